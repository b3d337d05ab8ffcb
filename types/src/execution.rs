use crate::economy::{
    AcquireMethod, Land, RedemptionRequest, User, MAX_BULK_CLAIM_PLOTS, MAX_NAME_LENGTH,
};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::{
    ed25519::{self, PublicKey},
    Signer, Verifier,
};
use commonware_utils::union;

pub const NAMESPACE: &[u8] = b"_PUGLANDS";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

/// A signed, replay-protected instruction. The signer's public key is the
/// user's identity; resolving a session is verifying this signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::new();
        nonce.write(&mut payload);
        instruction.write(&mut payload);

        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        let signature = private.sign(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&nonce, &instruction),
        );

        Self {
            nonce,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&self.nonce, &self.instruction),
            &self.signature,
        )
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let nonce = u64::read(reader)?;
        let instruction = Instruction::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            nonce,
            instruction,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

/// State-changing operations a client may submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Create the signer's user with the starting balance grant.
    /// Binary: [10] [nameLen:u32 BE] [nameBytes...]
    Register { name: String },

    /// Claim one plot, paying with Pugbucks or a voucher.
    /// Binary: [11] [gx:i64 BE] [gy:i64 BE] [method:u8]
    AcquireLand {
        gx: i64,
        gy: i64,
        method: AcquireMethod,
    },

    /// Claim several plots with vouchers, all-or-nothing.
    /// Binary: [12] [count:u32 BE] [(gx:i64 BE, gy:i64 BE)...]
    BulkClaim { plots: Vec<(i64, i64)> },

    /// Convert whole Pug Coins into Pugbucks at the fixed rate.
    /// Binary: [13] [coins:u64 BE]
    ExchangePugCoins { coins: u64 },

    /// Ad-reward grants, each gated by its own cooldown.
    /// Binary: [14] / [15] / [16]
    GrantVoucher,
    GrantBoost,
    GrantRangeBoost,

    /// Request a cash-out of whole Pug Coins (debited immediately).
    /// Binary: [17] [coins:u64 BE]
    SubmitRedemption { coins: u64 },

    /// Privileged: credit Pug Coins to a user. Must be signed by the admin.
    /// Binary: [18] [user:32] [coins:u64 BE]
    GrantPugbucks { user: PublicKey, coins: u64 },

    /// Privileged: resolve a user's pending redemption. Must be signed by
    /// the admin; rejection refunds the debit.
    /// Binary: [19] [user:32] [approve:u8]
    ResolveRedemption { user: PublicKey, approve: bool },
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Register { name } => {
                10u8.write(writer);
                (name.len() as u32).write(writer);
                writer.put_slice(name.as_bytes());
            }
            Self::AcquireLand { gx, gy, method } => {
                11u8.write(writer);
                gx.write(writer);
                gy.write(writer);
                method.write(writer);
            }
            Self::BulkClaim { plots } => {
                12u8.write(writer);
                plots.write(writer);
            }
            Self::ExchangePugCoins { coins } => {
                13u8.write(writer);
                coins.write(writer);
            }
            Self::GrantVoucher => 14u8.write(writer),
            Self::GrantBoost => 15u8.write(writer),
            Self::GrantRangeBoost => 16u8.write(writer),
            Self::SubmitRedemption { coins } => {
                17u8.write(writer);
                coins.write(writer);
            }
            Self::GrantPugbucks { user, coins } => {
                18u8.write(writer);
                user.write(writer);
                coins.write(writer);
            }
            Self::ResolveRedemption { user, approve } => {
                19u8.write(writer);
                user.write(writer);
                approve.write(writer);
            }
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match reader.get_u8() {
            10 => {
                let name_len = u32::read(reader)? as usize;
                if name_len > MAX_NAME_LENGTH {
                    return Err(Error::Invalid("Instruction", "name too long"));
                }
                if reader.remaining() < name_len {
                    return Err(Error::EndOfBuffer);
                }
                let mut name_bytes = vec![0u8; name_len];
                reader.copy_to_slice(&mut name_bytes);
                let name = String::from_utf8(name_bytes)
                    .map_err(|_| Error::Invalid("Instruction", "invalid UTF-8 in name"))?;
                Self::Register { name }
            }
            11 => Self::AcquireLand {
                gx: i64::read(reader)?,
                gy: i64::read(reader)?,
                method: AcquireMethod::read(reader)?,
            },
            12 => Self::BulkClaim {
                plots: Vec::<(i64, i64)>::read_range(reader, 1..=MAX_BULK_CLAIM_PLOTS)?,
            },
            13 => Self::ExchangePugCoins {
                coins: u64::read(reader)?,
            },
            14 => Self::GrantVoucher,
            15 => Self::GrantBoost,
            16 => Self::GrantRangeBoost,
            17 => Self::SubmitRedemption {
                coins: u64::read(reader)?,
            },
            18 => Self::GrantPugbucks {
                user: PublicKey::read(reader)?,
                coins: u64::read(reader)?,
            },
            19 => Self::ResolveRedemption {
                user: PublicKey::read(reader)?,
                approve: bool::read(reader)?,
            },

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Register { name } => 4 + name.len(),
                Self::AcquireLand { .. } => 8 + 8 + 1,
                Self::BulkClaim { plots } => plots.encode_size(),
                Self::ExchangePugCoins { .. } => 8,
                Self::GrantVoucher | Self::GrantBoost | Self::GrantRangeBoost => 0,
                Self::SubmitRedemption { .. } => 8,
                Self::GrantPugbucks { user, coins } => user.encode_size() + coins.encode_size(),
                Self::ResolveRedemption { user, approve } => {
                    user.encode_size() + approve.encode_size()
                }
            }
    }
}

/// Minimal per-key record for transaction nonce tracking (replay
/// protection), kept separate from the User row so it exists from the very
/// first submission.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
    }
}

/// Ledger key space.
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone)]
pub enum Key {
    /// Account for nonce tracking (tag 0)
    Account(PublicKey),

    // Economy keys (tags 10-12)
    User(PublicKey),
    Land { gx: i64, gy: i64 },
    Redemption(PublicKey),
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }
            Self::User(pk) => {
                10u8.write(writer);
                pk.write(writer);
            }
            Self::Land { gx, gy } => {
                11u8.write(writer);
                gx.write(writer);
                gy.write(writer);
            }
            Self::Redemption(pk) => {
                12u8.write(writer);
                pk.write(writer);
            }
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match reader.get_u8() {
            0 => Self::Account(PublicKey::read(reader)?),
            10 => Self::User(PublicKey::read(reader)?),
            11 => Self::Land {
                gx: i64::read(reader)?,
                gy: i64::read(reader)?,
            },
            12 => Self::Redemption(PublicKey::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) => PublicKey::SIZE,
                Self::User(_) => PublicKey::SIZE,
                Self::Land { .. } => 8 + 8,
                Self::Redemption(_) => PublicKey::SIZE,
            }
    }
}

/// Ledger value space, mirroring [Key].
#[derive(Clone, Eq, PartialEq, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Value {
    Account(Account),

    // Economy values (tags 10-12)
    User(User),
    Land(Land),
    Redemption(RedemptionRequest),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }
            Self::User(user) => {
                10u8.write(writer);
                user.write(writer);
            }
            Self::Land(land) => {
                11u8.write(writer);
                land.write(writer);
            }
            Self::Redemption(request) => {
                12u8.write(writer);
                request.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match reader.get_u8() {
            0 => Self::Account(Account::read(reader)?),
            10 => Self::User(User::read(reader)?),
            11 => Self::Land(Land::read(reader)?),
            12 => Self::Redemption(RedemptionRequest::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(account) => account.encode_size(),
                Self::User(user) => user.encode_size(),
                Self::Land(land) => land.encode_size(),
                Self::Redemption(request) => request.encode_size(),
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::{DecodeExt, Encode};
    use commonware_cryptography::{ed25519::PrivateKey, PrivateKeyExt};
    use rand::{rngs::StdRng, SeedableRng};

    fn keypair(seed: u64) -> (PrivateKey, PublicKey) {
        let mut rng = StdRng::seed_from_u64(seed);
        let private = PrivateKey::from_rng(&mut rng);
        let public = private.public_key();
        (private, public)
    }

    #[test]
    fn test_transaction_sign_verify() {
        let (private, public) = keypair(1);
        let tx = Transaction::sign(
            &private,
            0,
            Instruction::Register {
                name: "Pugsley".to_string(),
            },
        );
        assert_eq!(tx.public, public);
        assert!(tx.verify());

        // A decoded copy still verifies.
        let decoded = Transaction::decode(tx.encode().as_ref()).unwrap();
        assert_eq!(tx, decoded);
        assert!(decoded.verify());

        // Tampering with the nonce invalidates the signature.
        let mut tampered = tx;
        tampered.nonce = 1;
        assert!(!tampered.verify());
    }

    #[test]
    fn test_instruction_roundtrip() {
        let (_, user) = keypair(2);
        let instructions = [
            Instruction::Register {
                name: "Pugsley".to_string(),
            },
            Instruction::AcquireLand {
                gx: -5,
                gy: 1_000_000,
                method: AcquireMethod::Voucher,
            },
            Instruction::BulkClaim {
                plots: vec![(0, 0), (0, 1), (-3, 7)],
            },
            Instruction::ExchangePugCoins { coins: 2 },
            Instruction::GrantVoucher,
            Instruction::GrantBoost,
            Instruction::GrantRangeBoost,
            Instruction::SubmitRedemption { coins: 3 },
            Instruction::GrantPugbucks {
                user: user.clone(),
                coins: 100,
            },
            Instruction::ResolveRedemption {
                user,
                approve: true,
            },
        ];
        for instruction in instructions {
            let encoded = instruction.encode();
            assert_eq!(encoded.len(), instruction.encode_size());
            let decoded = Instruction::decode(encoded.as_ref()).unwrap();
            assert_eq!(instruction, decoded);
        }
    }

    #[test]
    fn test_bulk_claim_bounds() {
        // An empty batch does not decode.
        let empty = Instruction::BulkClaim { plots: vec![] };
        assert!(Instruction::decode(empty.encode().as_ref()).is_err());

        // Neither does one beyond the plot cap.
        let oversized = Instruction::BulkClaim {
            plots: (0..=MAX_BULK_CLAIM_PLOTS as i64).map(|i| (i, 0)).collect(),
        };
        assert!(Instruction::decode(oversized.encode().as_ref()).is_err());
    }

    #[test]
    fn test_key_value_roundtrip() {
        let (_, public) = keypair(3);
        let keys = [
            Key::Account(public.clone()),
            Key::User(public.clone()),
            Key::Land { gx: -42, gy: 17 },
            Key::Redemption(public.clone()),
        ];
        for key in keys {
            let encoded = key.encode();
            assert_eq!(encoded.len(), key.encode_size());
            let decoded = Key::decode(encoded.as_ref()).unwrap();
            assert!(decoded == key);
        }

        let value = Value::Account(Account { nonce: 9 });
        let decoded = Value::decode(value.encode().as_ref()).unwrap();
        assert_eq!(value, decoded);
    }
}
