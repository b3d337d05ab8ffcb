use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;

use super::{read_string, string_encode_size, write_string, MAX_NAME_LENGTH};

/// How a plot was acquired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireMethod {
    /// Debit the land cost from the buyer's Pugbucks balance.
    Buy,
    /// Spend one land voucher.
    Voucher,
}

impl Write for AcquireMethod {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            AcquireMethod::Buy => 0u8.write(writer),
            AcquireMethod::Voucher => 1u8.write(writer),
        }
    }
}

impl Read for AcquireMethod {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(AcquireMethod::Buy),
            1 => Ok(AcquireMethod::Voucher),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl FixedSize for AcquireMethod {
    const SIZE: usize = u8::SIZE;
}

/// One owned grid cell. Created exactly once on successful acquisition and
/// immutable afterwards: a plot is never deleted or reassigned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Land {
    pub gx: i64,
    pub gy: i64,
    /// Income rate in base units per second, fixed at acquisition time.
    pub pps: u64,
    pub owner: PublicKey,
    /// Display cache; the ownership relation is `owner`.
    pub owner_name: String,
    pub purchased_at_ms: u64,
}

impl Write for Land {
    fn write(&self, writer: &mut impl BufMut) {
        self.gx.write(writer);
        self.gy.write(writer);
        self.pps.write(writer);
        self.owner.write(writer);
        write_string(&self.owner_name, writer);
        self.purchased_at_ms.write(writer);
    }
}

impl Read for Land {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            gx: i64::read(reader)?,
            gy: i64::read(reader)?,
            pps: u64::read(reader)?,
            owner: PublicKey::read(reader)?,
            owner_name: read_string(reader, MAX_NAME_LENGTH)?,
            purchased_at_ms: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Land {
    fn encode_size(&self) -> usize {
        self.gx.encode_size()
            + self.gy.encode_size()
            + self.pps.encode_size()
            + self.owner.encode_size()
            + string_encode_size(&self.owner_name)
            + self.purchased_at_ms.encode_size()
    }
}
