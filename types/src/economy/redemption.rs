use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;

/// Lifecycle of a cash-out request. `Pending` transitions exactly once to
/// `Approved` or `Rejected` by an external reviewer; both are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedemptionStatus {
    Pending,
    Approved,
    Rejected,
}

impl Write for RedemptionStatus {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            RedemptionStatus::Pending => 0u8.write(writer),
            RedemptionStatus::Approved => 1u8.write(writer),
            RedemptionStatus::Rejected => 2u8.write(writer),
        }
    }
}

impl Read for RedemptionStatus {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(RedemptionStatus::Pending),
            1 => Ok(RedemptionStatus::Approved),
            2 => Ok(RedemptionStatus::Rejected),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl FixedSize for RedemptionStatus {
    const SIZE: usize = u8::SIZE;
}

/// A cash-out request. The submitting debit and this row are written in the
/// same commit; a rejection credits the debit back when the reviewer
/// resolves it. At most one `Pending` request exists per user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedemptionRequest {
    pub user: PublicKey,
    /// Whole Pug Coins requested for cash-out.
    pub coins: u64,
    pub status: RedemptionStatus,
    pub requested_at_ms: u64,
}

impl Write for RedemptionRequest {
    fn write(&self, writer: &mut impl BufMut) {
        self.user.write(writer);
        self.coins.write(writer);
        self.status.write(writer);
        self.requested_at_ms.write(writer);
    }
}

impl Read for RedemptionRequest {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            user: PublicKey::read(reader)?,
            coins: u64::read(reader)?,
            status: RedemptionStatus::read(reader)?,
            requested_at_ms: u64::read(reader)?,
        })
    }
}

impl EncodeSize for RedemptionRequest {
    fn encode_size(&self) -> usize {
        self.user.encode_size()
            + self.coins.encode_size()
            + self.status.encode_size()
            + self.requested_at_ms.encode_size()
    }
}
