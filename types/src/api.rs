use crate::economy::{Land, User, MAX_BULK_CLAIM_PLOTS};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::ed25519::PublicKey;

/// Canonical result of a committed operation: the affected user's
/// post-commit snapshot and any plots the operation created. Clients
/// reconcile against this, never against local predictions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub uid: PublicKey,
    pub user: User,
    pub lands: Vec<Land>,
}

impl Write for Receipt {
    fn write(&self, writer: &mut impl BufMut) {
        self.uid.write(writer);
        self.user.write(writer);
        self.lands.write(writer);
    }
}

impl Read for Receipt {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            uid: PublicKey::read(reader)?,
            user: User::read(reader)?,
            lands: Vec::<Land>::read_range(reader, 0..=MAX_BULK_CLAIM_PLOTS)?,
        })
    }
}

impl EncodeSize for Receipt {
    fn encode_size(&self) -> usize {
        self.uid.encode_size() + self.user.encode_size() + self.lands.encode_size()
    }
}

/// Post-commit snapshot pushed to subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Update {
    /// A user's state changed; scoped to that user's subscribers.
    User { uid: PublicKey, user: User },
    /// Plots changed ownership state; delivered to every subscriber.
    Lands { lands: Vec<Land> },
}

impl Write for Update {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Update::User { uid, user } => {
                0u8.write(writer);
                uid.write(writer);
                user.write(writer);
            }
            Update::Lands { lands } => {
                1u8.write(writer);
                lands.write(writer);
            }
        }
    }
}

impl Read for Update {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Update::User {
                uid: PublicKey::read(reader)?,
                user: User::read(reader)?,
            }),
            1 => Ok(Update::Lands {
                lands: Vec::<Land>::read_range(reader, 0..=MAX_BULK_CLAIM_PLOTS)?,
            }),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Update {
    fn encode_size(&self) -> usize {
        1 + match self {
            Update::User { uid, user } => uid.encode_size() + user.encode_size(),
            Update::Lands { lands } => lands.encode_size(),
        }
    }
}

/// Subscription filter for the updates stream.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum UpdatesFilter {
    /// Subscribe to everything.
    All,
    /// Subscribe to land deltas plus one user's snapshots.
    User(PublicKey),
}

impl Write for UpdatesFilter {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            UpdatesFilter::All => 0u8.write(writer),
            UpdatesFilter::User(key) => {
                1u8.write(writer);
                key.write(writer);
            }
        }
    }
}

impl Read for UpdatesFilter {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(UpdatesFilter::All),
            1 => Ok(UpdatesFilter::User(PublicKey::read(reader)?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for UpdatesFilter {
    fn encode_size(&self) -> usize {
        1 + match self {
            UpdatesFilter::All => 0,
            UpdatesFilter::User(key) => key.encode_size(),
        }
    }
}
