use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use super::{
    read_string, string_encode_size, write_string, BASE_CLAIM_RADIUS_METERS, MAX_NAME_LENGTH,
    RANGE_BOOST_MULTIPLIER, STARTING_BALANCE,
};

/// Current user schema version. Version 1 records predate the dual-currency
/// model (no Pug Coins, no range boost, no per-reward cooldown watermarks)
/// and are migrated at read time.
const USER_SCHEMA_V1: u8 = 1;
const USER_SCHEMA_V2: u8 = 2;

/// Authoritative per-user economy state. Balances are base currency units
/// (see [super::UNITS_PER_PUGBUCK]); timestamps are epoch milliseconds.
///
/// `last_seen_ms` is the accrual watermark: income has been folded into
/// `balance` up to exactly this instant.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct User {
    pub name: String,
    pub balance: u64,
    pub pug_coins: u64,
    pub land_vouchers: u32,
    pub land_count: u32,
    pub last_seen_ms: u64,
    pub boost_end_ms: Option<u64>,
    pub range_boost_end_ms: Option<u64>,
    pub last_voucher_ad_ms: Option<u64>,
    pub last_boost_ad_ms: Option<u64>,
    pub last_range_boost_ad_ms: Option<u64>,
    pub created_at_ms: u64,
}

impl User {
    pub fn new(name: String, now_ms: u64) -> Self {
        Self {
            name,
            balance: STARTING_BALANCE,
            pug_coins: 0,
            land_vouchers: 0,
            land_count: 0,
            last_seen_ms: now_ms,
            boost_end_ms: None,
            range_boost_end_ms: None,
            last_voucher_ad_ms: None,
            last_boost_ad_ms: None,
            last_range_boost_ad_ms: None,
            created_at_ms: now_ms,
        }
    }

    /// Whether the 20x income boost is active at `now_ms`.
    pub fn boost_active(&self, now_ms: u64) -> bool {
        self.boost_end_ms.is_some_and(|end| now_ms < end)
    }

    /// Whether the claim-range boost is active at `now_ms`.
    pub fn range_boost_active(&self, now_ms: u64) -> bool {
        self.range_boost_end_ms.is_some_and(|end| now_ms < end)
    }

    /// The claim radius the server vouches for at `now_ms`. Clients render
    /// this; they never compute their own.
    pub fn claim_radius_meters(&self, now_ms: u64) -> f64 {
        if self.range_boost_active(now_ms) {
            BASE_CLAIM_RADIUS_METERS * RANGE_BOOST_MULTIPLIER
        } else {
            BASE_CLAIM_RADIUS_METERS
        }
    }
}

impl Write for User {
    fn write(&self, writer: &mut impl BufMut) {
        USER_SCHEMA_V2.write(writer);
        write_string(&self.name, writer);
        self.balance.write(writer);
        self.pug_coins.write(writer);
        self.land_vouchers.write(writer);
        self.land_count.write(writer);
        self.last_seen_ms.write(writer);
        self.boost_end_ms.write(writer);
        self.range_boost_end_ms.write(writer);
        self.last_voucher_ad_ms.write(writer);
        self.last_boost_ad_ms.write(writer);
        self.last_range_boost_ad_ms.write(writer);
        self.created_at_ms.write(writer);
    }
}

impl Read for User {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let version = u8::read(reader)?;
        match version {
            // Legacy single-currency record: migrate added fields to their
            // zero values.
            USER_SCHEMA_V1 => Ok(Self {
                name: read_string(reader, MAX_NAME_LENGTH)?,
                balance: u64::read(reader)?,
                pug_coins: 0,
                land_vouchers: u32::read(reader)?,
                land_count: u32::read(reader)?,
                last_seen_ms: u64::read(reader)?,
                boost_end_ms: Option::<u64>::read(reader)?,
                range_boost_end_ms: None,
                last_voucher_ad_ms: None,
                last_boost_ad_ms: None,
                last_range_boost_ad_ms: None,
                created_at_ms: u64::read(reader)?,
            }),
            USER_SCHEMA_V2 => Ok(Self {
                name: read_string(reader, MAX_NAME_LENGTH)?,
                balance: u64::read(reader)?,
                pug_coins: u64::read(reader)?,
                land_vouchers: u32::read(reader)?,
                land_count: u32::read(reader)?,
                last_seen_ms: u64::read(reader)?,
                boost_end_ms: Option::<u64>::read(reader)?,
                range_boost_end_ms: Option::<u64>::read(reader)?,
                last_voucher_ad_ms: Option::<u64>::read(reader)?,
                last_boost_ad_ms: Option::<u64>::read(reader)?,
                last_range_boost_ad_ms: Option::<u64>::read(reader)?,
                created_at_ms: u64::read(reader)?,
            }),
            v => Err(Error::InvalidEnum(v)),
        }
    }
}

impl EncodeSize for User {
    fn encode_size(&self) -> usize {
        1 + string_encode_size(&self.name)
            + self.balance.encode_size()
            + self.pug_coins.encode_size()
            + self.land_vouchers.encode_size()
            + self.land_count.encode_size()
            + self.last_seen_ms.encode_size()
            + self.boost_end_ms.encode_size()
            + self.range_boost_end_ms.encode_size()
            + self.last_voucher_ad_ms.encode_size()
            + self.last_boost_ad_ms.encode_size()
            + self.last_range_boost_ad_ms.encode_size()
            + self.created_at_ms.encode_size()
    }
}
