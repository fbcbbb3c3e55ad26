//! Since: the 64 bit timelock value attached to a transaction input.
//!
//! ```text
//! bit 63      relative (1) / absolute (0)
//! bit 61..62  metric: 00 block number, 01 epoch, 10 timestamp
//! bit 56..60  reserved, must be zero
//! bit 0..55   metric specific value
//! ```
//!
//! Two values are only comparable when they share the relative flag and the
//! metric. `Since` therefore implements `PartialOrd` only, and `partial_cmp`
//! returns `None` for every mismatched pair.

use std::cmp::Ordering;
use std::fmt;

mod epoch;

pub use epoch::EpochNumberWithFraction;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LockValue {
    BlockNumber(u64),
    EpochNumberWithFraction(EpochNumberWithFraction),
    /// Seconds since the unix epoch, or elapsed seconds for a relative since.
    Timestamp(u64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    BlockNumber,
    Epoch,
    Timestamp,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Since(u64);

impl Since {
    pub const LOCK_TYPE_FLAG: u64 = 1 << 63;
    pub const METRIC_TYPE_FLAG_MASK: u64 = 0x6000_0000_0000_0000;
    pub const FLAGS_MASK: u64 = 0xff00_0000_0000_0000;
    pub const VALUE_MASK: u64 = 0x00ff_ffff_ffff_ffff;
    pub const REMAIN_FLAGS_BITS: u64 = 0x1f00_0000_0000_0000;
    pub const LOCK_BY_BLOCK_NUMBER_MASK: u64 = 0x0000_0000_0000_0000;
    pub const LOCK_BY_EPOCH_MASK: u64 = 0x2000_0000_0000_0000;
    pub const LOCK_BY_TIMESTAMP_MASK: u64 = 0x4000_0000_0000_0000;

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_le_bytes(bytes))
    }

    pub fn to_le_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn from_block_number(number: u64, absolute: bool) -> Option<Self> {
        Self::from_value(number, Self::LOCK_BY_BLOCK_NUMBER_MASK, absolute)
    }

    pub fn from_timestamp(timestamp: u64, absolute: bool) -> Option<Self> {
        Self::from_value(timestamp, Self::LOCK_BY_TIMESTAMP_MASK, absolute)
    }

    pub fn from_epoch(epoch: EpochNumberWithFraction, absolute: bool) -> Option<Self> {
        Self::from_value(epoch.full_value(), Self::LOCK_BY_EPOCH_MASK, absolute)
    }

    fn from_value(value: u64, metric: u64, absolute: bool) -> Option<Self> {
        if value & Self::FLAGS_MASK != 0 {
            return None;
        }
        let relative = if absolute { 0 } else { Self::LOCK_TYPE_FLAG };
        Some(Self(value | metric | relative))
    }

    pub fn is_absolute(&self) -> bool {
        self.0 & Self::LOCK_TYPE_FLAG == 0
    }

    pub fn is_relative(&self) -> bool {
        !self.is_absolute()
    }

    /// Reserved bits are clear and the metric tag is a known one.
    pub fn flags_is_valid(&self) -> bool {
        self.0 & Self::REMAIN_FLAGS_BITS == 0 && self.metric().is_some()
    }

    pub fn metric(&self) -> Option<Metric> {
        match self.0 & Self::METRIC_TYPE_FLAG_MASK {
            Self::LOCK_BY_BLOCK_NUMBER_MASK => Some(Metric::BlockNumber),
            Self::LOCK_BY_EPOCH_MASK => Some(Metric::Epoch),
            Self::LOCK_BY_TIMESTAMP_MASK => Some(Metric::Timestamp),
            _ => None,
        }
    }

    pub fn extract_lock_value(&self) -> Option<LockValue> {
        let value = self.0 & Self::VALUE_MASK;
        match self.metric()? {
            Metric::BlockNumber => Some(LockValue::BlockNumber(value)),
            Metric::Epoch => Some(LockValue::EpochNumberWithFraction(
                EpochNumberWithFraction::from_full_value(value),
            )),
            Metric::Timestamp => Some(LockValue::Timestamp(value)),
        }
    }
}

impl PartialOrd for Since {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.is_absolute() != other.is_absolute()
            || !self.flags_is_valid()
            || !other.flags_is_valid()
        {
            return None;
        }

        match (self.extract_lock_value()?, other.extract_lock_value()?) {
            (LockValue::BlockNumber(a), LockValue::BlockNumber(b)) => Some(a.cmp(&b)),
            (LockValue::Timestamp(a), LockValue::Timestamp(b)) => Some(a.cmp(&b)),
            (LockValue::EpochNumberWithFraction(a), LockValue::EpochNumberWithFraction(b)) => {
                a.partial_cmp(&b)
            }
            _ => None,
        }
    }
}

impl PartialEq for Since {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl From<u64> for Since {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Since {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = if self.is_absolute() {
            "absolute"
        } else {
            "relative"
        };
        match self.extract_lock_value() {
            Some(LockValue::BlockNumber(n)) => write!(f, "{} block {}", kind, n),
            Some(LockValue::EpochNumberWithFraction(e)) => write!(f, "{} epoch {}", kind, e),
            Some(LockValue::Timestamp(t)) => write!(f, "{} timestamp {}", kind, t),
            None => write!(f, "invalid since {:#018x}", self.0),
        }
    }
}
