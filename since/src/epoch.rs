use std::cmp::Ordering;
use std::fmt;

use ckb_types::core;

/// Epoch number with a fractional progress inside the epoch.
///
/// Packed as `length:16 | index:16 | number:24` in the low 56 bits of a u64.
#[derive(Clone, Copy, Debug, Default)]
pub struct EpochNumberWithFraction(u64);

impl EpochNumberWithFraction {
    pub const NUMBER_OFFSET: usize = 0;
    pub const NUMBER_BITS: usize = 24;
    pub const NUMBER_MAXIMUM_VALUE: u64 = 1u64 << Self::NUMBER_BITS;
    pub const NUMBER_MASK: u64 = Self::NUMBER_MAXIMUM_VALUE - 1;
    pub const INDEX_OFFSET: usize = Self::NUMBER_BITS;
    pub const INDEX_BITS: usize = 16;
    pub const INDEX_MAXIMUM_VALUE: u64 = 1u64 << Self::INDEX_BITS;
    pub const INDEX_MASK: u64 = Self::INDEX_MAXIMUM_VALUE - 1;
    pub const LENGTH_OFFSET: usize = Self::NUMBER_BITS + Self::INDEX_BITS;
    pub const LENGTH_BITS: usize = 16;
    pub const LENGTH_MAXIMUM_VALUE: u64 = 1u64 << Self::LENGTH_BITS;
    pub const LENGTH_MASK: u64 = Self::LENGTH_MAXIMUM_VALUE - 1;

    /// Returns `None` unless every field fits and `0 <= index < length`.
    pub fn create(number: u64, index: u64, length: u64) -> Option<Self> {
        if number < Self::NUMBER_MAXIMUM_VALUE
            && index < Self::INDEX_MAXIMUM_VALUE
            && length < Self::LENGTH_MAXIMUM_VALUE
            && length > 0
            && index < length
        {
            Some(Self::new_unchecked(number, index, length))
        } else {
            None
        }
    }

    pub const fn new_unchecked(number: u64, index: u64, length: u64) -> Self {
        Self(
            (length << Self::LENGTH_OFFSET)
                | (index << Self::INDEX_OFFSET)
                | (number << Self::NUMBER_OFFSET),
        )
    }

    /// Decodes a packed value. A zero length is read as `number + 0/1`, which
    /// is how the chain interprets an epoch since without a fraction.
    pub fn from_full_value(value: u64) -> Self {
        let epoch = Self(value);
        if epoch.length() == 0 {
            Self::new_unchecked(epoch.number(), 0, 1)
        } else {
            epoch
        }
    }

    pub fn full_value(&self) -> u64 {
        self.0
    }

    pub fn number(&self) -> u64 {
        (self.0 >> Self::NUMBER_OFFSET) & Self::NUMBER_MASK
    }

    pub fn index(&self) -> u64 {
        (self.0 >> Self::INDEX_OFFSET) & Self::INDEX_MASK
    }

    pub fn length(&self) -> u64 {
        (self.0 >> Self::LENGTH_OFFSET) & Self::LENGTH_MASK
    }

    pub fn is_well_formed(&self) -> bool {
        self.length() > 0 && self.index() < self.length()
    }

    /// Adds two epoch positions.
    ///
    /// The fractions are summed over the common denominator, reduced by their
    /// gcd, and whole epochs are carried into `number`. Any operand that is
    /// not well formed, or a result that no longer fits the packed layout,
    /// yields `None`.
    pub fn add(&self, rhs: &Self) -> Option<Self> {
        if !self.is_well_formed() || !rhs.is_well_formed() {
            return None;
        }

        let mut number = self.number().checked_add(rhs.number())?;

        let mut numerator = self
            .index()
            .checked_mul(rhs.length())?
            .checked_add(rhs.index().checked_mul(self.length())?)?;
        let mut denominator = self.length().checked_mul(rhs.length())?;

        let divisor = gcd(numerator, denominator);
        numerator /= divisor;
        denominator /= divisor;

        number = number.checked_add(numerator / denominator)?;
        numerator %= denominator;

        Self::create(number, numerator, denominator)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl PartialOrd for EpochNumberWithFraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.number().cmp(&other.number()) {
            Ordering::Equal => {
                // index/length are at most 16 bits, the products fit in u64
                let a = self.index() * other.length();
                let b = other.index() * self.length();
                Some(a.cmp(&b))
            }
            ord => Some(ord),
        }
    }
}

impl PartialEq for EpochNumberWithFraction {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for EpochNumberWithFraction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({}/{})", self.number(), self.index(), self.length())
    }
}

impl From<core::EpochNumberWithFraction> for EpochNumberWithFraction {
    fn from(epoch: core::EpochNumberWithFraction) -> Self {
        Self::from_full_value(epoch.full_value())
    }
}
