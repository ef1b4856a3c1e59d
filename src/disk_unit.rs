//! Disk Unit Module
//!
//! Named byte magnitudes used to express size limits in human units.

use std::fmt;
use std::str::FromStr;

use crate::error::{CacheError, Result};

// == Disk Unit ==
/// Decimal byte magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiskUnit {
    Byte,
    Kilobyte,
    Megabyte,
    Gigabyte,
}

impl DiskUnit {
    /// Number of bytes in one unit.
    pub const fn size(self) -> u64 {
        match self {
            DiskUnit::Byte => 1,
            DiskUnit::Kilobyte => 1_000,
            DiskUnit::Megabyte => 1_000_000,
            DiskUnit::Gigabyte => 1_000_000_000,
        }
    }

    /// Short lowercase suffix for the unit.
    pub const fn initial(self) -> &'static str {
        match self {
            DiskUnit::Byte => "b",
            DiskUnit::Kilobyte => "kb",
            DiskUnit::Megabyte => "mb",
            DiskUnit::Gigabyte => "gb",
        }
    }

    // == Convert ==
    /// Converts `amount` of this unit into `to`, rounding down.
    ///
    /// The multiplication saturates instead of wrapping.
    pub const fn convert(self, amount: u64, to: DiskUnit) -> u64 {
        amount.saturating_mul(self.size()) / to.size()
    }

    pub const fn to_bytes(self, amount: u64) -> u64 {
        self.convert(amount, DiskUnit::Byte)
    }

    pub const fn to_kilobytes(self, amount: u64) -> u64 {
        self.convert(amount, DiskUnit::Kilobyte)
    }

    pub const fn to_megabytes(self, amount: u64) -> u64 {
        self.convert(amount, DiskUnit::Megabyte)
    }

    pub const fn to_gigabytes(self, amount: u64) -> u64 {
        self.convert(amount, DiskUnit::Gigabyte)
    }
}

impl fmt::Display for DiskUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.initial())
    }
}

impl FromStr for DiskUnit {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "b" => Ok(DiskUnit::Byte),
            "kb" => Ok(DiskUnit::Kilobyte),
            "mb" => Ok(DiskUnit::Megabyte),
            "gb" => Ok(DiskUnit::Gigabyte),
            other => Err(CacheError::InvalidArgument(format!(
                "Unknown disk unit '{}'",
                other
            ))),
        }
    }
}

// == Parse Size ==
/// Parses a size such as `"100mb"`, `"5 KB"` or `"512"` into bytes.
///
/// A bare number is taken as bytes.
pub fn parse_size(input: &str) -> Result<u64> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, unit) = input.split_at(split);

    let amount: u64 = digits.parse().map_err(|_| {
        CacheError::InvalidArgument(format!("Invalid size '{}'", input))
    })?;
    let unit: DiskUnit = unit.parse()?;

    Ok(unit.to_bytes(amount))
}
