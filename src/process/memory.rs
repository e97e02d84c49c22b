//! Memory quantities and kB field parsing for `/proc` status files.
//!
//! `MemorySize` stores bytes as `f64` because sizes are also produced by
//! division (averages, scaled values). Equality therefore uses a small
//! tolerance instead of exact comparison.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

const TOLERANCE: f64 = 0.000_000_01;
const KB: f64 = 1024.0;

/// A byte quantity with KB/MB/GB views.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemorySize {
    bytes: f64,
}

impl MemorySize {
    pub const ZERO: MemorySize = MemorySize { bytes: 0.0 };

    pub fn from_bytes(bytes: u64) -> Self {
        Self {
            bytes: bytes as f64,
        }
    }

    /// Whole bytes; fractions below one byte are dropped.
    pub fn from_kilobytes(kb: f64) -> Self {
        Self {
            bytes: (kb * KB).trunc(),
        }
    }

    pub fn from_megabytes(mb: f64) -> Self {
        Self {
            bytes: (mb * KB * KB).trunc(),
        }
    }

    pub fn from_gigabytes(gb: f64) -> Self {
        Self {
            bytes: (gb * KB * KB * KB).trunc(),
        }
    }

    pub fn bytes(&self) -> f64 {
        self.bytes
    }

    pub fn kilobytes(&self) -> f64 {
        self.bytes / KB
    }

    pub fn megabytes(&self) -> f64 {
        self.bytes / KB / KB
    }

    pub fn gigabytes(&self) -> f64 {
        self.bytes / KB / KB / KB
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.gigabytes() >= 1.0 {
            write!(f, "{:.2} GB", self.gigabytes())
        } else if self.megabytes() >= 1.0 {
            write!(f, "{:.2} MB", self.megabytes())
        } else if self.kilobytes() >= 1.0 {
            write!(f, "{:.2} KB", self.kilobytes())
        } else {
            write!(f, "{} B", self.bytes)
        }
    }
}

impl PartialEq for MemorySize {
    fn eq(&self, other: &Self) -> bool {
        (self.bytes - other.bytes).abs() < TOLERANCE
    }
}

impl PartialOrd for MemorySize {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        self.bytes.partial_cmp(&other.bytes)
    }
}

impl Add for MemorySize {
    type Output = MemorySize;

    fn add(self, rhs: MemorySize) -> MemorySize {
        MemorySize {
            bytes: self.bytes + rhs.bytes,
        }
    }
}

impl Sub for MemorySize {
    type Output = MemorySize;

    fn sub(self, rhs: MemorySize) -> MemorySize {
        MemorySize {
            bytes: self.bytes - rhs.bytes,
        }
    }
}

impl Mul<f64> for MemorySize {
    type Output = MemorySize;

    fn mul(self, rhs: f64) -> MemorySize {
        MemorySize {
            bytes: self.bytes * rhs,
        }
    }
}

impl Div<f64> for MemorySize {
    type Output = MemorySize;

    fn div(self, rhs: f64) -> MemorySize {
        MemorySize {
            bytes: self.bytes / rhs,
        }
    }
}

/// Ratio of two sizes; dimensionless.
impl Div for MemorySize {
    type Output = f64;

    fn div(self, rhs: MemorySize) -> f64 {
        self.bytes / rhs.bytes
    }
}

impl From<u64> for MemorySize {
    fn from(bytes: u64) -> Self {
        MemorySize::from_bytes(bytes)
    }
}

impl From<f64> for MemorySize {
    fn from(bytes: f64) -> Self {
        MemorySize {
            bytes: bytes.trunc(),
        }
    }
}

impl From<MemorySize> for f64 {
    fn from(size: MemorySize) -> f64 {
        size.bytes
    }
}

/// Serialized as a whole byte count.
impl Serialize for MemorySize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.bytes.max(0.0).round() as u64)
    }
}

/// Parses kilobyte values from status/meminfo lines.
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Finds `key` (e.g. `"VmRSS:"`) in a status-style file and returns its size.
pub fn find_kb_field(content: &str, key: &str) -> Option<MemorySize> {
    content
        .lines()
        .find_map(|line| line.strip_prefix(key).and_then(parse_kb_value))
        .map(|kb| MemorySize::from_bytes(kb.saturating_mul(1024)))
}
