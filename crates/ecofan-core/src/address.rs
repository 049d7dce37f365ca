//! RF address codec.
//!
//! An RF address is exactly three bytes written as `XX:XX:XX`. Parsing is
//! case-insensitive; formatting is always uppercase. The emitted form is an
//! unsigned integer literal made of the six concatenated hex digits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Number of bytes in an RF address.
pub const ADDRESS_LEN: usize = 3;

const MSG_PART_COUNT: &str = "RF Address must consist of 3 : (colon) separated parts";
const MSG_PART_WIDTH: &str = "RF Address must be format XX:XX:XX";
const MSG_PART_HEX: &str = "RF Address parts must be hexadecimal values from 00 to FF";

/// A three-byte RF address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RfAddress([u8; ADDRESS_LEN]);

impl RfAddress {
    /// Build an address from its bytes.
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// The address bytes, most significant first.
    pub fn bytes(&self) -> [u8; ADDRESS_LEN] {
        self.0
    }

    /// Parse `XX:XX:XX` notation.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason| CoreError::InvalidFormat {
            input: text.to_string(),
            reason,
        };

        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() != ADDRESS_LEN {
            return Err(invalid(MSG_PART_COUNT));
        }
        // Width is checked for every part before any is decoded.
        if parts.iter().any(|p| p.chars().count() != 2) {
            return Err(invalid(MSG_PART_WIDTH));
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        for (slot, part) in bytes.iter_mut().zip(&parts) {
            // from_str_radix accepts a leading '+', which is not a hex digit.
            if !part.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(invalid(MSG_PART_HEX));
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| invalid(MSG_PART_HEX))?;
        }
        Ok(Self(bytes))
    }

    /// Encode as an unsigned integer literal of the concatenated hex digits.
    pub fn encode(&self) -> UintLiteral {
        let value = self
            .0
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        UintLiteral {
            value,
            hex_digits: (ADDRESS_LEN * 2) as u8,
        }
    }
}

impl fmt::Display for RfAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}")
    }
}

impl FromStr for RfAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for RfAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RfAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// A fixed-width unsigned integer literal, rendered in hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UintLiteral {
    /// Numeric value.
    pub value: u64,
    /// Number of hex digits the literal is padded to.
    pub hex_digits: u8,
}

impl UintLiteral {
    /// Build a literal with explicit width.
    pub fn new(value: u64, hex_digits: u8) -> Self {
        Self { value, hex_digits }
    }
}

impl fmt::Display for UintLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:0width$X}", self.value, width = self.hex_digits as usize)
    }
}
