//! Four-character chunk tags.

use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::error::{Error, Result};

/// Four-character chunk magic number.
///
/// Stored in file byte order and compared as a raw bit pattern.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct Magic(pub [u8; 4]);

impl Magic {
    pub const UCFB: Self = Self(*b"ucfb");
    pub const VER_: Self = Self(*b"VER_");
    pub const NAME: Self = Self(*b"NAME");
    pub const INFO: Self = Self(*b"INFO");
    pub const DATA: Self = Self(*b"DATA");
    pub const BODY: Self = Self(*b"BODY");

    /// Create from bytes.
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Interpret a little-endian `u32` as a magic number.
    pub const fn from_u32(value: u32) -> Self {
        Self(value.to_le_bytes())
    }

    /// The magic number as it appears in a little-endian `u32` field.
    pub const fn to_u32(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Display for Magic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for Magic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "Magic({s:?})"),
            Err(_) => write!(f, "Magic({:#010x})", self.to_u32()),
        }
    }
}

impl From<[u8; 4]> for Magic {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&str> for Magic {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| Error::InvalidMagic(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl std::str::FromStr for Magic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from(s)
    }
}
