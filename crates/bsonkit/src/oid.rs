//! The 12-byte ObjectId.
//!
//! Layout: a 4-byte big-endian timestamp in seconds, 5 bytes of per-process
//! randomness, and a 3-byte big-endian counter.

use alloc::string::String;
use core::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectIdError {
    #[error("expected 24 hex characters, found {0}")]
    InvalidLength(usize),
    #[error("invalid hex character '{0}'")]
    InvalidCharacter(char),
}

#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub const LEN: usize = 12;

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Assembles an id from its three components. Only the low 24 bits of
    /// `counter` are kept.
    #[must_use]
    pub fn from_parts(seconds: u32, random: [u8; 5], counter: u32) -> Self {
        let mut bytes = [0; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&random);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Generates a fresh id from the system clock, a per-process random value
    /// and a process-wide counter.
    #[cfg(feature = "std")]
    #[must_use]
    pub fn new() -> Self {
        generator::next()
    }

    #[must_use]
    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Seconds since the Unix epoch at which the id was generated.
    #[must_use]
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Lower-case hexadecimal form (24 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(24);
        for byte in self.0 {
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0F) as usize] as char);
        }
        out
    }

    /// Parses the 24-character hexadecimal form (either case).
    ///
    /// # Errors
    ///
    /// Fails if `s` is not exactly 24 hex digits.
    pub fn parse_str(s: &str) -> Result<Self, ObjectIdError> {
        if s.len() != 24 {
            return Err(ObjectIdError::InvalidLength(s.chars().count()));
        }
        let mut bytes = [0u8; 12];
        let mut chars = s.chars();
        for byte in &mut bytes {
            let hi = hex_value(chars.next())?;
            let lo = hex_value(chars.next())?;
            *byte = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }
}

const HEX: &[u8; 16] = b"0123456789abcdef";

fn hex_value(c: Option<char>) -> Result<u8, ObjectIdError> {
    let c = c.ok_or(ObjectIdError::InvalidLength(0))?;
    c.to_digit(16)
        .and_then(|d| u8::try_from(d).ok())
        .ok_or(ObjectIdError::InvalidCharacter(c))
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl From<[u8; 12]> for ObjectId {
    fn from(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId(\"{}\")", self.to_hex())
    }
}

#[cfg(feature = "std")]
mod generator {
    use core::sync::atomic::{AtomicU32, Ordering};
    use std::{sync::OnceLock, time::SystemTime};

    use super::ObjectId;

    static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
    static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

    pub(super) fn next() -> ObjectId {
        #[allow(clippy::cast_possible_truncation)]
        let seconds = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs() as u32);
        let random = *PROCESS_UNIQUE.get_or_init(rand::random::<[u8; 5]>);
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::random::<u32>() & 0x00FF_FFFF))
            .fetch_add(1, Ordering::Relaxed);
        ObjectId::from_parts(seconds, random, counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let oid = ObjectId::parse_str("507F1F77bcf86cd799439011").unwrap();
        assert_eq!(oid.to_hex(), "507f1f77bcf86cd799439011");
        assert_eq!(oid.timestamp(), 0x507f_1f77);
        assert_eq!("507f1f77bcf86cd799439011".parse::<ObjectId>(), Ok(oid));
    }

    #[test]
    fn rejects_bad_hex() {
        assert_eq!(
            ObjectId::parse_str("abc"),
            Err(ObjectIdError::InvalidLength(3))
        );
        assert_eq!(
            ObjectId::parse_str("507f1f77bcf86cd79943901z"),
            Err(ObjectIdError::InvalidCharacter('z'))
        );
    }

    #[test]
    fn parts_are_laid_out_big_endian() {
        let oid = ObjectId::from_parts(1, [2, 3, 4, 5, 6], 0x0107_0809);
        assert_eq!(oid.bytes(), [0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[cfg(feature = "std")]
    #[test]
    fn generated_ids_are_unique_within_a_process() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
        assert_eq!(a.as_slice()[4..9], b.as_slice()[4..9]);
    }
}
