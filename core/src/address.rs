use data_encoding::BASE32_NOPAD;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512_256};
use std::{fmt, str::FromStr};

const CHECKSUM_LEN: usize = 4;
const ENCODED_LEN: usize = 58;

/// A ledger account: 32 public-key bytes, shown as base32 with a 4-byte checksum.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 32]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address must be 58 characters, got {0}")]
    Length(usize),
    #[error("address is not valid base32")]
    Encoding,
    #[error("address checksum does not match")]
    Checksum,
}

impl Address {
    pub const fn new(public_key: [u8; 32]) -> Self {
        Self(public_key)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        let digest = Sha512_256::digest(self.0);
        let mut checksum = [0u8; CHECKSUM_LEN];
        checksum.copy_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
        checksum
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ENCODED_LEN {
            return Err(AddressError::Length(s.len()));
        }
        let decoded = BASE32_NOPAD
            .decode(s.as_bytes())
            .map_err(|_| AddressError::Encoding)?;
        if decoded.len() != 32 + CHECKSUM_LEN {
            return Err(AddressError::Encoding);
        }

        let mut public_key = [0u8; 32];
        public_key.copy_from_slice(&decoded[..32]);
        let address = Address(public_key);
        if address.checksum()[..] != decoded[32..] {
            return Err(AddressError::Checksum);
        }
        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = Vec::with_capacity(32 + CHECKSUM_LEN);
        raw.extend_from_slice(&self.0);
        raw.extend_from_slice(&self.checksum());
        f.write_str(&BASE32_NOPAD.encode(&raw))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
