//! Digest primitives for CRC32, MD5 and SHA-1
//!
//! Every algorithm can be fed from a byte slice or from any [`Read`]
//! consumed in fixed-size chunks; both paths yield the same bytes.

use crate::config::HashAlgorithm;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Read};

/// Output of a hash algorithm or pipeline, as raw bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashResult {
    #[serde(with = "hex::serde")]
    bytes: Vec<u8>,
}

impl HashResult {
    /// Wrap raw hash bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Raw hash bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume into raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of bytes in the hash
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-length hash
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lowercase hex, two digits per byte
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl std::fmt::Display for HashResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for HashResult {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Running digest state for one algorithm
pub enum DigestState {
    /// CRC-32 (IEEE)
    Crc32(crc32fast::Hasher),
    /// MD5
    Md5(md5::Md5),
    /// SHA-1
    Sha1(sha1::Sha1),
}

impl DigestState {
    /// Create fresh state for the given algorithm
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Crc32 => Self::Crc32(crc32fast::Hasher::new()),
            HashAlgorithm::Md5 => {
                use md5::Digest;
                Self::Md5(md5::Md5::new())
            }
            HashAlgorithm::Sha1 => {
                use sha1::Digest;
                Self::Sha1(sha1::Sha1::new())
            }
        }
    }

    /// Feed more data
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Crc32(h) => h.update(data),
            Self::Md5(h) => {
                use md5::Digest;
                h.update(data);
            }
            Self::Sha1(h) => {
                use sha1::Digest;
                h.update(data);
            }
        }
    }

    /// Finish and return the hash bytes
    ///
    /// CRC32 is emitted most significant byte first on every platform.
    pub fn finalize(self) -> HashResult {
        let bytes = match self {
            Self::Crc32(h) => h.finalize().to_be_bytes().to_vec(),
            Self::Md5(h) => {
                use md5::Digest;
                h.finalize().to_vec()
            }
            Self::Sha1(h) => {
                use sha1::Digest;
                h.finalize().to_vec()
            }
        };
        HashResult::new(bytes)
    }
}

/// Hash an in-memory buffer
pub fn compute_bytes(algorithm: HashAlgorithm, data: &[u8]) -> HashResult {
    let mut digest = DigestState::new(algorithm);
    digest.update(data);
    digest.finalize()
}

/// Hash a stream until EOF, reading `buffer_size` bytes at a time
pub fn compute_reader(
    algorithm: HashAlgorithm,
    reader: &mut dyn Read,
    buffer_size: usize,
) -> Result<HashResult> {
    let mut digest = DigestState::new(algorithm);
    let mut buffer = vec![0u8; buffer_size.max(1)];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        digest.update(&buffer[..bytes_read]);
    }

    Ok(digest.finalize())
}
