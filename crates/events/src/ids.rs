// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::B256;
use core::fmt;
use serde::{Deserialize, Serialize};
use veil_utils::hexf;

/// Batch identifier. Ids are allocated from 1; 0 never names a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BatchId(pub u64);

impl BatchId {
    pub const NONE: BatchId = BatchId(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    pub fn next(&self) -> BatchId {
        BatchId(self.0 + 1)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch:{}", self.0)
    }
}

impl From<u64> for BatchId {
    fn from(value: u64) -> Self {
        BatchId(value)
    }
}

/// Oracle assigned decryption request identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Big endian 32 byte word used when the id is hashed into proofs.
    pub fn to_be_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&self.0.to_be_bytes());
        word
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        RequestId(value)
    }
}

/// A 32 byte hash binding a decryption request to the ciphertext state it was made against.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment(pub B256);

impl Commitment {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hexf(self.as_bytes(), f)
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hexf(self.as_bytes(), f)
    }
}

impl From<[u8; 32]> for Commitment {
    fn from(value: [u8; 32]) -> Self {
        Commitment(B256::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_word_is_big_endian() {
        let word = RequestId(0x0102).to_be_word();
        assert_eq!(&word[..30], &[0u8; 30]);
        assert_eq!(&word[30..], &[0x01, 0x02]);
    }

    #[test]
    fn batch_zero_is_the_sentinel() {
        assert!(BatchId::NONE.is_none());
        assert_eq!(BatchId::NONE.next(), BatchId(1));
        assert!(!BatchId(1).is_none());
    }
}
