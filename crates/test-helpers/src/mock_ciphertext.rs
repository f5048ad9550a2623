// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use veil_fhe::{Decryptor, EncryptedInteger};
use veil_utils::ArcBytes;

/// Transparent "ciphertext" whose combine is wrapping addition. Serialized as little endian u64.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockCiphertext(pub u64);

impl EncryptedInteger for MockCiphertext {
    fn identity() -> Self {
        MockCiphertext(0)
    }

    fn combine(&self, rhs: &Self) -> Self {
        MockCiphertext(self.0.wrapping_add(rhs.0))
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_le_bytes().to_vec()
    }
}

/// Reads [`MockCiphertext`] bytes back.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockDecryptor;

impl Decryptor for MockDecryptor {
    fn decrypt_total(&self, ciphertexts: &[ArcBytes]) -> Result<u64> {
        ciphertexts.iter().try_fold(0u64, |acc, ct| {
            let bytes: [u8; 8] = ct[..]
                .try_into()
                .context("Mock ciphertexts are 8 bytes")?;
            Ok(acc.wrapping_add(u64::from_le_bytes(bytes)))
        })
    }
}
