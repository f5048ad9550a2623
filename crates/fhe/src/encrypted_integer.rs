// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use std::sync::Arc;
use veil_utils::ArcBytes;

/// An opaque encrypted integer supporting homomorphic addition.
///
/// `combine` must be commutative and associative with `identity()` as its neutral element so
/// that an aggregate does not depend on the order values were merged in. Nothing in this trait
/// can reveal the underlying plaintext.
pub trait EncryptedInteger: Clone + Send + Sync + Unpin + 'static {
    /// The encryption of zero
    fn identity() -> Self;

    /// Homomorphic addition
    fn combine(&self, rhs: &Self) -> Self;

    /// Stable serialization used for hashing and for shipping to a decryptor
    fn to_bytes(&self) -> Vec<u8>;
}

/// Turns serialized aggregates back into a cleartext total. Only oracles hold one of these.
pub trait Decryptor: Send + Sync + 'static {
    fn decrypt_total(&self, ciphertexts: &[ArcBytes]) -> Result<u64>;
}

impl<D: Decryptor> Decryptor for Arc<D> {
    fn decrypt_total(&self, ciphertexts: &[ArcBytes]) -> Result<u64> {
        self.as_ref().decrypt_total(ciphertexts)
    }
}
