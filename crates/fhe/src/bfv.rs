// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Decryptor, EncryptedInteger};
use anyhow::{bail, Context, Result};
use fhe::bfv::{
    BfvParameters, BfvParametersBuilder, Ciphertext, Encoding, Plaintext, PublicKey, SecretKey,
};
use fhe_traits::{DeserializeParametrized, FheDecoder, FheDecrypter, FheEncoder, FheEncrypter};
use rand::{CryptoRng, RngCore};
use std::{fmt, sync::Arc};
use tracing::trace;
use veil_utils::{formatters::truncate_hex, ArcBytes};

pub fn build_bfv_params_arc(
    degree: usize,
    plaintext_modulus: u64,
    moduli: &[u64],
) -> Result<Arc<BfvParameters>> {
    BfvParametersBuilder::new()
        .set_degree(degree)
        .set_plaintext_modulus(plaintext_modulus)
        .set_moduli(moduli)
        .build_arc()
        .context("Failed to build BFV parameters")
}

/// BFV ciphertext holding a single value in coefficient zero.
///
/// The zero element is kept symbolic so that an empty aggregate never has to be materialised
/// under any particular key.
#[derive(Clone)]
pub enum BfvCiphertext {
    Identity,
    Value(Arc<Ciphertext>),
}

impl BfvCiphertext {
    /// Decode a ciphertext produced under `params`. Empty input is the identity.
    pub fn from_bytes(bytes: &[u8], params: &Arc<BfvParameters>) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Self::Identity);
        }
        let ct = Ciphertext::from_bytes(bytes, params).context("Error deserializing ciphertext")?;
        Ok(Self::Value(Arc::new(ct)))
    }
}

impl EncryptedInteger for BfvCiphertext {
    fn identity() -> Self {
        Self::Identity
    }

    fn combine(&self, rhs: &Self) -> Self {
        match (self, rhs) {
            (Self::Identity, other) | (other, Self::Identity) => other.clone(),
            (Self::Value(lhs), Self::Value(rhs)) => {
                let mut sum = lhs.as_ref().clone();
                sum += rhs.as_ref();
                Self::Value(Arc::new(sum))
            }
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Identity => vec![],
            Self::Value(ct) => fhe_traits::Serialize::to_bytes(ct.as_ref()),
        }
    }
}

impl fmt::Debug for BfvCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => write!(f, "BfvCiphertext(identity)"),
            Self::Value(_) => write!(f, "BfvCiphertext({})", truncate_hex(&self.to_bytes())),
        }
    }
}

/// Key material for a single-party BFV deployment. The secret half never leaves this struct.
pub struct BfvKeyPair {
    params: Arc<BfvParameters>,
    sk: SecretKey,
    pk: PublicKey,
}

impl BfvKeyPair {
    pub fn generate<R: RngCore + CryptoRng>(params: Arc<BfvParameters>, rng: &mut R) -> Self {
        let sk = SecretKey::random(&params, rng);
        let pk = PublicKey::new(&sk, rng);
        Self { params, sk, pk }
    }

    pub fn params(&self) -> &Arc<BfvParameters> {
        &self.params
    }

    pub fn encrypt_u64<R: RngCore + CryptoRng>(
        &self,
        value: u64,
        rng: &mut R,
    ) -> Result<BfvCiphertext> {
        let t = self.params.plaintext();
        if value >= t {
            bail!("Value {value} does not fit the plaintext modulus {t}");
        }
        let pt = Plaintext::try_encode(&[value], Encoding::poly(), &self.params)?;
        let ct = self.pk.try_encrypt(&pt, rng)?;
        Ok(BfvCiphertext::Value(Arc::new(ct)))
    }

    fn decrypt_one(&self, bytes: &[u8]) -> Result<u64> {
        let BfvCiphertext::Value(ct) = BfvCiphertext::from_bytes(bytes, &self.params)? else {
            return Ok(0);
        };
        let pt = self.sk.try_decrypt(&ct)?;
        let decoded = Vec::<u64>::try_decode(&pt, Encoding::poly())?;
        decoded
            .first()
            .copied()
            .context("Decrypted plaintext has no coefficients")
    }
}

impl Decryptor for BfvKeyPair {
    fn decrypt_total(&self, ciphertexts: &[ArcBytes]) -> Result<u64> {
        let t = self.params.plaintext();
        let mut total = 0u64;
        for bytes in ciphertexts {
            let value = self.decrypt_one(bytes)?;
            total = ((total as u128 + value as u128) % t as u128) as u64;
        }
        trace!("Decrypted {} ciphertext(s)", ciphertexts.len());
        Ok(total)
    }
}
