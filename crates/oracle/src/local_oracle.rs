// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{sign_result, verify_signature};
use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use anyhow::{anyhow, Context, Result};
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};
use tracing::{info, trace};
use veil_aggregator::{encode_cleartext, CallbackTarget, DecryptionCallback, DecryptionOracle};
use veil_config::OracleConfig;
use veil_events::RequestId;
use veil_fhe::Decryptor;
use veil_utils::ArcBytes;

struct Job {
    ciphertexts: Vec<ArcBytes>,
    target: CallbackTarget,
}

struct OracleState {
    last_id: u64,
    jobs: BTreeMap<RequestId, Job>,
}

/// In process oracle that holds the decryption key and signs every result it releases.
///
/// Requests are queued by [`DecryptionOracle::submit_decryption_request`] and only decrypted when
/// [`LocalOracle::fulfil`] is called, which keeps the request and callback halves independent.
pub struct LocalOracle<D: Decryptor> {
    decryptor: D,
    signer: PrivateKeySigner,
    state: Mutex<OracleState>,
}

impl<D: Decryptor> LocalOracle<D> {
    pub fn new(decryptor: D, signer: PrivateKeySigner) -> Self {
        Self {
            decryptor,
            signer,
            state: Mutex::new(OracleState {
                last_id: 0,
                jobs: BTreeMap::new(),
            }),
        }
    }

    /// Uses the configured key or a fresh random one when none is set.
    pub fn from_config(decryptor: D, config: &OracleConfig) -> Result<Self> {
        let signer = match &config.private_key {
            Some(key) => key
                .parse::<PrivateKeySigner>()
                .map_err(|e| anyhow!("Invalid oracle private key: {e}"))?,
            None => PrivateKeySigner::random(),
        };
        Ok(Self::new(decryptor, signer))
    }

    /// Address proofs are checked against
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    fn state(&self) -> Result<MutexGuard<'_, OracleState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("Oracle state lock poisoned"))
    }

    /// Requests waiting for [`Self::fulfil`], oldest first
    pub fn pending(&self) -> Result<Vec<RequestId>> {
        Ok(self.state()?.jobs.keys().copied().collect())
    }

    /// Decrypt a pending request and produce its signed callback. The job stays queued until
    /// decryption and signing both succeed.
    pub fn fulfil(&self, request_id: RequestId) -> Result<DecryptionCallback> {
        let (ciphertexts, target) = {
            let state = self.state()?;
            let job = state
                .jobs
                .get(&request_id)
                .with_context(|| format!("No pending decryption for {request_id}"))?;
            (job.ciphertexts.clone(), job.target)
        };

        let total = self
            .decryptor
            .decrypt_total(&ciphertexts)
            .with_context(|| format!("Failed to decrypt {request_id}"))?;
        let cleartext = encode_cleartext(total);
        let proof = sign_result(&self.signer, request_id, &cleartext)?;

        self.state()?.jobs.remove(&request_id);
        info!(%request_id, instance = %target.instance, "decryption fulfilled");
        Ok(DecryptionCallback {
            request_id,
            cleartext: ArcBytes::from_bytes(&cleartext),
            proof,
            target,
        })
    }
}

impl<D: Decryptor> DecryptionOracle for LocalOracle<D> {
    fn submit_decryption_request(
        &self,
        ciphertexts: Vec<ArcBytes>,
        target: CallbackTarget,
    ) -> Result<RequestId> {
        let mut state = self.state()?;
        state.last_id += 1;
        let request_id = RequestId(state.last_id);
        trace!(%request_id, count = ciphertexts.len(), "decryption queued");
        state.jobs.insert(
            request_id,
            Job {
                ciphertexts,
                target,
            },
        );
        Ok(request_id)
    }

    fn verify_proof(&self, request_id: RequestId, cleartext: &[u8], proof: &[u8]) -> bool {
        verify_signature(&self.address(), request_id, cleartext, proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use veil_aggregator::decode_cleartext;
    use veil_fhe::{build_bfv_params_arc, BfvKeyPair, EncryptedInteger};

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    /// Treats each ciphertext as a little endian u64
    struct LeDecryptor;

    impl Decryptor for LeDecryptor {
        fn decrypt_total(&self, ciphertexts: &[ArcBytes]) -> Result<u64> {
            ciphertexts.iter().try_fold(0u64, |acc, ct| {
                let bytes: [u8; 8] = ct[..].try_into()?;
                Ok(acc + u64::from_le_bytes(bytes))
            })
        }
    }

    /// Fails until switched on
    #[derive(Default)]
    struct FlakyDecryptor {
        ready: std::sync::atomic::AtomicBool,
    }

    impl Decryptor for FlakyDecryptor {
        fn decrypt_total(&self, ciphertexts: &[ArcBytes]) -> Result<u64> {
            if !self.ready.load(std::sync::atomic::Ordering::SeqCst) {
                anyhow::bail!("decryption key unavailable");
            }
            LeDecryptor.decrypt_total(ciphertexts)
        }
    }

    fn target() -> CallbackTarget {
        CallbackTarget {
            instance: Address::repeat_byte(0xee),
        }
    }

    #[test]
    fn ids_are_sequential_from_one() -> Result<()> {
        let oracle = LocalOracle::new(LeDecryptor, KEY.parse()?);
        let a = oracle.submit_decryption_request(vec![], target())?;
        let b = oracle.submit_decryption_request(vec![], target())?;
        assert_eq!((a, b), (RequestId(1), RequestId(2)));
        assert_eq!(oracle.pending()?, vec![a, b]);
        Ok(())
    }

    #[test]
    fn fulfil_signs_the_cleartext() -> Result<()> {
        let oracle = LocalOracle::new(LeDecryptor, KEY.parse()?);
        let ct = ArcBytes::from_bytes(&42u64.to_le_bytes());
        let id = oracle.submit_decryption_request(vec![ct], target())?;

        let callback = oracle.fulfil(id)?;
        assert_eq!(callback.request_id, id);
        assert_eq!(callback.target, target());
        assert_eq!(decode_cleartext(&callback.cleartext), Some(42));
        assert!(oracle.verify_proof(id, &callback.cleartext, &callback.proof));
        assert!(!oracle.verify_proof(id, &encode_cleartext(43), &callback.proof));

        // fulfilled jobs are gone
        assert!(oracle.pending()?.is_empty());
        assert!(oracle.fulfil(id).is_err());
        Ok(())
    }

    #[test]
    fn failed_decryption_keeps_the_job() -> Result<()> {
        let oracle = LocalOracle::new(FlakyDecryptor::default(), KEY.parse()?);
        let ct = ArcBytes::from_bytes(&5u64.to_le_bytes());
        let id = oracle.submit_decryption_request(vec![ct], target())?;

        assert!(oracle.fulfil(id).is_err());
        assert_eq!(oracle.pending()?, vec![id]);

        oracle
            .decryptor
            .ready
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let callback = oracle.fulfil(id)?;
        assert_eq!(decode_cleartext(&callback.cleartext), Some(5));
        assert!(oracle.pending()?.is_empty());
        Ok(())
    }

    #[test]
    fn other_keys_cannot_forge_results() -> Result<()> {
        let oracle = LocalOracle::new(LeDecryptor, KEY.parse()?);
        let id = oracle.submit_decryption_request(vec![], target())?;
        let cleartext = encode_cleartext(1);
        let forged = sign_result(&PrivateKeySigner::random(), id, &cleartext)?;
        assert!(!oracle.verify_proof(id, &cleartext, &forged));
        Ok(())
    }

    #[test]
    fn config_key_sets_the_address() -> Result<()> {
        let configured = LocalOracle::from_config(
            LeDecryptor,
            &OracleConfig {
                private_key: Some(KEY.to_string()),
            },
        )?;
        let expected: PrivateKeySigner = KEY.parse()?;
        assert_eq!(configured.address(), expected.address());

        let random = LocalOracle::from_config(LeDecryptor, &OracleConfig::default())?;
        assert_ne!(random.address(), expected.address());

        assert!(LocalOracle::from_config(
            LeDecryptor,
            &OracleConfig {
                private_key: Some("0x1234".to_string()),
            },
        )
        .is_err());
        Ok(())
    }

    #[test]
    fn decrypts_bfv_aggregates() -> Result<()> {
        let params = build_bfv_params_arc(2048, 1032193, &[0x3FFFFFFF000001])?;
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let keys = std::sync::Arc::new(BfvKeyPair::generate(params, &mut rng));
        let total = keys
            .encrypt_u64(10, &mut rng)?
            .combine(&keys.encrypt_u64(15, &mut rng)?);

        let oracle = LocalOracle::new(keys.clone(), KEY.parse()?);
        let id = oracle.submit_decryption_request(
            vec![ArcBytes::from(total.to_bytes())],
            target(),
        )?;
        let callback = oracle.fulfil(id)?;
        assert_eq!(decode_cleartext(&callback.cleartext), Some(25));
        Ok(())
    }
}
