// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Batch, BatchRegistry, ProtocolError};
use alloy::primitives::{keccak256, Address};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info};
use veil_events::{BatchId, Commitment, RequestId};
use veil_fhe::EncryptedInteger;
use veil_utils::ArcBytes;

/// Routing handle handed to the oracle so its callback finds its way back to this instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallbackTarget {
    pub instance: Address,
}

/// External decryption service.
///
/// The oracle guarantees request ids are unique and never reused. `verify_proof` must only
/// accept proofs that the oracle itself produced for exactly this id and cleartext.
pub trait DecryptionOracle: Send + Sync + 'static {
    fn submit_decryption_request(
        &self,
        ciphertexts: Vec<ArcBytes>,
        target: CallbackTarget,
    ) -> anyhow::Result<RequestId>;

    fn verify_proof(&self, request_id: RequestId, cleartext: &[u8], proof: &[u8]) -> bool;
}

/// What an oracle delivers once it has decrypted a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionCallback {
    pub request_id: RequestId,
    pub cleartext: ArcBytes,
    pub proof: ArcBytes,
    pub target: CallbackTarget,
}

/// Pending or processed decryption request. Never deleted and never reverts to pending.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionContext {
    pub batch_id: BatchId,
    pub commitment: Commitment,
    pub processed: bool,
}

/// keccak256(instance ‖ batch_id ‖ count ‖ (len ‖ bytes)*) with all integers big endian u64
pub fn compute_commitment(
    instance: &Address,
    batch_id: BatchId,
    submission_count: u64,
    ciphertexts: &[ArcBytes],
) -> Commitment {
    let mut preimage = Vec::with_capacity(
        36 + ciphertexts.iter().map(|c| c.len() + 8).sum::<usize>(),
    );
    preimage.extend_from_slice(instance.as_slice());
    preimage.extend_from_slice(&batch_id.0.to_be_bytes());
    preimage.extend_from_slice(&submission_count.to_be_bytes());
    for ct in ciphertexts {
        preimage.extend_from_slice(&(ct.len() as u64).to_be_bytes());
        preimage.extend_from_slice(ct);
    }
    Commitment(keccak256(&preimage))
}

/// Encode a total as a 32 byte big endian word.
pub fn encode_cleartext(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Inverse of [`encode_cleartext`]. Rejects anything that is not exactly one word holding a u64.
pub fn decode_cleartext(payload: &[u8]) -> Option<u64> {
    let word: &[u8; 32] = payload.try_into().ok()?;
    if word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut value = [0u8; 8];
    value.copy_from_slice(&word[24..]);
    Some(u64::from_be_bytes(value))
}

fn snapshot<C: EncryptedInteger>(batch: &Batch<C>) -> Vec<ArcBytes> {
    vec![ArcBytes::from(batch.total().to_bytes())]
}

/// Binds decryption requests to the exact ciphertext state they were made against and checks
/// callbacks before releasing a cleartext.
pub struct DecryptionOracleBridge {
    oracle: Arc<dyn DecryptionOracle>,
    target: CallbackTarget,
    contexts: HashMap<RequestId, DecryptionContext>,
    results: HashMap<BatchId, u64>,
}

impl DecryptionOracleBridge {
    pub fn new(oracle: Arc<dyn DecryptionOracle>, instance: Address) -> Self {
        Self {
            oracle,
            target: CallbackTarget { instance },
            contexts: HashMap::new(),
            results: HashMap::new(),
        }
    }

    pub fn target(&self) -> CallbackTarget {
        self.target
    }

    /// Callbacks routed to a different instance are never matched against local contexts.
    pub fn require_target(
        &self,
        request_id: RequestId,
        target: &CallbackTarget,
    ) -> Result<(), ProtocolError> {
        if *target != self.target {
            return Err(ProtocolError::MisroutedCallback(request_id));
        }
        Ok(())
    }

    pub fn commitment_for<C: EncryptedInteger>(&self, batch: &Batch<C>) -> Commitment {
        compute_commitment(
            &self.target.instance,
            batch.id(),
            batch.submission_count(),
            &snapshot(batch),
        )
    }

    /// Snapshot the batch total and hand it to the oracle. The new context is pending.
    pub fn request_decryption<C: EncryptedInteger>(
        &mut self,
        batch: &Batch<C>,
    ) -> Result<(RequestId, Commitment), ProtocolError> {
        let ciphertexts = snapshot(batch);
        let commitment = compute_commitment(
            &self.target.instance,
            batch.id(),
            batch.submission_count(),
            &ciphertexts,
        );
        let request_id = self
            .oracle
            .submit_decryption_request(ciphertexts, self.target)
            .map_err(|e| ProtocolError::Oracle(e.to_string()))?;

        if self.contexts.contains_key(&request_id) {
            return Err(ProtocolError::Oracle(format!(
                "oracle reissued {request_id}"
            )));
        }

        debug!(batch_id = %batch.id(), %request_id, ?commitment, "decryption context stored");
        self.contexts.insert(
            request_id,
            DecryptionContext {
                batch_id: batch.id(),
                commitment,
                processed: false,
            },
        );
        Ok((request_id, commitment))
    }

    /// Replay, then commitment, then proof, then payload. Only a callback passing all four marks
    /// the context processed and publishes the total.
    pub fn handle_callback<C: EncryptedInteger>(
        &mut self,
        request_id: RequestId,
        cleartext: &[u8],
        proof: &[u8],
        batches: &BatchRegistry<C>,
    ) -> Result<(BatchId, u64), ProtocolError> {
        let Some(ctx) = self.contexts.get(&request_id).filter(|ctx| !ctx.processed) else {
            return Err(ProtocolError::ReplayAttempt(request_id));
        };
        let batch_id = ctx.batch_id;
        let stored = ctx.commitment;

        let current = batches
            .get(batch_id)
            .map(|batch| self.commitment_for(batch))
            .ok_or(ProtocolError::StateMismatch(request_id))?;
        if current != stored {
            return Err(ProtocolError::StateMismatch(request_id));
        }

        if !self.oracle.verify_proof(request_id, cleartext, proof) {
            return Err(ProtocolError::InvalidProof(request_id));
        }

        let total =
            decode_cleartext(cleartext).ok_or(ProtocolError::InvalidCleartext(request_id))?;

        if let Some(ctx) = self.contexts.get_mut(&request_id) {
            ctx.processed = true;
        }
        self.results.insert(batch_id, total);
        info!(%batch_id, %request_id, total, "decryption accepted");
        Ok((batch_id, total))
    }

    pub fn context(&self, request_id: RequestId) -> Option<&DecryptionContext> {
        self.contexts.get(&request_id)
    }

    /// Last published total for the batch
    pub fn decrypted_total(&self, batch_id: BatchId) -> Option<u64> {
        self.results.get(&batch_id).copied()
    }
}
