// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    AccessGuard, ActionKind, BatchRegistry, BatchView, CallbackTarget, DecryptionContext,
    DecryptionOracle, DecryptionOracleBridge, EncryptedAggregator, ProtocolError, RateLimiter,
    SubmissionView,
};
use alloy::primitives::Address;
use std::sync::Arc;
use tracing::debug;
use veil_events::{
    BatchClosed, BatchId, BatchOpened, CooldownWindowUpdated, DecryptionCompleted,
    DecryptionRequested, OwnershipTransferred, PauseChanged, ProviderAdded, ProviderRemoved,
    RequestId, SubmissionRecorded, VeilEvent, VeilEventData,
};
use veil_fhe::EncryptedInteger;

/// Explicit initialisation of a protocol instance.
#[derive(Clone, Debug)]
pub struct ProtocolParams {
    /// Initial caller. Becomes owner and provider.
    pub owner: Address,
    /// Identity every commitment and callback is bound to.
    pub instance: Address,
    pub cooldown_secs: u64,
}

/// The protocol state machine.
///
/// Every operation validates first and mutates last so a refused call has no effect. Accepted
/// operations queue a notification that callers collect with [`Self::take_events`].
pub struct ConfidentialAggregator<C: EncryptedInteger> {
    access: AccessGuard,
    limiter: RateLimiter,
    batches: BatchRegistry<C>,
    aggregator: EncryptedAggregator<C>,
    bridge: DecryptionOracleBridge,
    seq: u64,
    outbox: Vec<VeilEvent>,
}

impl<C: EncryptedInteger> ConfidentialAggregator<C> {
    pub fn new(params: ProtocolParams, oracle: Arc<dyn DecryptionOracle>) -> Self {
        Self {
            access: AccessGuard::new(params.owner),
            limiter: RateLimiter::new(params.cooldown_secs),
            batches: BatchRegistry::new(),
            aggregator: EncryptedAggregator::new(),
            bridge: DecryptionOracleBridge::new(oracle, params.instance),
            seq: 0,
            outbox: vec![],
        }
    }

    fn emit(&mut self, data: impl Into<VeilEventData>) {
        self.seq += 1;
        self.outbox.push(VeilEvent::new(self.seq, data));
    }

    /// Drain queued notifications in the order they happened.
    pub fn take_events(&mut self) -> Vec<VeilEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn transfer_ownership(
        &mut self,
        actor: Address,
        new_owner: Address,
    ) -> Result<(), ProtocolError> {
        let previous_owner = self.access.transfer_ownership(&actor, new_owner)?;
        self.emit(OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(())
    }

    pub fn add_provider(&mut self, actor: Address, provider: Address) -> Result<(), ProtocolError> {
        if self.access.add_provider(&actor, provider)? {
            self.emit(ProviderAdded { provider });
        }
        Ok(())
    }

    pub fn remove_provider(
        &mut self,
        actor: Address,
        provider: Address,
    ) -> Result<(), ProtocolError> {
        if self.access.remove_provider(&actor, &provider)? {
            self.emit(ProviderRemoved { provider });
        }
        Ok(())
    }

    pub fn set_paused(&mut self, actor: Address, paused: bool) -> Result<(), ProtocolError> {
        if self.access.set_paused(&actor, paused)? {
            self.emit(PauseChanged { paused, by: actor });
        }
        Ok(())
    }

    pub fn set_cooldown_window(&mut self, actor: Address, seconds: u64) -> Result<(), ProtocolError> {
        self.access.require_owner(&actor)?;
        self.access.require_not_paused()?;
        let previous_secs = self.limiter.set_window(seconds);
        self.emit(CooldownWindowUpdated {
            previous_secs,
            cooldown_secs: seconds,
        });
        Ok(())
    }

    pub fn open_batch(&mut self, actor: Address) -> Result<BatchId, ProtocolError> {
        self.access.require_owner(&actor)?;
        self.access.require_not_paused()?;
        let batch_id = self.batches.open_batch();
        self.emit(BatchOpened { batch_id });
        Ok(batch_id)
    }

    pub fn close_batch(&mut self, actor: Address, batch_id: BatchId) -> Result<(), ProtocolError> {
        self.access.require_owner(&actor)?;
        self.access.require_not_paused()?;
        self.batches.close_batch(batch_id)?;
        let submission_count = self
            .batches
            .get(batch_id)
            .map(|b| b.submission_count())
            .unwrap_or_default();
        self.emit(BatchClosed {
            batch_id,
            submission_count,
        });
        Ok(())
    }

    /// Returns the index the submission was recorded at.
    pub fn submit_encrypted_value(
        &mut self,
        actor: Address,
        batch_id: BatchId,
        value: C,
        now: u64,
    ) -> Result<u64, ProtocolError> {
        self.access.require_provider(&actor)?;
        self.access.require_not_paused()?;
        self.limiter.check(&actor, ActionKind::Submission, now)?;
        let batch = self.batches.open_batch_mut(batch_id)?;
        let index = self
            .aggregator
            .record_submission(batch, actor, value, now)?
            .index;
        self.limiter.record(actor, ActionKind::Submission, now);

        debug!(%batch_id, index, %actor, "submission merged");
        self.emit(SubmissionRecorded {
            batch_id,
            index,
            submitter: actor,
            timestamp: now,
        });
        Ok(index)
    }

    /// Closed batches may still be decrypted. Unknown batches may not.
    pub fn request_decryption(
        &mut self,
        actor: Address,
        batch_id: BatchId,
        now: u64,
    ) -> Result<RequestId, ProtocolError> {
        self.access.require_provider(&actor)?;
        self.access.require_not_paused()?;
        self.limiter
            .check(&actor, ActionKind::DecryptionRequest, now)?;
        let batch = self
            .batches
            .get(batch_id)
            .ok_or(ProtocolError::InvalidBatch(batch_id))?;
        let (request_id, commitment) = self.bridge.request_decryption(batch)?;
        self.limiter
            .record(actor, ActionKind::DecryptionRequest, now);

        self.emit(DecryptionRequested {
            batch_id,
            request_id,
            commitment,
            requested_by: actor,
        });
        Ok(request_id)
    }

    /// A callback refused while paused leaves its context pending, so it can be redelivered once
    /// the protocol resumes.
    pub fn handle_callback(
        &mut self,
        target: CallbackTarget,
        request_id: RequestId,
        cleartext: &[u8],
        proof: &[u8],
    ) -> Result<u64, ProtocolError> {
        self.access.require_not_paused()?;
        self.bridge.require_target(request_id, &target)?;
        let (batch_id, total) =
            self.bridge
                .handle_callback(request_id, cleartext, proof, &self.batches)?;
        self.emit(DecryptionCompleted {
            batch_id,
            request_id,
            total,
        });
        Ok(total)
    }

    /// Where oracles must route callbacks for this instance
    pub fn callback_target(&self) -> CallbackTarget {
        self.bridge.target()
    }

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    pub fn is_provider(&self, actor: &Address) -> bool {
        self.access.is_provider(actor)
    }

    pub fn is_paused(&self) -> bool {
        self.access.is_paused()
    }

    pub fn cooldown_window(&self) -> u64 {
        self.limiter.window()
    }

    pub fn batch(&self, batch_id: BatchId) -> Option<BatchView> {
        self.batches.get(batch_id).map(|b| b.view())
    }

    pub fn batch_count(&self) -> u64 {
        self.batches.count()
    }

    pub fn submissions(&self, batch_id: BatchId) -> Vec<SubmissionView> {
        self.aggregator
            .submissions(batch_id)
            .iter()
            .map(|s| s.view())
            .collect()
    }

    /// Current encrypted total of a batch
    pub fn encrypted_total(&self, batch_id: BatchId) -> Option<&C> {
        self.batches.get(batch_id).map(|b| b.total())
    }

    pub fn decryption_context(&self, request_id: RequestId) -> Option<DecryptionContext> {
        self.bridge.context(request_id).cloned()
    }

    pub fn decrypted_total(&self, batch_id: BatchId) -> Option<u64> {
        self.bridge.decrypted_total(batch_id)
    }

    pub fn next_action_at(&self, actor: &Address, kind: ActionKind) -> Option<u64> {
        self.limiter.next_allowed_at(actor, kind)
    }
}
