// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    ActionKind, BatchView, CallbackTarget, ConfidentialAggregator, DecryptionCallback,
    DecryptionContext, DecryptionOracle, ProtocolError, ProtocolParams, SubmissionView,
};
use actix::prelude::*;
use alloy::primitives::Address;
use std::sync::Arc;
use tracing::warn;
use veil_events::{BatchId, EventBus, RequestId, VeilEvent};
use veil_fhe::EncryptedInteger;
use veil_utils::{ArcBytes, Clock};

//////////////////////////////////////////////////////////////////////////////
// Operations
//////////////////////////////////////////////////////////////////////////////

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), ProtocolError>")]
pub struct TransferOwnership {
    pub actor: Address,
    pub new_owner: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), ProtocolError>")]
pub struct AddProvider {
    pub actor: Address,
    pub provider: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), ProtocolError>")]
pub struct RemoveProvider {
    pub actor: Address,
    pub provider: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), ProtocolError>")]
pub struct SetPaused {
    pub actor: Address,
    pub paused: bool,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), ProtocolError>")]
pub struct SetCooldownWindow {
    pub actor: Address,
    pub seconds: u64,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<BatchId, ProtocolError>")]
pub struct OpenBatch {
    pub actor: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), ProtocolError>")]
pub struct CloseBatch {
    pub actor: Address,
    pub batch_id: BatchId,
}

/// Resolves to the index the value was recorded at.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<u64, ProtocolError>")]
pub struct SubmitEncryptedValue<C: EncryptedInteger> {
    pub actor: Address,
    pub batch_id: BatchId,
    pub value: C,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<RequestId, ProtocolError>")]
pub struct RequestDecryption {
    pub actor: Address,
    pub batch_id: BatchId,
}

/// Resolves to the accepted total.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<u64, ProtocolError>")]
pub struct HandleCallback {
    pub request_id: RequestId,
    pub cleartext: ArcBytes,
    pub proof: ArcBytes,
    pub target: CallbackTarget,
}

impl From<DecryptionCallback> for HandleCallback {
    fn from(value: DecryptionCallback) -> Self {
        Self {
            request_id: value.request_id,
            cleartext: value.cleartext,
            proof: value.proof,
            target: value.target,
        }
    }
}

//////////////////////////////////////////////////////////////////////////////
// Queries
//////////////////////////////////////////////////////////////////////////////

#[derive(Message, Clone, Debug)]
#[rtype(result = "Address")]
pub struct GetOwner;

#[derive(Message, Clone, Debug)]
#[rtype(result = "bool")]
pub struct IsProvider(pub Address);

#[derive(Message, Clone, Debug)]
#[rtype(result = "bool")]
pub struct IsPaused;

#[derive(Message, Clone, Debug)]
#[rtype(result = "u64")]
pub struct GetCooldownWindow;

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<BatchView>")]
pub struct GetBatch(pub BatchId);

#[derive(Message, Clone, Debug)]
#[rtype(result = "u64")]
pub struct GetBatchCount;

#[derive(Message, Clone, Debug)]
#[rtype(result = "Vec<SubmissionView>")]
pub struct GetSubmissions(pub BatchId);

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<DecryptionContext>")]
pub struct GetDecryptionContext(pub RequestId);

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<u64>")]
pub struct GetDecryptedTotal(pub BatchId);

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<u64>")]
pub struct GetNextActionAt {
    pub actor: Address,
    pub kind: ActionKind,
}

//////////////////////////////////////////////////////////////////////////////
// Actor
//////////////////////////////////////////////////////////////////////////////

/// Serializes every protocol operation through its mailbox and publishes the resulting
/// notifications on the bus.
pub struct AggregatorActor<C: EncryptedInteger> {
    engine: ConfidentialAggregator<C>,
    bus: Addr<EventBus<VeilEvent>>,
    clock: Arc<dyn Clock>,
}

impl<C: EncryptedInteger> AggregatorActor<C> {
    pub fn new(
        engine: ConfidentialAggregator<C>,
        bus: &Addr<EventBus<VeilEvent>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            bus: bus.clone(),
            clock,
        }
    }

    pub fn attach(
        params: ProtocolParams,
        oracle: Arc<dyn DecryptionOracle>,
        bus: &Addr<EventBus<VeilEvent>>,
        clock: Arc<dyn Clock>,
    ) -> Addr<Self> {
        Self::new(ConfidentialAggregator::new(params, oracle), bus, clock).start()
    }

    fn publish<T>(&mut self, op: &str, res: Result<T, ProtocolError>) -> Result<T, ProtocolError> {
        if let Err(e) = &res {
            warn!(op, error = %e, "operation rejected");
        }
        for evt in self.engine.take_events() {
            self.bus.do_send(evt);
        }
        res
    }
}

impl<C: EncryptedInteger> Actor for AggregatorActor<C> {
    type Context = Context<Self>;
}

impl<C: EncryptedInteger> Handler<TransferOwnership> for AggregatorActor<C> {
    type Result = Result<(), ProtocolError>;
    fn handle(&mut self, msg: TransferOwnership, _: &mut Self::Context) -> Self::Result {
        let res = self.engine.transfer_ownership(msg.actor, msg.new_owner);
        self.publish("transfer_ownership", res)
    }
}

impl<C: EncryptedInteger> Handler<AddProvider> for AggregatorActor<C> {
    type Result = Result<(), ProtocolError>;
    fn handle(&mut self, msg: AddProvider, _: &mut Self::Context) -> Self::Result {
        let res = self.engine.add_provider(msg.actor, msg.provider);
        self.publish("add_provider", res)
    }
}

impl<C: EncryptedInteger> Handler<RemoveProvider> for AggregatorActor<C> {
    type Result = Result<(), ProtocolError>;
    fn handle(&mut self, msg: RemoveProvider, _: &mut Self::Context) -> Self::Result {
        let res = self.engine.remove_provider(msg.actor, msg.provider);
        self.publish("remove_provider", res)
    }
}

impl<C: EncryptedInteger> Handler<SetPaused> for AggregatorActor<C> {
    type Result = Result<(), ProtocolError>;
    fn handle(&mut self, msg: SetPaused, _: &mut Self::Context) -> Self::Result {
        let res = self.engine.set_paused(msg.actor, msg.paused);
        self.publish("set_paused", res)
    }
}

impl<C: EncryptedInteger> Handler<SetCooldownWindow> for AggregatorActor<C> {
    type Result = Result<(), ProtocolError>;
    fn handle(&mut self, msg: SetCooldownWindow, _: &mut Self::Context) -> Self::Result {
        let res = self.engine.set_cooldown_window(msg.actor, msg.seconds);
        self.publish("set_cooldown_window", res)
    }
}

impl<C: EncryptedInteger> Handler<OpenBatch> for AggregatorActor<C> {
    type Result = Result<BatchId, ProtocolError>;
    fn handle(&mut self, msg: OpenBatch, _: &mut Self::Context) -> Self::Result {
        let res = self.engine.open_batch(msg.actor);
        self.publish("open_batch", res)
    }
}

impl<C: EncryptedInteger> Handler<CloseBatch> for AggregatorActor<C> {
    type Result = Result<(), ProtocolError>;
    fn handle(&mut self, msg: CloseBatch, _: &mut Self::Context) -> Self::Result {
        let res = self.engine.close_batch(msg.actor, msg.batch_id);
        self.publish("close_batch", res)
    }
}

impl<C: EncryptedInteger> Handler<SubmitEncryptedValue<C>> for AggregatorActor<C> {
    type Result = Result<u64, ProtocolError>;
    fn handle(&mut self, msg: SubmitEncryptedValue<C>, _: &mut Self::Context) -> Self::Result {
        let now = self.clock.now();
        let res = self
            .engine
            .submit_encrypted_value(msg.actor, msg.batch_id, msg.value, now);
        self.publish("submit_encrypted_value", res)
    }
}

impl<C: EncryptedInteger> Handler<RequestDecryption> for AggregatorActor<C> {
    type Result = Result<RequestId, ProtocolError>;
    fn handle(&mut self, msg: RequestDecryption, _: &mut Self::Context) -> Self::Result {
        let now = self.clock.now();
        let res = self
            .engine
            .request_decryption(msg.actor, msg.batch_id, now);
        self.publish("request_decryption", res)
    }
}

impl<C: EncryptedInteger> Handler<HandleCallback> for AggregatorActor<C> {
    type Result = Result<u64, ProtocolError>;
    fn handle(&mut self, msg: HandleCallback, _: &mut Self::Context) -> Self::Result {
        let res = self.engine.handle_callback(
            msg.target,
            msg.request_id,
            &msg.cleartext,
            &msg.proof,
        );
        self.publish("handle_callback", res)
    }
}

impl<C: EncryptedInteger> Handler<GetOwner> for AggregatorActor<C> {
    type Result = MessageResult<GetOwner>;
    fn handle(&mut self, _: GetOwner, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.engine.owner())
    }
}

impl<C: EncryptedInteger> Handler<IsProvider> for AggregatorActor<C> {
    type Result = bool;
    fn handle(&mut self, msg: IsProvider, _: &mut Self::Context) -> Self::Result {
        self.engine.is_provider(&msg.0)
    }
}

impl<C: EncryptedInteger> Handler<IsPaused> for AggregatorActor<C> {
    type Result = bool;
    fn handle(&mut self, _: IsPaused, _: &mut Self::Context) -> Self::Result {
        self.engine.is_paused()
    }
}

impl<C: EncryptedInteger> Handler<GetCooldownWindow> for AggregatorActor<C> {
    type Result = u64;
    fn handle(&mut self, _: GetCooldownWindow, _: &mut Self::Context) -> Self::Result {
        self.engine.cooldown_window()
    }
}

impl<C: EncryptedInteger> Handler<GetBatch> for AggregatorActor<C> {
    type Result = Option<BatchView>;
    fn handle(&mut self, msg: GetBatch, _: &mut Self::Context) -> Self::Result {
        self.engine.batch(msg.0)
    }
}

impl<C: EncryptedInteger> Handler<GetBatchCount> for AggregatorActor<C> {
    type Result = u64;
    fn handle(&mut self, _: GetBatchCount, _: &mut Self::Context) -> Self::Result {
        self.engine.batch_count()
    }
}

impl<C: EncryptedInteger> Handler<GetSubmissions> for AggregatorActor<C> {
    type Result = Vec<SubmissionView>;
    fn handle(&mut self, msg: GetSubmissions, _: &mut Self::Context) -> Self::Result {
        self.engine.submissions(msg.0)
    }
}

impl<C: EncryptedInteger> Handler<GetDecryptionContext> for AggregatorActor<C> {
    type Result = Option<DecryptionContext>;
    fn handle(&mut self, msg: GetDecryptionContext, _: &mut Self::Context) -> Self::Result {
        self.engine.decryption_context(msg.0)
    }
}

impl<C: EncryptedInteger> Handler<GetDecryptedTotal> for AggregatorActor<C> {
    type Result = Option<u64>;
    fn handle(&mut self, msg: GetDecryptedTotal, _: &mut Self::Context) -> Self::Result {
        self.engine.decrypted_total(msg.0)
    }
}

impl<C: EncryptedInteger> Handler<GetNextActionAt> for AggregatorActor<C> {
    type Result = Option<u64>;
    fn handle(&mut self, msg: GetNextActionAt, _: &mut Self::Context) -> Self::Result {
        self.engine.next_action_at(&msg.actor, msg.kind)
    }
}
