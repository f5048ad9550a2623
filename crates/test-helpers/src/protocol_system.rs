// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::{Actor, Addr};
use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use anyhow::Result;
use std::sync::Arc;
use veil_aggregator::{AggregatorActor, HandleCallback, ProtocolError, ProtocolParams};
use veil_events::{Event, EventBus, EventBusConfig, GetHistory, RequestId, VeilEvent};
use veil_fhe::{Decryptor, EncryptedInteger};
use veil_oracle::LocalOracle;
use veil_utils::ManualClock;

pub const TEST_ORACLE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Everything needed to drive a protocol instance from a test: bus with history, a manual
/// clock, the local oracle and the aggregator actor.
pub struct ProtocolSystem<C: EncryptedInteger, D: Decryptor> {
    pub bus: Addr<EventBus<VeilEvent>>,
    pub clock: ManualClock,
    pub oracle: Arc<LocalOracle<D>>,
    pub aggregator: Addr<AggregatorActor<C>>,
    pub owner: Address,
    pub instance: Address,
}

impl<C: EncryptedInteger, D: Decryptor> ProtocolSystem<C, D> {
    /// Must be called from within an actix system.
    pub fn start(owner: Address, cooldown_secs: u64, decryptor: D) -> Result<Self> {
        let bus = EventBus::<VeilEvent>::new(EventBusConfig {
            capture_history: true,
            deduplicate: true,
        })
        .start();
        let clock = ManualClock::new(1_000);
        let signer: PrivateKeySigner = TEST_ORACLE_KEY.parse()?;
        let oracle = Arc::new(LocalOracle::new(decryptor, signer));
        let instance = Address::repeat_byte(0xee);
        let aggregator = AggregatorActor::<C>::attach(
            ProtocolParams {
                owner,
                instance,
                cooldown_secs,
            },
            oracle.clone(),
            &bus,
            Arc::new(clock.clone()),
        );
        Ok(Self {
            bus,
            clock,
            oracle,
            aggregator,
            owner,
            instance,
        })
    }

    /// Have the oracle decrypt a pending request and deliver its callback.
    pub async fn fulfil(&self, request_id: RequestId) -> Result<Result<u64, ProtocolError>> {
        let callback = self.oracle.fulfil(request_id)?;
        Ok(self.aggregator.send(HandleCallback::from(callback)).await?)
    }

    pub async fn history(&self) -> Result<Vec<VeilEvent>> {
        Ok(self.bus.send(GetHistory::<VeilEvent>::new()).await?)
    }

    pub async fn event_types(&self) -> Result<Vec<String>> {
        Ok(self
            .history()
            .await?
            .iter()
            .map(|e| e.event_type())
            .collect())
    }
}
