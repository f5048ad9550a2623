// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::{Actor, Addr, Context, Handler};
use std::marker::PhantomData;
use tracing::{info, warn};
use veil_events::{Event, EventBus, Subscribe, VeilEvent, VeilEventData};

pub trait EventLogging: Event {
    fn log(&self, logger_name: &str);
}

/// Logs every event published on a bus.
pub struct SimpleLogger<E: EventLogging> {
    name: String,
    _p: PhantomData<E>,
}

impl<E: EventLogging> SimpleLogger<E> {
    pub fn attach(name: &str, bus: Addr<EventBus<E>>) -> Addr<Self> {
        let addr = Self {
            name: name.to_owned(),
            _p: PhantomData,
        }
        .start();
        bus.do_send(Subscribe::<E>::new("*", addr.clone().recipient()));
        info!(node=%name, "READY!");
        addr
    }
}

impl<E: EventLogging> Actor for SimpleLogger<E> {
    type Context = Context<Self>;
}

impl<E: EventLogging> Handler<E> for SimpleLogger<E> {
    type Result = ();

    fn handle(&mut self, msg: E, _: &mut Self::Context) -> Self::Result {
        msg.log(&self.name);
    }
}

impl EventLogging for VeilEvent {
    fn log(&self, logger_name: &str) {
        match self.get_data() {
            VeilEventData::PauseChanged(data) if data.paused => {
                warn!(me = logger_name, evt = %self, "Protocol paused")
            }
            _ => match self.batch_id() {
                Some(batch_id) => {
                    info!(me = logger_name, evt = %self, batch_id = %batch_id, "Event Broadcasted")
                }
                None => info!(me = logger_name, evt = %self, "Event Broadcasted"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use std::time::Duration;
    use tracing_test::traced_test;
    use veil_events::{BatchId, BatchOpened, EventBusConfig, PauseChanged};

    #[actix::test]
    #[traced_test]
    async fn logs_every_published_event() {
        let bus = EventBus::<VeilEvent>::new(EventBusConfig::default()).start();
        SimpleLogger::<VeilEvent>::attach("test-node", bus.clone());

        bus.do_send(VeilEvent::new(1, BatchOpened { batch_id: BatchId(3) }));
        bus.do_send(VeilEvent::new(
            2,
            PauseChanged {
                paused: true,
                by: Address::ZERO,
            },
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(logs_contain("BatchOpened(batch:3)"));
        assert!(logs_contain("Protocol paused"));
    }
}
