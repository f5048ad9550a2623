// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::marker::PhantomData;

//////////////////////////////////////////////////////////////////////////////
// Core Traits
//////////////////////////////////////////////////////////////////////////////

/// Trait that must be implemented by events used with EventBus
pub trait Event: Message<Result = ()> + Clone + Display + Send + Sync + Unpin + 'static {
    type Id: Hash + Eq + Clone + Unpin;
    fn event_type(&self) -> String;
    fn event_id(&self) -> Self::Id;
}

//////////////////////////////////////////////////////////////////////////////
// Configuration
//////////////////////////////////////////////////////////////////////////////

/// Configuration for EventBus behavior
pub struct EventBusConfig {
    pub capture_history: bool,
    pub deduplicate: bool,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            capture_history: true,
            deduplicate: true,
        }
    }
}

//////////////////////////////////////////////////////////////////////////////
// EventBus Implementation
//////////////////////////////////////////////////////////////////////////////

/// Fans protocol notifications out to external observers. Listeners subscribe either to a
/// single event type or to every event with the `"*"` key.
pub struct EventBus<E: Event> {
    config: EventBusConfig,
    history: Vec<E>,
    ids: HashSet<E::Id>,
    listeners: HashMap<String, Vec<Recipient<E>>>,
}

impl<E: Event> Actor for EventBus<E> {
    type Context = Context<Self>;
}

impl<E: Event> EventBus<E> {
    pub fn new(config: EventBusConfig) -> Self {
        EventBus {
            config,
            listeners: HashMap::new(),
            ids: HashSet::new(),
            history: vec![],
        }
    }

    fn add_to_history(&mut self, event: E) {
        if self.config.deduplicate {
            self.ids.insert(event.event_id());
        }
        if self.config.capture_history {
            self.history.push(event);
        }
    }

    fn is_duplicate(&self, event: &E) -> bool {
        self.config.deduplicate && self.ids.contains(&event.event_id())
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

//////////////////////////////////////////////////////////////////////////////
// Subscribe Message
//////////////////////////////////////////////////////////////////////////////

#[derive(Message)]
#[rtype(result = "()")]
pub struct Subscribe<E: Event> {
    pub event_type: String,
    pub listener: Recipient<E>,
}

impl<E: Event> Subscribe<E> {
    pub fn new(event_type: impl Into<String>, listener: Recipient<E>) -> Self {
        Self {
            event_type: event_type.into(),
            listener,
        }
    }
}

impl<E: Event> Handler<Subscribe<E>> for EventBus<E> {
    type Result = ();

    fn handle(&mut self, msg: Subscribe<E>, _: &mut Context<Self>) {
        self.listeners
            .entry(msg.event_type)
            .or_default()
            .push(msg.listener);
    }
}

//////////////////////////////////////////////////////////////////////////////
// History Management
//////////////////////////////////////////////////////////////////////////////

#[derive(Message)]
#[rtype(result = "Vec<E>")]
pub struct GetHistory<E: Event>(PhantomData<E>);

impl<E: Event> GetHistory<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: Event> Handler<GetHistory<E>> for EventBus<E> {
    type Result = Vec<E>;

    fn handle(&mut self, _: GetHistory<E>, _: &mut Context<Self>) -> Vec<E> {
        self.history.clone()
    }
}

//////////////////////////////////////////////////////////////////////////////
// Event Handling
//////////////////////////////////////////////////////////////////////////////

impl<E: Event> Handler<E> for EventBus<E> {
    type Result = ();

    fn handle(&mut self, event: E, _: &mut Context<Self>) {
        if self.is_duplicate(&event) {
            return;
        }

        if let Some(listeners) = self.listeners.get("*") {
            for listener in listeners {
                listener.do_send(event.clone())
            }
        }

        if let Some(listeners) = self.listeners.get(&event.event_type()) {
            for listener in listeners {
                listener.do_send(event.clone())
            }
        }

        tracing::trace!(">>> {}", event);
        self.add_to_history(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BatchId, BatchOpened, VeilEvent};

    #[actix::test]
    async fn duplicates_are_dropped_and_history_is_kept() {
        let bus = EventBus::<VeilEvent>::new(EventBusConfig::default()).start();
        let evt = VeilEvent::new(1, BatchOpened { batch_id: BatchId(1) });

        bus.send(evt.clone()).await.unwrap();
        bus.send(evt.clone()).await.unwrap();
        bus.send(VeilEvent::new(2, BatchOpened { batch_id: BatchId(1) }))
            .await
            .unwrap();

        let history = bus.send(GetHistory::<VeilEvent>::new()).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], evt);
    }
}
