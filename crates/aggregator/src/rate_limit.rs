// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::ProtocolError;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Submission,
    DecryptionRequest,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Submission => write!(f, "submission"),
            ActionKind::DecryptionRequest => write!(f, "decryption-request"),
        }
    }
}

/// Per actor, per action kind cooldown tracking under one shared window.
///
/// Callers run [`Self::check`] before any other effect of an action and [`Self::record`] once the
/// action has been applied. Both take the limiter by reference from the same `&mut` owner, so no
/// other call for the actor can land between them.
#[derive(Clone, Debug, Default)]
pub struct RateLimiter {
    window: u64,
    last_action: HashMap<(Address, ActionKind), u64>,
}

impl RateLimiter {
    pub fn new(window: u64) -> Self {
        Self {
            window,
            last_action: HashMap::new(),
        }
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    /// Changes the window for future checks and returns the previous one. Recorded timestamps are
    /// kept, so a shorter window applies immediately to them.
    pub fn set_window(&mut self, seconds: u64) -> u64 {
        std::mem::replace(&mut self.window, seconds)
    }

    /// Earliest time the actor may act again. `None` if the actor has never acted.
    pub fn next_allowed_at(&self, actor: &Address, kind: ActionKind) -> Option<u64> {
        self.last_action
            .get(&(*actor, kind))
            .map(|last| last.saturating_add(self.window))
    }

    pub fn check(&self, actor: &Address, kind: ActionKind, now: u64) -> Result<(), ProtocolError> {
        match self.next_allowed_at(actor, kind) {
            Some(retry_at) if now < retry_at => Err(ProtocolError::CooldownActive { retry_at }),
            _ => Ok(()),
        }
    }

    pub fn record(&mut self, actor: Address, kind: ActionKind, now: u64) {
        self.last_action.insert((actor, kind), now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_action_is_always_allowed() {
        let mut limiter = RateLimiter::new(60);
        let actor = Address::repeat_byte(1);
        assert_eq!(limiter.next_allowed_at(&actor, ActionKind::Submission), None);
        assert_eq!(limiter.check(&actor, ActionKind::Submission, 0), Ok(()));
        limiter.record(actor, ActionKind::Submission, 0);
        assert_eq!(
            limiter.next_allowed_at(&actor, ActionKind::Submission),
            Some(60)
        );
    }

    #[test]
    fn second_action_waits_for_window() {
        let mut limiter = RateLimiter::new(60);
        let actor = Address::repeat_byte(1);
        limiter.record(actor, ActionKind::Submission, 100);

        assert_eq!(
            limiter.check(&actor, ActionKind::Submission, 159),
            Err(ProtocolError::CooldownActive { retry_at: 160 })
        );
        assert_eq!(
            limiter.next_allowed_at(&actor, ActionKind::Submission),
            Some(160)
        );
        assert_eq!(limiter.check(&actor, ActionKind::Submission, 160), Ok(()));
    }

    #[test]
    fn kinds_and_actors_are_independent() {
        let mut limiter = RateLimiter::new(60);
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        limiter.record(a, ActionKind::Submission, 10);

        assert_eq!(limiter.check(&a, ActionKind::DecryptionRequest, 10), Ok(()));
        assert_eq!(limiter.check(&b, ActionKind::Submission, 10), Ok(()));
    }

    #[test]
    fn window_changes_apply_prospectively() {
        let mut limiter = RateLimiter::new(60);
        let actor = Address::repeat_byte(1);
        limiter.record(actor, ActionKind::Submission, 10);

        assert_eq!(limiter.set_window(5), 60);
        assert_eq!(limiter.check(&actor, ActionKind::Submission, 15), Ok(()));

        limiter.set_window(u64::MAX);
        assert_eq!(
            limiter.check(&actor, ActionKind::Submission, 15),
            Err(ProtocolError::CooldownActive { retry_at: u64::MAX })
        );
    }
}
