// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::ProtocolError;
use alloy::primitives::Address;
use std::collections::HashSet;

/// Role and pause state answering whether an actor may act right now.
#[derive(Clone, Debug)]
pub struct AccessGuard {
    owner: Address,
    providers: HashSet<Address>,
    paused: bool,
}

impl AccessGuard {
    /// The initial owner is always a provider.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            providers: HashSet::from([owner]),
            paused: false,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_provider(&self, actor: &Address) -> bool {
        self.providers.contains(actor)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn require_owner(&self, actor: &Address) -> Result<(), ProtocolError> {
        if *actor != self.owner {
            return Err(ProtocolError::Unauthorized(*actor));
        }
        Ok(())
    }

    pub fn require_provider(&self, actor: &Address) -> Result<(), ProtocolError> {
        if !self.is_provider(actor) {
            return Err(ProtocolError::Unauthorized(*actor));
        }
        Ok(())
    }

    pub fn require_not_paused(&self) -> Result<(), ProtocolError> {
        if self.paused {
            return Err(ProtocolError::Suspended);
        }
        Ok(())
    }

    /// Returns whether the flag actually changed.
    pub fn set_paused(&mut self, actor: &Address, paused: bool) -> Result<bool, ProtocolError> {
        self.require_owner(actor)?;
        let changed = self.paused != paused;
        self.paused = paused;
        Ok(changed)
    }

    /// Returns the previous owner. Provider flags are left as they are.
    pub fn transfer_ownership(
        &mut self,
        actor: &Address,
        new_owner: Address,
    ) -> Result<Address, ProtocolError> {
        self.require_owner(actor)?;
        if new_owner == Address::ZERO {
            return Err(ProtocolError::InvalidOwner);
        }
        Ok(std::mem::replace(&mut self.owner, new_owner))
    }

    /// Returns false when the provider was already present.
    pub fn add_provider(
        &mut self,
        actor: &Address,
        provider: Address,
    ) -> Result<bool, ProtocolError> {
        self.require_owner(actor)?;
        Ok(self.providers.insert(provider))
    }

    /// Returns false when there was nothing to remove.
    pub fn remove_provider(
        &mut self,
        actor: &Address,
        provider: &Address,
    ) -> Result<bool, ProtocolError> {
        self.require_owner(actor)?;
        Ok(self.providers.remove(provider))
    }
}
