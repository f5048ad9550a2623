// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};
use veil_events::BatchId;
use veil_fhe::EncryptedInteger;

/// A collection window sharing one running encrypted total.
#[derive(Clone, Debug)]
pub struct Batch<C> {
    id: BatchId,
    open: bool,
    submission_count: u64,
    total: C,
}

impl<C: EncryptedInteger> Batch<C> {
    fn new(id: BatchId) -> Self {
        Self {
            id,
            open: true,
            submission_count: 0,
            total: C::identity(),
        }
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn submission_count(&self) -> u64 {
        self.submission_count
    }

    pub fn total(&self) -> &C {
        &self.total
    }

    /// Merge a value into the running total. Only reachable for open batches.
    pub(crate) fn absorb(&mut self, value: &C) -> u64 {
        self.total = self.total.combine(value);
        let index = self.submission_count;
        self.submission_count += 1;
        index
    }

    pub fn view(&self) -> BatchView {
        BatchView {
            id: self.id,
            open: self.open,
            submission_count: self.submission_count,
        }
    }
}

/// Public shape of a batch. The encrypted total stays inside the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchView {
    pub id: BatchId,
    pub open: bool,
    pub submission_count: u64,
}

/// Owns every batch record. Ids are sequential from 1.
#[derive(Clone, Debug)]
pub struct BatchRegistry<C> {
    batches: Vec<Batch<C>>,
}

impl<C> Default for BatchRegistry<C> {
    fn default() -> Self {
        Self { batches: vec![] }
    }
}

impl<C: EncryptedInteger> BatchRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_batch(&mut self) -> BatchId {
        let id = BatchId(self.batches.len() as u64).next();
        self.batches.push(Batch::new(id));
        id
    }

    /// Closing is terminal.
    pub fn close_batch(&mut self, id: BatchId) -> Result<(), ProtocolError> {
        match self.get_mut(id) {
            Some(batch) if batch.open => {
                batch.open = false;
                Ok(())
            }
            _ => Err(ProtocolError::InvalidBatch(id)),
        }
    }

    pub fn get(&self, id: BatchId) -> Option<&Batch<C>> {
        if id.is_none() {
            return None;
        }
        self.batches.get((id.0 - 1) as usize)
    }

    fn get_mut(&mut self, id: BatchId) -> Option<&mut Batch<C>> {
        if id.is_none() {
            return None;
        }
        self.batches.get_mut((id.0 - 1) as usize)
    }

    pub fn require_open(&self, id: BatchId) -> Result<&Batch<C>, ProtocolError> {
        match self.get(id) {
            Some(batch) if batch.open => Ok(batch),
            _ => Err(ProtocolError::BatchNotOpen(id)),
        }
    }

    pub(crate) fn open_batch_mut(&mut self, id: BatchId) -> Result<&mut Batch<C>, ProtocolError> {
        match self.get_mut(id) {
            Some(batch) if batch.open => Ok(batch),
            _ => Err(ProtocolError::BatchNotOpen(id)),
        }
    }

    pub fn count(&self) -> u64 {
        self.batches.len() as u64
    }
}
