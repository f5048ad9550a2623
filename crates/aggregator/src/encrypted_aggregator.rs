// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Batch, ProtocolError};
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use veil_events::BatchId;
use veil_fhe::EncryptedInteger;

/// An accepted contribution. Immutable once recorded.
#[derive(Clone, Debug)]
pub struct Submission<C> {
    pub batch_id: BatchId,
    pub index: u64,
    pub submitter: Address,
    pub value: C,
    pub timestamp: u64,
}

impl<C> Submission<C> {
    pub fn view(&self) -> SubmissionView {
        SubmissionView {
            batch_id: self.batch_id,
            index: self.index,
            submitter: self.submitter,
            timestamp: self.timestamp,
        }
    }
}

/// Audit record of a submission without its ciphertext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionView {
    pub batch_id: BatchId,
    pub index: u64,
    pub submitter: Address,
    pub timestamp: u64,
}

/// Merges encrypted values into batch totals and keeps the ordered submission log. Nothing here
/// can decrypt.
#[derive(Clone, Debug)]
pub struct EncryptedAggregator<C> {
    submissions: HashMap<BatchId, Vec<Submission<C>>>,
}

impl<C> Default for EncryptedAggregator<C> {
    fn default() -> Self {
        Self {
            submissions: HashMap::new(),
        }
    }
}

impl<C: EncryptedInteger> EncryptedAggregator<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the submission at the next index and folds the value into the batch total.
    pub fn record_submission(
        &mut self,
        batch: &mut Batch<C>,
        submitter: Address,
        value: C,
        now: u64,
    ) -> Result<&Submission<C>, ProtocolError> {
        if !batch.is_open() {
            return Err(ProtocolError::BatchNotOpen(batch.id()));
        }
        let index = batch.absorb(&value);
        let log = self.submissions.entry(batch.id()).or_default();
        log.push(Submission {
            batch_id: batch.id(),
            index,
            submitter,
            value,
            timestamp: now,
        });
        Ok(&log[log.len() - 1])
    }

    pub fn submissions(&self, batch_id: BatchId) -> &[Submission<C>] {
        self.submissions
            .get(&batch_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
