// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::BatchId;
use actix::Message;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// An encrypted value was merged into a batch. The value itself is never part of the
/// notification.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct SubmissionRecorded {
    pub batch_id: BatchId,
    pub index: u64,
    pub submitter: Address,
    pub timestamp: u64,
}

impl Display for SubmissionRecorded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, index: {}, submitter: {}, timestamp: {}",
            self.batch_id, self.index, self.submitter, self.timestamp
        )
    }
}
