// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{BatchId, Commitment, RequestId};
use actix::Message;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct DecryptionRequested {
    pub batch_id: BatchId,
    pub request_id: RequestId,
    pub commitment: Commitment,
    pub requested_by: Address,
}

impl Display for DecryptionRequested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, commitment: {}, requested_by: {}",
            self.batch_id, self.request_id, self.commitment, self.requested_by
        )
    }
}
