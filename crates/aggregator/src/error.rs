// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use thiserror::Error;
use veil_events::{BatchId, RequestId};

/// Reasons a protocol operation is refused. A refused operation never leaves partial effects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("{0} does not hold the role required for this operation")]
    Unauthorized(Address),

    #[error("Protocol is paused")]
    Suspended,

    #[error("Cooldown active, retry at {retry_at}")]
    CooldownActive { retry_at: u64 },

    #[error("{0} does not exist or is already closed")]
    InvalidBatch(BatchId),

    #[error("{0} is not accepting submissions")]
    BatchNotOpen(BatchId),

    #[error("{0} is unknown or was already processed")]
    ReplayAttempt(RequestId),

    #[error("Aggregate changed since {0} was issued")]
    StateMismatch(RequestId),

    #[error("Proof for {0} failed verification")]
    InvalidProof(RequestId),

    #[error("Ownership cannot be transferred to the zero address")]
    InvalidOwner,

    #[error("Callback for {0} was addressed to another instance")]
    MisroutedCallback(RequestId),

    #[error("Cleartext for {0} is not a 32 byte word holding a u64")]
    InvalidCleartext(RequestId),

    #[error("Oracle rejected the request: {0}")]
    Oracle(String),
}
