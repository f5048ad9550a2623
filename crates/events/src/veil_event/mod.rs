// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod batch_closed;
mod batch_opened;
mod cooldown_window_updated;
mod decryption_completed;
mod decryption_requested;
mod ownership_transferred;
mod pause_changed;
mod provider_added;
mod provider_removed;
mod submission_recorded;

pub use batch_closed::*;
pub use batch_opened::*;
pub use cooldown_window_updated::*;
pub use decryption_completed::*;
pub use decryption_requested::*;
pub use ownership_transferred::*;
pub use pause_changed::*;
pub use provider_added::*;
pub use provider_removed::*;
pub use submission_recorded::*;

use crate::{BatchId, Event, EventId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

macro_rules! impl_from_event_data {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for VeilEventData {
                fn from(data: $variant) -> Self {
                    VeilEventData::$variant(data)
                }
            }
        )*
    };
}

/// Payload of a protocol notification
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VeilEventData {
    OwnershipTransferred(OwnershipTransferred),
    ProviderAdded(ProviderAdded),
    ProviderRemoved(ProviderRemoved),
    PauseChanged(PauseChanged),
    CooldownWindowUpdated(CooldownWindowUpdated),
    BatchOpened(BatchOpened),
    BatchClosed(BatchClosed),
    SubmissionRecorded(SubmissionRecorded),
    DecryptionRequested(DecryptionRequested),
    DecryptionCompleted(DecryptionCompleted),
}

impl_from_event_data!(
    OwnershipTransferred,
    ProviderAdded,
    ProviderRemoved,
    PauseChanged,
    CooldownWindowUpdated,
    BatchOpened,
    BatchClosed,
    SubmissionRecorded,
    DecryptionRequested,
    DecryptionCompleted
);

impl VeilEventData {
    pub fn variant_name(&self) -> &'static str {
        match self {
            VeilEventData::OwnershipTransferred(_) => "OwnershipTransferred",
            VeilEventData::ProviderAdded(_) => "ProviderAdded",
            VeilEventData::ProviderRemoved(_) => "ProviderRemoved",
            VeilEventData::PauseChanged(_) => "PauseChanged",
            VeilEventData::CooldownWindowUpdated(_) => "CooldownWindowUpdated",
            VeilEventData::BatchOpened(_) => "BatchOpened",
            VeilEventData::BatchClosed(_) => "BatchClosed",
            VeilEventData::SubmissionRecorded(_) => "SubmissionRecorded",
            VeilEventData::DecryptionRequested(_) => "DecryptionRequested",
            VeilEventData::DecryptionCompleted(_) => "DecryptionCompleted",
        }
    }
}

impl Display for VeilEventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VeilEventData::OwnershipTransferred(data) => Display::fmt(data, f),
            VeilEventData::ProviderAdded(data) => Display::fmt(data, f),
            VeilEventData::ProviderRemoved(data) => Display::fmt(data, f),
            VeilEventData::PauseChanged(data) => Display::fmt(data, f),
            VeilEventData::CooldownWindowUpdated(data) => Display::fmt(data, f),
            VeilEventData::BatchOpened(data) => Display::fmt(data, f),
            VeilEventData::BatchClosed(data) => Display::fmt(data, f),
            VeilEventData::SubmissionRecorded(data) => Display::fmt(data, f),
            VeilEventData::DecryptionRequested(data) => Display::fmt(data, f),
            VeilEventData::DecryptionCompleted(data) => Display::fmt(data, f),
        }
    }
}

/// A sequenced protocol notification as published on the [`crate::EventBus`].
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct VeilEvent {
    id: EventId,
    seq: u64,
    data: VeilEventData,
}

impl VeilEvent {
    pub fn new(seq: u64, data: impl Into<VeilEventData>) -> Self {
        let data = data.into();
        Self {
            id: EventId::hash(seq, &data),
            seq,
            data,
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn get_data(&self) -> &VeilEventData {
        &self.data
    }

    /// The batch this notification concerns, if any
    pub fn batch_id(&self) -> Option<BatchId> {
        match &self.data {
            VeilEventData::BatchOpened(data) => Some(data.batch_id),
            VeilEventData::BatchClosed(data) => Some(data.batch_id),
            VeilEventData::SubmissionRecorded(data) => Some(data.batch_id),
            VeilEventData::DecryptionRequested(data) => Some(data.batch_id),
            VeilEventData::DecryptionCompleted(data) => Some(data.batch_id),
            _ => None,
        }
    }
}

impl Event for VeilEvent {
    type Id = EventId;

    fn event_type(&self) -> String {
        self.data.variant_name().to_string()
    }

    fn event_id(&self) -> Self::Id {
        self.id.clone()
    }
}

impl Display for VeilEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.data.variant_name(), self.data)
    }
}
