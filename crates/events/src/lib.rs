// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod event_id;
mod eventbus;
mod ids;
mod veil_event;

pub use event_id::*;
pub use eventbus::*;
pub use ids::*;
pub use veil_event::*;
