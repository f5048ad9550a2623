// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod access;
mod actor;
mod batch_registry;
mod encrypted_aggregator;
mod engine;
mod error;
mod oracle_bridge;
mod rate_limit;
#[cfg(test)]
mod test_utils;

pub use access::*;
pub use actor::*;
pub use batch_registry::*;
pub use encrypted_aggregator::*;
pub use engine::*;
pub use error::*;
pub use oracle_bridge::*;
pub use rate_limit::*;
