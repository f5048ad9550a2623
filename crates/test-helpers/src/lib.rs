// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod mock_ciphertext;
mod protocol_system;
mod utils;

pub use mock_ciphertext::*;
pub use protocol_system::*;
pub use utils::*;
