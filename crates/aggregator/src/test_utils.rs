// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CallbackTarget, DecryptionOracle};
use alloy::primitives::keccak256;
use anyhow::bail;
use std::sync::Mutex;
use veil_events::RequestId;
use veil_fhe::EncryptedInteger;
use veil_utils::ArcBytes;

/// Additive stand-in for a ciphertext
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plain(pub u64);

impl EncryptedInteger for Plain {
    fn identity() -> Self {
        Plain(0)
    }

    fn combine(&self, rhs: &Self) -> Self {
        Plain(self.0.wrapping_add(rhs.0))
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_le_bytes().to_vec()
    }
}

#[derive(Default)]
struct StubState {
    next_id: u64,
    requests: Vec<(RequestId, CallbackTarget)>,
    refuse: bool,
}

/// Oracle whose proofs are a keyless hash. Good enough to exercise the bridge.
#[derive(Default)]
pub struct StubOracle {
    state: Mutex<StubState>,
}

impl StubOracle {
    pub fn prove(request_id: RequestId, cleartext: &[u8]) -> Vec<u8> {
        let mut preimage = request_id.to_be_word().to_vec();
        preimage.extend_from_slice(cleartext);
        keccak256(&preimage).to_vec()
    }

    pub fn refuse(&self, refuse: bool) {
        self.state.lock().unwrap().refuse = refuse;
    }

    pub fn requests(&self) -> Vec<(RequestId, CallbackTarget)> {
        self.state.lock().unwrap().requests.clone()
    }
}

impl DecryptionOracle for StubOracle {
    fn submit_decryption_request(
        &self,
        _ciphertexts: Vec<ArcBytes>,
        target: CallbackTarget,
    ) -> anyhow::Result<RequestId> {
        let mut state = self.state.lock().unwrap();
        if state.refuse {
            bail!("oracle offline");
        }
        state.next_id += 1;
        let id = RequestId(state.next_id);
        state.requests.push((id, target));
        Ok(id)
    }

    fn verify_proof(&self, request_id: RequestId, cleartext: &[u8], proof: &[u8]) -> bool {
        Self::prove(request_id, cleartext) == proof
    }
}
