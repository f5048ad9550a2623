// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;
use veil_config::BfvConfig;
use veil_fhe::{build_bfv_params_arc, BfvKeyPair};

pub fn create_random_eth_addrs(how_many: u32) -> Vec<Address> {
    (0..how_many)
        .map(|_| Address::from_slice(&rand::thread_rng().gen::<[u8; 20]>()))
        .collect()
}

pub fn create_rng_from_u64(value: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(value)
}

/// Keys for the default BFV parameter set, derived from a seeded rng
pub fn create_bfv_keys(rng: &mut ChaCha20Rng) -> Result<Arc<BfvKeyPair>> {
    let BfvConfig {
        degree,
        plaintext_modulus,
        moduli,
    } = BfvConfig::default();
    let params = build_bfv_params_arc(degree, plaintext_modulus, &moduli)?;
    Ok(Arc::new(BfvKeyPair::generate(params, rng)))
}
