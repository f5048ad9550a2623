// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::{Actor, Addr};
use alloy::primitives::Address;
use anyhow::{bail, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;
use tracing::info;
use veil_aggregator::{
    AddProvider, AggregatorActor, CloseBatch, HandleCallback, OpenBatch, ProtocolParams,
    RequestDecryption, SubmitEncryptedValue,
};
use veil_config::ProtocolConfig;
use veil_events::{EventBus, EventBusConfig, VeilEvent};
use veil_fhe::{build_bfv_params_arc, BfvCiphertext, BfvKeyPair};
use veil_logger::SimpleLogger;
use veil_oracle::LocalOracle;
use veil_utils::{Clock, ManualClock, SystemClock};

fn random_address(rng: &mut ChaCha20Rng) -> Address {
    Address::from_slice(&rng.gen::<[u8; 20]>())
}

/// Totals wrap modulo the plaintext modulus, so the sum must stay below it.
fn checked_total(values: &[u64], plaintext_modulus: u64) -> Result<u64> {
    let total = values
        .iter()
        .try_fold(0u64, |acc, v| acc.checked_add(*v))
        .filter(|total| *total < plaintext_modulus);
    match total {
        Some(total) => Ok(total),
        None => bail!("Sum of values must be below the plaintext modulus {plaintext_modulus}"),
    }
}

/// One batch through the whole protocol on a simulated clock that skips cooldowns.
pub async fn execute(
    config: &ProtocolConfig,
    values: Vec<u64>,
    providers: Option<u32>,
    seed: u64,
) -> Result<()> {
    let provider_count = providers.unwrap_or(values.len() as u32) as usize;
    if provider_count == 0 {
        bail!("At least one provider is required");
    }
    let expected = checked_total(&values, config.bfv.plaintext_modulus)?;

    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let params = build_bfv_params_arc(
        config.bfv.degree,
        config.bfv.plaintext_modulus,
        &config.bfv.moduli,
    )?;
    let keys = Arc::new(BfvKeyPair::generate(params, &mut rng));
    let oracle = Arc::new(LocalOracle::from_config(keys.clone(), &config.oracle)?);
    info!(oracle = %oracle.address(), "local oracle ready");

    let bus = EventBus::<VeilEvent>::new(EventBusConfig::default()).start();
    SimpleLogger::<VeilEvent>::attach(&config.name, bus.clone());

    let clock = ManualClock::new(SystemClock.now());
    let owner = random_address(&mut rng);
    // unset instances get a throwaway address
    let instance = if config.has_instance() {
        config.instance
    } else {
        random_address(&mut rng)
    };
    let aggregator: Addr<AggregatorActor<BfvCiphertext>> = AggregatorActor::attach(
        ProtocolParams {
            owner,
            instance,
            cooldown_secs: config.cooldown_secs,
        },
        oracle.clone(),
        &bus,
        Arc::new(clock.clone()),
    );

    let providers: Vec<Address> = (0..provider_count)
        .map(|_| random_address(&mut rng))
        .collect();
    for provider in &providers {
        aggregator
            .send(AddProvider {
                actor: owner,
                provider: *provider,
            })
            .await??;
    }

    let batch_id = aggregator.send(OpenBatch { actor: owner }).await??;
    for (i, value) in values.iter().enumerate() {
        let actor = providers[i % providers.len()];
        let value = keys.encrypt_u64(*value, &mut rng)?;
        aggregator
            .send(SubmitEncryptedValue {
                actor,
                batch_id,
                value,
            })
            .await??;
        // each provider acts once per round
        if (i + 1) % providers.len() == 0 {
            clock.advance(config.cooldown_secs);
        }
    }
    aggregator
        .send(CloseBatch {
            actor: owner,
            batch_id,
        })
        .await??;

    let request_id = aggregator
        .send(RequestDecryption {
            actor: owner,
            batch_id,
        })
        .await??;
    let callback = oracle.fulfil(request_id)?;
    let total = aggregator.send(HandleCallback::from(callback)).await??;
    if total != expected {
        bail!("Decrypted total {total} does not match the submitted sum {expected}");
    }

    println!("{batch_id}: {} submissions, decrypted total {total}", values.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_must_fit_the_plaintext_modulus() -> Result<()> {
        assert_eq!(checked_total(&[10, 15], 1032193)?, 25);
        assert_eq!(checked_total(&[], 2)?, 0);
        assert!(checked_total(&[1032192, 5], 1032193).is_err());
        assert!(checked_total(&[1032193], 1032193).is_err());
        assert!(checked_total(&[u64::MAX, 1], u64::MAX).is_err());
        Ok(())
    }
}
