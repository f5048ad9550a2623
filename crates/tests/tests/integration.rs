// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use anyhow::Result;
use std::sync::Arc;
use veil_aggregator::{
    decode_cleartext, AddProvider, CloseBatch, GetBatch, GetDecryptedTotal, GetDecryptionContext,
    GetSubmissions, HandleCallback, OpenBatch, ProtocolError, RequestDecryption, SetPaused,
    SubmitEncryptedValue,
};
use veil_events::{BatchId, VeilEventData};
use veil_fhe::{BfvCiphertext, BfvKeyPair};
use veil_logger::SimpleLogger;
use veil_oracle::verify_signature;
use veil_test_helpers::{
    create_bfv_keys, create_random_eth_addrs, create_rng_from_u64, MockCiphertext,
    MockDecryptor, ProtocolSystem,
};
use veil_utils::Clock;

type BfvSystem = ProtocolSystem<BfvCiphertext, Arc<BfvKeyPair>>;
type MockSystem = ProtocolSystem<MockCiphertext, MockDecryptor>;

async fn add_providers<C, D>(sys: &ProtocolSystem<C, D>, providers: &[Address]) -> Result<()>
where
    C: veil_fhe::EncryptedInteger,
    D: veil_fhe::Decryptor,
{
    for provider in providers {
        sys.aggregator
            .send(AddProvider {
                actor: sys.owner,
                provider: *provider,
            })
            .await??;
    }
    Ok(())
}

#[actix::test]
async fn test_encrypted_round_trip_and_replay() -> Result<()> {
    let mut rng = create_rng_from_u64(42);
    let keys = create_bfv_keys(&mut rng)?;
    let owner = Address::repeat_byte(1);
    let sys = BfvSystem::start(owner, 60, keys.clone())?;
    SimpleLogger::attach("integration", sys.bus.clone());

    let [alice, bob] = [Address::repeat_byte(2), Address::repeat_byte(3)];
    add_providers(&sys, &[alice, bob]).await?;

    let batch_id = sys.aggregator.send(OpenBatch { actor: owner }).await??;
    assert_eq!(batch_id, BatchId(1));

    sys.aggregator
        .send(SubmitEncryptedValue {
            actor: alice,
            batch_id,
            value: keys.encrypt_u64(10, &mut rng)?,
        })
        .await??;
    sys.clock.advance(60);
    sys.aggregator
        .send(SubmitEncryptedValue {
            actor: bob,
            batch_id,
            value: keys.encrypt_u64(15, &mut rng)?,
        })
        .await??;

    let request_id = sys
        .aggregator
        .send(RequestDecryption {
            actor: owner,
            batch_id,
        })
        .await??;
    let pending = sys
        .aggregator
        .send(GetDecryptionContext(request_id))
        .await?
        .expect("context stored");
    assert!(!pending.processed);
    assert_eq!(pending.batch_id, batch_id);

    let callback = sys.oracle.fulfil(request_id)?;
    assert_eq!(decode_cleartext(&callback.cleartext), Some(25));
    assert_eq!(callback.target.instance, sys.instance);
    assert!(verify_signature(
        &sys.oracle.address(),
        request_id,
        &callback.cleartext,
        &callback.proof
    ));

    let total = sys
        .aggregator
        .send(HandleCallback::from(callback.clone()))
        .await??;
    assert_eq!(total, 25);
    assert_eq!(
        sys.aggregator.send(HandleCallback::from(callback)).await?,
        Err(ProtocolError::ReplayAttempt(request_id))
    );
    assert_eq!(
        sys.aggregator.send(GetDecryptedTotal(batch_id)).await?,
        Some(25)
    );

    assert_eq!(
        sys.event_types().await?,
        vec![
            "ProviderAdded",
            "ProviderAdded",
            "BatchOpened",
            "SubmissionRecorded",
            "SubmissionRecorded",
            "DecryptionRequested",
            "DecryptionCompleted"
        ]
    );
    let history = sys.history().await?;
    let Some(VeilEventData::DecryptionCompleted(done)) = history.last().map(|e| e.get_data())
    else {
        panic!("expected DecryptionCompleted last");
    };
    assert_eq!(done.total, 25);
    assert_eq!(done.request_id, request_id);
    Ok(())
}

#[actix::test]
async fn test_callback_after_new_submission_is_rejected() -> Result<()> {
    let mut rng = create_rng_from_u64(7);
    let keys = create_bfv_keys(&mut rng)?;
    let owner = Address::repeat_byte(1);
    let alice = Address::repeat_byte(2);
    let sys = BfvSystem::start(owner, 0, keys.clone())?;
    add_providers(&sys, &[alice]).await?;

    let batch_id = sys.aggregator.send(OpenBatch { actor: owner }).await??;
    sys.aggregator
        .send(SubmitEncryptedValue {
            actor: owner,
            batch_id,
            value: keys.encrypt_u64(10, &mut rng)?,
        })
        .await??;
    let stale = sys
        .aggregator
        .send(RequestDecryption {
            actor: owner,
            batch_id,
        })
        .await??;
    sys.aggregator
        .send(SubmitEncryptedValue {
            actor: alice,
            batch_id,
            value: keys.encrypt_u64(15, &mut rng)?,
        })
        .await??;

    assert_eq!(
        sys.fulfil(stale).await?,
        Err(ProtocolError::StateMismatch(stale))
    );
    assert_eq!(sys.aggregator.send(GetDecryptedTotal(batch_id)).await?, None);

    // a request made against the new state succeeds
    let fresh = sys
        .aggregator
        .send(RequestDecryption {
            actor: alice,
            batch_id,
        })
        .await??;
    assert_eq!(sys.fulfil(fresh).await?, Ok(25));
    Ok(())
}

#[actix::test]
async fn test_total_ignores_submission_order() -> Result<()> {
    let mut rng = create_rng_from_u64(99);
    let keys = create_bfv_keys(&mut rng)?;
    let owner = Address::repeat_byte(1);
    let providers = create_random_eth_addrs(4);
    let values = [3u64, 11, 0, 29];

    let mut totals = vec![];
    for order in [[0usize, 1, 2, 3], [3, 1, 0, 2]] {
        let sys = BfvSystem::start(owner, 60, keys.clone())?;
        add_providers(&sys, &providers).await?;
        let batch_id = sys.aggregator.send(OpenBatch { actor: owner }).await??;
        for i in order {
            sys.aggregator
                .send(SubmitEncryptedValue {
                    actor: providers[i],
                    batch_id,
                    value: keys.encrypt_u64(values[i], &mut rng)?,
                })
                .await??;
        }
        let submitters: Vec<_> = sys
            .aggregator
            .send(GetSubmissions(batch_id))
            .await?
            .iter()
            .map(|s| s.submitter)
            .collect();
        assert_eq!(
            submitters,
            order.iter().map(|i| providers[*i]).collect::<Vec<_>>()
        );

        let request_id = sys
            .aggregator
            .send(RequestDecryption {
                actor: owner,
                batch_id,
            })
            .await??;
        totals.push(sys.fulfil(request_id).await??);
    }
    assert_eq!(totals, vec![43, 43]);
    Ok(())
}

#[actix::test]
async fn test_pause_rejects_and_resume_restores() -> Result<()> {
    let owner = Address::repeat_byte(1);
    let sys = MockSystem::start(owner, 60, MockDecryptor)?;
    let batch_id = sys.aggregator.send(OpenBatch { actor: owner }).await??;
    sys.aggregator
        .send(SubmitEncryptedValue {
            actor: owner,
            batch_id,
            value: MockCiphertext(5),
        })
        .await??;

    sys.aggregator
        .send(SetPaused {
            actor: owner,
            paused: true,
        })
        .await??;
    sys.clock.advance(600);
    assert_eq!(
        sys.aggregator
            .send(SubmitEncryptedValue {
                actor: owner,
                batch_id,
                value: MockCiphertext(6),
            })
            .await?,
        Err(ProtocolError::Suspended)
    );
    let before = sys.aggregator.send(GetBatch(batch_id)).await?;

    sys.aggregator
        .send(SetPaused {
            actor: owner,
            paused: false,
        })
        .await??;
    assert_eq!(sys.aggregator.send(GetBatch(batch_id)).await?, before);
    sys.aggregator
        .send(SubmitEncryptedValue {
            actor: owner,
            batch_id,
            value: MockCiphertext(6),
        })
        .await??;
    assert_eq!(
        sys.aggregator
            .send(GetBatch(batch_id))
            .await?
            .map(|b| b.submission_count),
        Some(2)
    );
    Ok(())
}

#[actix::test]
async fn test_callback_during_pause_lands_after_resume() -> Result<()> {
    let owner = Address::repeat_byte(1);
    let sys = MockSystem::start(owner, 60, MockDecryptor)?;
    let batch_id = sys.aggregator.send(OpenBatch { actor: owner }).await??;
    sys.aggregator
        .send(SubmitEncryptedValue {
            actor: owner,
            batch_id,
            value: MockCiphertext(9),
        })
        .await??;
    let request_id = sys
        .aggregator
        .send(RequestDecryption {
            actor: owner,
            batch_id,
        })
        .await??;
    let callback = HandleCallback::from(sys.oracle.fulfil(request_id)?);

    sys.aggregator
        .send(SetPaused {
            actor: owner,
            paused: true,
        })
        .await??;
    assert_eq!(
        sys.aggregator.send(callback.clone()).await?,
        Err(ProtocolError::Suspended)
    );
    assert_eq!(sys.aggregator.send(GetDecryptedTotal(batch_id)).await?, None);

    sys.aggregator
        .send(SetPaused {
            actor: owner,
            paused: false,
        })
        .await??;
    assert_eq!(sys.aggregator.send(callback).await??, 9);
    assert_eq!(
        sys.aggregator.send(GetDecryptedTotal(batch_id)).await?,
        Some(9)
    );
    Ok(())
}

#[actix::test]
async fn test_cooldown_and_closed_batches() -> Result<()> {
    let owner = Address::repeat_byte(1);
    let sys = MockSystem::start(owner, 60, MockDecryptor)?;
    let batch_id = sys.aggregator.send(OpenBatch { actor: owner }).await??;
    let submit = SubmitEncryptedValue {
        actor: owner,
        batch_id,
        value: MockCiphertext(1),
    };

    sys.aggregator.send(submit.clone()).await??;
    assert_eq!(
        sys.aggregator.send(submit.clone()).await?,
        Err(ProtocolError::CooldownActive {
            retry_at: sys.clock.now() + 60
        })
    );
    sys.clock.advance(60);
    sys.aggregator.send(submit.clone()).await??;

    sys.aggregator
        .send(CloseBatch {
            actor: owner,
            batch_id,
        })
        .await??;
    sys.clock.advance(60);
    assert_eq!(
        sys.aggregator.send(submit).await?,
        Err(ProtocolError::BatchNotOpen(batch_id))
    );
    assert_eq!(
        sys.aggregator
            .send(SubmitEncryptedValue {
                actor: owner,
                batch_id: BatchId(42),
                value: MockCiphertext(1),
            })
            .await?,
        Err(ProtocolError::BatchNotOpen(BatchId(42)))
    );

    // the closed batch can still be decrypted
    let request_id = sys
        .aggregator
        .send(RequestDecryption {
            actor: owner,
            batch_id,
        })
        .await??;
    assert_eq!(sys.fulfil(request_id).await?, Ok(2));
    Ok(())
}

#[actix::test]
async fn test_forged_callback_is_rejected() -> Result<()> {
    let owner = Address::repeat_byte(1);
    let sys = MockSystem::start(owner, 60, MockDecryptor)?;
    let batch_id = sys.aggregator.send(OpenBatch { actor: owner }).await??;
    let request_id = sys
        .aggregator
        .send(RequestDecryption {
            actor: owner,
            batch_id,
        })
        .await??;

    let mut callback = sys.oracle.fulfil(request_id)?;
    callback.cleartext = veil_aggregator::encode_cleartext(1_000_000).to_vec().into();
    assert_eq!(
        sys.aggregator.send(HandleCallback::from(callback)).await?,
        Err(ProtocolError::InvalidProof(request_id))
    );
    assert!(
        !sys.aggregator
            .send(GetDecryptionContext(request_id))
            .await?
            .map(|ctx| ctx.processed)
            .unwrap_or(true)
    );
    Ok(())
}
