// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Result proofs are Ethereum `eth_sign` (EIP-191) signatures by the oracle key over
//! `keccak256(request_id ‖ keccak256(cleartext))`, so anything that can run `ecrecover` can check
//! them.

use alloy::primitives::{keccak256, Address, Signature};
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use anyhow::{anyhow, Result};
use veil_events::RequestId;
use veil_utils::ArcBytes;

pub fn proof_digest(request_id: RequestId, cleartext: &[u8]) -> [u8; 32] {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(&request_id.to_be_word());
    preimage[32..].copy_from_slice(keccak256(cleartext).as_slice());
    keccak256(preimage).into()
}

pub fn sign_result(
    signer: &PrivateKeySigner,
    request_id: RequestId,
    cleartext: &[u8],
) -> Result<ArcBytes> {
    let digest = proof_digest(request_id, cleartext);
    let sig = signer
        .sign_message_sync(&digest)
        .map_err(|e| anyhow!("Failed to sign decryption result: {e}"))?;
    Ok(ArcBytes::from_bytes(&sig.as_bytes()))
}

pub fn recover_signer(request_id: RequestId, cleartext: &[u8], proof: &[u8]) -> Result<Address> {
    let sig = Signature::try_from(proof).map_err(|e| anyhow!("Invalid signature: {e}"))?;
    let digest = proof_digest(request_id, cleartext);
    sig.recover_address_from_msg(&digest)
        .map_err(|e| anyhow!("Failed to recover signer address: {e}"))
}

/// True only if `proof` was produced by `expected` for exactly this request and cleartext.
pub fn verify_signature(
    expected: &Address,
    request_id: RequestId,
    cleartext: &[u8],
    proof: &[u8],
) -> bool {
    recover_signer(request_id, cleartext, proof)
        .map(|signer| signer == *expected)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> PrivateKeySigner {
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
            .parse()
            .unwrap()
    }

    #[test]
    fn sign_and_recover() -> Result<()> {
        let signer = signer();
        let proof = sign_result(&signer, RequestId(7), b"cleartext")?;
        assert_eq!(proof.len(), 65);
        assert_eq!(
            recover_signer(RequestId(7), b"cleartext", &proof)?,
            signer.address()
        );
        assert!(verify_signature(
            &signer.address(),
            RequestId(7),
            b"cleartext",
            &proof
        ));
        Ok(())
    }

    #[test]
    fn proof_is_bound_to_request_and_cleartext() -> Result<()> {
        let signer = signer();
        let proof = sign_result(&signer, RequestId(7), b"cleartext")?;
        let me = signer.address();

        assert!(!verify_signature(&me, RequestId(8), b"cleartext", &proof));
        assert!(!verify_signature(&me, RequestId(7), b"cleartexT", &proof));
        assert!(!verify_signature(&Address::ZERO, RequestId(7), b"cleartext", &proof));
        assert!(!verify_signature(&me, RequestId(7), b"cleartext", &proof[..64]));
        Ok(())
    }
}
