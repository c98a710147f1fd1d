//! Plaintext-backed FHE service for tests, demos and local ledgers
//!
//! `MockFhe` keeps every "ciphertext" as a plaintext behind a random-looking
//! handle and enforces the same rules a real coprocessor does: input proofs
//! bound to contract and sender, range attestation, typed operands, and a
//! public-decryption access list. It provides no confidentiality whatsoever.
//!
//! The store is append-only. Superseded tallies and per-vote indicators are
//! never collected, so a vote on an `n`-option poll adds `1 + 2n` entries and a
//! persisted ledger grows with every ballot.

use std::collections::{BTreeMap, BTreeSet};

use blake2::{Blake2s256, Digest};
use serde::{Deserialize, Serialize};
use tracing::debug;
use voteshield_runtime::{
    Address, CiphertextHandle, EncryptedBool, InputProof, Result, VoteShieldError,
};

use super::FheService;

const HANDLE_DOMAIN: &[u8] = b"voteshield/mock/handle";
const PROOF_DOMAIN: &[u8] = b"voteshield/mock/input-proof";

/// Encrypted value type, mirroring the widths the engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Uint8,
    Uint32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Origin {
    /// Created client-side by `encrypt_input`, usable only after validation
    ClientInput,
    Computed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCiphertext {
    kind: ValueKind,
    value: u32,
    origin: Origin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockFhe {
    seed: u64,
    next_nonce: u64,
    ciphertexts: BTreeMap<CiphertextHandle, StoredCiphertext>,
    public: BTreeSet<CiphertextHandle>,
}

impl Default for MockFhe {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFhe {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Deterministic handle sequence, for reproducible tests and benches.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, next_nonce: 0, ciphertexts: BTreeMap::new(), public: BTreeSet::new() }
    }

    /// Client-side encryption of a choice for `submitter` voting on the contract at `context`.
    pub fn encrypt_input(
        &mut self,
        value: u8,
        context: &Address,
        submitter: &Address,
    ) -> (CiphertextHandle, InputProof) {
        let handle = self.store(ValueKind::Uint8, value as u32, Origin::ClientInput);
        let proof = InputProof::new(Self::binding_digest(&handle, context, submitter).to_vec());
        (handle, proof)
    }

    /// Test-mode decryption that ignores the access list.
    pub fn debug_decrypt(&self, handle: &CiphertextHandle) -> Result<u64> {
        self.lookup(handle).map(|stored| stored.value as u64)
    }

    pub fn is_publicly_decryptable(&self, handle: &CiphertextHandle) -> bool {
        self.public.contains(handle)
    }

    pub fn kind_of(&self, handle: &CiphertextHandle) -> Option<ValueKind> {
        self.ciphertexts.get(handle).map(|stored| stored.kind)
    }

    pub fn ciphertext_count(&self) -> usize {
        self.ciphertexts.len()
    }

    fn binding_digest(
        handle: &CiphertextHandle,
        context: &Address,
        submitter: &Address,
    ) -> [u8; 32] {
        let digest = Blake2s256::new()
            .chain_update(PROOF_DOMAIN)
            .chain_update(handle.as_bytes())
            .chain_update(context.as_bytes())
            .chain_update(submitter.as_bytes())
            .finalize();

        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }

    fn fresh_handle(&mut self) -> CiphertextHandle {
        let digest = Blake2s256::new()
            .chain_update(HANDLE_DOMAIN)
            .chain_update(self.seed.to_le_bytes())
            .chain_update(self.next_nonce.to_le_bytes())
            .finalize();
        self.next_nonce += 1;

        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        CiphertextHandle::new(out)
    }

    fn store(&mut self, kind: ValueKind, value: u32, origin: Origin) -> CiphertextHandle {
        let handle = self.fresh_handle();
        self.ciphertexts.insert(handle, StoredCiphertext { kind, value, origin });
        handle
    }

    fn lookup(&self, handle: &CiphertextHandle) -> Result<&StoredCiphertext> {
        self.ciphertexts.get(handle).ok_or(VoteShieldError::UnknownCiphertext(*handle))
    }

    /// Operand of a computation: must exist and must not be an unvalidated client input.
    fn operand(&self, handle: &CiphertextHandle) -> Result<&StoredCiphertext> {
        let stored = self.lookup(handle)?;
        if stored.origin == Origin::ClientInput {
            return Err(VoteShieldError::invalid_ciphertext(format!(
                "handle {} is an unvalidated client input",
                handle
            )));
        }
        Ok(stored)
    }
}

impl FheService for MockFhe {
    fn validate_encrypted_input(
        &mut self,
        input: &CiphertextHandle,
        proof: &InputProof,
        context: &Address,
        submitter: &Address,
        upper_bound: u8,
    ) -> Result<CiphertextHandle> {
        let stored = self.ciphertexts.get(input).ok_or_else(|| {
            VoteShieldError::invalid_ciphertext(format!("unknown input {}", input))
        })?;

        if stored.origin != Origin::ClientInput || stored.kind != ValueKind::Uint8 {
            return Err(VoteShieldError::invalid_ciphertext(format!(
                "handle {} is not an 8-bit client input",
                input
            )));
        }

        if proof.as_bytes() != &Self::binding_digest(input, context, submitter)[..] {
            return Err(VoteShieldError::invalid_ciphertext(
                "input proof is not bound to this contract and sender",
            ));
        }

        if stored.value >= upper_bound as u32 {
            return Err(VoteShieldError::invalid_ciphertext(format!(
                "input outside attested range [0, {})",
                upper_bound
            )));
        }

        let value = stored.value;
        let verified = self.store(ValueKind::Uint8, value, Origin::Computed);
        debug!(%input, %verified, "validated encrypted input");
        Ok(verified)
    }

    fn encrypted_equals(
        &mut self,
        ciphertext: &CiphertextHandle,
        plain_index: u8,
    ) -> Result<EncryptedBool> {
        let value = self.operand(ciphertext)?.value;
        let hit = u32::from(value == plain_index as u32);
        let result = self.store(ValueKind::Bool, hit, Origin::Computed);
        Ok(EncryptedBool::from_handle(result))
    }

    fn homomorphic_add(
        &mut self,
        a: &CiphertextHandle,
        b: &CiphertextHandle,
    ) -> Result<CiphertextHandle> {
        let sum = self.operand(a)?.value.wrapping_add(self.operand(b)?.value);
        Ok(self.store(ValueKind::Uint32, sum, Origin::Computed))
    }

    fn encrypt_zero(&mut self) -> Result<CiphertextHandle> {
        Ok(self.store(ValueKind::Uint32, 0, Origin::Computed))
    }

    fn grant_public_decrypt(&mut self, handles: &[CiphertextHandle]) -> Result<()> {
        for handle in handles {
            self.lookup(handle)?;
        }
        self.public.extend(handles.iter().copied());
        debug!(count = handles.len(), "granted public decryption");
        Ok(())
    }

    fn public_decrypt(
        &self,
        handles: &[CiphertextHandle],
    ) -> Result<BTreeMap<CiphertextHandle, u64>> {
        handles
            .iter()
            .map(|handle| {
                let stored = self.lookup(handle)?;
                if !self.public.contains(handle) {
                    return Err(VoteShieldError::DecryptionNotPermitted(*handle));
                }
                Ok((*handle, stored.value as u64))
            })
            .collect()
    }
}
