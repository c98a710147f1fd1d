//! Boundary to the external FHE service
//!
//! The engine never sees plaintexts. Everything it does to a ballot or a tally
//! goes through [`FheService`]: input validation, the per-option equality test,
//! homomorphic addition, fresh encrypted zeros, and the public-decryption
//! access list.

pub mod mock;

use std::collections::BTreeMap;

use voteshield_runtime::{Address, CiphertextHandle, EncryptedBool, InputProof, Result};

pub use mock::MockFhe;

/// Capabilities the poll engine consumes from the FHE coprocessor.
pub trait FheService {
    /// Checks an encrypted input submitted by `submitter` to the contract at `context`.
    ///
    /// The proof must be bound to both `context` and `submitter`, and must attest
    /// that the plaintext lies in `[0, upper_bound)`. Returns the handle the
    /// engine may compute on.
    fn validate_encrypted_input(
        &mut self,
        input: &CiphertextHandle,
        proof: &InputProof,
        context: &Address,
        submitter: &Address,
        upper_bound: u8,
    ) -> Result<CiphertextHandle>;

    /// Encrypted `plaintext(ciphertext) == plain_index`.
    fn encrypted_equals(
        &mut self,
        ciphertext: &CiphertextHandle,
        plain_index: u8,
    ) -> Result<EncryptedBool>;

    /// Homomorphic sum of two 32-bit encrypted integers (wrapping).
    fn homomorphic_add(
        &mut self,
        a: &CiphertextHandle,
        b: &CiphertextHandle,
    ) -> Result<CiphertextHandle>;

    /// A fresh encryption of zero.
    fn encrypt_zero(&mut self) -> Result<CiphertextHandle>;

    /// Marks every handle in `handles` publicly decryptable.
    ///
    /// All-or-nothing: if any handle is unknown, no grant is recorded.
    fn grant_public_decrypt(&mut self, handles: &[CiphertextHandle]) -> Result<()>;

    /// Decrypts handles for anyone, refusing any handle without a prior grant.
    fn public_decrypt(
        &self,
        handles: &[CiphertextHandle],
    ) -> Result<BTreeMap<CiphertextHandle, u64>>;
}
