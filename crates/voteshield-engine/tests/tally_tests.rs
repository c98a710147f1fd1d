//! Tests for encrypted tally accumulation and atomicity of rejected votes

use voteshield_engine::{
    Address, CiphertextHandle, EngineConfig, InputProof, MockFhe, TxContext, VoteShield,
    VoteShieldError,
};

const NOW: u64 = 1_000;
const END: u64 = 2_000;

fn contract() -> Address {
    Address::new([0xc0; 20])
}

fn voter(n: u8) -> Address {
    Address::new([n; 20])
}

fn engine_with_poll(options: &[&str]) -> (VoteShield<MockFhe>, u64) {
    let mut shield =
        VoteShield::new(EngineConfig::new(contract(), voter(0xd0)), MockFhe::with_seed(5));
    let poll_id =
        shield.create_poll(&TxContext::new(voter(0xd0), NOW), "poll", options, END).unwrap();
    (shield, poll_id)
}

fn tallies(shield: &VoteShield<MockFhe>, poll_id: u64) -> Vec<CiphertextHandle> {
    let count = shield.poll_meta(poll_id).unwrap().options_count;
    (0..count).map(|i| shield.encrypted_count(poll_id, i).unwrap()).collect()
}

fn decrypted(shield: &VoteShield<MockFhe>, poll_id: u64) -> Vec<u64> {
    tallies(shield, poll_id).iter().map(|h| shield.fhe().debug_decrypt(h).unwrap()).collect()
}

#[test]
fn test_counts_match_choices() {
    let (mut shield, poll_id) = engine_with_poll(&["a", "b", "c", "d"]);
    let choices = [0u8, 3, 3, 1, 3, 0, 2];

    for (n, &choice) in choices.iter().enumerate() {
        let who = voter(n as u8 + 1);
        let (input, proof) = shield.fhe_mut().encrypt_input(choice, &contract(), &who);
        shield.vote(&TxContext::new(who, NOW + n as u64), poll_id, &input, &proof).unwrap();
    }

    let counts = decrypted(&shield, poll_id);
    assert_eq!(counts, vec![2, 1, 1, 3]);
    assert_eq!(counts.iter().sum::<u64>(), choices.len() as u64);
}

#[test]
fn test_every_option_changes_on_every_vote() {
    let (mut shield, poll_id) = engine_with_poll(&["a", "b", "c"]);

    for (n, choice) in [2u8, 0].into_iter().enumerate() {
        let before = tallies(&shield, poll_id);
        let who = voter(n as u8 + 1);
        let (input, proof) = shield.fhe_mut().encrypt_input(choice, &contract(), &who);
        shield.vote(&TxContext::new(who, NOW), poll_id, &input, &proof).unwrap();

        let after = tallies(&shield, poll_id);
        assert!(before.iter().zip(&after).all(|(b, a)| b != a));
    }
}

#[test]
fn test_duplicate_vote_leaves_tallies_unchanged() {
    let (mut shield, poll_id) = engine_with_poll(&["a", "b"]);
    let who = voter(1);

    let (input, proof) = shield.fhe_mut().encrypt_input(0, &contract(), &who);
    shield.vote(&TxContext::new(who, NOW), poll_id, &input, &proof).unwrap();
    let before = tallies(&shield, poll_id);

    let (input, proof) = shield.fhe_mut().encrypt_input(1, &contract(), &who);
    let result = shield.vote(&TxContext::new(who, NOW), poll_id, &input, &proof);

    assert!(matches!(result, Err(VoteShieldError::DuplicateVote { .. })));
    assert_eq!(tallies(&shield, poll_id), before);
    assert_eq!(decrypted(&shield, poll_id), vec![1, 0]);
}

#[test]
fn test_choice_outside_options_is_rejected() {
    let (mut shield, poll_id) = engine_with_poll(&["a", "b"]);
    let who = voter(1);
    let before = tallies(&shield, poll_id);

    let (input, proof) = shield.fhe_mut().encrypt_input(2, &contract(), &who);
    let result = shield.vote(&TxContext::new(who, NOW), poll_id, &input, &proof);

    assert!(matches!(result, Err(VoteShieldError::InvalidCiphertext(_))));
    assert_eq!(tallies(&shield, poll_id), before);
    assert!(!shield.has_voted(poll_id, &who));
}

#[test]
fn test_proof_bound_to_sender() {
    let (mut shield, poll_id) = engine_with_poll(&["a", "b"]);
    let alice = voter(1);
    let mallory = voter(2);

    let (input, proof) = shield.fhe_mut().encrypt_input(1, &contract(), &alice);
    let result = shield.vote(&TxContext::new(mallory, NOW), poll_id, &input, &proof);

    assert!(matches!(result, Err(VoteShieldError::InvalidCiphertext(_))));
    assert!(!shield.has_voted(poll_id, &mallory));

    // The rightful owner can still use it
    assert!(shield.vote(&TxContext::new(alice, NOW), poll_id, &input, &proof).is_ok());
}

#[test]
fn test_proof_bound_to_contract() {
    let (mut shield, poll_id) = engine_with_poll(&["a", "b"]);
    let alice = voter(1);
    let other_contract = Address::new([0x0c; 20]);

    let (input, proof) = shield.fhe_mut().encrypt_input(1, &other_contract, &alice);
    let result = shield.vote(&TxContext::new(alice, NOW), poll_id, &input, &proof);

    assert!(matches!(result, Err(VoteShieldError::InvalidCiphertext(_))));
}

#[test]
fn test_tampered_proof_rejected() {
    let (mut shield, poll_id) = engine_with_poll(&["a", "b"]);
    let alice = voter(1);

    let (input, proof) = shield.fhe_mut().encrypt_input(0, &contract(), &alice);
    let mut bytes = proof.into_bytes();
    bytes[0] ^= 0x01;

    let result = shield.vote(&TxContext::new(alice, NOW), poll_id, &input, &InputProof::new(bytes));
    assert!(matches!(result, Err(VoteShieldError::InvalidCiphertext(_))));
}

#[test]
fn test_tally_handle_cannot_be_submitted_as_choice() {
    let (mut shield, poll_id) = engine_with_poll(&["a", "b"]);
    let alice = voter(1);
    let tally = shield.encrypted_count(poll_id, 0).unwrap();

    let empty = InputProof::new(vec![]);
    let result = shield.vote(&TxContext::new(alice, NOW), poll_id, &tally, &empty);
    assert!(matches!(result, Err(VoteShieldError::InvalidCiphertext(_))));
}

#[test]
fn test_each_vote_appends_one_plus_two_per_option_ciphertexts() {
    for options in [&["a", "b"][..], &["a", "b", "c", "d"][..]] {
        let (mut shield, poll_id) = engine_with_poll(options);
        let who = voter(1);

        let (input, proof) = shield.fhe_mut().encrypt_input(1, &contract(), &who);
        let before = shield.fhe().ciphertext_count();
        shield.vote(&TxContext::new(who, NOW), poll_id, &input, &proof).unwrap();

        let added = shield.fhe().ciphertext_count() - before;
        assert_eq!(added, 1 + 2 * options.len());
    }
}

#[test]
fn test_rejected_vote_appends_no_ciphertexts() {
    let (mut shield, poll_id) = engine_with_poll(&["a", "b"]);
    let who = voter(1);

    let (input, proof) = shield.fhe_mut().encrypt_input(2, &contract(), &who);
    let before = shield.fhe().ciphertext_count();
    assert!(shield.vote(&TxContext::new(who, NOW), poll_id, &input, &proof).is_err());

    assert_eq!(shield.fhe().ciphertext_count(), before);
}
