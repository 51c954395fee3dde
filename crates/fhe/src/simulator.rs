//! Plaintext-backed coprocessor simulator for development and testing.
//!
//! The simulator keeps plaintexts in a private table keyed by handle and
//! hands out only handles. Client inputs are masked with a keystream derived
//! from the simulator key, and input proofs are keyed SHA-256 digests that
//! bind the inputs to a caller and a target contract. None of this is secure;
//! it reproduces the interface and the failure modes of a real coprocessor.
//!
//! [`MockCoprocessor::decrypt`] exists only here, for tests and tooling.

use auction_types::{sha256, Address, Ebool, Euint64, Handle, InputCiphertext};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::coprocessor::{FheCoprocessor, FheResult, InputVerifier};
use crate::error::FheError;

const NONCE_LEN: usize = 16;
const INPUT_LEN: usize = NONCE_LEN + 8;
const DIGEST_LEN: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Plaintext {
    U64(u64),
    Bool(bool),
}

/// In-memory stand-in for an FHE coprocessor.
#[derive(Debug)]
pub struct MockCoprocessor {
    key: [u8; 32],
    domain: [u8; 32],
    next_sequence: u64,
    values: HashMap<Handle, Plaintext>,
    acl: HashSet<(Handle, Address)>,
    transient: HashSet<(Handle, Address)>,
}

impl Default for MockCoprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCoprocessor {
    /// Create a simulator with a random key.
    pub fn new() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self::with_key(key)
    }

    /// Create a simulator with a fixed key.
    pub fn with_key(key: [u8; 32]) -> Self {
        Self {
            key,
            domain: sha256(&key),
            next_sequence: 0,
            values: HashMap::new(),
            acl: HashSet::new(),
            transient: HashSet::new(),
        }
    }

    /// Number of live ciphertexts.
    pub fn ciphertext_count(&self) -> usize {
        self.values.len()
    }

    /// Encrypt client inputs and produce one proof covering all of them.
    ///
    /// This is what client tooling does against a real coprocessor.
    pub fn encrypt_inputs(
        &self,
        values: &[u64],
        caller: Address,
        contract: Address,
    ) -> (Vec<InputCiphertext>, Vec<u8>) {
        let inputs: Vec<InputCiphertext> = values
            .iter()
            .map(|value| {
                let mut nonce = [0u8; NONCE_LEN];
                OsRng.fill_bytes(&mut nonce);
                self.mask_input(*value, nonce)
            })
            .collect();
        let proof = self.prove(&inputs, caller, contract);
        (inputs, proof)
    }

    /// Reveal the plaintext behind an encrypted integer.
    pub fn decrypt(&self, value: Euint64) -> FheResult<u64> {
        match self.plaintext(value.handle())? {
            Plaintext::U64(v) => Ok(v),
            Plaintext::Bool(_) => Err(FheError::TypeMismatch(value.handle())),
        }
    }

    /// Reveal the plaintext behind an encrypted boolean.
    pub fn decrypt_bool(&self, value: Ebool) -> FheResult<bool> {
        match self.plaintext(value.handle())? {
            Plaintext::Bool(b) => Ok(b),
            Plaintext::U64(_) => Err(FheError::TypeMismatch(value.handle())),
        }
    }

    fn mask_input(&self, value: u64, nonce: [u8; NONCE_LEN]) -> InputCiphertext {
        let pad = self.keystream(&nonce);
        let mut bytes = Vec::with_capacity(INPUT_LEN);
        bytes.extend_from_slice(&nonce);
        bytes.extend_from_slice(&(value ^ pad).to_le_bytes());
        InputCiphertext(bytes)
    }

    fn unmask_input(&self, input: &InputCiphertext) -> FheResult<u64> {
        if input.0.len() != INPUT_LEN {
            return Err(FheError::MalformedInput);
        }
        let (nonce, masked) = input.0.split_at(NONCE_LEN);
        let masked: [u8; 8] = masked.try_into().map_err(|_| FheError::MalformedInput)?;
        Ok(u64::from_le_bytes(masked) ^ self.keystream(nonce))
    }

    fn keystream(&self, nonce: &[u8]) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(b"MOCK_FHE_PAD_V1:");
        hasher.update(self.key);
        hasher.update(nonce);
        let digest: [u8; 32] = hasher.finalize().into();
        let mut pad = [0u8; 8];
        pad.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(pad)
    }

    /// Proof layout: `digest(input_0) || ... || digest(input_n) || mac`.
    fn prove(&self, inputs: &[InputCiphertext], caller: Address, contract: Address) -> Vec<u8> {
        let digests: Vec<[u8; 32]> = inputs.iter().map(|input| sha256(&input.0)).collect();
        let mac = self.proof_mac(&digests, caller, contract);
        let mut proof = Vec::with_capacity((digests.len() + 1) * DIGEST_LEN);
        for digest in &digests {
            proof.extend_from_slice(digest);
        }
        proof.extend_from_slice(&mac);
        proof
    }

    fn proof_mac(&self, digests: &[[u8; 32]], caller: Address, contract: Address) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"MOCK_FHE_INPUT_PROOF_V1:");
        hasher.update(self.key);
        hasher.update(caller);
        hasher.update(contract);
        for digest in digests {
            hasher.update(digest);
        }
        hasher.finalize().into()
    }

    fn plaintext(&self, handle: Handle) -> FheResult<Plaintext> {
        self.values
            .get(&handle)
            .copied()
            .ok_or(FheError::UnknownHandle(handle))
    }

    fn u64_operand(&self, value: Euint64) -> FheResult<u64> {
        self.decrypt(value)
    }

    fn bool_operand(&self, value: Ebool) -> FheResult<bool> {
        self.decrypt_bool(value)
    }

    fn store(&mut self, plaintext: Plaintext) -> Handle {
        let handle = Handle::derive(&self.domain, self.next_sequence);
        self.next_sequence += 1;
        self.values.insert(handle, plaintext);
        handle
    }

    fn store_u64(&mut self, value: u64) -> Euint64 {
        Euint64(self.store(Plaintext::U64(value)))
    }

    fn store_bool(&mut self, value: bool) -> Ebool {
        Ebool(self.store(Plaintext::Bool(value)))
    }
}

impl FheCoprocessor for MockCoprocessor {
    fn trivial_encrypt(&mut self, value: u64) -> FheResult<Euint64> {
        Ok(self.store_u64(value))
    }

    fn add(&mut self, lhs: Euint64, rhs: Euint64) -> FheResult<Euint64> {
        let (a, b) = (self.u64_operand(lhs)?, self.u64_operand(rhs)?);
        Ok(self.store_u64(a.wrapping_add(b)))
    }

    fn sub(&mut self, lhs: Euint64, rhs: Euint64) -> FheResult<Euint64> {
        let (a, b) = (self.u64_operand(lhs)?, self.u64_operand(rhs)?);
        Ok(self.store_u64(a.wrapping_sub(b)))
    }

    fn mul(&mut self, lhs: Euint64, rhs: Euint64) -> FheResult<Euint64> {
        let (a, b) = (self.u64_operand(lhs)?, self.u64_operand(rhs)?);
        Ok(self.store_u64(a.wrapping_mul(b)))
    }

    fn lt(&mut self, lhs: Euint64, rhs: Euint64) -> FheResult<Ebool> {
        let (a, b) = (self.u64_operand(lhs)?, self.u64_operand(rhs)?);
        Ok(self.store_bool(a < b))
    }

    fn le(&mut self, lhs: Euint64, rhs: Euint64) -> FheResult<Ebool> {
        let (a, b) = (self.u64_operand(lhs)?, self.u64_operand(rhs)?);
        Ok(self.store_bool(a <= b))
    }

    fn select(
        &mut self,
        condition: Ebool,
        if_true: Euint64,
        if_false: Euint64,
    ) -> FheResult<Euint64> {
        let condition = self.bool_operand(condition)?;
        let (t, f) = (self.u64_operand(if_true)?, self.u64_operand(if_false)?);
        Ok(self.store_u64(if condition { t } else { f }))
    }

    fn allow(&mut self, handle: Handle, account: Address) {
        self.acl.insert((handle, account));
    }

    fn allow_transient(&mut self, handle: Handle, account: Address) {
        self.transient.insert((handle, account));
    }

    fn is_allowed(&self, handle: Handle, account: Address) -> bool {
        self.acl.contains(&(handle, account)) || self.transient.contains(&(handle, account))
    }

    fn clear_transient(&mut self) {
        self.transient.clear();
    }

    fn checkpoint(&self) -> u64 {
        self.next_sequence
    }

    fn discard_since(&mut self, mark: u64) {
        // Sequence numbers are not reused, so discarded handles stay dead.
        let discarded: HashSet<Handle> = (mark..self.next_sequence)
            .map(|sequence| Handle::derive(&self.domain, sequence))
            .collect();
        self.values.retain(|handle, _| !discarded.contains(handle));
        self.acl.retain(|(handle, _)| !discarded.contains(handle));
        self.transient.retain(|(handle, _)| !discarded.contains(handle));
        debug!(count = discarded.len(), "Discarded ciphertexts");
    }
}

impl InputVerifier for MockCoprocessor {
    fn verify_input(
        &mut self,
        input: &InputCiphertext,
        proof: &[u8],
        caller: Address,
        contract: Address,
    ) -> FheResult<Euint64> {
        if proof.len() < 2 * DIGEST_LEN || proof.len() % DIGEST_LEN != 0 {
            return Err(FheError::ProofRejected);
        }
        let (covered, mac) = proof.split_at(proof.len() - DIGEST_LEN);
        let digests: Vec<[u8; 32]> = covered
            .chunks_exact(DIGEST_LEN)
            .map(|chunk| {
                let mut digest = [0u8; 32];
                digest.copy_from_slice(chunk);
                digest
            })
            .collect();

        if self.proof_mac(&digests, caller, contract).as_slice() != mac {
            return Err(FheError::ProofRejected);
        }

        let digest = sha256(&input.0);
        if !digests.contains(&digest) {
            return Err(FheError::InputNotInProof);
        }

        let value = self.unmask_input(input)?;
        let handle = self.store_u64(value);
        debug!(handle = %handle.handle(), "Verified input ciphertext");
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALLER: Address = [1u8; 32];
    const CONTRACT: Address = [2u8; 32];

    fn coprocessor() -> MockCoprocessor {
        MockCoprocessor::with_key([42u8; 32])
    }

    #[test]
    fn test_arithmetic_wraps() {
        let mut fhe = coprocessor();
        let small = fhe.trivial_encrypt(3).unwrap();
        let large = fhe.trivial_encrypt(10).unwrap();

        let diff = fhe.sub(small, large).unwrap();
        assert_eq!(fhe.decrypt(diff).unwrap(), 3u64.wrapping_sub(10));

        let max = fhe.trivial_encrypt(u64::MAX).unwrap();
        let sum = fhe.add(max, small).unwrap();
        assert_eq!(fhe.decrypt(sum).unwrap(), 2);

        let product = fhe.mul(small, large).unwrap();
        assert_eq!(fhe.decrypt(product).unwrap(), 30);
    }

    #[test]
    fn test_comparison_and_select() {
        let mut fhe = coprocessor();
        let a = fhe.trivial_encrypt(4).unwrap();
        let b = fhe.trivial_encrypt(9).unwrap();

        let a_lt_b = fhe.lt(a, b).unwrap();
        let b_lt_a = fhe.lt(b, a).unwrap();
        let a_le_a = fhe.le(a, a).unwrap();
        assert!(fhe.decrypt_bool(a_lt_b).unwrap());
        assert!(!fhe.decrypt_bool(b_lt_a).unwrap());
        assert!(fhe.decrypt_bool(a_le_a).unwrap());

        let picked = fhe.select(a_lt_b, a, b).unwrap();
        assert_eq!(fhe.decrypt(picked).unwrap(), 4);
        let picked = fhe.select(b_lt_a, a, b).unwrap();
        assert_eq!(fhe.decrypt(picked).unwrap(), 9);
    }

    #[test]
    fn test_every_result_gets_a_fresh_handle() {
        let mut fhe = coprocessor();
        let a = fhe.trivial_encrypt(0).unwrap();
        let b = fhe.trivial_encrypt(0).unwrap();
        assert_ne!(a, b);
        assert_eq!(fhe.ciphertext_count(), 2);
    }

    #[test]
    fn test_type_mismatch_and_unknown_handle() {
        let mut fhe = coprocessor();
        let a = fhe.trivial_encrypt(1).unwrap();
        let flag = fhe.lt(a, a).unwrap();

        let as_int = Euint64(flag.handle());
        assert_eq!(
            fhe.add(as_int, a),
            Err(FheError::TypeMismatch(flag.handle()))
        );

        let missing = Euint64(Handle([0xffu8; 32]));
        assert_eq!(
            fhe.mul(missing, a),
            Err(FheError::UnknownHandle(missing.handle()))
        );
    }

    #[test]
    fn test_input_roundtrip_through_verifier() {
        let mut fhe = coprocessor();
        let (inputs, proof) = fhe.encrypt_inputs(&[5, 10], CALLER, CONTRACT);

        let amount = fhe.verify_input(&inputs[0], &proof, CALLER, CONTRACT).unwrap();
        let price = fhe.verify_input(&inputs[1], &proof, CALLER, CONTRACT).unwrap();
        assert_eq!(fhe.decrypt(amount).unwrap(), 5);
        assert_eq!(fhe.decrypt(price).unwrap(), 10);
    }

    #[test]
    fn test_proof_bound_to_caller_and_contract() {
        let mut fhe = coprocessor();
        let (inputs, proof) = fhe.encrypt_inputs(&[5], CALLER, CONTRACT);

        assert_eq!(
            fhe.verify_input(&inputs[0], &proof, [3u8; 32], CONTRACT),
            Err(FheError::ProofRejected)
        );
        assert_eq!(
            fhe.verify_input(&inputs[0], &proof, CALLER, [3u8; 32]),
            Err(FheError::ProofRejected)
        );
    }

    #[test]
    fn test_input_outside_proof_rejected() {
        let mut fhe = coprocessor();
        let (_, proof) = fhe.encrypt_inputs(&[5], CALLER, CONTRACT);
        let (other, _) = fhe.encrypt_inputs(&[6], CALLER, CONTRACT);

        assert_eq!(
            fhe.verify_input(&other[0], &proof, CALLER, CONTRACT),
            Err(FheError::InputNotInProof)
        );
    }

    #[test]
    fn test_malformed_proof_and_input() {
        let mut fhe = coprocessor();
        let (inputs, proof) = fhe.encrypt_inputs(&[5], CALLER, CONTRACT);

        assert_eq!(
            fhe.verify_input(&inputs[0], &proof[..10], CALLER, CONTRACT),
            Err(FheError::ProofRejected)
        );

        let truncated = InputCiphertext(inputs[0].0[..4].to_vec());
        let proof = fhe.prove(std::slice::from_ref(&truncated), CALLER, CONTRACT);
        assert_eq!(
            fhe.verify_input(&truncated, &proof, CALLER, CONTRACT),
            Err(FheError::MalformedInput)
        );
    }

    #[test]
    fn test_simulators_with_different_keys_reject_each_other() {
        let mut fhe = coprocessor();
        let other = MockCoprocessor::with_key([43u8; 32]);
        let (inputs, proof) = other.encrypt_inputs(&[5], CALLER, CONTRACT);

        assert_eq!(
            fhe.verify_input(&inputs[0], &proof, CALLER, CONTRACT),
            Err(FheError::ProofRejected)
        );
    }
}
