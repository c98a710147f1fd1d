//! Core types for VoteShield
//!
//! This module defines the value types shared by the polling engine, the FHE
//! service boundary and the command-line tools: account addresses, opaque
//! ciphertext handles, encrypted-input proofs and the per-transition execution
//! context.

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Poll identifier. Allocated from 1 upwards, never reused.
pub type PollId = u64;

fn parse_hex_array<const N: usize>(s: &str) -> Result<[u8; N], String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|e| format!("invalid hex '{}': {}", s, e))?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| format!("expected {} bytes, got {}", N, bytes.len()))
}

/// Implements `0x`-prefixed hex `Display`/`FromStr` and string-based serde for a byte newtype.
macro_rules! hex_newtype {
    ($name:ident, $len:expr) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hex_array::<$len>(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

/// Account identity supplied by the transaction submitter
///
/// The engine never verifies signatures; an `Address` is whatever identity the
/// hosting ledger attributes a transaction to.
///
/// # Examples
///
/// ```
/// use voteshield_runtime::Address;
///
/// let alice: Address = "0x00000000000000000000000000000000000000a1".parse().unwrap();
/// assert_eq!(alice.to_string(), "0x00000000000000000000000000000000000000a1");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

hex_newtype!(Address, 20);

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

/// Opaque reference to a value held by the FHE service
///
/// Handles are passed by value and only ever combined through the service's
/// homomorphic operations. Comparing two handles tells nothing about the
/// plaintexts behind them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CiphertextHandle([u8; 32]);

hex_newtype!(CiphertextHandle, 32);

impl CiphertextHandle {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Handle to an encrypted boolean whose plaintext is 0 or 1
///
/// Kept distinct from [`CiphertextHandle`] so an indicator cannot be confused
/// with a running tally, while still being addable into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedBool(CiphertextHandle);

impl EncryptedBool {
    pub const fn from_handle(handle: CiphertextHandle) -> Self {
        Self(handle)
    }

    pub fn handle(&self) -> &CiphertextHandle {
        &self.0
    }
}

/// Proof accompanying an encrypted input
///
/// Produced client-side together with the input ciphertext. The FHE service
/// checks it against the target contract and the submitting account, so a
/// proof cannot be replayed from another context or by another sender.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputProof {
    /// Raw bytes of the serialized proof
    proof_data: Vec<u8>,
}

impl InputProof {
    pub fn new(proof_data: Vec<u8>) -> Self {
        Self { proof_data }
    }

    pub fn size(&self) -> usize {
        self.proof_data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.proof_data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.proof_data
    }
}

impl fmt::Debug for InputProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InputProof(0x{})", hex::encode(&self.proof_data))
    }
}

/// Execution context of a single ledger transition
///
/// Every state transition is evaluated against the sender and the timestamp
/// the hosting ledger assigned to it; the engine has no clock of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxContext {
    pub sender: Address,
    /// Unix seconds
    pub timestamp: u64,
}

impl TxContext {
    pub fn new(sender: Address, timestamp: u64) -> Self {
        Self { sender, timestamp }
    }
}
