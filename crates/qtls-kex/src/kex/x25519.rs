//! X25519 key share (RFC 7748).
//!
//! The fixed-width classical variant: public keys, private keys, and shared
//! secrets are all exactly 32 bytes. Used both standalone (group `X25519`)
//! and as the classical side of hybrid pairings.
//!
//! # Security
//!
//! - The private key is wrapped in `Zeroizing<>` and cleared from memory
//!   when dropped or consumed.
//! - `decap` rejects any ciphertext whose length is not exactly 32 bytes
//!   before invoking the primitive.
//! - An all-zero exchange output (low-order peer point) is rejected.
//!
//! # Example
//!
//! ```
//! use qtls_kex::kex::{KeyShare, X25519KeyShare};
//!
//! # fn example() -> Result<(), qtls_kex::Error> {
//! let mut alice = X25519KeyShare::new();
//! let mut bob = X25519KeyShare::new();
//!
//! // Alice offers her public key; Bob answers with his own and a secret.
//! let mut offer = Vec::new();
//! alice.generate(&mut offer)?;
//!
//! let mut reply = Vec::new();
//! let bob_secret = bob.encap(&mut reply, &offer)?;
//!
//! // Alice recovers the same secret from Bob's reply.
//! let alice_secret = alice.decap(&reply)?;
//! assert_eq!(*alice_secret, *bob_secret);
//! # Ok(())
//! # }
//! ```

use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::group;
use crate::kex::KeyShare;

/// Byte length of X25519 public keys, private keys, and shared secrets.
pub const X25519_SHARE_SIZE: usize = 32;

/// Key share for the `X25519` named group.
pub struct X25519KeyShare {
    /// Private scalar, zeroed on drop. `None` until `generate` or
    /// `deserialize_private_key`; consumed by a successful `decap`.
    private_key: Option<Zeroizing<StaticSecret>>,
}

impl X25519KeyShare {
    /// Create an empty share for the `X25519` group.
    pub fn new() -> Self {
        Self { private_key: None }
    }
}

impl Default for X25519KeyShare {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one X25519 exchange against a peer public key, rejecting low-order
/// results. Shared with the hybrid pairings that carry an X25519 side.
pub(crate) fn exchange(
    private_key: &StaticSecret,
    peer_public: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if peer_public.len() != X25519_SHARE_SIZE {
        return Err(Error::InvalidLength {
            expected: X25519_SHARE_SIZE,
            actual: peer_public.len(),
        });
    }

    let peer_bytes: [u8; 32] = peer_public
        .try_into()
        .map_err(|_| Error::Decode("failed to read X25519 public key".into()))?;
    let shared = private_key.diffie_hellman(&PublicKey::from(peer_bytes));

    // An all-zero output means the peer sent a low-order point.
    if shared.as_bytes() == &[0u8; 32] {
        return Err(Error::Primitive(
            "X25519 produced an all-zero shared secret (low-order peer point)".into(),
        ));
    }

    Ok(Zeroizing::new(shared.as_bytes().to_vec()))
}

impl KeyShare for X25519KeyShare {
    fn group_id(&self) -> u16 {
        group::X25519
    }

    fn generate(&mut self, out: &mut Vec<u8>) -> Result<()> {
        if self.private_key.is_some() {
            return Err(Error::InvalidState("key share already generated"));
        }

        let private_key = StaticSecret::random_from_rng(rand::rngs::OsRng);
        let public_key = PublicKey::from(&private_key);

        out.extend_from_slice(public_key.as_bytes());
        self.private_key = Some(Zeroizing::new(private_key));
        Ok(())
    }

    /// X25519 fits the KEM-shaped contract by using a second key pair's
    /// public key as the ciphertext: a throwaway ephemeral key is generated
    /// here and exchanged against `peer_key`. No instance state is read or
    /// written.
    fn encap(
        &mut self,
        out_artifact: &mut Vec<u8>,
        peer_key: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let ephemeral = StaticSecret::random_from_rng(rand::rngs::OsRng);
        let secret = exchange(&ephemeral, peer_key)?;

        out_artifact.extend_from_slice(PublicKey::from(&ephemeral).as_bytes());
        Ok(secret)
    }

    fn decap(&mut self, artifact: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let private_key = self
            .private_key
            .as_ref()
            .ok_or(Error::InvalidState("decap requires a generated private key"))?;

        let secret = exchange(private_key, artifact)?;
        self.private_key = None;
        Ok(secret)
    }

    fn serialize_private_key(&self, out: &mut Vec<u8>) -> Result<()> {
        let private_key = self
            .private_key
            .as_ref()
            .ok_or(Error::InvalidState("no private key to serialize"))?;
        out.extend_from_slice(&private_key.to_bytes());
        Ok(())
    }

    fn deserialize_private_key(&mut self, input: &[u8]) -> Result<()> {
        if self.private_key.is_some() {
            return Err(Error::InvalidState("key share already generated"));
        }
        if input.len() != X25519_SHARE_SIZE {
            return Err(Error::InvalidLength {
                expected: X25519_SHARE_SIZE,
                actual: input.len(),
            });
        }

        let private_bytes: [u8; 32] = input
            .try_into()
            .map_err(|_| Error::Decode("failed to read X25519 private key".into()))?;
        self.private_key = Some(Zeroizing::new(StaticSecret::from(private_bytes)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// X25519 exchange against the RFC 7748 §6.1 test vectors, driven
    /// through the key-share contract.
    #[test]
    fn test_rfc7748_vectors() {
        let alice_private =
            hex::decode("77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a")
                .unwrap();
        let bob_public =
            hex::decode("de9edb7d7b7dc1b4d35b61c2ece435373f8343c85b78674dadfc7e146f882b4f")
                .unwrap();
        let expected_shared =
            hex::decode("4a5d9d5ba4ce2de1728e3bf480350f25e07e21c947d19e3376f09b3c1e161742")
                .unwrap();

        let mut alice = X25519KeyShare::new();
        alice.deserialize_private_key(&alice_private).unwrap();

        let shared = alice.decap(&bob_public).unwrap();
        assert_eq!(&*shared, expected_shared.as_slice());
    }

    #[test]
    fn test_generate_encap_decap_round_trip() {
        let mut alice = X25519KeyShare::new();
        let mut bob = X25519KeyShare::new();

        let mut offer = Vec::new();
        alice.generate(&mut offer).unwrap();
        assert_eq!(offer.len(), X25519_SHARE_SIZE);

        let mut reply = Vec::new();
        let bob_secret = bob.encap(&mut reply, &offer).unwrap();
        assert_eq!(reply.len(), X25519_SHARE_SIZE);
        assert_eq!(bob_secret.len(), X25519_SHARE_SIZE);

        let alice_secret = alice.decap(&reply).unwrap();
        assert_eq!(&*alice_secret, &*bob_secret);
    }

    /// `encap` is self-contained: it must work on a fresh instance and must
    /// not leave private state usable for a later `decap`.
    #[test]
    fn test_encap_requires_no_state_and_stores_none() {
        let mut alice = X25519KeyShare::new();
        let mut offer = Vec::new();
        alice.generate(&mut offer).unwrap();

        let mut fresh = X25519KeyShare::new();
        let mut reply = Vec::new();
        fresh.encap(&mut reply, &offer).unwrap();

        let result = fresh.decap(&reply);
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_decap_rejects_wrong_length() {
        let mut alice = X25519KeyShare::new();
        let mut offer = Vec::new();
        alice.generate(&mut offer).unwrap();

        for len in [0, 31, 33] {
            let result = alice.decap(&vec![0x42; len]);
            assert!(
                matches!(result, Err(Error::InvalidLength { expected: 32, .. })),
                "length {} must be rejected",
                len
            );
        }
    }

    #[test]
    fn test_decap_rejects_low_order_point() {
        let mut alice = X25519KeyShare::new();
        let mut offer = Vec::new();
        alice.generate(&mut offer).unwrap();

        let result = alice.decap(&[0u8; 32]);
        assert!(matches!(result, Err(Error::Primitive(_))));
    }

    #[test]
    fn test_repeated_generate_is_rejected() {
        let mut share = X25519KeyShare::new();
        let mut out = Vec::new();
        share.generate(&mut out).unwrap();

        let result = share.generate(&mut out);
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    /// Private state survives a serialize/deserialize carry into a fresh
    /// instance, as used across a retry round.
    #[test]
    fn test_private_key_serialization_round_trip() {
        let mut alice = X25519KeyShare::new();
        let mut offer = Vec::new();
        alice.generate(&mut offer).unwrap();

        let mut serialized = Vec::new();
        alice.serialize_private_key(&mut serialized).unwrap();
        assert_eq!(serialized.len(), X25519_SHARE_SIZE);

        let mut restored = X25519KeyShare::new();
        restored.deserialize_private_key(&serialized).unwrap();

        let mut bob = X25519KeyShare::new();
        let mut reply = Vec::new();
        let bob_secret = bob.encap(&mut reply, &offer).unwrap();
        let restored_secret = restored.decap(&reply).unwrap();
        assert_eq!(&*restored_secret, &*bob_secret);
    }

    #[test]
    fn test_decap_consumes_private_state() {
        let mut alice = X25519KeyShare::new();
        let mut bob = X25519KeyShare::new();

        let mut offer = Vec::new();
        alice.generate(&mut offer).unwrap();
        let mut reply = Vec::new();
        bob.encap(&mut reply, &offer).unwrap();

        alice.decap(&reply).unwrap();
        assert!(matches!(
            alice.decap(&reply),
            Err(Error::InvalidState(_))
        ));
    }
}
