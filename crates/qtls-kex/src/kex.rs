//! The key-share contract and factory.
//!
//! A [`KeyShare`] is created per handshake attempt for one named group and
//! driven through generate → (send bytes) → peer encap/decap → shared
//! secret. The contract is uniform over mechanisms with different
//! cryptographic shapes; the Diffie-Hellman/KEM asymmetry of `encap` is part
//! of each variant's documented contract:
//!
//! - For DH-style groups, `encap` generates a throwaway local ephemeral key
//!   and performs the exchange against the peer's public key in one step. It
//!   needs no prior `generate` call and leaves no private state behind.
//! - For genuine KEMs, `encap` consumes only the peer's public key and
//!   produces a ciphertext plus secret; there is nothing to `decap` later on
//!   that instance.
//!
//! `decap`, by contrast, always requires the private state established by a
//! prior `generate` (or `deserialize_private_key`) and consumes it on
//! success.

use zeroize::Zeroizing;

use crate::error::Result;
use crate::group::{self, Algorithm};

pub mod ec;
pub mod hybrid;
pub mod ml_kem;
pub mod x25519;
pub mod x25519_ml_kem;

pub use ec::{EcCurve, EcKeyShare};
pub use hybrid::HybridKeyShare;
pub use ml_kem::{MlKemKeyShare, MlKemVariant};
pub use x25519::X25519KeyShare;
pub use x25519_ml_kem::X25519MlKem768KeyShare;

/// One side of a key exchange, bound to a single named group.
///
/// Instances are owned by one handshake attempt and are not shared between
/// threads. Wire artifacts are appended to the caller's buffer; on failure
/// nothing is appended and no secret is returned. Shared secrets transfer
/// ownership to the caller and wipe themselves on drop.
pub trait KeyShare: Send {
    /// The group id this share was created for.
    fn group_id(&self) -> u16;

    /// Generate a local key pair, appending the public encoding to `out`
    /// and retaining the private state for a later [`KeyShare::decap`].
    ///
    /// Fails if the instance already holds private state; a fresh handshake
    /// attempt creates a fresh instance.
    fn generate(&mut self, out: &mut Vec<u8>) -> Result<()>;

    /// Perform the responding side of the exchange in one step: consume the
    /// peer's public encoding, append the artifact to send back to
    /// `out_artifact`, and return the shared secret.
    ///
    /// Does not read or create durable private state; see the module docs
    /// for the DH/KEM asymmetry behind this.
    fn encap(&mut self, out_artifact: &mut Vec<u8>, peer_key: &[u8])
        -> Result<Zeroizing<Vec<u8>>>;

    /// Recover the shared secret from the peer's artifact using the private
    /// state retained by [`KeyShare::generate`], consuming that state.
    ///
    /// The artifact's length and structure are validated before any
    /// primitive is invoked.
    fn decap(&mut self, artifact: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// Export the private state at a fixed length per group, appending it to
    /// `out`. Used only to carry state across a single retry round of the
    /// handshake. Groups without a fixed private encoding do not support
    /// this.
    fn serialize_private_key(&self, out: &mut Vec<u8>) -> Result<()> {
        let _ = out;
        Err(crate::error::Error::SerializationUnsupported)
    }

    /// Import private state previously exported by
    /// [`KeyShare::serialize_private_key`], leaving the instance ready for
    /// [`KeyShare::decap`].
    fn deserialize_private_key(&mut self, input: &[u8]) -> Result<()> {
        let _ = input;
        Err(crate::error::Error::SerializationUnsupported)
    }
}

/// Construct a key share for `group_id`.
///
/// Returns `None` for ids not present in the registry. An unsupported group
/// is a normal negotiation outcome, not an error; the caller falls back to
/// its next candidate.
pub fn create(group_id: u16) -> Option<Box<dyn KeyShare>> {
    let group = group::by_group_id(group_id).or_else(|| {
        tracing::warn!(group_id, "key share requested for unsupported group");
        None
    })?;

    tracing::debug!(group_id, name = group.name, "creating key share");
    let share: Box<dyn KeyShare> = match group.algorithm {
        Algorithm::EcP256 => Box::new(EcKeyShare::new(EcCurve::P256, group_id)),
        Algorithm::EcP384 => Box::new(EcKeyShare::new(EcCurve::P384, group_id)),
        Algorithm::EcP521 => Box::new(EcKeyShare::new(EcCurve::P521, group_id)),
        Algorithm::X25519 => Box::new(X25519KeyShare::new()),
        Algorithm::X25519MlKem768 => Box::new(X25519MlKem768KeyShare::new()),
        Algorithm::MlKem(name) => {
            Box::new(MlKemKeyShare::new(group_id, MlKemVariant::from_name(name)?))
        }
        Algorithm::Hybrid { classical, kem } => Box::new(HybridKeyShare::new(
            group_id,
            classical,
            MlKemVariant::from_name(kem)?,
        )),
    };
    Some(share)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::named_groups;

    #[test]
    fn test_create_covers_every_registered_group() {
        for group in named_groups() {
            let share = create(group.id)
                .unwrap_or_else(|| panic!("no key share for registered group {}", group.name));
            assert_eq!(share.group_id(), group.id);
        }
    }

    #[test]
    fn test_create_unregistered_id_is_unsupported() {
        assert!(create(0xFFFF).is_none());
        assert!(create(0x0000).is_none());
    }

    #[test]
    fn test_round_trip_through_trait_objects() {
        for group in named_groups() {
            let mut alice = create(group.id).unwrap();
            let mut bob = create(group.id).unwrap();

            let mut offer = Vec::new();
            alice.generate(&mut offer).unwrap();

            let mut artifact = Vec::new();
            let bob_secret = bob.encap(&mut artifact, &offer).unwrap();
            let alice_secret = alice.decap(&artifact).unwrap();

            assert_eq!(
                &*alice_secret, &*bob_secret,
                "secret mismatch for {}",
                group.name
            );
            assert!(!alice_secret.is_empty());
        }
    }
}
