//! Short-Weierstrass ECDH key shares (NIST P-256, P-384, P-521).
//!
//! One implementation covers the three NIST groups, selected by curve at
//! construction. Public keys travel in uncompressed SEC 1 form
//! (`0x04 || x || y`) per NIST SP 800-56A; shared secrets are the
//! x-coordinate of the exchange result.
//!
//! # Security
//!
//! - Private scalars live in the curve crates' `SecretKey` types, which
//!   zero their memory on drop; a successful `decap` drops the scalar
//!   immediately.
//! - Shared secrets and serialized scalars use fixed-width encodings,
//!   left-padded to the field/order byte length, so output sizes never
//!   depend on the secret's numeric value.
//! - Peer input is checked for the uncompressed-point tag before any parse,
//!   and parsed (including the on-curve check) before any scalar
//!   multiplication.
//!
//! # Example
//!
//! ```
//! use qtls_kex::group;
//! use qtls_kex::kex::{EcCurve, EcKeyShare, KeyShare};
//!
//! # fn example() -> Result<(), qtls_kex::Error> {
//! let mut alice = EcKeyShare::new(EcCurve::P256, group::SECP256R1);
//! let mut bob = EcKeyShare::new(EcCurve::P256, group::SECP256R1);
//!
//! let mut offer = Vec::new();
//! alice.generate(&mut offer)?;
//! assert_eq!(offer.len(), 65); // 0x04 || x || y
//!
//! let mut reply = Vec::new();
//! let bob_secret = bob.encap(&mut reply, &offer)?;
//! let alice_secret = alice.decap(&reply)?;
//! assert_eq!(*alice_secret, *bob_secret);
//! # Ok(())
//! # }
//! ```

use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::kex::KeyShare;

/// SEC 1 tag byte for uncompressed points.
const UNCOMPRESSED_TAG: u8 = 0x04;

/// The short-Weierstrass curves this variant supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    /// NIST P-256 (secp256r1).
    P256,
    /// NIST P-384 (secp384r1).
    P384,
    /// NIST P-521 (secp521r1).
    P521,
}

impl EcCurve {
    /// Field element width in bytes; also the width of a serialized scalar
    /// and of a shared secret (the orders of these curves have the same
    /// byte length as their fields).
    pub fn field_size(self) -> usize {
        match self {
            EcCurve::P256 => 32,
            EcCurve::P384 => 48,
            EcCurve::P521 => 66,
        }
    }

    /// Length of an uncompressed SEC 1 public encoding: tag plus two
    /// coordinates.
    pub fn share_size(self) -> usize {
        1 + 2 * self.field_size()
    }
}

/// Private scalar for one of the supported curves, zeroed on drop.
enum EcPrivateKey {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    P521(p521::SecretKey),
}

/// Key share for the `P-256`, `P-384`, and `P-521` named groups.
pub struct EcKeyShare {
    curve: EcCurve,
    group_id: u16,
    private_key: Option<EcPrivateKey>,
}

impl EcKeyShare {
    /// Create an empty share for `group_id` on `curve`.
    pub fn new(curve: EcCurve, group_id: u16) -> Self {
        Self {
            curve,
            group_id,
            private_key: None,
        }
    }
}

fn check_uncompressed_tag(bytes: &[u8]) -> Result<()> {
    if bytes.first() != Some(&UNCOMPRESSED_TAG) {
        return Err(Error::Decode(
            "peer value is not an uncompressed EC point".into(),
        ));
    }
    Ok(())
}

fn parse_p256_point(bytes: &[u8]) -> Result<p256::PublicKey> {
    check_uncompressed_tag(bytes)?;
    let point = p256::EncodedPoint::from_bytes(bytes)
        .map_err(|_| Error::Decode("failed to parse P-256 point".into()))?;
    p256::PublicKey::from_encoded_point(&point)
        .into_option()
        .ok_or_else(|| Error::Decode("P-256 point is not on the curve".into()))
}

fn parse_p384_point(bytes: &[u8]) -> Result<p384::PublicKey> {
    check_uncompressed_tag(bytes)?;
    let point = p384::EncodedPoint::from_bytes(bytes)
        .map_err(|_| Error::Decode("failed to parse P-384 point".into()))?;
    p384::PublicKey::from_encoded_point(&point)
        .into_option()
        .ok_or_else(|| Error::Decode("P-384 point is not on the curve".into()))
}

fn parse_p521_point(bytes: &[u8]) -> Result<p521::PublicKey> {
    check_uncompressed_tag(bytes)?;
    let point = p521::EncodedPoint::from_bytes(bytes)
        .map_err(|_| Error::Decode("failed to parse P-521 point".into()))?;
    p521::PublicKey::from_encoded_point(&point)
        .into_option()
        .ok_or_else(|| Error::Decode("P-521 point is not on the curve".into()))
}

impl KeyShare for EcKeyShare {
    fn group_id(&self) -> u16 {
        self.group_id
    }

    fn generate(&mut self, out: &mut Vec<u8>) -> Result<()> {
        if self.private_key.is_some() {
            return Err(Error::InvalidState("key share already generated"));
        }

        let (private_key, public_bytes) = match self.curve {
            EcCurve::P256 => {
                let secret_key = p256::SecretKey::random(&mut rand::rngs::OsRng);
                let public = secret_key.public_key().to_encoded_point(false);
                (EcPrivateKey::P256(secret_key), public.as_bytes().to_vec())
            }
            EcCurve::P384 => {
                let secret_key = p384::SecretKey::random(&mut rand::rngs::OsRng);
                let public = secret_key.public_key().to_encoded_point(false);
                (EcPrivateKey::P384(secret_key), public.as_bytes().to_vec())
            }
            EcCurve::P521 => {
                let secret_key = p521::SecretKey::random(&mut rand::rngs::OsRng);
                let public = secret_key.public_key().to_encoded_point(false);
                (EcPrivateKey::P521(secret_key), public.as_bytes().to_vec())
            }
        };

        out.extend_from_slice(&public_bytes);
        self.private_key = Some(private_key);
        Ok(())
    }

    /// ECDH fits the KEM-shaped contract by using a second key pair's public
    /// key as the ciphertext: a throwaway ephemeral scalar is generated here
    /// and exchanged against `peer_key`. No instance state is read or
    /// written.
    fn encap(
        &mut self,
        out_artifact: &mut Vec<u8>,
        peer_key: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let (public_bytes, secret) = match self.curve {
            EcCurve::P256 => {
                let peer = parse_p256_point(peer_key)?;
                let ephemeral = p256::SecretKey::random(&mut rand::rngs::OsRng);
                let shared =
                    p256::ecdh::diffie_hellman(ephemeral.to_nonzero_scalar(), peer.as_affine());
                let public = ephemeral.public_key().to_encoded_point(false);
                (
                    public.as_bytes().to_vec(),
                    Zeroizing::new(shared.raw_secret_bytes().as_slice().to_vec()),
                )
            }
            EcCurve::P384 => {
                let peer = parse_p384_point(peer_key)?;
                let ephemeral = p384::SecretKey::random(&mut rand::rngs::OsRng);
                let shared =
                    p384::ecdh::diffie_hellman(ephemeral.to_nonzero_scalar(), peer.as_affine());
                let public = ephemeral.public_key().to_encoded_point(false);
                (
                    public.as_bytes().to_vec(),
                    Zeroizing::new(shared.raw_secret_bytes().as_slice().to_vec()),
                )
            }
            EcCurve::P521 => {
                let peer = parse_p521_point(peer_key)?;
                let ephemeral = p521::SecretKey::random(&mut rand::rngs::OsRng);
                let shared =
                    p521::ecdh::diffie_hellman(ephemeral.to_nonzero_scalar(), peer.as_affine());
                let public = ephemeral.public_key().to_encoded_point(false);
                (
                    public.as_bytes().to_vec(),
                    Zeroizing::new(shared.raw_secret_bytes().as_slice().to_vec()),
                )
            }
        };

        out_artifact.extend_from_slice(&public_bytes);
        Ok(secret)
    }

    fn decap(&mut self, artifact: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let private_key = self
            .private_key
            .as_ref()
            .ok_or(Error::InvalidState("decap requires a generated private key"))?;

        // The x-coordinate comes back as fixed-width field bytes, so the
        // secret's length never depends on its value.
        let secret = match private_key {
            EcPrivateKey::P256(secret_key) => {
                let peer = parse_p256_point(artifact)?;
                let shared =
                    p256::ecdh::diffie_hellman(secret_key.to_nonzero_scalar(), peer.as_affine());
                Zeroizing::new(shared.raw_secret_bytes().as_slice().to_vec())
            }
            EcPrivateKey::P384(secret_key) => {
                let peer = parse_p384_point(artifact)?;
                let shared =
                    p384::ecdh::diffie_hellman(secret_key.to_nonzero_scalar(), peer.as_affine());
                Zeroizing::new(shared.raw_secret_bytes().as_slice().to_vec())
            }
            EcPrivateKey::P521(secret_key) => {
                let peer = parse_p521_point(artifact)?;
                let shared =
                    p521::ecdh::diffie_hellman(secret_key.to_nonzero_scalar(), peer.as_affine());
                Zeroizing::new(shared.raw_secret_bytes().as_slice().to_vec())
            }
        };

        self.private_key = None;
        Ok(secret)
    }

    fn serialize_private_key(&self, out: &mut Vec<u8>) -> Result<()> {
        let private_key = self
            .private_key
            .as_ref()
            .ok_or(Error::InvalidState("no private key to serialize"))?;

        // Big-endian, left-padded to the order length.
        match private_key {
            EcPrivateKey::P256(secret_key) => out.extend_from_slice(secret_key.to_bytes().as_slice()),
            EcPrivateKey::P384(secret_key) => out.extend_from_slice(secret_key.to_bytes().as_slice()),
            EcPrivateKey::P521(secret_key) => out.extend_from_slice(secret_key.to_bytes().as_slice()),
        }
        Ok(())
    }

    fn deserialize_private_key(&mut self, input: &[u8]) -> Result<()> {
        if self.private_key.is_some() {
            return Err(Error::InvalidState("key share already generated"));
        }
        if input.len() != self.curve.field_size() {
            return Err(Error::InvalidLength {
                expected: self.curve.field_size(),
                actual: input.len(),
            });
        }

        let private_key = match self.curve {
            EcCurve::P256 => EcPrivateKey::P256(
                p256::SecretKey::from_slice(input)
                    .map_err(|_| Error::Decode("invalid P-256 private scalar".into()))?,
            ),
            EcCurve::P384 => EcPrivateKey::P384(
                p384::SecretKey::from_slice(input)
                    .map_err(|_| Error::Decode("invalid P-384 private scalar".into()))?,
            ),
            EcCurve::P521 => EcPrivateKey::P521(
                p521::SecretKey::from_slice(input)
                    .map_err(|_| Error::Decode("invalid P-521 private scalar".into()))?,
            ),
        };

        self.private_key = Some(private_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group;

    fn share_for(curve: EcCurve) -> EcKeyShare {
        let group_id = match curve {
            EcCurve::P256 => group::SECP256R1,
            EcCurve::P384 => group::SECP384R1,
            EcCurve::P521 => group::SECP521R1,
        };
        EcKeyShare::new(curve, group_id)
    }

    #[test]
    fn test_round_trip_all_curves() {
        for curve in [EcCurve::P256, EcCurve::P384, EcCurve::P521] {
            let mut alice = share_for(curve);
            let mut bob = share_for(curve);

            let mut offer = Vec::new();
            alice.generate(&mut offer).unwrap();
            assert_eq!(offer.len(), curve.share_size());
            assert_eq!(offer[0], 0x04);

            let mut reply = Vec::new();
            let bob_secret = bob.encap(&mut reply, &offer).unwrap();
            assert_eq!(reply.len(), curve.share_size());
            assert_eq!(bob_secret.len(), curve.field_size());

            let alice_secret = alice.decap(&reply).unwrap();
            assert_eq!(&*alice_secret, &*bob_secret, "mismatch on {:?}", curve);
        }
    }

    #[test]
    fn test_decap_rejects_empty_and_bad_tag() {
        let mut alice = share_for(EcCurve::P256);
        let mut offer = Vec::new();
        alice.generate(&mut offer).unwrap();

        assert!(matches!(alice.decap(&[]), Err(Error::Decode(_))));

        // Compressed tag byte must be rejected before any parse.
        let mut compressed = offer.clone();
        compressed[0] = 0x02;
        assert!(matches!(alice.decap(&compressed), Err(Error::Decode(_))));
    }

    #[test]
    fn test_decap_rejects_truncated_and_extended_points() {
        for curve in [EcCurve::P256, EcCurve::P384, EcCurve::P521] {
            let mut alice = share_for(curve);
            let mut bob = share_for(curve);

            let mut offer = Vec::new();
            alice.generate(&mut offer).unwrap();
            let mut reply = Vec::new();
            bob.encap(&mut reply, &offer).unwrap();

            let truncated = &reply[..reply.len() - 1];
            assert!(
                matches!(alice.decap(truncated), Err(Error::Decode(_))),
                "truncated point accepted on {:?}",
                curve
            );

            let mut extended = reply.clone();
            extended.push(0x00);
            assert!(
                matches!(alice.decap(&extended), Err(Error::Decode(_))),
                "extended point accepted on {:?}",
                curve
            );
        }
    }

    #[test]
    fn test_decap_rejects_point_off_curve() {
        let mut alice = share_for(EcCurve::P256);
        let mut bob = share_for(EcCurve::P256);

        let mut offer = Vec::new();
        alice.generate(&mut offer).unwrap();
        let mut reply = Vec::new();
        bob.encap(&mut reply, &offer).unwrap();

        // Flip a coordinate bit: the right length and tag, but (almost
        // surely) no longer a curve point.
        reply[10] ^= 0x01;
        assert!(matches!(alice.decap(&reply), Err(Error::Decode(_))));
    }

    #[test]
    fn test_encap_on_fresh_instance_keeps_no_state() {
        let mut alice = share_for(EcCurve::P384);
        let mut offer = Vec::new();
        alice.generate(&mut offer).unwrap();

        let mut fresh = share_for(EcCurve::P384);
        let mut reply = Vec::new();
        fresh.encap(&mut reply, &offer).unwrap();

        assert!(matches!(
            fresh.decap(&reply),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_private_key_serialization_round_trip() {
        for curve in [EcCurve::P256, EcCurve::P384, EcCurve::P521] {
            let mut alice = share_for(curve);
            let mut offer = Vec::new();
            alice.generate(&mut offer).unwrap();

            let mut serialized = Vec::new();
            alice.serialize_private_key(&mut serialized).unwrap();
            assert_eq!(serialized.len(), curve.field_size());

            let mut restored = share_for(curve);
            restored.deserialize_private_key(&serialized).unwrap();

            let mut bob = share_for(curve);
            let mut reply = Vec::new();
            let bob_secret = bob.encap(&mut reply, &offer).unwrap();
            let restored_secret = restored.decap(&reply).unwrap();
            assert_eq!(&*restored_secret, &*bob_secret);
        }
    }

    #[test]
    fn test_deserialize_rejects_wrong_length_and_zero_scalar() {
        let mut share = share_for(EcCurve::P256);
        assert!(matches!(
            share.deserialize_private_key(&[0x42; 31]),
            Err(Error::InvalidLength { expected: 32, .. })
        ));
        // An all-zero scalar is outside [1, order).
        assert!(matches!(
            share.deserialize_private_key(&[0x00; 32]),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_state_machine() {
        let mut share = share_for(EcCurve::P256);
        assert!(matches!(
            share.decap(&[0x04; 65]),
            Err(Error::InvalidState(_))
        ));

        let mut out = Vec::new();
        share.generate(&mut out).unwrap();
        assert!(matches!(
            share.generate(&mut out),
            Err(Error::InvalidState(_))
        ));
    }
}
