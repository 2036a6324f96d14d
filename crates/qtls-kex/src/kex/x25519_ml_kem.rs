//! The fixed X25519 + ML-KEM-768 hybrid key share.
//!
//! One hard-coded pairing with a hand-specified concatenation encoding
//! (draft-ietf-tls-hybrid-design §3.2): every artifact and every secret is
//! the classical segment followed by the post-quantum segment, at fixed
//! byte offsets. The exchange is secure unless both components are broken.
//!
//! Wire layout:
//! - offer: X25519 public key (32) ‖ ML-KEM-768 encapsulation key (1184)
//! - answer: X25519 public key (32) ‖ ML-KEM-768 ciphertext (1088)
//! - secret: X25519 output (32) ‖ ML-KEM-768 shared secret (32)
//!
//! Any peer blob whose total length differs is rejected before either
//! sub-mechanism is invoked.

use hybrid_array::typenum::Unsigned;
use kem::{Decapsulate, Encapsulate};
use ml_kem::kem::{DecapsulationKey, EncapsulationKey};
use ml_kem::{EncodedSizeUser, KemCore, MlKem768, MlKem768Params};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::group;
use crate::kex::x25519::{exchange, X25519_SHARE_SIZE};
use crate::kex::KeyShare;

const MLKEM768_PUBLIC_KEY_SIZE: usize =
    <EncapsulationKey<MlKem768Params> as EncodedSizeUser>::EncodedSize::USIZE;
const MLKEM768_CIPHERTEXT_SIZE: usize = <MlKem768 as KemCore>::CiphertextSize::USIZE;
const MLKEM768_SHARED_SECRET_SIZE: usize = <MlKem768 as KemCore>::SharedKeySize::USIZE;

/// Length of a generated offer: X25519 then ML-KEM-768 public key.
pub const OFFER_SIZE: usize = X25519_SHARE_SIZE + MLKEM768_PUBLIC_KEY_SIZE;
/// Length of an encap answer: X25519 public key then ML-KEM-768 ciphertext.
pub const ARTIFACT_SIZE: usize = X25519_SHARE_SIZE + MLKEM768_CIPHERTEXT_SIZE;
/// Length of the combined shared secret.
pub const SECRET_SIZE: usize = X25519_SHARE_SIZE + MLKEM768_SHARED_SECRET_SIZE;

/// Private state: both components are set together by `generate`.
struct HybridPrivateKey {
    x25519: Zeroizing<StaticSecret>,
    /// Encoded ML-KEM-768 decapsulation key.
    ml_kem: Zeroizing<Vec<u8>>,
}

/// Key share for the `X25519MlKem768` named group.
pub struct X25519MlKem768KeyShare {
    private_key: Option<HybridPrivateKey>,
}

impl X25519MlKem768KeyShare {
    /// Create an empty share for the `X25519MlKem768` group.
    pub fn new() -> Self {
        Self { private_key: None }
    }
}

impl Default for X25519MlKem768KeyShare {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyShare for X25519MlKem768KeyShare {
    fn group_id(&self) -> u16 {
        group::X25519_MLKEM768
    }

    fn generate(&mut self, out: &mut Vec<u8>) -> Result<()> {
        if self.private_key.is_some() {
            return Err(Error::InvalidState("key share already generated"));
        }

        let x25519_private = StaticSecret::random_from_rng(rand::rngs::OsRng);
        let x25519_public = PublicKey::from(&x25519_private);

        let mut rng = rand::rngs::OsRng;
        let (dk, ek) = MlKem768::generate(&mut rng);

        out.extend_from_slice(x25519_public.as_bytes());
        out.extend_from_slice(&ek.as_bytes());
        self.private_key = Some(HybridPrivateKey {
            x25519: Zeroizing::new(x25519_private),
            ml_kem: Zeroizing::new(dk.as_bytes().to_vec()),
        });
        Ok(())
    }

    /// The classical half generates a throwaway ephemeral key and exchanges
    /// it against the peer's X25519 sub-key; the post-quantum half runs a
    /// genuine encapsulation against the peer's ML-KEM sub-key. Neither
    /// leaves private state on the instance.
    fn encap(
        &mut self,
        out_artifact: &mut Vec<u8>,
        peer_key: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        if peer_key.len() != OFFER_SIZE {
            return Err(Error::InvalidLength {
                expected: OFFER_SIZE,
                actual: peer_key.len(),
            });
        }
        let (peer_x25519, peer_ml_kem) = peer_key.split_at(X25519_SHARE_SIZE);

        let ephemeral = StaticSecret::random_from_rng(rand::rngs::OsRng);
        let x25519_secret = exchange(&ephemeral, peer_x25519)?;

        let ek = EncapsulationKey::<MlKem768Params>::from_bytes(
            &peer_ml_kem
                .try_into()
                .map_err(|_| Error::Decode("failed to read encapsulation key".into()))?,
        );
        let mut rng = rand::rngs::OsRng;
        let (ciphertext, ml_kem_secret) = ek
            .encapsulate(&mut rng)
            .map_err(|e| Error::Primitive(format!("ML-KEM encapsulation failed: {:?}", e)))?;

        out_artifact.extend_from_slice(PublicKey::from(&ephemeral).as_bytes());
        out_artifact.extend_from_slice(&ciphertext);

        let mut secret = Zeroizing::new(Vec::with_capacity(SECRET_SIZE));
        secret.extend_from_slice(&x25519_secret);
        secret.extend_from_slice(&ml_kem_secret);
        Ok(secret)
    }

    fn decap(&mut self, artifact: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let private_key = self
            .private_key
            .as_ref()
            .ok_or(Error::InvalidState("decap requires a generated private key"))?;

        if artifact.len() != ARTIFACT_SIZE {
            return Err(Error::InvalidLength {
                expected: ARTIFACT_SIZE,
                actual: artifact.len(),
            });
        }
        let (peer_x25519, ml_kem_ciphertext) = artifact.split_at(X25519_SHARE_SIZE);

        let x25519_secret = exchange(&private_key.x25519, peer_x25519)?;

        let dk = DecapsulationKey::<MlKem768Params>::from_bytes(
            &private_key.ml_kem.as_slice().try_into().map_err(|_| {
                Error::Primitive("stored decapsulation key has the wrong length".into())
            })?,
        );
        let ml_kem_secret = dk
            .decapsulate(
                &ml_kem_ciphertext
                    .try_into()
                    .map_err(|_| Error::Decode("failed to read ciphertext".into()))?,
            )
            .map_err(|e| Error::Primitive(format!("ML-KEM decapsulation failed: {:?}", e)))?;

        let mut secret = Zeroizing::new(Vec::with_capacity(SECRET_SIZE));
        secret.extend_from_slice(&x25519_secret);
        secret.extend_from_slice(&ml_kem_secret);

        self.private_key = None;
        Ok(secret)
    }
}
