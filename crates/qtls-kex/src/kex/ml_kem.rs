//! ML-KEM key shares (FIPS 203).
//!
//! A generic wrapper over the ML-KEM parameter sets, selected by algorithm
//! name at construction. Unlike the classical variants, buffer sizes are not
//! fixed constants of this module: all four lengths (encapsulation key,
//! decapsulation key, ciphertext, shared secret) are queried from the
//! selected parameter set's encoded-size types and revalidated on every
//! call, since a mismatched size is the primary attacker-controlled failure
//! surface.
//!
//! # Security
//!
//! - The decapsulation key is held in `Zeroizing<>` and cleared when
//!   dropped or consumed.
//! - `encap` consumes only the peer's encapsulation key and retains no
//!   private state at all; there is nothing to `decap` afterwards on the
//!   same instance.
//!
//! # Example
//!
//! ```
//! use qtls_kex::group;
//! use qtls_kex::kex::{KeyShare, MlKemKeyShare, MlKemVariant};
//!
//! # fn example() -> Result<(), qtls_kex::Error> {
//! let variant = MlKemVariant::from_name("mlkem768").unwrap();
//! let mut recipient = MlKemKeyShare::new(group::MLKEM768, variant);
//!
//! let mut offer = Vec::new();
//! recipient.generate(&mut offer)?;
//! assert_eq!(offer.len(), 1184);
//!
//! let mut sender = MlKemKeyShare::new(group::MLKEM768, variant);
//! let mut ciphertext = Vec::new();
//! let sender_secret = sender.encap(&mut ciphertext, &offer)?;
//! assert_eq!(ciphertext.len(), 1088);
//!
//! let recipient_secret = recipient.decap(&ciphertext)?;
//! assert_eq!(*sender_secret, *recipient_secret);
//! # Ok(())
//! # }
//! ```

use hybrid_array::typenum::Unsigned;
use kem::{Decapsulate, Encapsulate};
use ml_kem::kem::{DecapsulationKey, EncapsulationKey};
use ml_kem::{
    EncodedSizeUser, KemCore, MlKem1024, MlKem1024Params, MlKem512, MlKem512Params, MlKem768,
    MlKem768Params,
};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::kex::KeyShare;

/// ML-KEM parameter sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MlKemVariant {
    /// ML-KEM-512 (NIST security category 1).
    MlKem512,
    /// ML-KEM-768 (NIST security category 3).
    MlKem768,
    /// ML-KEM-1024 (NIST security category 5).
    MlKem1024,
}

impl MlKemVariant {
    /// Resolve an algorithm name to a parameter set.
    ///
    /// The match is exact; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mlkem512" => Some(MlKemVariant::MlKem512),
            "mlkem768" => Some(MlKemVariant::MlKem768),
            "mlkem1024" => Some(MlKemVariant::MlKem1024),
            _ => None,
        }
    }

    /// The algorithm name this parameter set was selected by.
    pub fn name(self) -> &'static str {
        match self {
            MlKemVariant::MlKem512 => "mlkem512",
            MlKemVariant::MlKem768 => "mlkem768",
            MlKemVariant::MlKem1024 => "mlkem1024",
        }
    }

    /// Encapsulation-key (public key) length in bytes, as declared by the
    /// primitive.
    pub fn public_key_size(self) -> usize {
        match self {
            MlKemVariant::MlKem512 => {
                <EncapsulationKey<MlKem512Params> as EncodedSizeUser>::EncodedSize::USIZE
            }
            MlKemVariant::MlKem768 => {
                <EncapsulationKey<MlKem768Params> as EncodedSizeUser>::EncodedSize::USIZE
            }
            MlKemVariant::MlKem1024 => {
                <EncapsulationKey<MlKem1024Params> as EncodedSizeUser>::EncodedSize::USIZE
            }
        }
    }

    /// Decapsulation-key (private key) length in bytes, as declared by the
    /// primitive.
    pub fn private_key_size(self) -> usize {
        match self {
            MlKemVariant::MlKem512 => {
                <DecapsulationKey<MlKem512Params> as EncodedSizeUser>::EncodedSize::USIZE
            }
            MlKemVariant::MlKem768 => {
                <DecapsulationKey<MlKem768Params> as EncodedSizeUser>::EncodedSize::USIZE
            }
            MlKemVariant::MlKem1024 => {
                <DecapsulationKey<MlKem1024Params> as EncodedSizeUser>::EncodedSize::USIZE
            }
        }
    }

    /// Ciphertext length in bytes, as declared by the primitive.
    pub fn ciphertext_size(self) -> usize {
        match self {
            MlKemVariant::MlKem512 => <MlKem512 as KemCore>::CiphertextSize::USIZE,
            MlKemVariant::MlKem768 => <MlKem768 as KemCore>::CiphertextSize::USIZE,
            MlKemVariant::MlKem1024 => <MlKem1024 as KemCore>::CiphertextSize::USIZE,
        }
    }

    /// Shared-secret length in bytes, as declared by the primitive.
    pub fn shared_secret_size(self) -> usize {
        match self {
            MlKemVariant::MlKem512 => <MlKem512 as KemCore>::SharedKeySize::USIZE,
            MlKemVariant::MlKem768 => <MlKem768 as KemCore>::SharedKeySize::USIZE,
            MlKemVariant::MlKem1024 => <MlKem1024 as KemCore>::SharedKeySize::USIZE,
        }
    }
}

/// Key share for the standalone ML-KEM named groups.
pub struct MlKemKeyShare {
    group_id: u16,
    variant: MlKemVariant,
    /// Encoded decapsulation key, zeroed on drop. `None` until `generate`;
    /// consumed by a successful `decap`.
    decapsulation_key: Option<Zeroizing<Vec<u8>>>,
}

impl MlKemKeyShare {
    /// Create an empty share for `group_id` using `variant`.
    pub fn new(group_id: u16, variant: MlKemVariant) -> Self {
        Self {
            group_id,
            variant,
            decapsulation_key: None,
        }
    }

    /// The parameter set this share wraps.
    pub fn variant(&self) -> MlKemVariant {
        self.variant
    }
}

impl KeyShare for MlKemKeyShare {
    fn group_id(&self) -> u16 {
        self.group_id
    }

    fn generate(&mut self, out: &mut Vec<u8>) -> Result<()> {
        if self.decapsulation_key.is_some() {
            return Err(Error::InvalidState("key share already generated"));
        }

        let mut rng = rand::rngs::OsRng;
        let (dk_bytes, ek_bytes) = match self.variant {
            MlKemVariant::MlKem512 => {
                let (dk, ek) = MlKem512::generate(&mut rng);
                (dk.as_bytes().to_vec(), ek.as_bytes().to_vec())
            }
            MlKemVariant::MlKem768 => {
                let (dk, ek) = MlKem768::generate(&mut rng);
                (dk.as_bytes().to_vec(), ek.as_bytes().to_vec())
            }
            MlKemVariant::MlKem1024 => {
                let (dk, ek) = MlKem1024::generate(&mut rng);
                (dk.as_bytes().to_vec(), ek.as_bytes().to_vec())
            }
        };

        out.extend_from_slice(&ek_bytes);
        self.decapsulation_key = Some(Zeroizing::new(dk_bytes));
        Ok(())
    }

    /// Genuine KEM encapsulation: consumes only the peer's encapsulation
    /// key, emits the ciphertext, and stores nothing on the instance.
    fn encap(
        &mut self,
        out_artifact: &mut Vec<u8>,
        peer_key: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let expected = self.variant.public_key_size();
        if peer_key.len() != expected {
            return Err(Error::InvalidLength {
                expected,
                actual: peer_key.len(),
            });
        }

        let mut rng = rand::rngs::OsRng;
        let (ct_bytes, secret) = match self.variant {
            MlKemVariant::MlKem512 => {
                let ek = EncapsulationKey::<MlKem512Params>::from_bytes(
                    &peer_key
                        .try_into()
                        .map_err(|_| Error::Decode("failed to read encapsulation key".into()))?,
                );
                let (ct, ss) = ek
                    .encapsulate(&mut rng)
                    .map_err(|e| Error::Primitive(format!("ML-KEM encapsulation failed: {:?}", e)))?;
                (ct.to_vec(), Zeroizing::new(ss.to_vec()))
            }
            MlKemVariant::MlKem768 => {
                let ek = EncapsulationKey::<MlKem768Params>::from_bytes(
                    &peer_key
                        .try_into()
                        .map_err(|_| Error::Decode("failed to read encapsulation key".into()))?,
                );
                let (ct, ss) = ek
                    .encapsulate(&mut rng)
                    .map_err(|e| Error::Primitive(format!("ML-KEM encapsulation failed: {:?}", e)))?;
                (ct.to_vec(), Zeroizing::new(ss.to_vec()))
            }
            MlKemVariant::MlKem1024 => {
                let ek = EncapsulationKey::<MlKem1024Params>::from_bytes(
                    &peer_key
                        .try_into()
                        .map_err(|_| Error::Decode("failed to read encapsulation key".into()))?,
                );
                let (ct, ss) = ek
                    .encapsulate(&mut rng)
                    .map_err(|e| Error::Primitive(format!("ML-KEM encapsulation failed: {:?}", e)))?;
                (ct.to_vec(), Zeroizing::new(ss.to_vec()))
            }
        };

        out_artifact.extend_from_slice(&ct_bytes);
        Ok(secret)
    }

    fn decap(&mut self, artifact: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let dk_bytes = self
            .decapsulation_key
            .as_ref()
            .ok_or(Error::InvalidState("decap requires a generated private key"))?;

        let expected = self.variant.ciphertext_size();
        if artifact.len() != expected {
            return Err(Error::InvalidLength {
                expected,
                actual: artifact.len(),
            });
        }

        let secret = match self.variant {
            MlKemVariant::MlKem512 => {
                let dk = DecapsulationKey::<MlKem512Params>::from_bytes(
                    &dk_bytes.as_slice().try_into().map_err(|_| {
                        Error::Primitive("stored decapsulation key has the wrong length".into())
                    })?,
                );
                let ct = artifact
                    .try_into()
                    .map_err(|_| Error::Decode("failed to read ciphertext".into()))?;
                let ss = dk
                    .decapsulate(&ct)
                    .map_err(|e| Error::Primitive(format!("ML-KEM decapsulation failed: {:?}", e)))?;
                Zeroizing::new(ss.to_vec())
            }
            MlKemVariant::MlKem768 => {
                let dk = DecapsulationKey::<MlKem768Params>::from_bytes(
                    &dk_bytes.as_slice().try_into().map_err(|_| {
                        Error::Primitive("stored decapsulation key has the wrong length".into())
                    })?,
                );
                let ct = artifact
                    .try_into()
                    .map_err(|_| Error::Decode("failed to read ciphertext".into()))?;
                let ss = dk
                    .decapsulate(&ct)
                    .map_err(|e| Error::Primitive(format!("ML-KEM decapsulation failed: {:?}", e)))?;
                Zeroizing::new(ss.to_vec())
            }
            MlKemVariant::MlKem1024 => {
                let dk = DecapsulationKey::<MlKem1024Params>::from_bytes(
                    &dk_bytes.as_slice().try_into().map_err(|_| {
                        Error::Primitive("stored decapsulation key has the wrong length".into())
                    })?,
                );
                let ct = artifact
                    .try_into()
                    .map_err(|_| Error::Decode("failed to read ciphertext".into()))?;
                let ss = dk
                    .decapsulate(&ct)
                    .map_err(|e| Error::Primitive(format!("ML-KEM decapsulation failed: {:?}", e)))?;
                Zeroizing::new(ss.to_vec())
            }
        };

        self.decapsulation_key = None;
        Ok(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group;

    #[test]
    fn test_name_resolution_is_exact() {
        assert_eq!(
            MlKemVariant::from_name("mlkem512"),
            Some(MlKemVariant::MlKem512)
        );
        assert_eq!(
            MlKemVariant::from_name("mlkem1024"),
            Some(MlKemVariant::MlKem1024)
        );
        assert_eq!(MlKemVariant::from_name("mlkem768 "), None);
        assert_eq!(MlKemVariant::from_name("MLKEM768"), None);
        assert_eq!(MlKemVariant::from_name("kyber768"), None);
    }

    /// The sizes reported by the primitive must match FIPS 203.
    #[test]
    fn test_declared_sizes() {
        let cases = [
            (MlKemVariant::MlKem512, 800, 1632, 768),
            (MlKemVariant::MlKem768, 1184, 2400, 1088),
            (MlKemVariant::MlKem1024, 1568, 3168, 1568),
        ];
        for (variant, ek, dk, ct) in cases {
            assert_eq!(variant.public_key_size(), ek, "{:?}", variant);
            assert_eq!(variant.private_key_size(), dk, "{:?}", variant);
            assert_eq!(variant.ciphertext_size(), ct, "{:?}", variant);
            assert_eq!(variant.shared_secret_size(), 32, "{:?}", variant);
        }
    }

    #[test]
    fn test_round_trip_all_variants() {
        let cases = [
            (group::MLKEM512, MlKemVariant::MlKem512),
            (group::MLKEM768, MlKemVariant::MlKem768),
            (group::MLKEM1024, MlKemVariant::MlKem1024),
        ];
        for (group_id, variant) in cases {
            let mut recipient = MlKemKeyShare::new(group_id, variant);
            let mut sender = MlKemKeyShare::new(group_id, variant);

            let mut offer = Vec::new();
            recipient.generate(&mut offer).unwrap();
            assert_eq!(offer.len(), variant.public_key_size());

            let mut ciphertext = Vec::new();
            let sender_secret = sender.encap(&mut ciphertext, &offer).unwrap();
            assert_eq!(ciphertext.len(), variant.ciphertext_size());
            assert_eq!(sender_secret.len(), variant.shared_secret_size());

            let recipient_secret = recipient.decap(&ciphertext).unwrap();
            assert_eq!(&*sender_secret, &*recipient_secret, "{:?}", variant);
        }
    }

    #[test]
    fn test_encap_rejects_wrong_public_key_length() {
        let variant = MlKemVariant::MlKem512;
        let mut sender = MlKemKeyShare::new(group::MLKEM512, variant);

        for len in [0, 799, 801] {
            let mut ciphertext = Vec::new();
            let result = sender.encap(&mut ciphertext, &vec![0u8; len]);
            assert!(
                matches!(result, Err(Error::InvalidLength { expected: 800, .. })),
                "length {} must be rejected",
                len
            );
            assert!(ciphertext.is_empty(), "no partial artifact on failure");
        }
    }

    #[test]
    fn test_decap_rejects_wrong_ciphertext_length() {
        let variant = MlKemVariant::MlKem512;
        let mut recipient = MlKemKeyShare::new(group::MLKEM512, variant);
        let mut offer = Vec::new();
        recipient.generate(&mut offer).unwrap();

        for len in [0, 767, 769] {
            let result = recipient.decap(&vec![0u8; len]);
            assert!(
                matches!(result, Err(Error::InvalidLength { expected: 768, .. })),
                "length {} must be rejected",
                len
            );
        }
    }

    /// KEM encapsulation retains no private state: there is nothing to
    /// decap on the encapsulating instance.
    #[test]
    fn test_encap_stores_no_state() {
        let variant = MlKemVariant::MlKem768;
        let mut recipient = MlKemKeyShare::new(group::MLKEM768, variant);
        let mut offer = Vec::new();
        recipient.generate(&mut offer).unwrap();

        let mut sender = MlKemKeyShare::new(group::MLKEM768, variant);
        let mut ciphertext = Vec::new();
        sender.encap(&mut ciphertext, &offer).unwrap();

        assert!(matches!(
            sender.decap(&ciphertext),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_decap_consumes_private_state() {
        let variant = MlKemVariant::MlKem512;
        let mut recipient = MlKemKeyShare::new(group::MLKEM512, variant);
        let mut offer = Vec::new();
        recipient.generate(&mut offer).unwrap();

        let mut sender = MlKemKeyShare::new(group::MLKEM512, variant);
        let mut ciphertext = Vec::new();
        sender.encap(&mut ciphertext, &offer).unwrap();

        recipient.decap(&ciphertext).unwrap();
        assert!(matches!(
            recipient.decap(&ciphertext),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_private_key_serialization_unsupported() {
        let mut share = MlKemKeyShare::new(group::MLKEM512, MlKemVariant::MlKem512);
        let mut offer = Vec::new();
        share.generate(&mut offer).unwrap();

        let mut out = Vec::new();
        assert!(matches!(
            share.serialize_private_key(&mut out),
            Err(Error::SerializationUnsupported)
        ));
    }
}
