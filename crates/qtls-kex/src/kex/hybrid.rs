//! Runtime-combined classical + KEM hybrid key shares.
//!
//! Where [`x25519_ml_kem`](crate::kex::x25519_ml_kem) hard-codes one
//! pairing, this combiner composes *any* registered classical group with an
//! ML-KEM parameter set chosen at construction. The wire rule is the same
//! (draft-ietf-tls-hybrid-design §3.2): artifacts and secrets are the
//! classical segment followed by the post-quantum segment.
//!
//! Splitting an incoming peer blob requires the exact byte length of the
//! classical public encoding. That length is a static property of each
//! classical group (an uncompressed point or a raw 32-byte key), so it
//! comes from a fixed table rather than being measured at runtime.
//!
//! If either sub-mechanism fails, its failure propagates immediately and
//! the other is not attempted.

use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::group;
use crate::kex::ec::EcCurve;
use crate::kex::ml_kem::{MlKemKeyShare, MlKemVariant};
use crate::kex::x25519::X25519_SHARE_SIZE;
use crate::kex::KeyShare;

/// Encoded public-key length of a classical group, which for the
/// DH-style groups is also its artifact length.
fn classical_share_len(classical_group_id: u16) -> Result<usize> {
    match classical_group_id {
        group::SECP256R1 => Ok(EcCurve::P256.share_size()),
        group::SECP384R1 => Ok(EcCurve::P384.share_size()),
        group::SECP521R1 => Ok(EcCurve::P521.share_size()),
        group::X25519 => Ok(X25519_SHARE_SIZE),
        _ => Err(Error::UnsupportedAlgorithm(format!(
            "no classical key share for group {:#06x}",
            classical_group_id
        ))),
    }
}

/// Key share combining a classical group with an ML-KEM parameter set.
pub struct HybridKeyShare {
    group_id: u16,
    classical_group_id: u16,
    kem_variant: MlKemVariant,
    /// Sub-shares, built lazily on first use.
    classical: Option<Box<dyn KeyShare>>,
    pq: Option<MlKemKeyShare>,
}

impl HybridKeyShare {
    /// Create an empty combiner for `group_id`, pairing the classical group
    /// `classical_group_id` with `kem_variant`. Sub-shares are constructed
    /// on first use.
    pub fn new(group_id: u16, classical_group_id: u16, kem_variant: MlKemVariant) -> Self {
        Self {
            group_id,
            classical_group_id,
            kem_variant,
            classical: None,
            pq: None,
        }
    }

    fn ensure_init(&mut self) -> Result<()> {
        if self.classical.is_none() {
            // Rejects non-classical pairings up front, so a misconfigured
            // table cannot nest hybrids.
            classical_share_len(self.classical_group_id)?;
            tracing::debug!(
                group_id = self.group_id,
                classical = self.classical_group_id,
                kem = self.kem_variant.name(),
                "building hybrid sub-shares"
            );
            self.classical = Some(crate::kex::create(self.classical_group_id).ok_or_else(
                || {
                    Error::UnsupportedAlgorithm(format!(
                        "classical group {:#06x} is not registered",
                        self.classical_group_id
                    ))
                },
            )?);
        }
        if self.pq.is_none() {
            self.pq = Some(MlKemKeyShare::new(self.group_id, self.kem_variant));
        }
        Ok(())
    }

    fn sub_shares(&mut self) -> Result<(&mut Box<dyn KeyShare>, &mut MlKemKeyShare)> {
        match (self.classical.as_mut(), self.pq.as_mut()) {
            (Some(classical), Some(pq)) => Ok((classical, pq)),
            _ => Err(Error::InvalidState("hybrid sub-shares not initialized")),
        }
    }
}

impl KeyShare for HybridKeyShare {
    fn group_id(&self) -> u16 {
        self.group_id
    }

    fn generate(&mut self, out: &mut Vec<u8>) -> Result<()> {
        self.ensure_init()?;
        let (classical, pq) = self.sub_shares()?;

        // Each sub-offer lands in a scratch buffer so nothing reaches `out`
        // unless both succeed.
        let mut classical_offer = Vec::new();
        classical.generate(&mut classical_offer)?;

        let mut pq_offer = Vec::new();
        pq.generate(&mut pq_offer)?;

        out.extend_from_slice(&classical_offer);
        out.extend_from_slice(&pq_offer);
        Ok(())
    }

    fn encap(
        &mut self,
        out_artifact: &mut Vec<u8>,
        peer_key: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        self.ensure_init()?;
        let classical_len = classical_share_len(self.classical_group_id)?;
        let expected = classical_len + self.kem_variant.public_key_size();
        if peer_key.len() != expected {
            return Err(Error::InvalidLength {
                expected,
                actual: peer_key.len(),
            });
        }
        let (peer_classical, peer_pq) = peer_key.split_at(classical_len);

        let (classical, pq) = self.sub_shares()?;

        let mut classical_artifact = Vec::new();
        let classical_secret = classical.encap(&mut classical_artifact, peer_classical)?;

        let mut pq_artifact = Vec::new();
        let pq_secret = pq.encap(&mut pq_artifact, peer_pq)?;

        out_artifact.extend_from_slice(&classical_artifact);
        out_artifact.extend_from_slice(&pq_artifact);

        let mut secret = Zeroizing::new(Vec::with_capacity(
            classical_secret.len() + pq_secret.len(),
        ));
        secret.extend_from_slice(&classical_secret);
        secret.extend_from_slice(&pq_secret);
        Ok(secret)
    }

    fn decap(&mut self, artifact: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.ensure_init()?;
        let classical_len = classical_share_len(self.classical_group_id)?;
        let expected = classical_len + self.kem_variant.ciphertext_size();
        if artifact.len() != expected {
            return Err(Error::InvalidLength {
                expected,
                actual: artifact.len(),
            });
        }
        let (peer_classical, peer_pq) = artifact.split_at(classical_len);

        let (classical, pq) = self.sub_shares()?;

        let classical_secret = classical.decap(peer_classical)?;
        let pq_secret = pq.decap(peer_pq)?;

        let mut secret = Zeroizing::new(Vec::with_capacity(
            classical_secret.len() + pq_secret.len(),
        ));
        secret.extend_from_slice(&classical_secret);
        secret.extend_from_slice(&pq_secret);
        Ok(secret)
    }
}
