//! Key-exchange abstraction layer for the qtls handshake.
//!
//! This crate implements the named-group machinery the handshake layer drives
//! during key establishment:
//! - Named-group registry (numeric id, display name, alias) with exact lookups
//! - A uniform [`KeyShare`] contract over classical Diffie-Hellman groups
//!   (P-256/P-384/P-521, X25519), post-quantum KEMs (ML-KEM-512/768/1024),
//!   and classical+KEM hybrids
//! - A factory mapping a peer-offered group id to a concrete key share
//!
//! All implementations follow the crate security requirements:
//! - No unsafe code
//! - All private keys and shared secrets use `Zeroizing` wrappers
//! - Peer-supplied lengths are validated before any primitive is invoked
//! - No logging of key material

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod group;
pub mod kex;

pub use error::{Alert, Error, Result};
pub use group::NamedGroup;
pub use kex::{create, KeyShare};
