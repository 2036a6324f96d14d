//! Named-group registry.
//!
//! The registry is a compile-time table mapping each negotiable group id to
//! its display name, optional alias, and internal algorithm selector. It is
//! immutable and safe for unsynchronized concurrent reads; negotiation code
//! enumerates it via [`named_groups`] and resolves peer-supplied ids or
//! configuration strings via [`by_group_id`] and [`by_name`].
//!
//! Name and alias resolution is exact: the entire candidate string must
//! match byte-for-byte, with no case folding and no prefix matching.

/// secp256r1 (P-256), RFC 8446 codepoint.
pub const SECP256R1: u16 = 0x0017;
/// secp384r1 (P-384), RFC 8446 codepoint.
pub const SECP384R1: u16 = 0x0018;
/// secp521r1 (P-521), RFC 8446 codepoint.
pub const SECP521R1: u16 = 0x0019;
/// X25519, RFC 8446 codepoint.
pub const X25519: u16 = 0x001D;
/// X25519 + ML-KEM-768 fixed hybrid.
pub const X25519_MLKEM768: u16 = 0x11EC;
/// ML-KEM-512 as a standalone key exchange.
pub const MLKEM512: u16 = 0x0247;
/// ML-KEM-768 as a standalone key exchange.
pub const MLKEM768: u16 = 0x0248;
/// ML-KEM-1024 as a standalone key exchange.
pub const MLKEM1024: u16 = 0x0249;
/// P-256 + ML-KEM-512 hybrid.
pub const P256_MLKEM512: u16 = 0x2F47;
/// P-384 + ML-KEM-768 hybrid.
pub const P384_MLKEM768: u16 = 0x2F48;
/// P-521 + ML-KEM-1024 hybrid.
pub const P521_MLKEM1024: u16 = 0x2F49;

/// Internal algorithm selector for a registered group.
///
/// KEM algorithms are carried by name so this module stays free of any
/// dependency on the primitive wrappers; the factory resolves names to
/// parameter sets when it constructs a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// NIST P-256 ECDH.
    EcP256,
    /// NIST P-384 ECDH.
    EcP384,
    /// NIST P-521 ECDH.
    EcP521,
    /// X25519 (RFC 7748).
    X25519,
    /// The fixed X25519 + ML-KEM-768 pairing.
    X25519MlKem768,
    /// A standalone KEM, selected by algorithm name.
    MlKem(&'static str),
    /// A runtime-combined classical group and KEM.
    Hybrid {
        /// Group id of the classical component.
        classical: u16,
        /// Algorithm name of the KEM component.
        kem: &'static str,
    },
}

/// Descriptor for one negotiable group.
///
/// Invariants over the registry: ids are unique, display names are unique,
/// and a non-empty alias is distinct from every display name and every
/// other alias. An empty alias means the group has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedGroup {
    /// Protocol-visible group id.
    pub id: u16,
    /// Internal algorithm selector.
    pub algorithm: Algorithm,
    /// Display name.
    pub name: &'static str,
    /// Alias, or `""` if the group has none.
    pub alias: &'static str,
}

const NAMED_GROUPS: &[NamedGroup] = &[
    NamedGroup {
        id: SECP256R1,
        algorithm: Algorithm::EcP256,
        name: "P-256",
        alias: "prime256v1",
    },
    NamedGroup {
        id: SECP384R1,
        algorithm: Algorithm::EcP384,
        name: "P-384",
        alias: "secp384r1",
    },
    NamedGroup {
        id: SECP521R1,
        algorithm: Algorithm::EcP521,
        name: "P-521",
        alias: "secp521r1",
    },
    NamedGroup {
        id: X25519,
        algorithm: Algorithm::X25519,
        name: "X25519",
        alias: "x25519",
    },
    NamedGroup {
        id: X25519_MLKEM768,
        algorithm: Algorithm::X25519MlKem768,
        name: "X25519MlKem768",
        alias: "x25519_mlkem768",
    },
    NamedGroup {
        id: MLKEM512,
        algorithm: Algorithm::MlKem("mlkem512"),
        name: "mlkem512",
        alias: "ML-KEM-512",
    },
    NamedGroup {
        id: MLKEM768,
        algorithm: Algorithm::MlKem("mlkem768"),
        name: "mlkem768",
        alias: "ML-KEM-768",
    },
    NamedGroup {
        id: MLKEM1024,
        algorithm: Algorithm::MlKem("mlkem1024"),
        name: "mlkem1024",
        alias: "ML-KEM-1024",
    },
    NamedGroup {
        id: P256_MLKEM512,
        algorithm: Algorithm::Hybrid {
            classical: SECP256R1,
            kem: "mlkem512",
        },
        name: "p256_mlkem512",
        alias: "",
    },
    NamedGroup {
        id: P384_MLKEM768,
        algorithm: Algorithm::Hybrid {
            classical: SECP384R1,
            kem: "mlkem768",
        },
        name: "p384_mlkem768",
        alias: "",
    },
    NamedGroup {
        id: P521_MLKEM1024,
        algorithm: Algorithm::Hybrid {
            classical: SECP521R1,
            kem: "mlkem1024",
        },
        name: "p521_mlkem1024",
        alias: "",
    },
];

/// The full ordered list of registered groups.
pub fn named_groups() -> &'static [NamedGroup] {
    NAMED_GROUPS
}

/// Look up a group by its protocol-visible id.
pub fn by_group_id(id: u16) -> Option<&'static NamedGroup> {
    NAMED_GROUPS.iter().find(|group| group.id == id)
}

/// Look up a group by its exact display name or exact alias.
///
/// The match is byte-for-byte and length-for-length; `"p-256"` does not
/// resolve `"P-256"`, and an empty alias never matches anything.
pub fn by_name(name: &str) -> Option<&'static NamedGroup> {
    NAMED_GROUPS
        .iter()
        .find(|group| group.name == name)
        .or_else(|| {
            NAMED_GROUPS
                .iter()
                .find(|group| !group.alias.is_empty() && group.alias == name)
        })
}
