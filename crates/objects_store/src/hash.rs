//! Stable, name-derived type identifiers.
//!
//! [`TypeHash`] is derived from a type's **string name** using the FNV-1a
//! 64-bit hash algorithm. Object types and component types share this one
//! key space, so any name resolves to at most one registered type.

use serde::{Deserialize, Serialize};

/// A deterministic identifier derived from a type name with FNV-1a 64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`TypeHash`] of a name.
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }
}

impl std::fmt::Display for TypeHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_deterministic() {
        assert_eq!(TypeHash::from_name("Health"), TypeHash::from_name("Health"));
        assert_ne!(TypeHash::from_name("Health"), TypeHash::from_name("Velocity"));
    }

    #[test]
    fn test_fnv1a_known_vectors() {
        assert_eq!(TypeHash::from_name(""), TypeHash(0xcbf2_9ce4_8422_2325));
        assert_eq!(TypeHash::from_name("a"), TypeHash(0xaf63_dc4c_8601_ec8c));
    }

    #[test]
    fn test_usable_in_const_context() {
        const ID: TypeHash = TypeHash::from_name("Transform");
        assert_eq!(ID, TypeHash::from_name("Transform"));
    }
}
