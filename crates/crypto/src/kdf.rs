//! HKDF-SHA256 Key Derivation

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};

/// HKDF-basierte Key Derivation (allgemein verwendbar)
pub fn hkdf_derive(ikm: &[u8], salt: &[u8], info: &[u8], len: usize) -> CryptoResult<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; len];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(okm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hkdf_derive_deterministisch() {
        let key1 = hkdf_derive(b"ikm", b"salt", b"info", 32).unwrap();
        let key2 = hkdf_derive(b"ikm", b"salt", b"info", 32).unwrap();
        assert_eq!(key1, key2);
        assert_eq!(key1.len(), 32);
    }

    #[test]
    fn hkdf_verschiedenes_info_verschiedene_keys() {
        let a = hkdf_derive(b"ikm", b"salt", b"a", 32).unwrap();
        let b = hkdf_derive(b"ikm", b"salt", b"b", 32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn hkdf_zu_lange_ausgabe_schlaegt_fehl() {
        // HKDF-SHA256 erlaubt maximal 255 * 32 Bytes
        assert!(hkdf_derive(b"ikm", b"salt", b"info", 255 * 32 + 1).is_err());
    }
}
