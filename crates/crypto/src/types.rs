//! Schluesselmaterial der Session

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::hkdf_derive;

pub const SESSION_KEY_LEN: usize = 32;

const SALT: &[u8] = b"raumwart-session";
const INFO: &[u8] = b"raumwart-session-key-v1";

/// Abgeleiteter 256-Bit Session-Schluessel (wird beim Drop genullt)
#[derive(Clone)]
pub struct SessionSchluessel([u8; SESSION_KEY_LEN]);

impl SessionSchluessel {
    /// Leitet den Schluessel per HKDF-SHA256 aus Material beliebiger Laenge ab
    ///
    /// Das Material ist der rohe Inhalt der `SESSION_KEY`-Unit, auch ein
    /// einzelnes Byte ist zulaessig. Nur leeres Material wird abgelehnt.
    pub fn ableiten(material: &[u8]) -> CryptoResult<Self> {
        if material.is_empty() {
            return Err(CryptoError::UngueltigeDaten(
                "Leeres Schluesselmaterial".into(),
            ));
        }
        let okm = hkdf_derive(material, SALT, INFO, SESSION_KEY_LEN)?;
        let mut key = [0u8; SESSION_KEY_LEN];
        key.copy_from_slice(&okm);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for SessionSchluessel {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SessionSchluessel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionSchluessel([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_zeigt_keinen_inhalt() {
        let s = SessionSchluessel::ableiten(&[0xAB; 32]).unwrap();
        let debug = format!("{:?}", s);
        assert_eq!(debug, "SessionSchluessel([REDACTED])");
    }

    #[test]
    fn ein_byte_material_reicht() {
        let a = SessionSchluessel::ableiten(b"k").unwrap();
        let b = SessionSchluessel::ableiten(b"k").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.as_bytes().len(), SESSION_KEY_LEN);
    }

    #[test]
    fn verschiedenes_material_verschiedene_schluessel() {
        let a = SessionSchluessel::ableiten(b"alt").unwrap();
        let b = SessionSchluessel::ableiten(b"neu").unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn leeres_material_wird_abgelehnt() {
        assert!(matches!(
            SessionSchluessel::ableiten(b""),
            Err(CryptoError::UngueltigeDaten(_))
        ));
    }
}
