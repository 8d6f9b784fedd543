//! Symmetrische Session-Cipher
//!
//! Beide Algorithmen verwenden 32-Byte-Schluessel und 12-Byte-Nonces.
//! Das Schluesselmaterial vom Server hat beliebige Laenge und wird per
//! HKDF auf 32 Bytes abgeleitet.
//!
//! Format einer Nachricht: `nonce(12) || ciphertext || tag(16)`

use aes_gcm::Aes256Gcm;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305,
};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};
use crate::provider::CipherProvider;
use crate::types::SessionSchluessel;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Unterstuetzte symmetrische Algorithmen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymmetricAlgorithm {
    Aes256Gcm,
    ChaCha20Poly1305,
}

impl SymmetricAlgorithm {
    /// Registrierungsname
    pub fn name(&self) -> &'static str {
        match self {
            SymmetricAlgorithm::Aes256Gcm => "aes256gcm",
            SymmetricAlgorithm::ChaCha20Poly1305 => "chacha20poly1305",
        }
    }

    /// Alle eingebauten Algorithmen
    pub fn alle() -> [SymmetricAlgorithm; 2] {
        [
            SymmetricAlgorithm::Aes256Gcm,
            SymmetricAlgorithm::ChaCha20Poly1305,
        ]
    }
}

/// Symmetrischer Cipher – ohne Schluessel bis zum ersten `rekey`
#[derive(Debug)]
pub struct SymmetricCipher {
    algorithm: SymmetricAlgorithm,
    key: Option<SessionSchluessel>,
}

impl SymmetricCipher {
    /// Erstellt einen Cipher ohne Schluessel
    pub fn neu(algorithm: SymmetricAlgorithm) -> Self {
        Self {
            algorithm,
            key: None,
        }
    }

    pub fn algorithm(&self) -> SymmetricAlgorithm {
        self.algorithm
    }

    /// Gibt true zurueck sobald ein Schluessel gesetzt wurde
    pub fn hat_schluessel(&self) -> bool {
        self.key.is_some()
    }

    fn schluessel(&self) -> CryptoResult<&[u8]> {
        self.key
            .as_ref()
            .map(|k| k.as_bytes())
            .ok_or_else(|| CryptoError::KeinSchluessel(self.algorithm.name().to_string()))
    }
}

impl CipherProvider for SymmetricCipher {
    fn name(&self) -> &str {
        self.algorithm.name()
    }

    fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let key = self.schluessel()?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = match self.algorithm {
            SymmetricAlgorithm::Aes256Gcm => Aes256Gcm::new_from_slice(key)
                .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?
                .encrypt(aes_gcm::Nonce::from_slice(&nonce), plaintext),
            SymmetricAlgorithm::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key)
                .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?
                .encrypt(chacha20poly1305::Nonce::from_slice(&nonce), plaintext),
        }
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        let key = self.schluessel()?;

        if ciphertext.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::UngueltigeDaten(format!(
                "Nachricht zu kurz: {} Bytes",
                ciphertext.len()
            )));
        }
        let (nonce, daten) = ciphertext.split_at(NONCE_LEN);

        match self.algorithm {
            SymmetricAlgorithm::Aes256Gcm => Aes256Gcm::new_from_slice(key)
                .map_err(|e| CryptoError::Entschluesselung(e.to_string()))?
                .decrypt(aes_gcm::Nonce::from_slice(nonce), daten),
            SymmetricAlgorithm::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key)
                .map_err(|e| CryptoError::Entschluesselung(e.to_string()))?
                .decrypt(chacha20poly1305::Nonce::from_slice(nonce), daten),
        }
        .map_err(|e| CryptoError::Entschluesselung(e.to_string()))
    }

    fn rekey(&mut self, material: &[u8]) -> CryptoResult<()> {
        self.key = Some(SessionSchluessel::ableiten(material)?);
        tracing::debug!(cipher = self.algorithm.name(), "Session-Schluessel gesetzt");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ohne_schluessel_kein_encrypt() {
        let cipher = SymmetricCipher::neu(SymmetricAlgorithm::Aes256Gcm);
        assert!(!cipher.hat_schluessel());
        assert!(matches!(
            cipher.encrypt(b"x"),
            Err(CryptoError::KeinSchluessel(_))
        ));
        assert!(matches!(
            cipher.decrypt(&[0u8; 40]),
            Err(CryptoError::KeinSchluessel(_))
        ));
    }

    #[test]
    fn beide_algorithmen_ver_und_entschluesseln() {
        for algorithm in SymmetricAlgorithm::alle() {
            let mut cipher = SymmetricCipher::neu(algorithm);
            cipher.rekey(b"material-beliebiger-laenge").unwrap();
            let ct = cipher.encrypt(b"RW:C>S:ROOMS_REQUEST").unwrap();
            assert_eq!(ct.len(), NONCE_LEN + 20 + TAG_LEN);
            assert_eq!(cipher.decrypt(&ct).unwrap(), b"RW:C>S:ROOMS_REQUEST");
        }
    }

    #[test]
    fn gleiches_material_gleicher_schluessel() {
        let mut a = SymmetricCipher::neu(SymmetricAlgorithm::ChaCha20Poly1305);
        let mut b = SymmetricCipher::neu(SymmetricAlgorithm::ChaCha20Poly1305);
        a.rekey(b"gemeinsam").unwrap();
        b.rekey(b"gemeinsam").unwrap();
        let ct = a.encrypt(b"hallo").unwrap();
        assert_eq!(b.decrypt(&ct).unwrap(), b"hallo");
    }

    #[test]
    fn rekey_ersetzt_schluessel() {
        let mut cipher = SymmetricCipher::neu(SymmetricAlgorithm::Aes256Gcm);
        cipher.rekey(b"alt").unwrap();
        let ct = cipher.encrypt(b"hallo").unwrap();
        cipher.rekey(b"neu").unwrap();
        assert!(matches!(
            cipher.decrypt(&ct),
            Err(CryptoError::Entschluesselung(_))
        ));
    }

    #[test]
    fn leeres_material_wird_abgelehnt() {
        let mut cipher = SymmetricCipher::neu(SymmetricAlgorithm::Aes256Gcm);
        assert!(cipher.rekey(b"").is_err());
        assert!(!cipher.hat_schluessel());
    }

    #[test]
    fn manipulierte_nachricht_schlaegt_fehl() {
        let mut cipher = SymmetricCipher::neu(SymmetricAlgorithm::Aes256Gcm);
        cipher.rekey(b"k").unwrap();
        let mut ct = cipher.encrypt(b"hallo").unwrap();
        let letzter = ct.len() - 1;
        ct[letzter] ^= 0x01;
        assert!(cipher.decrypt(&ct).is_err());
        assert!(matches!(
            cipher.decrypt(&[0u8; 10]),
            Err(CryptoError::UngueltigeDaten(_))
        ));
    }
}
