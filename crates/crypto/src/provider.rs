//! Cipher-Provider – austauschbare Verschluesselung einer Session
//!
//! Genau ein Provider ist zu jedem Zeitpunkt aktiv. Die Session beginnt mit
//! `NoCipher`, wechselt beim Verbindungsaufbau auf den Bootstrap-Cipher und
//! nach Erhalt des Session-Keys auf den konfigurierten symmetrischen Cipher.

use crate::error::{CryptoError, CryptoResult};

/// Gemeinsame Schnittstelle aller Cipher
pub trait CipherProvider: Send + Sync {
    /// Registrierungsname des Ciphers (fuer Logs)
    fn name(&self) -> &str;

    /// Verschluesselt eine einzelne Nachricht
    fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Entschluesselt eine einzelne Nachricht
    fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Ersetzt das Schluesselmaterial
    ///
    /// Nur symmetrische Cipher unterstuetzen einen Schluesselwechsel.
    fn rekey(&mut self, material: &[u8]) -> CryptoResult<()> {
        let _ = material;
        Err(CryptoError::RekeyNichtUnterstuetzt(self.name().to_string()))
    }
}

/// Keine Verschluesselung – Daten werden unveraendert durchgereicht
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCipher;

impl NoCipher {
    pub const NAME: &'static str = "none";
}

impl CipherProvider for NoCipher {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        Ok(plaintext.to_vec())
    }

    fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        Ok(ciphertext.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_cipher_reicht_durch() {
        let cipher = NoCipher;
        assert_eq!(cipher.encrypt(b"hallo").unwrap(), b"hallo");
        assert_eq!(cipher.decrypt(b"hallo").unwrap(), b"hallo");
    }

    #[test]
    fn no_cipher_kein_rekey() {
        let mut cipher = NoCipher;
        let result = cipher.rekey(b"k");
        assert!(matches!(result, Err(CryptoError::RekeyNichtUnterstuetzt(_))));
    }
}
