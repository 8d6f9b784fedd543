//! Asymmetrischer Bootstrap-Cipher
//!
//! Wird nur verwendet, um den symmetrischen Session-Key vom Server zu
//! empfangen. Der oeffentliche Schluessel wird unverschluesselt gesendet
//! (Trust-on-first-contact).
//!
//! ## Format einer versiegelten Nachricht
//! ```text
//! [ephemeral_public(32)] [nonce(12)] [ciphertext + auth_tag(16)]
//! ```
//!
//! ## Ablauf (ECIES-aehnlich)
//! 1. Ephemeres X25519-Schluessel-Paar generieren
//! 2. DH mit dem Empfaenger-Public-Key
//! 3. HKDF -> Wrapping Key
//! 4. AES-256-GCM verschluesseln

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey, StaticSecret};

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::hkdf_derive;
use crate::provider::CipherProvider;

/// Einzige unterstuetzte Schluesselgroesse (X25519)
pub const BOOTSTRAP_KEY_BITS: usize = 256;

const WRAP_INFO: &[u8] = b"raumwart-bootstrap-wrap-v1";
const PUBLIC_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Bootstrap-Cipher mit statischem X25519-Schluessel-Paar
pub struct BootstrapCipher {
    secret: StaticSecret,
    public: X25519PublicKey,
}

impl BootstrapCipher {
    pub const NAME: &'static str = "bootstrap-x25519";

    /// Erzeugt ein frisches Schluessel-Paar
    ///
    /// `key_size_bits` muss `BOOTSTRAP_KEY_BITS` sein.
    pub fn neu(key_size_bits: usize) -> CryptoResult<Self> {
        if key_size_bits != BOOTSTRAP_KEY_BITS {
            return Err(CryptoError::UngueltigeSchluesselLaenge {
                erwartet: BOOTSTRAP_KEY_BITS,
                erhalten: key_size_bits,
            });
        }

        let secret = StaticSecret::random_from_rng(OsRng);
        let public = X25519PublicKey::from(&secret);
        Ok(Self { secret, public })
    }

    /// Oeffentlicher Schluessel als Base64-Text (fuer die UTF-8-Leitung)
    pub fn export_public_key(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.public.as_bytes())
    }

    /// Oeffentlicher Schluessel als Rohbytes
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_LEN] {
        self.public.to_bytes()
    }
}

impl std::fmt::Debug for BootstrapCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapCipher")
            .field("public", &self.export_public_key())
            .finish_non_exhaustive()
    }
}

impl CipherProvider for BootstrapCipher {
    fn name(&self) -> &str {
        Self::NAME
    }

    /// Versiegelt an den eigenen oeffentlichen Schluessel
    fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        seal(&self.public, plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        open(&self.secret, &self.public, ciphertext)
    }
}

/// Versiegelt Daten fuer den Besitzer eines exportierten Bootstrap-Keys
///
/// Gegenstueck zu `BootstrapCipher::decrypt`, wird serverseitig (oder im
/// Test-Harness) zum Uebertragen des Session-Keys verwendet.
pub fn seal_for_recipient(public_key_b64: &str, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(public_key_b64.trim())?;
    let bytes: [u8; PUBLIC_LEN] =
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::UngueltigeSchluesselLaenge {
                erwartet: PUBLIC_LEN,
                erhalten: bytes.len(),
            })?;
    seal(&X25519PublicKey::from(bytes), plaintext)
}

fn seal(recipient: &X25519PublicKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    // Ephemeres Schluessel-Paar
    let ephemeral_secret = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519PublicKey::from(&ephemeral_secret);

    // DH-Austausch
    let dh_output = ephemeral_secret.diffie_hellman(recipient);
    let wrapping_key = hkdf_derive(dh_output.as_bytes(), recipient.as_bytes(), WRAP_INFO, 32)?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&wrapping_key));
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    let mut out = Vec::with_capacity(PUBLIC_LEN + NONCE_LEN + ciphertext.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn open(
    secret: &StaticSecret,
    public: &X25519PublicKey,
    sealed: &[u8],
) -> CryptoResult<Vec<u8>> {
    if sealed.len() < PUBLIC_LEN + NONCE_LEN + TAG_LEN {
        return Err(CryptoError::UngueltigeDaten(format!(
            "Versiegelte Nachricht zu kurz: {} Bytes",
            sealed.len()
        )));
    }

    let (ephemeral, rest) = sealed.split_at(PUBLIC_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

    let mut ephemeral_bytes = [0u8; PUBLIC_LEN];
    ephemeral_bytes.copy_from_slice(ephemeral);
    let dh_output = secret.diffie_hellman(&X25519PublicKey::from(ephemeral_bytes));
    let wrapping_key = hkdf_derive(dh_output.as_bytes(), public.as_bytes(), WRAP_INFO, 32)?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&wrapping_key));
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| CryptoError::Entschluesselung(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falsche_schluesselgroesse_wird_abgelehnt() {
        let result = BootstrapCipher::neu(2048);
        assert!(matches!(
            result,
            Err(CryptoError::UngueltigeSchluesselLaenge {
                erwartet: 256,
                erhalten: 2048
            })
        ));
    }

    #[test]
    fn exportierter_key_ist_base64_von_32_bytes() {
        let cipher = BootstrapCipher::neu(BOOTSTRAP_KEY_BITS).unwrap();
        let exportiert = cipher.export_public_key();
        let roh = base64::engine::general_purpose::STANDARD
            .decode(&exportiert)
            .unwrap();
        assert_eq!(roh, cipher.public_key_bytes());
    }

    #[test]
    fn versiegeln_fuer_empfaenger_und_oeffnen() {
        let cipher = BootstrapCipher::neu(BOOTSTRAP_KEY_BITS).unwrap();
        let sealed = seal_for_recipient(&cipher.export_public_key(), b"session-key").unwrap();
        assert_eq!(sealed.len(), PUBLIC_LEN + NONCE_LEN + b"session-key".len() + TAG_LEN);
        assert_eq!(cipher.decrypt(&sealed).unwrap(), b"session-key");
    }

    #[test]
    fn eigener_encrypt_ist_lesbar() {
        let cipher = BootstrapCipher::neu(BOOTSTRAP_KEY_BITS).unwrap();
        let sealed = cipher.encrypt(b"heartbeat").unwrap();
        assert_eq!(cipher.decrypt(&sealed).unwrap(), b"heartbeat");
    }

    #[test]
    fn fremder_schluessel_schlaegt_fehl() {
        let a = BootstrapCipher::neu(BOOTSTRAP_KEY_BITS).unwrap();
        let b = BootstrapCipher::neu(BOOTSTRAP_KEY_BITS).unwrap();
        let sealed = seal_for_recipient(&a.export_public_key(), b"geheim").unwrap();
        assert!(matches!(
            b.decrypt(&sealed),
            Err(CryptoError::Entschluesselung(_))
        ));
    }

    #[test]
    fn zu_kurze_nachricht_schlaegt_fehl() {
        let cipher = BootstrapCipher::neu(BOOTSTRAP_KEY_BITS).unwrap();
        assert!(matches!(
            cipher.decrypt(&[0u8; 20]),
            Err(CryptoError::UngueltigeDaten(_))
        ));
    }

    #[test]
    fn ungueltiger_public_key_text() {
        assert!(matches!(
            seal_for_recipient("kein base64!", b"x"),
            Err(CryptoError::Base64(_))
        ));
        // Gueltiges Base64, aber nur 3 Bytes
        assert!(matches!(
            seal_for_recipient("AAAA", b"x"),
            Err(CryptoError::UngueltigeSchluesselLaenge { erwartet: 32, .. })
        ));
    }
}
