//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Schluessel-Generierung fehlgeschlagen: {0}")]
    SchluesselGenerierung(String),

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Entschluesselung fehlgeschlagen: {0}")]
    Entschluesselung(String),

    #[error("Ungueltige Schluessel-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeSchluesselLaenge { erwartet: usize, erhalten: usize },

    #[error("Ungueltige Daten: {0}")]
    UngueltigeDaten(String),

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),

    #[error("Cipher '{0}' hat noch keinen Schluessel")]
    KeinSchluessel(String),

    #[error("Cipher '{0}' unterstuetzt keinen Schluesselwechsel")]
    RekeyNichtUnterstuetzt(String),

    #[error("Unbekannter Cipher: '{0}'")]
    UnbekannterCipher(String),

    #[error("Cipher '{name}' konnte nicht erstellt werden: {grund}")]
    CipherKonstruktion { name: String, grund: String },

    #[error("Cipher '{0}' ist bereits registriert")]
    CipherBereitsRegistriert(String),

    #[error("Base64-Dekodierung fehlgeschlagen: {0}")]
    Base64(#[from] base64::DecodeError),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
