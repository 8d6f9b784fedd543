//! # raumwart-crypto
//!
//! Austauschbare Verschluesselung fuer Raumwart-Sessions.
//!
//! ## Module
//! - `provider` - `CipherProvider`-Trait und `NoCipher`
//! - `bootstrap` - Asymmetrischer Bootstrap-Cipher (X25519, nur fuer den Key-Transport)
//! - `symmetric` - Benannte symmetrische Session-Cipher (AES-256-GCM, ChaCha20-Poly1305)
//! - `registry` - Name -> Konstruktor, mit Fallback auf `NoCipher`
//! - `kdf` - HKDF-SHA256
//! - `types` - `SessionSchluessel` (HKDF-abgeleitet)
//! - `error` - Fehlertypen

pub mod bootstrap;
pub mod error;
pub mod kdf;
pub mod provider;
pub mod registry;
pub mod symmetric;
pub mod types;

// Bequeme Re-Exports
pub use bootstrap::{seal_for_recipient, BootstrapCipher, BOOTSTRAP_KEY_BITS};
pub use error::{CryptoError, CryptoResult};
pub use kdf::hkdf_derive;
pub use provider::{CipherProvider, NoCipher};
pub use registry::{CipherAufloesung, CipherFactory, CipherRegistry};
pub use symmetric::{SymmetricAlgorithm, SymmetricCipher};
pub use types::{SessionSchluessel, SESSION_KEY_LEN};
