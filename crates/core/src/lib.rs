//! raumwart-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt das Datenmodell einer Client-Session bereit, das von
//! allen anderen Raumwart-Crates gemeinsam genutzt wird: Sitzungszustand,
//! Benutzerstatus und Rollen.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{CoreError, Result};
pub use types::{Role, SessionState, TerminalReason, UserStatus};
