//! Fehlertypen fuer das Raumwart-Datenmodell
//!
//! Untermodule anderer Crates definieren eigene Fehler und konvertieren
//! diesen hier via `#[from]`.

use thiserror::Error;

/// Result-Alias fuer raumwart-core
pub type Result<T> = std::result::Result<T, CoreError>;

/// Fehler im Datenmodell
#[derive(Debug, Error)]
pub enum CoreError {
    /// Lokale Eingabe ist ungueltig (z.B. leerer Benutzername)
    #[error("Ungueltige Eingabe: {0}")]
    Validierung(String),

    /// Rollen-Code vom Server ist unbekannt
    #[error("Unbekannte Rolle: '{0}'")]
    UnbekannteRolle(String),
}

impl CoreError {
    /// Erstellt einen Validierungsfehler
    pub fn validierung(msg: impl Into<String>) -> Self {
        Self::Validierung(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = CoreError::validierung("Passwort darf nicht leer sein");
        assert_eq!(
            e.to_string(),
            "Ungueltige Eingabe: Passwort darf nicht leer sein"
        );
    }

    #[test]
    fn unbekannte_rolle_anzeige() {
        let e = CoreError::UnbekannteRolle("7".into());
        assert!(e.to_string().contains("'7'"));
    }
}
