//! Fehlertypen fuer die Session-Engine

use raumwart_core::{CoreError, TerminalReason};
use raumwart_crypto::CryptoError;
use thiserror::Error;

/// Fehler der Session-Engine
#[derive(Debug, Error)]
pub enum SessionError {
    /// Unerwartetes Tag an einer Stelle mit fester Erwartung
    #[error("Protokollverletzung: {0}")]
    Protokollverletzung(String),

    /// Lokale Eingabe abgelehnt, es wurde nichts gesendet
    #[error(transparent)]
    Validierung(#[from] CoreError),

    /// Kryptografie-Fehler
    #[error("Kryptografie-Fehler: {0}")]
    Crypto(#[from] CryptoError),

    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Transport ist bereits geschlossen
    #[error("Transport geschlossen")]
    TransportGeschlossen,

    /// Befehl im aktuellen Zustand nicht erlaubt
    #[error("Session ist nicht bereit (Zustand: {0})")]
    NichtBereit(&'static str),

    /// Session ist beendet
    #[error("Session beendet: {0}")]
    Beendet(TerminalReason),

    /// Ungueltige Konfiguration
    #[error("Ungueltige Konfiguration: {0}")]
    Konfiguration(String),
}

impl SessionError {
    /// Erstellt einen Validierungsfehler
    pub fn validierung(msg: impl Into<String>) -> Self {
        Self::Validierung(CoreError::validierung(msg))
    }

    /// Erstellt einen Protokollfehler
    pub fn protokoll(msg: impl Into<String>) -> Self {
        Self::Protokollverletzung(msg.into())
    }
}

/// Result-Typ fuer die Session-Engine
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validierung_wird_durchgereicht() {
        let e = SessionError::validierung("Passwort darf nicht leer sein");
        assert!(matches!(e, SessionError::Validierung(CoreError::Validierung(_))));
        assert_eq!(e.to_string(), "Ungueltige Eingabe: Passwort darf nicht leer sein");
    }

    #[test]
    fn beendet_zeigt_grund() {
        let e = SessionError::Beendet(TerminalReason::ServerGetrennt);
        assert!(e.to_string().contains("Server hat die Verbindung beendet"));
    }
}
