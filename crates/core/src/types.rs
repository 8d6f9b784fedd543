//! Datenmodell einer Client-Session
//!
//! `UserStatus` ist ein unveraenderlicher Wert: bei jedem Login-Versuch und
//! jedem Login-Ergebnis wird er komplett ersetzt, nie feldweise geaendert.
//!
//! ## State Machine
//! ```text
//! Connecting -> AwaitingSessionKey -> AwaitingSessionAck -> Authenticated
//!                                                              |    ^
//!                                                              v    |
//!                                                     CredentialsPending
//!                                                              |
//!                                                              v
//!                                                          LoggedIn
//!
//! jeder Zustand ----- fataler Fehler / Logout -----> Terminated
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Zugriffsstufe eines Kontos
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Normales Konto (Schueler)
    #[default]
    Normal,
    /// Lehrkraft – darf Geraete im Raum steuern
    Teacher,
    /// Administrator
    Admin,
}

impl Role {
    /// Numerischer Code wie er auf der Leitung uebertragen wird
    pub fn code(&self) -> u16 {
        match self {
            Role::Normal => 256,
            Role::Teacher => 512,
            Role::Admin => 1024,
        }
    }

    /// Liest eine Rolle aus ihrem Leitungs-Code
    pub fn from_code(code: &str) -> Result<Self, CoreError> {
        match code.trim() {
            "256" => Ok(Role::Normal),
            "512" => Ok(Role::Teacher),
            "1024" => Ok(Role::Admin),
            other => Err(CoreError::UnbekannteRolle(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Normal => write!(f, "normal"),
            Role::Teacher => write!(f, "teacher"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

// ---------------------------------------------------------------------------
// UserStatus
// ---------------------------------------------------------------------------

/// Unveraenderlicher Benutzerstatus `{ username, role }`
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatus {
    username: String,
    role: Role,
}

impl UserStatus {
    /// Erstellt einen neuen Status
    pub fn neu(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    /// Leerer Status (vor dem Login, nach Fehlschlag oder Trennung)
    pub fn leer() -> Self {
        Self::default()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Gibt true zurueck wenn kein Benutzer angemeldet ist
    pub fn ist_leer(&self) -> bool {
        self.username.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TerminalReason
// ---------------------------------------------------------------------------

/// Grund fuer das Ende einer Session
///
/// Der Kern beendet nie selbst den Prozess. Der Besitzer der Session
/// entscheidet anhand dieses Werts, was passieren soll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "grund", content = "details", rename_all = "snake_case")]
pub enum TerminalReason {
    /// Server hat ein unerwartetes Tag gesendet
    Protokollverletzung(String),
    /// Transport wurde unerwartet beendet
    VerbindungGetrennt(String),
    /// Server hat ein Disconnect-Signal gesendet
    ServerGetrennt,
    /// Handshake wurde nicht rechtzeitig abgeschlossen
    Zeitlimit,
    /// Regulaerer Logout durch den Benutzer
    Abgemeldet,
}

impl TerminalReason {
    /// Gibt true zurueck wenn die Session regulaer beendet wurde
    pub fn ist_regulaer(&self) -> bool {
        matches!(self, TerminalReason::Abgemeldet)
    }
}

impl std::fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminalReason::Protokollverletzung(details) => {
                write!(f, "Protokollverletzung: {}", details)
            }
            TerminalReason::VerbindungGetrennt(details) => {
                write!(f, "Verbindung getrennt: {}", details)
            }
            TerminalReason::ServerGetrennt => write!(f, "Server hat die Verbindung beendet"),
            TerminalReason::Zeitlimit => write!(f, "Handshake-Zeitlimit ueberschritten"),
            TerminalReason::Abgemeldet => write!(f, "Abgemeldet"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Zustand der Client-Session – genau ein Zustand ist aktiv
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Transport wird aufgebaut
    Connecting,
    /// Public Key gesendet, warte auf den Session-Key
    AwaitingSessionKey,
    /// Userdata gesendet, warte auf die Session-Bestaetigung
    AwaitingSessionAck,
    /// Session steht, Login moeglich
    Authenticated(UserStatus),
    /// Login-Anfrage gesendet, warte auf das Ergebnis
    CredentialsPending {
        /// Lokal gemerkter Benutzername (der Server sendet ihn nicht zurueck)
        pending_username: String,
    },
    /// Erfolgreich angemeldet
    LoggedIn(UserStatus),
    /// Endzustand
    Terminated(TerminalReason),
}

impl SessionState {
    /// Kurzname fuer Logs
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Connecting => "connecting",
            SessionState::AwaitingSessionKey => "awaiting_session_key",
            SessionState::AwaitingSessionAck => "awaiting_session_ack",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::CredentialsPending { .. } => "credentials_pending",
            SessionState::LoggedIn(_) => "logged_in",
            SessionState::Terminated(_) => "terminated",
        }
    }

    /// Gibt true zurueck sobald der Handshake abgeschlossen ist (und die Session noch lebt)
    pub fn ist_authentifiziert(&self) -> bool {
        matches!(
            self,
            SessionState::Authenticated(_)
                | SessionState::CredentialsPending { .. }
                | SessionState::LoggedIn(_)
        )
    }

    /// Gibt true zurueck im Endzustand
    pub fn ist_beendet(&self) -> bool {
        matches!(self, SessionState::Terminated(_))
    }

    /// Aktueller Benutzerstatus (leer ausserhalb von Authenticated/LoggedIn)
    pub fn user_status(&self) -> UserStatus {
        match self {
            SessionState::Authenticated(status) | SessionState::LoggedIn(status) => {
                status.clone()
            }
            _ => UserStatus::leer(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolle_aus_code() {
        assert_eq!(Role::from_code("256").unwrap(), Role::Normal);
        assert_eq!(Role::from_code("512").unwrap(), Role::Teacher);
        assert_eq!(Role::from_code(" 1024 ").unwrap(), Role::Admin);
        assert!(Role::from_code("2048").is_err());
        assert!(Role::from_code("admin").is_err());
    }

    #[test]
    fn rolle_code_konsistent() {
        for rolle in [Role::Normal, Role::Teacher, Role::Admin] {
            let code = rolle.code().to_string();
            assert_eq!(Role::from_code(&code).unwrap(), rolle);
        }
    }

    #[test]
    fn leerer_status() {
        let status = UserStatus::leer();
        assert!(status.ist_leer());
        assert_eq!(status.role(), Role::Normal);
    }

    #[test]
    fn status_wird_ersetzt_nicht_veraendert() {
        let a = UserStatus::neu("lehrer1", Role::Teacher);
        let b = UserStatus::neu("lehrer1", Role::Admin);
        assert_ne!(a, b);
        assert_eq!(a.role(), Role::Teacher);
    }

    #[test]
    fn zustand_authentifiziert() {
        assert!(!SessionState::Connecting.ist_authentifiziert());
        assert!(!SessionState::AwaitingSessionAck.ist_authentifiziert());
        assert!(SessionState::Authenticated(UserStatus::leer()).ist_authentifiziert());
        assert!(SessionState::CredentialsPending {
            pending_username: "x".into()
        }
        .ist_authentifiziert());
        assert!(!SessionState::Terminated(TerminalReason::Abgemeldet).ist_authentifiziert());
    }

    #[test]
    fn user_status_aus_zustand() {
        let status = UserStatus::neu("admin", Role::Admin);
        assert_eq!(SessionState::LoggedIn(status.clone()).user_status(), status);
        assert!(SessionState::AwaitingSessionKey.user_status().ist_leer());
    }

    #[test]
    fn terminal_reason_serde() {
        let grund = TerminalReason::Protokollverletzung("falsches Tag".into());
        let json = serde_json::to_string(&grund).unwrap();
        let zurueck: TerminalReason = serde_json::from_str(&json).unwrap();
        assert_eq!(grund, zurueck);
        assert!(!grund.ist_regulaer());
        assert!(TerminalReason::Abgemeldet.ist_regulaer());
    }
}
