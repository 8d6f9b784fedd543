//! Command-Dispatcher – Units nach dem Handshake
//!
//! Eingehend: fertige Units werden an typisierte Handler verteilt.
//! Unbekannte oder unerwartete Units werden verworfen, anders als im
//! Handshake sind sie hier nicht fatal.
//!
//! Ausgehend: Builder fuer alle Befehle. Lokale Eingaben werden geprueft,
//! bevor irgendetwas gesendet wird.

use std::sync::Arc;

use raumwart_core::{Role, SessionState, TerminalReason, UserStatus};
use raumwart_protocol::{tags, Signal, Token, Unit};

use crate::aktion::Aktion;
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::events::SessionEvent;

/// Trennzeichen in Geraete-Listen
const GERAETE_TRENNER: char = ';';

/// Massenbefehl fuer Geraete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeraeteBefehl {
    Herunterfahren,
    Neustarten,
    Sperren,
    Entsperren,
}

impl GeraeteBefehl {
    /// Fuehrendes Tag und Abschluss-Tag
    fn tags(&self) -> (&'static str, &'static str) {
        match self {
            GeraeteBefehl::Herunterfahren => (tags::CLIENT_SHUTDOWN, tags::CLIENT_SHUTDOWN_FINISHED),
            GeraeteBefehl::Neustarten => (tags::CLIENT_RESTART, tags::CLIENT_RESTART_FINISHED),
            GeraeteBefehl::Sperren => (tags::CLIENT_LOCK, tags::CLIENT_LOCK_FINISHED),
            GeraeteBefehl::Entsperren => (tags::CLIENT_UNLOCK, tags::CLIENT_UNLOCK_FINISHED),
        }
    }
}

/// Verteilt Units und baut ausgehende Befehle
pub struct CommandDispatcher {
    config: Arc<SessionConfig>,
}

impl CommandDispatcher {
    pub fn neu(config: Arc<SessionConfig>) -> Self {
        Self { config }
    }

    // -----------------------------------------------------------------------
    // Eingehend
    // -----------------------------------------------------------------------

    /// Verarbeitet eine Unit in einem authentifizierten Zustand
    pub fn verarbeiten(&self, zustand: &SessionState, unit: Unit) -> Vec<Aktion> {
        match unit {
            Unit::Signal(Signal::HeartbeatChallenge) => {
                tracing::debug!("Heartbeat empfangen");
                vec![Aktion::senden([
                    tags::CLIENT_HEARTBEAT,
                    self.config.username.as_str(),
                ])]
            }
            Unit::Signal(Signal::Disconnect) => {
                tracing::error!("Server hat die Verbindung beendet");
                vec![Aktion::Beenden(TerminalReason::ServerGetrennt)]
            }
            Unit::Signal(Signal::LoginInvalid) => {
                self.login_fehlgeschlagen(zustand, SessionEvent::AnmeldungFehlgeschlagen)
            }
            Unit::Signal(Signal::NoLoginServers) => {
                self.login_fehlgeschlagen(zustand, SessionEvent::KeinLoginServer)
            }
            Unit::Data { tag, payload } if tag == tags::SERVER_LOGIN_SUCCESS => {
                self.login_erfolgreich(zustand, &payload)
            }
            Unit::Data { tag, payload } if tag == tags::SERVER_ROOMS => {
                let raeume: Vec<String> = payload.iter().map(Token::text).collect();
                tracing::debug!(anzahl = raeume.len(), "Raeume empfangen");
                vec![Aktion::Ereignis(SessionEvent::RaeumeEmpfangen(raeume))]
            }
            Unit::Data { tag, payload } if tag == tags::SERVER_STARTED_CLIENTS => {
                vec![geraete_ereignis(&payload, false)]
            }
            Unit::Data { tag, payload } if tag == tags::SERVER_LOCKED_CLIENTS => {
                vec![geraete_ereignis(&payload, true)]
            }
            andere => {
                tracing::debug!(unit = %andere.beschreibung(), "Unerwartete Unit verworfen");
                Vec::new()
            }
        }
    }

    fn login_erfolgreich(&self, zustand: &SessionState, payload: &[Token]) -> Vec<Aktion> {
        let SessionState::CredentialsPending { pending_username } = zustand else {
            tracing::debug!(zustand = zustand.name(), "Login-Antwort ohne Anfrage verworfen");
            return Vec::new();
        };

        let code = payload.first().map(Token::text).unwrap_or_default();
        match Role::from_code(&code) {
            Ok(role) => {
                let status = UserStatus::neu(pending_username.clone(), role);
                tracing::info!(username = %pending_username, role = %role, "Angemeldet");
                vec![
                    Aktion::ZustandSetzen(SessionState::LoggedIn(status.clone())),
                    Aktion::Ereignis(SessionEvent::Angemeldet(status)),
                ]
            }
            Err(e) => {
                tracing::warn!(fehler = %e, "Login-Antwort mit unbekannter Rolle");
                vec![
                    Aktion::ZustandSetzen(SessionState::Authenticated(UserStatus::leer())),
                    Aktion::Ereignis(SessionEvent::AnmeldungFehlgeschlagen),
                ]
            }
        }
    }

    fn login_fehlgeschlagen(&self, zustand: &SessionState, ereignis: SessionEvent) -> Vec<Aktion> {
        if !matches!(zustand, SessionState::CredentialsPending { .. }) {
            tracing::debug!(zustand = zustand.name(), "Login-Antwort ohne Anfrage verworfen");
            return Vec::new();
        }
        tracing::info!(ergebnis = ?ereignis, "Login fehlgeschlagen");
        vec![
            Aktion::ZustandSetzen(SessionState::Authenticated(UserStatus::leer())),
            Aktion::Ereignis(ereignis),
        ]
    }

    // -----------------------------------------------------------------------
    // Ausgehend
    // -----------------------------------------------------------------------

    /// `{LOGIN_REQUEST, username, password}`
    pub fn login_anfrage(&self, username: &str, password: &str) -> SessionResult<Vec<String>> {
        if username.trim().is_empty() {
            return Err(SessionError::validierung("Benutzername darf nicht leer sein"));
        }
        if password.trim().is_empty() {
            return Err(SessionError::validierung("Passwort darf nicht leer sein"));
        }
        Ok(vec![
            tags::CLIENT_LOGIN_REQUEST.into(),
            username.into(),
            password.into(),
        ])
    }

    /// `{ROOMS_REQUEST}`
    pub fn raeume_anfrage(&self) -> Vec<String> {
        vec![tags::CLIENT_ROOMS_REQUEST.into()]
    }

    /// `{STARTED_CLIENTS_REQUEST | LOCKED_CLIENTS_REQUEST, raum}`
    pub fn geraete_anfrage(&self, raum: &str, gesperrt: bool) -> SessionResult<Vec<String>> {
        if raum.trim().is_empty() {
            return Err(SessionError::validierung("Raum darf nicht leer sein"));
        }
        let tag = if gesperrt {
            tags::CLIENT_LOCKED_CLIENTS_REQUEST
        } else {
            tags::CLIENT_STARTED_CLIENTS_REQUEST
        };
        Ok(vec![tag.into(), raum.into()])
    }

    /// `{TAG, client..., TAG_FINISHED}`
    pub fn geraete_befehl(
        &self,
        befehl: GeraeteBefehl,
        clients: &[String],
    ) -> SessionResult<Vec<String>> {
        if clients.is_empty() {
            return Err(SessionError::validierung("Keine Geraete angegeben"));
        }
        let (tag, ende) = befehl.tags();
        let mut unit = Vec::with_capacity(clients.len() + 2);
        unit.push(tag.to_string());
        unit.extend(clients.iter().cloned());
        unit.push(ende.to_string());
        Ok(unit)
    }

    /// `{LOGOUT_REQUEST, DISCONNECT}`
    pub fn logout_anfrage(&self) -> Vec<String> {
        vec![
            tags::CLIENT_LOGOUT_REQUEST.into(),
            tags::CLIENT_DISCONNECT.into(),
        ]
    }
}

/// Geraete-Namen aus allen Payload-Tokens (jeweils `;`-getrennt)
fn geraete_ereignis(payload: &[Token], gesperrt: bool) -> Aktion {
    let namen: Vec<String> = payload
        .iter()
        .flat_map(|token| {
            token
                .text()
                .split(GERAETE_TRENNER)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .collect();
    tracing::debug!(anzahl = namen.len(), gesperrt, "Geraete empfangen");
    Aktion::Ereignis(SessionEvent::GeraeteEmpfangen { namen, gesperrt })
}
