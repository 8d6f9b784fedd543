//! Handshake – von der Verbindung bis zur authentifizierten Session
//!
//! ## Ablauf
//! ```text
//! Client                                   Server
//!   | -- PUBLIC_KEY, key (unverschluesselt) -> |
//!   | <- SESSION_KEY, material (Bootstrap) --- |
//!   |    rekey, Session-Cipher aktiv           |
//!   | -- USERDATA, host, user, id ----------> |
//!   | <- SESSION_CREATED, server_id ---------- |
//!   |    Authenticated                         |
//! ```
//!
//! Heartbeats sind in jedem Zustand vor `Authenticated` erlaubt. Jede andere
//! Abweichung ist eine Protokollverletzung und beendet die Session. Es gibt
//! keine Wiederholung.

use std::sync::Arc;
use std::time::Duration;

use raumwart_core::{SessionState, TerminalReason, UserStatus};
use raumwart_crypto::{BootstrapCipher, CipherProvider, CipherRegistry, CryptoError, NoCipher};
use raumwart_protocol::{tags, Signal, Unit};

use crate::aktion::Aktion;
use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::events::SessionEvent;

/// Zustandsautomat des Handshakes (ohne eigenes IO)
pub struct HandshakeStateMachine {
    config: Arc<SessionConfig>,
    registry: Arc<CipherRegistry>,
}

impl HandshakeStateMachine {
    pub fn neu(config: Arc<SessionConfig>, registry: Arc<CipherRegistry>) -> Self {
        Self { config, registry }
    }

    /// Zeitlimit bis `Authenticated`
    pub fn frist(&self) -> Option<Duration> {
        self.config.handshake_frist()
    }

    /// Erste Aktionen nach dem Verbindungsaufbau
    pub fn starten(&self) -> SessionResult<Vec<Aktion>> {
        let bootstrap = BootstrapCipher::neu(self.config.bootstrap_key_bits)?;
        let public_key = bootstrap.export_public_key();
        tracing::info!("Verbindung steht, sende Public Key");

        Ok(vec![
            Aktion::CipherSetzen(Box::new(bootstrap)),
            Aktion::SendenUnverschluesselt(vec![tags::CLIENT_PUBLIC_KEY.into(), public_key]),
            Aktion::ZustandSetzen(SessionState::AwaitingSessionKey),
        ])
    }

    /// Verarbeitet eine Unit vor `Authenticated`
    pub fn verarbeiten(&self, zustand: &SessionState, unit: Unit) -> Vec<Aktion> {
        match (zustand, unit) {
            (_, Unit::Signal(Signal::HeartbeatChallenge)) => {
                tracing::debug!("Heartbeat empfangen");
                vec![self.heartbeat_antwort()]
            }
            (_, Unit::Signal(Signal::Disconnect)) => {
                tracing::error!("Server hat die Verbindung beendet");
                vec![Aktion::Beenden(TerminalReason::ServerGetrennt)]
            }
            (SessionState::AwaitingSessionKey, Unit::Data { tag, payload })
                if tag == tags::SERVER_SESSION_KEY =>
            {
                match payload.first() {
                    Some(material) => self.session_key(material.bytes()),
                    None => verletzung("SESSION_KEY ohne Schluesselmaterial".into()),
                }
            }
            (SessionState::AwaitingSessionAck, Unit::Data { tag, payload })
                if tag == tags::SERVER_SESSION_CREATED =>
            {
                let kennung = payload.first().map(|t| t.text()).unwrap_or_default();
                if kennung == self.config.server_id {
                    tracing::info!(server_id = %kennung, "Session erstellt");
                    vec![
                        Aktion::ZustandSetzen(SessionState::Authenticated(UserStatus::leer())),
                        Aktion::Ereignis(SessionEvent::Bereit),
                    ]
                } else {
                    verletzung(format!(
                        "Unerwartete Server-Kennung '{}' (erwartet '{}')",
                        kennung, self.config.server_id
                    ))
                }
            }
            (zustand, unit) => verletzung(format!(
                "{} im Zustand {}",
                unit.beschreibung(),
                zustand.name()
            )),
        }
    }

    fn heartbeat_antwort(&self) -> Aktion {
        Aktion::senden([tags::CLIENT_HEARTBEAT, self.config.username.as_str()])
    }

    fn session_key(&self, material: &[u8]) -> Vec<Aktion> {
        let mut aktionen = Vec::new();

        let aufloesung = self.registry.resolve_or_fallback(&self.config.cipher);
        if let Some(warnung) = &aufloesung.warnung {
            tracing::warn!(
                cipher = %self.config.cipher,
                fehler = %warnung,
                "Ungueltiger Cipher, Session laeuft ohne Verschluesselung"
            );
            aktionen.push(fallback_ereignis(&self.config.cipher, warnung));
        }

        let mut cipher = aufloesung.cipher;
        match cipher.rekey(material) {
            Ok(()) => {}
            // `none` hat keinen Schluessel
            Err(CryptoError::RekeyNichtUnterstuetzt(_)) => {}
            Err(e) => {
                tracing::warn!(
                    cipher = cipher.name(),
                    fehler = %e,
                    "Session-Key nicht anwendbar, Session laeuft ohne Verschluesselung"
                );
                aktionen.push(fallback_ereignis(&self.config.cipher, &e));
                cipher = Box::new(NoCipher);
            }
        }

        tracing::info!(cipher = cipher.name(), "Session-Key empfangen, sende Userdata");

        aktionen.push(Aktion::CipherSetzen(cipher));
        aktionen.push(Aktion::senden([
            tags::CLIENT_USERDATA,
            self.config.hostname.as_str(),
            self.config.username.as_str(),
            self.config.client_id.as_str(),
        ]));
        aktionen.push(Aktion::ZustandSetzen(SessionState::AwaitingSessionAck));
        aktionen
    }
}

fn fallback_ereignis(angefragt: &str, fehler: &CryptoError) -> Aktion {
    Aktion::Ereignis(SessionEvent::CipherFallback {
        angefragt: angefragt.to_string(),
        grund: fehler.to_string(),
    })
}

fn verletzung(details: String) -> Vec<Aktion> {
    tracing::error!(details = %details, "Server spricht ein ungueltiges Protokoll");
    vec![Aktion::Beenden(TerminalReason::Protokollverletzung(details))]
}
