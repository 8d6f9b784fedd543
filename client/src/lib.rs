//! raumwart-client – Bibliotheks-Root
//!
//! Baut eine TCP-Verbindung zum Server auf, fuehrt eine Session bis zum
//! Ende und liefert den Beendigungsgrund. Den Prozess beendet nur `main`.

pub mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use config::ClientConfig;
use raumwart_core::TerminalReason;
use raumwart_crypto::CipherRegistry;
use raumwart_session::{
    LoginErgebnis, SessionController, SessionEvent, TcpTransport, Transport,
};

/// Zugangsdaten fuer den automatischen Login
#[derive(Clone)]
pub struct Zugangsdaten {
    pub username: String,
    pub password: String,
}

impl Zugangsdaten {
    /// Liest `RW_USERNAME` und `RW_PASSWORD`, beide muessen gesetzt sein
    pub fn aus_env() -> Option<Self> {
        let username = std::env::var("RW_USERNAME").ok()?;
        let password = std::env::var("RW_PASSWORD").ok()?;
        Some(Self { username, password })
    }
}

impl std::fmt::Debug for Zugangsdaten {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Zugangsdaten")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Haelt die Client-Konfiguration und fuehrt eine Session aus
pub struct Client {
    pub config: ClientConfig,
    zugangsdaten: Option<Zugangsdaten>,
}

impl Client {
    /// Erstellt einen neuen Client aus der gegebenen Konfiguration
    pub fn neu(config: ClientConfig) -> Self {
        Self {
            config,
            zugangsdaten: None,
        }
    }

    pub fn mit_zugangsdaten(mut self, zugangsdaten: Option<Zugangsdaten>) -> Self {
        self.zugangsdaten = zugangsdaten;
        self
    }

    /// Verbindet, fuehrt die Session und laeuft bis zu ihrem Ende
    ///
    /// Ablauf:
    /// 1. TCP-Verbindung aufbauen
    /// 2. Handshake bis `Bereit`
    /// 3. Optional anmelden, Raumliste abfragen
    /// 4. Auf Session-Ende oder Ctrl-C warten (dann Logout)
    pub async fn starten(self) -> Result<TerminalReason> {
        let adresse = self.config.server_adresse();
        tracing::info!(
            server = %adresse,
            cipher = %self.config.sicherheit.cipher,
            "Client startet"
        );

        let (transport, eingang) =
            TcpTransport::establish(&adresse, self.config.verbindung.max_frame_size)
                .await
                .with_context(|| format!("Verbindung zu '{adresse}' fehlgeschlagen"))?;

        let session = SessionController::connect(
            self.config.session_config(),
            Arc::new(CipherRegistry::mit_standard()),
            transport.clone(),
        )
        .await
        .context("Handshake konnte nicht gestartet werden")?;

        let mut ereignisse = session.subscribe();
        tokio::spawn(async move {
            while let Some(ereignis) = ereignisse.recv().await {
                ereignis_protokollieren(&ereignis);
            }
        });

        let mut lauf = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.run(eingang).await })
        };

        if let Err(e) = sitzung_nutzen(&session, self.zugangsdaten.as_ref()).await {
            tracing::warn!(fehler = %e, "Sitzung nicht nutzbar");
        }

        tokio::select! {
            grund = &mut lauf => return grund.context("Session-Task abgebrochen"),
            signal = tokio::signal::ctrl_c() => {
                signal.context("Ctrl-C-Handler nicht verfuegbar")?;
                tracing::info!("Shutdown-Signal empfangen, Session wird beendet");
                if let Err(e) = session.logout().await {
                    tracing::debug!(fehler = %e, "Logout nicht moeglich, schliesse Transport");
                    transport.close().await;
                }
            }
        }

        lauf.await.context("Session-Task abgebrochen")
    }
}

async fn sitzung_nutzen(
    session: &SessionController,
    zugangsdaten: Option<&Zugangsdaten>,
) -> Result<()> {
    session.bereit().await?;
    tracing::info!(session_id = %session.id(), "Session bereit");

    if let Some(zugang) = zugangsdaten {
        match session.login(&zugang.username, &zugang.password).await? {
            LoginErgebnis::Angemeldet(status) => {
                tracing::info!(username = %status.username(), rolle = %status.role(), "Angemeldet")
            }
            LoginErgebnis::Abgelehnt => tracing::warn!("Anmeldung abgelehnt"),
            LoginErgebnis::KeinLoginServer => tracing::warn!("Kein Login-Server erreichbar"),
        }
    }

    let raeume = session.query_rooms().await?;
    tracing::info!(anzahl = raeume.len(), raeume = ?raeume, "Raumliste empfangen");
    Ok(())
}

fn ereignis_protokollieren(ereignis: &SessionEvent) {
    match ereignis {
        SessionEvent::CipherFallback { angefragt, grund } => tracing::warn!(
            angefragt = %angefragt,
            grund = %grund,
            "Session laeuft ohne Verschluesselung"
        ),
        SessionEvent::Beendet(grund) => tracing::info!(grund = %grund, "Session beendet"),
        andere => tracing::debug!(ereignis = ?andere, "Session-Ereignis"),
    }
}

/// Exit-Code des Prozesses fuer einen Beendigungsgrund
pub fn exit_code(grund: &TerminalReason) -> i32 {
    match grund {
        TerminalReason::Abgemeldet => 0,
        TerminalReason::ServerGetrennt => 2,
        TerminalReason::VerbindungGetrennt(_) => 3,
        TerminalReason::Zeitlimit => 4,
        TerminalReason::Protokollverletzung(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nur_logout_ist_erfolgreich() {
        assert_eq!(exit_code(&TerminalReason::Abgemeldet), 0);
        assert_ne!(exit_code(&TerminalReason::ServerGetrennt), 0);
        assert_ne!(exit_code(&TerminalReason::Zeitlimit), 0);
        assert_ne!(
            exit_code(&TerminalReason::Protokollverletzung("x".into())),
            exit_code(&TerminalReason::VerbindungGetrennt("x".into()))
        );
    }

    #[test]
    fn zugangsdaten_debug_ohne_passwort() {
        let zugang = Zugangsdaten {
            username: "frau.meier".into(),
            password: "geheim".into(),
        };
        let text = format!("{zugang:?}");
        assert!(text.contains("frau.meier"));
        assert!(!text.contains("geheim"));
    }
}
