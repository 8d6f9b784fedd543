//! Session-Konfiguration
//!
//! Teilmenge der Client-Konfiguration, die die Session-Engine braucht.
//! Wird vom Binary aus der TOML-Datei abgeleitet.

use std::time::Duration;

use raumwart_crypto::BOOTSTRAP_KEY_BITS;

use crate::error::{SessionError, SessionResult};

/// Konfiguration einer einzelnen Session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Rechnername, wird im Userdata-Block gesendet
    pub hostname: String,
    /// Lokaler Benutzername (Userdata und Heartbeat-Antwort)
    pub username: String,
    /// Kennung dieses Clients
    pub client_id: String,
    /// Erwartete Server-Kennung in `SESSION_CREATED`
    pub server_id: String,
    /// Name des symmetrischen Session-Ciphers
    pub cipher: String,
    /// Schluesselgroesse des Bootstrap-Ciphers in Bit
    pub bootstrap_key_bits: usize,
    /// Zeitlimit fuer den Handshake in Sekunden (0 = kein Limit)
    pub handshake_timeout_sek: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hostname: lokaler_hostname(),
            username: lokaler_benutzer(),
            client_id: "RW-CLIENT".into(),
            server_id: "RW-SERVER".into(),
            cipher: "aes256gcm".into(),
            bootstrap_key_bits: BOOTSTRAP_KEY_BITS,
            handshake_timeout_sek: 30,
        }
    }
}

impl SessionConfig {
    /// Zeitlimit fuer den Handshake, `None` wenn deaktiviert
    pub fn handshake_frist(&self) -> Option<Duration> {
        (self.handshake_timeout_sek > 0).then(|| Duration::from_secs(self.handshake_timeout_sek))
    }

    /// Prueft die Konfiguration vor dem Verbindungsaufbau
    pub fn validieren(&self) -> SessionResult<()> {
        if self.server_id.trim().is_empty() {
            return Err(SessionError::Konfiguration(
                "server_id darf nicht leer sein".into(),
            ));
        }
        if self.username.trim().is_empty() {
            return Err(SessionError::Konfiguration(
                "username darf nicht leer sein".into(),
            ));
        }
        if self.bootstrap_key_bits != BOOTSTRAP_KEY_BITS {
            return Err(SessionError::Konfiguration(format!(
                "bootstrap_key_bits muss {} sein, ist {}",
                BOOTSTRAP_KEY_BITS, self.bootstrap_key_bits
            )));
        }
        Ok(())
    }
}

/// Dateien mit dem Rechnernamen (Linux bzw. Unix)
const HOSTNAME_DATEIEN: &[&str] = &["/proc/sys/kernel/hostname", "/etc/hostname"];

fn lokaler_hostname() -> String {
    let umgebung = [
        std::env::var("HOSTNAME").ok(),
        std::env::var("COMPUTERNAME").ok(),
    ];
    hostname_aufloesen(&umgebung, HOSTNAME_DATEIEN).unwrap_or_else(|| {
        tracing::warn!("Rechnername nicht ermittelbar, verwende 'localhost' ([identitaet] hostname setzen)");
        "localhost".into()
    })
}

/// Erster nicht-leerer Wert aus Umgebung, danach aus den Dateien
fn hostname_aufloesen(umgebung: &[Option<String>], dateien: &[&str]) -> Option<String> {
    let aus_dateien = dateien
        .iter()
        .filter_map(|pfad| std::fs::read_to_string(pfad).ok());
    umgebung
        .iter()
        .flatten()
        .cloned()
        .chain(aus_dateien)
        .map(|wert| wert.trim().to_string())
        .find(|wert| !wert.is_empty())
}

fn lokaler_benutzer() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unbekannt".into())
}
