//! Client-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Client ohne Konfigurationsdatei
//! lauffaehig ist.

use raumwart_crypto::BOOTSTRAP_KEY_BITS;
use raumwart_protocol::wire::DEFAULT_MAX_FRAME_SIZE;
use raumwart_session::SessionConfig;
use serde::{Deserialize, Serialize};

/// Vollstaendige Client-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server-Adresse und Framing
    pub verbindung: VerbindungsEinstellungen,
    /// Cipher-Auswahl
    pub sicherheit: SicherheitsEinstellungen,
    /// Angaben im Userdata-Block
    pub identitaet: IdentitaetsEinstellungen,
    pub zeitlimits: ZeitlimitEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Verbindungs-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbindungsEinstellungen {
    /// Hostname oder IP des Servers
    pub server: String,
    /// TCP-Port des Servers
    pub port: u16,
    /// Maximale Groesse einer einzelnen Nachricht in Bytes
    pub max_frame_size: usize,
}

impl Default for VerbindungsEinstellungen {
    fn default() -> Self {
        Self {
            server: "127.0.0.1".into(),
            port: 9610,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Sicherheits-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SicherheitsEinstellungen {
    /// Name des Session-Ciphers ("aes256gcm", "chacha20poly1305", "none")
    pub cipher: String,
    /// Schluesselgroesse des Bootstrap-Ciphers in Bit
    pub bootstrap_key_bits: usize,
}

impl Default for SicherheitsEinstellungen {
    fn default() -> Self {
        Self {
            cipher: "aes256gcm".into(),
            bootstrap_key_bits: BOOTSTRAP_KEY_BITS,
        }
    }
}

/// Identitaet des Clients
///
/// Leere Felder werden durch die Werte der Session-Engine ersetzt
/// (Hostname und Benutzer aus der Umgebung).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitaetsEinstellungen {
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub client_id: Option<String>,
    /// Erwartete Server-Kennung
    pub server_id: Option<String>,
}

/// Zeitlimits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZeitlimitEinstellungen {
    /// Zeitlimit fuer den Handshake in Sekunden (0 = kein Limit)
    pub handshake_timeout_sek: u64,
}

impl Default for ZeitlimitEinstellungen {
    fn default() -> Self {
        Self {
            handshake_timeout_sek: 30,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ClientConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => Self::aus_toml(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    pub fn aus_toml(inhalt: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(inhalt)
    }

    /// Gibt die vollstaendige Server-Adresse zurueck
    pub fn server_adresse(&self) -> String {
        format!("{}:{}", self.verbindung.server, self.verbindung.port)
    }

    /// Leitet die Konfiguration der Session-Engine ab
    pub fn session_config(&self) -> SessionConfig {
        let standard = SessionConfig::default();
        let id = &self.identitaet;
        SessionConfig {
            hostname: id.hostname.clone().unwrap_or(standard.hostname),
            username: id.username.clone().unwrap_or(standard.username),
            client_id: id.client_id.clone().unwrap_or(standard.client_id),
            server_id: id.server_id.clone().unwrap_or(standard.server_id),
            cipher: self.sicherheit.cipher.clone(),
            bootstrap_key_bits: self.sicherheit.bootstrap_key_bits,
            handshake_timeout_sek: self.zeitlimits.handshake_timeout_sek,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.verbindung.port, 9610);
        assert_eq!(cfg.sicherheit.cipher, "aes256gcm");
        assert_eq!(cfg.zeitlimits.handshake_timeout_sek, 30);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.session_config().validieren().is_ok());
    }

    #[test]
    fn server_adresse() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.server_adresse(), "127.0.0.1:9610");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [verbindung]
            server = "schulserver.local"

            [sicherheit]
            cipher = "chacha20poly1305"

            [identitaet]
            username = "herr.schulz"
            server_id = "HVH-SERVER"

            [zeitlimits]
            handshake_timeout_sek = 0
        "#;
        let cfg = ClientConfig::aus_toml(toml).unwrap();
        assert_eq!(cfg.server_adresse(), "schulserver.local:9610");

        let session = cfg.session_config();
        assert_eq!(session.cipher, "chacha20poly1305");
        assert_eq!(session.username, "herr.schulz");
        assert_eq!(session.server_id, "HVH-SERVER");
        assert_eq!(session.handshake_frist(), None);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(session.client_id, "RW-CLIENT");
        assert_eq!(cfg.verbindung.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
    }

    #[test]
    fn kaputtes_toml_wird_gemeldet() {
        assert!(ClientConfig::aus_toml("[verbindung]\nport = \"abc\"").is_err());
    }

    #[test]
    fn fehlende_datei_liefert_standard() {
        let cfg = ClientConfig::laden("/nicht/vorhanden/raumwart.toml").unwrap();
        assert_eq!(cfg.verbindung.port, 9610);
    }
}
