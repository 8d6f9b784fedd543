//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable (ueberschreibt die Konfigurationsdatei):
//! - `RW_LOG_LEVEL`: Filter-Direktive (z.B. `info`, `raumwart_session=debug`)
//! - `RW_LOG_FORMAT`: `text` oder `json`
//!
//! Die Session-ID wird als Span-Feld an alle Ereignisse der Session gehaengt.

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LEVEL: &str = "RW_LOG_LEVEL";
pub const ENV_FORMAT: &str = "RW_LOG_FORMAT";

/// Fehler beim Einrichten des Loggings
#[derive(Debug, Error)]
pub enum LoggingFehler {
    #[error("Ungueltiger Log-Level: '{0}'")]
    UngueltigerLevel(String),

    #[error("Ungueltiges Log-Format: '{0}' (erlaubt: text, json)")]
    UngueltigesFormat(String),

    #[error("Logging ist bereits initialisiert: {0}")]
    BereitsInitialisiert(String),
}

/// Ausgabeformat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = LoggingFehler;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            andere => Err(LoggingFehler::UngueltigesFormat(andere.to_string())),
        }
    }
}

/// Initialisiert das Logging-System
///
/// `level` und `format` kommen aus der Konfiguration, die Umgebung hat Vorrang.
pub fn logging_initialisieren(level: &str, format: &str) -> Result<(), LoggingFehler> {
    let level = aus_env_oder(std::env::var(ENV_LEVEL).ok(), level);
    let format: LogFormat = aus_env_oder(std::env::var(ENV_FORMAT).ok(), format).parse()?;

    let filter =
        EnvFilter::try_new(&level).map_err(|_| LoggingFehler::UngueltigerLevel(level.clone()))?;

    let ergebnis = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };
    ergebnis.map_err(|e| LoggingFehler::BereitsInitialisiert(e.to_string()))
}

/// Wert aus der Umgebung, sonst der Konfigurationswert
pub fn aus_env_oder(env: Option<String>, konfiguriert: &str) -> String {
    env.filter(|wert| !wert.trim().is_empty())
        .unwrap_or_else(|| konfiguriert.to_string())
}

/// Validiert einen einfachen Log-Level-String
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert einen Log-Format-String
pub fn log_format_gueltig(format: &str) -> bool {
    format.parse::<LogFormat>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_gueltige_werte() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_level_gueltig(level));
        }
        assert!(!log_level_gueltig("verbose"));
        assert!(!log_level_gueltig("INFO"));
        assert!(!log_level_gueltig(""));
    }

    #[test]
    fn log_format_parsen() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!(log_format_gueltig("text"));
        assert!(!log_format_gueltig("xml"));
        assert!(!log_format_gueltig("JSON"));
    }

    #[test]
    fn umgebung_hat_vorrang() {
        assert_eq!(aus_env_oder(Some("debug".into()), "info"), "debug");
        assert_eq!(aus_env_oder(None, "info"), "info");
        assert_eq!(aus_env_oder(Some("  ".into()), "warn"), "warn");
    }
}
