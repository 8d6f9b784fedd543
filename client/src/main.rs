//! Raumwart Client – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und fuehrt eine Session aus.

use anyhow::Result;
use raumwart_client::{config::ClientConfig, exit_code, Client, Zugangsdaten};
use raumwart_observability::logging_initialisieren;

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("RW_CONFIG").unwrap_or_else(|_| "raumwart.toml".into());

    let config = ClientConfig::laden(&config_pfad)?;

    logging_initialisieren(&config.logging.level, &config.logging.format)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Raumwart Client wird initialisiert"
    );

    let grund = Client::neu(config)
        .mit_zugangsdaten(Zugangsdaten::aus_env())
        .starten()
        .await?;

    tracing::info!(grund = %grund, "Client beendet");
    std::process::exit(exit_code(&grund));
}
