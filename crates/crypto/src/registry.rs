//! Cipher-Registry – Name -> Konstruktor
//!
//! Namen werden klein geschrieben abgelegt. Ein unbekannter Name ist ein
//! behebbarer Fehler: `resolve_or_fallback` liefert dann `NoCipher` plus
//! eine Warnung, die Session laeuft unverschluesselt weiter.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{CryptoError, CryptoResult};
use crate::provider::{CipherProvider, NoCipher};
use crate::symmetric::{SymmetricAlgorithm, SymmetricCipher};

/// Konstruktor fuer einen frischen Cipher
pub type CipherFactory = Arc<dyn Fn() -> CryptoResult<Box<dyn CipherProvider>> + Send + Sync>;

/// Ergebnis von `resolve_or_fallback`
pub struct CipherAufloesung {
    pub cipher: Box<dyn CipherProvider>,
    /// Gesetzt wenn auf `NoCipher` zurueckgefallen wurde
    pub warnung: Option<CryptoError>,
}

impl CipherAufloesung {
    /// Gibt true zurueck wenn der angefragte Cipher nicht verfuegbar war
    pub fn ist_fallback(&self) -> bool {
        self.warnung.is_some()
    }
}

/// Cipher-Registry – thread-sicher via DashMap
pub struct CipherRegistry {
    eintraege: DashMap<String, CipherFactory>,
}

impl CipherRegistry {
    /// Erstellt eine leere Registry
    pub fn neu() -> Self {
        Self {
            eintraege: DashMap::new(),
        }
    }

    /// Registry mit `none` und allen eingebauten symmetrischen Ciphern
    pub fn mit_standard() -> Self {
        let registry = Self::neu();
        registry.eintraege.insert(
            NoCipher::NAME.to_string(),
            Arc::new(|| Ok(Box::new(NoCipher) as Box<dyn CipherProvider>)),
        );
        for algorithm in SymmetricAlgorithm::alle() {
            registry.eintraege.insert(
                algorithm.name().to_string(),
                Arc::new(move || {
                    Ok(Box::new(SymmetricCipher::neu(algorithm)) as Box<dyn CipherProvider>)
                }),
            );
        }
        registry
    }

    /// Registriert einen zusaetzlichen Cipher
    pub fn registrieren(&self, name: &str, factory: CipherFactory) -> CryptoResult<()> {
        match self.eintraege.entry(normalisieren(name)) {
            Entry::Occupied(eintrag) => Err(CryptoError::CipherBereitsRegistriert(
                eintrag.key().clone(),
            )),
            Entry::Vacant(eintrag) => {
                tracing::debug!(cipher = %eintrag.key(), "Cipher registriert");
                eintrag.insert(factory);
                Ok(())
            }
        }
    }

    /// Erstellt eine frische Instanz des benannten Ciphers
    pub fn resolve(&self, name: &str) -> CryptoResult<Box<dyn CipherProvider>> {
        let name = normalisieren(name);
        // Factory klonen, damit der Shard-Lock nicht waehrend der Konstruktion gehalten wird
        let factory = self
            .eintraege
            .get(&name)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| CryptoError::UnbekannterCipher(name.clone()))?;
        factory()
    }

    /// Wie `resolve`, faellt bei Fehlern aber auf `NoCipher` zurueck
    pub fn resolve_or_fallback(&self, name: &str) -> CipherAufloesung {
        match self.resolve(name) {
            Ok(cipher) => CipherAufloesung {
                cipher,
                warnung: None,
            },
            Err(e) => CipherAufloesung {
                cipher: Box::new(NoCipher),
                warnung: Some(e),
            },
        }
    }

    /// Alle registrierten Namen (sortiert)
    pub fn namen(&self) -> Vec<String> {
        let mut namen: Vec<String> = self.eintraege.iter().map(|e| e.key().clone()).collect();
        namen.sort();
        namen
    }

    /// Anzahl registrierter Cipher
    pub fn anzahl(&self) -> usize {
        self.eintraege.len()
    }
}

impl Default for CipherRegistry {
    fn default() -> Self {
        Self::mit_standard()
    }
}

fn normalisieren(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
