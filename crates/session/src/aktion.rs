//! Aktionen, die Handshake und Dispatcher beim Controller anfordern
//!
//! Beide Zustandsautomaten fuehren selbst kein IO aus. Sie liefern eine
//! geordnete Liste von Aktionen, die der `SessionController` nacheinander
//! ausfuehrt.

use raumwart_core::{SessionState, TerminalReason};
use raumwart_crypto::CipherProvider;

use crate::events::SessionEvent;

/// Eine vom Controller auszufuehrende Aktion
pub enum Aktion {
    /// Unit unter dem aktiven Cipher senden
    Senden(Vec<String>),
    /// Unit unverschluesselt senden
    SendenUnverschluesselt(Vec<String>),
    /// Aktiven Cipher ersetzen
    CipherSetzen(Box<dyn CipherProvider>),
    /// Neuen Session-Zustand setzen
    ZustandSetzen(SessionState),
    /// Ereignis an Slots und Abonnenten liefern
    Ereignis(SessionEvent),
    /// Session beenden (Disconnect senden, Transport schliessen)
    Beenden(TerminalReason),
}

impl Aktion {
    /// Kurzform fuer eine Unit aus Tags und Werten
    pub fn senden<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Aktion::Senden(tokens.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Debug for Aktion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aktion::Senden(unit) => f.debug_tuple("Senden").field(unit).finish(),
            Aktion::SendenUnverschluesselt(unit) => {
                f.debug_tuple("SendenUnverschluesselt").field(unit).finish()
            }
            Aktion::CipherSetzen(cipher) => {
                f.debug_tuple("CipherSetzen").field(&cipher.name()).finish()
            }
            Aktion::ZustandSetzen(zustand) => f.debug_tuple("ZustandSetzen").field(zustand).finish(),
            Aktion::Ereignis(ereignis) => f.debug_tuple("Ereignis").field(ereignis).finish(),
            Aktion::Beenden(grund) => f.debug_tuple("Beenden").field(grund).finish(),
        }
    }
}
