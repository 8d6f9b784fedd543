//! Session-Ereignisse und Callback-Slots
//!
//! Einmalige Slots werden pro `EventKind` registriert, beim naechsten
//! passenden Ereignis genau einmal aufgeloest und danach entfernt.
//! Dauerhafte Abonnenten erhalten jedes Ereignis.

use std::collections::HashMap;

use parking_lot::Mutex;
use raumwart_core::{TerminalReason, UserStatus};
use tokio::sync::{mpsc, oneshot};

/// Ereignis fuer den Besitzer der Session (UI oder Binary)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Handshake abgeschlossen, Login moeglich
    Bereit,
    /// Login erfolgreich
    Angemeldet(UserStatus),
    /// Server hat die Zugangsdaten abgelehnt
    AnmeldungFehlgeschlagen,
    /// Server hat keinen Login-Server erreicht
    KeinLoginServer,
    /// Antwort auf die Raum-Abfrage
    RaeumeEmpfangen(Vec<String>),
    /// Antwort auf eine Geraete-Abfrage
    GeraeteEmpfangen { namen: Vec<String>, gesperrt: bool },
    /// Konfigurierter Cipher war nicht verfuegbar, Session laeuft ohne Verschluesselung
    CipherFallback { angefragt: String, grund: String },
    /// Session ist beendet
    Beendet(TerminalReason),
}

/// Art eines Ereignisses (Schluessel der einmaligen Slots)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Bereit,
    /// Alle drei Login-Ergebnisse
    Login,
    Raeume,
    /// Liste der gestarteten Geraete
    GeraeteGestartet,
    /// Liste der gesperrten Geraete
    GeraeteGesperrt,
    CipherFallback,
    Beendet,
}

impl EventKind {
    /// Slot-Art einer Geraete-Abfrage
    pub fn geraete(gesperrt: bool) -> Self {
        if gesperrt {
            EventKind::GeraeteGesperrt
        } else {
            EventKind::GeraeteGestartet
        }
    }
}

impl SessionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SessionEvent::Bereit => EventKind::Bereit,
            SessionEvent::Angemeldet(_)
            | SessionEvent::AnmeldungFehlgeschlagen
            | SessionEvent::KeinLoginServer => EventKind::Login,
            SessionEvent::RaeumeEmpfangen(_) => EventKind::Raeume,
            SessionEvent::GeraeteEmpfangen { gesperrt, .. } => EventKind::geraete(*gesperrt),
            SessionEvent::CipherFallback { .. } => EventKind::CipherFallback,
            SessionEvent::Beendet(_) => EventKind::Beendet,
        }
    }
}

/// Einmalige und dauerhafte Empfaenger von Session-Ereignissen
#[derive(Default)]
pub struct EventSlots {
    einmalig: Mutex<HashMap<EventKind, Vec<oneshot::Sender<SessionEvent>>>>,
    abonnenten: Mutex<Vec<mpsc::UnboundedSender<SessionEvent>>>,
}

impl EventSlots {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert einen einmaligen Slot
    pub fn einmalig(&self, kind: EventKind) -> oneshot::Receiver<SessionEvent> {
        let (tx, rx) = oneshot::channel();
        self.einmalig.lock().entry(kind).or_default().push(tx);
        rx
    }

    /// Registriert einen dauerhaften Abonnenten
    pub fn abonnieren(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.abonnenten.lock().push(tx);
        rx
    }

    /// Liefert ein Ereignis an alle passenden Slots und Abonnenten
    pub fn ausloesen(&self, ereignis: SessionEvent) {
        let slots = self
            .einmalig
            .lock()
            .remove(&ereignis.kind())
            .unwrap_or_default();
        for slot in slots {
            let _ = slot.send(ereignis.clone());
        }

        self.abonnenten
            .lock()
            .retain(|tx| tx.send(ereignis.clone()).is_ok());
    }

    /// Verwirft alle offenen einmaligen Slots (Wartende erhalten einen Fehler)
    pub fn einmalige_verwerfen(&self) {
        self.einmalig.lock().clear();
    }

    /// Anzahl offener einmaliger Slots
    pub fn offene_slots(&self) -> usize {
        self.einmalig.lock().values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn einmaliger_slot_wird_genau_einmal_aufgeloest() {
        let slots = EventSlots::neu();
        let mut rx = slots.einmalig(EventKind::Raeume);
        assert_eq!(slots.offene_slots(), 1);

        slots.ausloesen(SessionEvent::RaeumeEmpfangen(vec!["A".into()]));
        slots.ausloesen(SessionEvent::RaeumeEmpfangen(vec!["B".into()]));

        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::RaeumeEmpfangen(vec!["A".into()])
        );
        assert_eq!(slots.offene_slots(), 0);
    }

    #[test]
    fn fremde_art_loest_slot_nicht_aus() {
        let slots = EventSlots::neu();
        let mut rx = slots.einmalig(EventKind::Login);
        slots.ausloesen(SessionEvent::Bereit);
        assert!(rx.try_recv().is_err());

        slots.ausloesen(SessionEvent::KeinLoginServer);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::KeinLoginServer);
    }

    #[test]
    fn abonnenten_erhalten_alles() {
        let slots = EventSlots::neu();
        let mut rx = slots.abonnieren();
        slots.ausloesen(SessionEvent::Bereit);
        slots.ausloesen(SessionEvent::AnmeldungFehlgeschlagen);

        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Bereit);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::AnmeldungFehlgeschlagen);
    }

    #[test]
    fn geschlossene_abonnenten_werden_entfernt() {
        let slots = EventSlots::neu();
        drop(slots.abonnieren());
        slots.ausloesen(SessionEvent::Bereit);
        assert!(slots.abonnenten.lock().is_empty());
    }

    #[test]
    fn geraete_slots_nach_variante_getrennt() {
        let slots = EventSlots::neu();
        let mut gesperrt = slots.einmalig(EventKind::GeraeteGesperrt);
        let mut gestartet = slots.einmalig(EventKind::GeraeteGestartet);

        slots.ausloesen(SessionEvent::GeraeteEmpfangen {
            namen: vec!["pc1".into()],
            gesperrt: false,
        });
        assert!(gesperrt.try_recv().is_err());
        assert_eq!(
            gestartet.try_recv().unwrap(),
            SessionEvent::GeraeteEmpfangen {
                namen: vec!["pc1".into()],
                gesperrt: false
            }
        );
        assert_eq!(slots.offene_slots(), 1);
    }

    #[tokio::test]
    async fn verwerfen_weckt_wartende() {
        let slots = EventSlots::neu();
        let rx = slots.einmalig(EventKind::GeraeteGesperrt);
        slots.einmalige_verwerfen();
        assert!(rx.await.is_err());
    }
}
