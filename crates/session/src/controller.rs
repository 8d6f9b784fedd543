//! SessionController – Fassade einer Client-Session
//!
//! Besitzt Transport, aktiven Cipher, Backlog und Session-Zustand. Der
//! Empfangspfad (`run` bzw. `on_receive`) laeuft sequenziell, ausgehende
//! Befehle koennen aus beliebigen Tasks kommen und teilen sich den Sende-
//! Mutex des `UnitSender`.
//!
//! Fatale Fehler beenden nie den Prozess. Die Session geht in
//! `Terminated` ueber und `run` liefert den `TerminalReason` zurueck.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use raumwart_core::{SessionState, TerminalReason, UserStatus};
use raumwart_crypto::CipherRegistry;
use raumwart_protocol::{tags, BacklogAssembler};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::aktion::Aktion;
use crate::codec::{MessageCodec, UnitSender};
use crate::config::SessionConfig;
use crate::dispatcher::{CommandDispatcher, GeraeteBefehl};
use crate::error::{SessionError, SessionResult};
use crate::events::{EventKind, EventSlots, SessionEvent};
use crate::handshake::HandshakeStateMachine;
use crate::transport::{Transport, TransportEmpfang, TransportEvent};

/// Ergebnis eines Login-Versuchs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginErgebnis {
    Angemeldet(UserStatus),
    Abgelehnt,
    KeinLoginServer,
}

/// Fassade einer einzelnen Client-Session
pub struct SessionController {
    id: Uuid,
    codec: Arc<MessageCodec>,
    sender: Arc<UnitSender>,
    zustand: Mutex<SessionState>,
    backlog: Mutex<BacklogAssembler>,
    handshake: HandshakeStateMachine,
    dispatcher: CommandDispatcher,
    events: EventSlots,
    beendet: watch::Sender<bool>,
}

impl SessionController {
    /// Startet den Handshake auf einem bereits aufgebauten Transport
    ///
    /// Sendet den Public Key und liefert den Controller im Zustand
    /// `AwaitingSessionKey`. Eingehende Nachrichten verarbeitet `run`.
    pub async fn connect(
        config: SessionConfig,
        registry: Arc<CipherRegistry>,
        transport: Arc<dyn Transport>,
    ) -> SessionResult<Arc<Self>> {
        config.validieren()?;
        let config = Arc::new(config);
        let codec = Arc::new(MessageCodec::neu());
        let (beendet, _) = watch::channel(false);

        let controller = Arc::new(Self {
            id: Uuid::new_v4(),
            sender: Arc::new(UnitSender::neu(Arc::clone(&codec), transport)),
            codec,
            zustand: Mutex::new(SessionState::Connecting),
            backlog: Mutex::new(BacklogAssembler::neu()),
            handshake: HandshakeStateMachine::neu(Arc::clone(&config), registry),
            dispatcher: CommandDispatcher::neu(config),
            events: EventSlots::neu(),
            beendet,
        });

        tracing::info!(session_id = %controller.id, "Session gestartet");
        let aktionen = controller.handshake.starten()?;
        controller.ausfuehren(aktionen).await;

        match controller.state() {
            SessionState::Terminated(grund) => Err(SessionError::Beendet(grund)),
            _ => Ok(controller),
        }
    }

    // -----------------------------------------------------------------------
    // Empfangspfad
    // -----------------------------------------------------------------------

    /// Verarbeitet Transport-Ereignisse bis die Session beendet ist
    ///
    /// Vor `Authenticated` gilt das Handshake-Zeitlimit aus der
    /// Konfiguration, danach wird unbegrenzt gewartet.
    pub async fn run(&self, eingang: TransportEmpfang) -> TerminalReason {
        let span = tracing::info_span!("session", session_id = %self.id);
        self.run_schleife(eingang).instrument(span).await
    }

    async fn run_schleife(&self, mut eingang: TransportEmpfang) -> TerminalReason {
        let mut beendet = self.beendet.subscribe();
        let frist = self
            .handshake
            .frist()
            .map(|dauer| tokio::time::Instant::now() + dauer);

        loop {
            let zustand = self.state();
            if let SessionState::Terminated(grund) = &zustand {
                return grund.clone();
            }

            let zeitlimit_aktiv = !zustand.ist_authentifiziert();
            let zeitpunkt = frist.unwrap_or_else(tokio::time::Instant::now);

            tokio::select! {
                _ = beendet.changed() => {}
                _ = tokio::time::sleep_until(zeitpunkt), if zeitlimit_aktiv && frist.is_some() => {
                    tracing::error!(zustand = zustand.name(), "Handshake-Zeitlimit ueberschritten");
                    self.beenden(TerminalReason::Zeitlimit).await;
                }
                ereignis = eingang.recv() => match ereignis {
                    Some(TransportEvent::Empfangen(roh)) => self.on_receive(roh).await,
                    Some(TransportEvent::Beendet(grund)) => self.on_terminate(grund).await,
                    None => self.on_terminate("Transport-Kanal geschlossen".into()).await,
                },
            }
        }
    }

    /// Verarbeitet eine rohe Transport-Nachricht
    pub async fn on_receive(&self, roh: Bytes) {
        if self.state().ist_beendet() {
            tracing::trace!("Nachricht nach Session-Ende verworfen");
            return;
        }

        let token = match self.codec.decode(&roh) {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(fehler = %e, "Nachricht nicht lesbar");
                self.beenden(TerminalReason::Protokollverletzung(e.to_string()))
                    .await;
                return;
            }
        };

        let Some(unit) = self.backlog.lock().push(token) else {
            return;
        };

        let zustand = self.state();
        tracing::debug!(zustand = zustand.name(), unit = %unit.beschreibung(), "Unit empfangen");

        let aktionen = if zustand.ist_authentifiziert() {
            self.dispatcher.verarbeiten(&zustand, unit)
        } else {
            self.handshake.verarbeiten(&zustand, unit)
        };
        self.ausfuehren(aktionen).await;
    }

    /// Transport wurde von aussen beendet
    pub async fn on_terminate(&self, grund: String) {
        tracing::error!(grund = %grund, "Verbindung getrennt");
        self.beenden(TerminalReason::VerbindungGetrennt(grund)).await;
    }

    async fn ausfuehren(&self, aktionen: Vec<Aktion>) {
        for aktion in aktionen {
            match aktion {
                Aktion::Senden(unit) => {
                    if let Err(e) = self.sender.send_unit(&unit).await {
                        self.senden_fehlgeschlagen(&e).await;
                        return;
                    }
                }
                Aktion::SendenUnverschluesselt(unit) => {
                    if let Err(e) = self.sender.send_unit_plain(&unit).await {
                        self.senden_fehlgeschlagen(&e).await;
                        return;
                    }
                }
                Aktion::CipherSetzen(cipher) => self.codec.wechseln(cipher),
                Aktion::ZustandSetzen(neu) => self.zustand_setzen(neu),
                Aktion::Ereignis(ereignis) => self.events.ausloesen(ereignis),
                Aktion::Beenden(grund) => {
                    self.beenden(grund).await;
                    return;
                }
            }
        }
    }

    /// Sendet eine Befehls-Unit, ein Sendefehler beendet die Session
    async fn befehl_senden(&self, unit: &[String]) -> SessionResult<()> {
        if let Err(e) = self.sender.send_unit(unit).await {
            self.senden_fehlgeschlagen(&e).await;
            return Err(e);
        }
        Ok(())
    }

    async fn senden_fehlgeschlagen(&self, fehler: &SessionError) {
        tracing::error!(fehler = %fehler, "Senden fehlgeschlagen");
        self.beenden(TerminalReason::VerbindungGetrennt(fehler.to_string()))
            .await;
    }

    fn zustand_setzen(&self, neu: SessionState) {
        let mut zustand = self.zustand.lock();
        if zustand.ist_beendet() {
            return;
        }
        tracing::debug!(von = zustand.name(), nach = neu.name(), "Zustandswechsel");
        *zustand = neu;
    }

    /// Beendet die Session genau einmal
    async fn beenden(&self, grund: TerminalReason) {
        self.beenden_mit(grund, vec![tags::CLIENT_DISCONNECT.to_string()])
            .await;
    }

    async fn beenden_mit(&self, grund: TerminalReason, abschied: Vec<String>) {
        {
            let mut zustand = self.zustand.lock();
            if zustand.ist_beendet() {
                return;
            }
            *zustand = SessionState::Terminated(grund.clone());
        }
        self.backlog.lock().leeren();

        // Transport kann bereits weg sein
        if let Err(e) = self.sender.send_unit(&abschied).await {
            tracing::debug!(fehler = %e, "Abschied nicht zugestellt");
        }
        self.sender.close().await;

        if grund.ist_regulaer() {
            tracing::info!(session_id = %self.id, "Session beendet");
        } else {
            tracing::warn!(session_id = %self.id, grund = %grund, "Session beendet");
        }

        self.events.ausloesen(SessionEvent::Beendet(grund));
        self.events.einmalige_verwerfen();
        self.beendet.send_replace(true);
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Aktueller Zustand (Kopie)
    pub fn state(&self) -> SessionState {
        self.zustand.lock().clone()
    }

    pub fn user_status(&self) -> UserStatus {
        self.zustand.lock().user_status()
    }

    /// Name des aktiven Ciphers
    pub fn cipher_name(&self) -> String {
        self.codec.cipher_name()
    }

    /// Anzahl der Tokens der laufenden Unit
    pub fn backlog_len(&self) -> usize {
        self.backlog.lock().len()
    }

    /// Dauerhafter Abonnent fuer alle Ereignisse
    pub fn subscribe(&self) -> tokio::sync::mpsc::UnboundedReceiver<SessionEvent> {
        self.events.abonnieren()
    }

    /// Einmaliger Slot fuer das naechste Ereignis dieser Art
    pub fn einmalig(&self, kind: EventKind) -> oneshot::Receiver<SessionEvent> {
        self.events.einmalig(kind)
    }

    /// Wartet bis der Handshake abgeschlossen ist
    pub async fn bereit(&self) -> SessionResult<()> {
        let slot = self.events.einmalig(EventKind::Bereit);
        match self.state() {
            zustand if zustand.ist_authentifiziert() => return Ok(()),
            SessionState::Terminated(grund) => return Err(SessionError::Beendet(grund)),
            _ => {}
        }
        self.warten(slot).await.map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Ausgehende Befehle
    // -----------------------------------------------------------------------

    /// Meldet einen Benutzer an und wartet auf das Ergebnis
    ///
    /// Leere Zugangsdaten werden ohne Netzwerkverkehr abgelehnt.
    pub async fn login(&self, username: &str, password: &str) -> SessionResult<LoginErgebnis> {
        let unit = self.dispatcher.login_anfrage(username, password)?;
        self.authentifiziert()?;

        let slot = self.events.einmalig(EventKind::Login);
        self.zustand_setzen(SessionState::CredentialsPending {
            pending_username: username.to_string(),
        });
        tracing::info!(username = %username, "Sende Login-Anfrage");
        self.befehl_senden(&unit).await?;

        match self.warten(slot).await? {
            SessionEvent::Angemeldet(status) => Ok(LoginErgebnis::Angemeldet(status)),
            SessionEvent::KeinLoginServer => Ok(LoginErgebnis::KeinLoginServer),
            _ => Ok(LoginErgebnis::Abgelehnt),
        }
    }

    /// Fragt alle Raeume ab
    pub async fn query_rooms(&self) -> SessionResult<Vec<String>> {
        self.authentifiziert()?;
        let slot = self.events.einmalig(EventKind::Raeume);
        self.befehl_senden(&self.dispatcher.raeume_anfrage()).await?;

        match self.warten(slot).await? {
            SessionEvent::RaeumeEmpfangen(raeume) => Ok(raeume),
            andere => Err(unerwartet(andere)),
        }
    }

    /// Fragt die gestarteten bzw. gesperrten Geraete eines Raums ab
    pub async fn query_devices(&self, raum: &str, gesperrt: bool) -> SessionResult<Vec<String>> {
        let unit = self.dispatcher.geraete_anfrage(raum, gesperrt)?;
        self.authentifiziert()?;
        let slot = self.events.einmalig(EventKind::geraete(gesperrt));
        self.befehl_senden(&unit).await?;

        match self.warten(slot).await? {
            SessionEvent::GeraeteEmpfangen { namen, .. } => Ok(namen),
            andere => Err(unerwartet(andere)),
        }
    }

    /// Faehrt Geraete herunter oder startet sie neu (im Hintergrund)
    pub fn shutdown_devices(
        self: &Arc<Self>,
        clients: Vec<String>,
        neustart: bool,
    ) -> SessionResult<JoinHandle<SessionResult<()>>> {
        let befehl = if neustart {
            GeraeteBefehl::Neustarten
        } else {
            GeraeteBefehl::Herunterfahren
        };
        self.massenbefehl(befehl, clients)
    }

    /// Sperrt oder entsperrt Geraete (im Hintergrund)
    pub fn lock_devices(
        self: &Arc<Self>,
        clients: Vec<String>,
        sperren: bool,
    ) -> SessionResult<JoinHandle<SessionResult<()>>> {
        let befehl = if sperren {
            GeraeteBefehl::Sperren
        } else {
            GeraeteBefehl::Entsperren
        };
        self.massenbefehl(befehl, clients)
    }

    fn massenbefehl(
        self: &Arc<Self>,
        befehl: GeraeteBefehl,
        clients: Vec<String>,
    ) -> SessionResult<JoinHandle<SessionResult<()>>> {
        let unit = self.dispatcher.geraete_befehl(befehl, &clients)?;
        self.authentifiziert()?;

        let controller = Arc::clone(self);
        let span = tracing::debug_span!("massenbefehl", session_id = %self.id, befehl = ?befehl);
        Ok(tokio::spawn(
            async move {
                tracing::info!(anzahl = clients.len(), "Sende Massenbefehl");
                controller.befehl_senden(&unit).await
            }
            .instrument(span),
        ))
    }

    /// Meldet ab und beendet die Session regulaer
    pub async fn logout(&self) -> SessionResult<()> {
        self.authentifiziert()?;
        tracing::info!("Abmelden");
        self.beenden_mit(TerminalReason::Abgemeldet, self.dispatcher.logout_anfrage())
            .await;
        Ok(())
    }

    fn authentifiziert(&self) -> SessionResult<()> {
        match self.state() {
            zustand if zustand.ist_authentifiziert() => Ok(()),
            SessionState::Terminated(grund) => Err(SessionError::Beendet(grund)),
            zustand => Err(SessionError::NichtBereit(zustand.name())),
        }
    }

    async fn warten(&self, slot: oneshot::Receiver<SessionEvent>) -> SessionResult<SessionEvent> {
        slot.await.map_err(|_| match self.state() {
            SessionState::Terminated(grund) => SessionError::Beendet(grund),
            zustand => SessionError::NichtBereit(zustand.name()),
        })
    }
}

fn unerwartet(ereignis: SessionEvent) -> SessionError {
    SessionError::protokoll(format!("Unerwartetes Ereignis: {:?}", ereignis))
}
