//! Transport – nachrichtenorientierte Verbindung zum Server
//!
//! Eine Sendung ist genau eine Transport-Nachricht. Eingehende Nachrichten
//! und das Verbindungsende werden als `TransportEvent` ueber einen Kanal
//! geliefert, den der Besitzer an `SessionController::run` uebergibt.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{SplitSink, StreamExt};
use futures_util::SinkExt;
use raumwart_protocol::FrameCodec;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use crate::error::{SessionError, SessionResult};

/// Ereignis auf der Empfangsseite eines Transports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Eine vollstaendige Nachricht ist eingetroffen
    Empfangen(Bytes),
    /// Verbindung wurde beendet (Grund fuer Logs)
    Beendet(String),
}

/// Empfangskanal eines Transports
pub type TransportEmpfang = mpsc::UnboundedReceiver<TransportEvent>;

/// Sendeseite eines Transports
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sendet eine einzelne Nachricht
    async fn send(&self, nachricht: Bytes) -> SessionResult<()>;

    /// Schliesst die Verbindung (idempotent)
    async fn close(&self);
}

// ---------------------------------------------------------------------------
// TcpTransport
// ---------------------------------------------------------------------------

type FramedSink = SplitSink<Framed<TcpStream, FrameCodec>, Bytes>;

/// TCP-Transport mit Laengen-Praefix-Framing
pub struct TcpTransport {
    sink: tokio::sync::Mutex<FramedSink>,
    leser: parking_lot::Mutex<Option<JoinHandle<()>>>,
    peer: SocketAddr,
}

impl TcpTransport {
    /// Baut die Verbindung auf und startet den Lese-Task
    pub async fn establish(
        adresse: &str,
        max_frame_size: usize,
    ) -> SessionResult<(Arc<Self>, TransportEmpfang)> {
        let stream = TcpStream::connect(adresse).await?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;

        let framed = Framed::new(stream, FrameCodec::with_max_size(max_frame_size));
        let (sink, mut stream) = framed.split();
        let (tx, rx) = mpsc::unbounded_channel();

        let leser = tokio::spawn(async move {
            let grund = loop {
                match stream.next().await {
                    Some(Ok(frame)) => {
                        if tx.send(TransportEvent::Empfangen(frame)).is_err() {
                            return;
                        }
                    }
                    Some(Err(e)) => break format!("Frame-Lesefehler: {}", e),
                    None => break "Verbindung vom Server geschlossen".to_string(),
                }
            };
            tracing::debug!(peer = %peer, grund = %grund, "Lese-Task beendet");
            let _ = tx.send(TransportEvent::Beendet(grund));
        });

        tracing::info!(peer = %peer, "TCP-Verbindung aufgebaut");

        Ok((
            Arc::new(Self {
                sink: tokio::sync::Mutex::new(sink),
                leser: parking_lot::Mutex::new(Some(leser)),
                peer,
            }),
            rx,
        ))
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, nachricht: Bytes) -> SessionResult<()> {
        self.sink.lock().await.send(nachricht).await?;
        Ok(())
    }

    async fn close(&self) {
        if let Some(leser) = self.leser.lock().take() {
            leser.abort();
        }
        if let Err(e) = self.sink.lock().await.close().await {
            tracing::debug!(peer = %self.peer, fehler = %e, "Schliessen fehlgeschlagen");
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryTransport
// ---------------------------------------------------------------------------

/// In-Memory-Transport fuer Tests und Simulationen
///
/// Alles Gesendete landet bei der `Gegenstelle`, die ihrerseits Nachrichten
/// an den Client zustellen oder die Verbindung trennen kann.
pub struct MemoryTransport {
    ausgang: mpsc::UnboundedSender<Bytes>,
    gesendet: parking_lot::Mutex<Vec<Bytes>>,
    geschlossen: AtomicBool,
}

/// Server-Seite eines `MemoryTransport`
pub struct Gegenstelle {
    ausgang: mpsc::UnboundedReceiver<Bytes>,
    eingang: mpsc::UnboundedSender<TransportEvent>,
}

impl MemoryTransport {
    /// Erstellt ein verbundenes Paar aus Transport, Empfangskanal und Gegenstelle
    pub fn verbinden() -> (Arc<Self>, TransportEmpfang, Gegenstelle) {
        let (ausgang_tx, ausgang_rx) = mpsc::unbounded_channel();
        let (eingang_tx, eingang_rx) = mpsc::unbounded_channel();

        let transport = Arc::new(Self {
            ausgang: ausgang_tx,
            gesendet: parking_lot::Mutex::new(Vec::new()),
            geschlossen: AtomicBool::new(false),
        });
        let gegenstelle = Gegenstelle {
            ausgang: ausgang_rx,
            eingang: eingang_tx,
        };
        (transport, eingang_rx, gegenstelle)
    }

    /// Alle bisher gesendeten Nachrichten
    pub fn gesendet(&self) -> Vec<Bytes> {
        self.gesendet.lock().clone()
    }

    pub fn ist_geschlossen(&self) -> bool {
        self.geschlossen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, nachricht: Bytes) -> SessionResult<()> {
        if self.ist_geschlossen() {
            return Err(SessionError::TransportGeschlossen);
        }
        self.gesendet.lock().push(nachricht.clone());
        // Gegenstelle darf bereits weg sein
        let _ = self.ausgang.send(nachricht);
        Ok(())
    }

    async fn close(&self) {
        self.geschlossen.store(true, Ordering::SeqCst);
    }
}

impl Gegenstelle {
    /// Stellt dem Client eine Nachricht zu
    pub fn zustellen(&self, nachricht: impl Into<Bytes>) {
        let _ = self
            .eingang
            .send(TransportEvent::Empfangen(nachricht.into()));
    }

    /// Simuliert einen Verbindungsabbruch
    pub fn trennen(&self, grund: &str) {
        let _ = self.eingang.send(TransportEvent::Beendet(grund.to_string()));
    }

    /// Wartet auf die naechste Nachricht des Clients
    pub async fn empfangen(&mut self) -> Option<Bytes> {
        self.ausgang.recv().await
    }

    /// Naechste bereits gesendete Nachricht, ohne zu warten
    pub fn sofort_empfangen(&mut self) -> Option<Bytes> {
        self.ausgang.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_transport_liefert_an_gegenstelle() {
        let (transport, _rx, mut gegenstelle) = MemoryTransport::verbinden();
        transport.send(Bytes::from_static(b"hallo")).await.unwrap();

        assert_eq!(gegenstelle.empfangen().await.unwrap(), Bytes::from_static(b"hallo"));
        assert_eq!(transport.gesendet().len(), 1);
    }

    #[tokio::test]
    async fn gegenstelle_stellt_zu_und_trennt() {
        let (_transport, mut rx, gegenstelle) = MemoryTransport::verbinden();
        gegenstelle.zustellen(Bytes::from_static(b"x"));
        gegenstelle.trennen("weg");

        assert_eq!(
            rx.recv().await,
            Some(TransportEvent::Empfangen(Bytes::from_static(b"x")))
        );
        assert_eq!(rx.recv().await, Some(TransportEvent::Beendet("weg".into())));
    }

    #[tokio::test]
    async fn senden_nach_close_schlaegt_fehl() {
        let (transport, _rx, _gegenstelle) = MemoryTransport::verbinden();
        transport.close().await;
        transport.close().await;
        assert!(transport.ist_geschlossen());
        assert!(matches!(
            transport.send(Bytes::from_static(b"x")).await,
            Err(SessionError::TransportGeschlossen)
        ));
    }

    #[tokio::test]
    async fn tcp_transport_sendet_und_empfaengt_frames() {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let adresse = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut framed = Framed::new(stream, FrameCodec::new());
            let frame = framed.next().await.unwrap().unwrap();
            framed.send(frame).await.unwrap();
            // Danach schliesst der Server
        });

        let (transport, mut rx) = TcpTransport::establish(&adresse, 1024).await.unwrap();
        transport.send(Bytes::from_static(b"echo")).await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some(TransportEvent::Empfangen(Bytes::from_static(b"echo")))
        );
        server.await.unwrap();
        assert!(matches!(rx.recv().await, Some(TransportEvent::Beendet(_))));
        transport.close().await;
    }
}
