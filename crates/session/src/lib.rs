//! raumwart-session – Session-Engine des Raumwart-Clients
//!
//! Datenfluss pro Unit:
//! ```text
//! Transport -> MessageCodec -> BacklogAssembler -> Handshake | Dispatcher
//!                                                       |
//!           Transport <- UnitSender <- Aktionen <-------+
//! ```
//!
//! ## Module
//! - `transport` - Transport-Trait, TCP- und In-Memory-Transport
//! - `codec` - `MessageCodec` und `UnitSender`
//! - `handshake` - Schluesselaustausch bis `Authenticated`
//! - `dispatcher` - eingehende Units und ausgehende Befehle
//! - `events` - Ereignisse, einmalige Slots, Abonnenten
//! - `controller` - `SessionController` (Fassade)

pub mod aktion;
pub mod codec;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod handshake;
pub mod transport;

pub use codec::{MessageCodec, UnitSender};
pub use config::SessionConfig;
pub use controller::{LoginErgebnis, SessionController};
pub use dispatcher::{CommandDispatcher, GeraeteBefehl};
pub use error::{SessionError, SessionResult};
pub use events::{EventKind, EventSlots, SessionEvent};
pub use handshake::HandshakeStateMachine;
pub use transport::{
    Gegenstelle, MemoryTransport, TcpTransport, Transport, TransportEmpfang, TransportEvent,
};
