//! raumwart-protocol – Leitungsformat des Raumwart-Protokolls
//!
//! Jede Sendung ist genau eine Transport-Nachricht mit genau einem Token.
//! Ein logischer Befehl (Unit) besteht aus einem oder mehreren Tokens und
//! wird vom `BacklogAssembler` wieder zusammengesetzt.
//!
//! ## Module
//! - `tags` - Tag-Katalog (32-Byte-Literale)
//! - `wire` - Laengen-Praefix-Framing fuer Byte-Streams (TCP)
//! - `backlog` - Zusammensetzen von Tokens zu Units

pub mod backlog;
pub mod tags;
pub mod wire;

pub use backlog::{BacklogAssembler, Signal, Token, Unit};
pub use tags::TAG_LEN;
pub use wire::FrameCodec;
