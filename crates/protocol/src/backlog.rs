//! Backlog-Assembler – setzt Tokens zu logischen Units zusammen
//!
//! Zwei Framing-Regeln existieren nebeneinander:
//!
//! - **Kontrollsignal**: ein Token mit genau `TAG_LEN` Bytes bei leerem
//!   Backlog, das einem eigenstaendigen Signal entspricht (Heartbeat,
//!   Disconnect, Login-Fehler). `WAIT_SIGNAL` wird nie aufgenommen.
//! - **Daten-Unit**: alles andere wird angehaengt. Die Unit ist fertig,
//!   wenn ihr Abschluss erreicht ist (feste Token-Anzahl oder passendes
//!   `*_FINISHED`-Tag).
//!
//! Bei jeder fertigen Unit wird der Backlog vollstaendig geleert.

use bytes::Bytes;

use crate::tags::{self, TAG_LEN};

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// Ein entschluesseltes Token (eine Transport-Nachricht)
///
/// Die Rohbytes bleiben erhalten, weil der Session-Key nicht als Text
/// interpretiert werden darf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    bytes: Bytes,
}

impl Token {
    pub fn neu(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Text des Tokens (ungueltiges UTF-8 wird ersetzt)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Vergleicht das Token byteweise mit einem Tag
    pub fn ist(&self, tag: &str) -> bool {
        self.bytes.as_ref() == tag.as_bytes()
    }
}

impl From<&str> for Token {
    fn from(text: &str) -> Self {
        Token::neu(Bytes::copy_from_slice(text.as_bytes()))
    }
}

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

/// Eigenstaendiges Kontrollsignal vom Server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    HeartbeatChallenge,
    Disconnect,
    LoginInvalid,
    NoLoginServers,
}

impl Signal {
    fn aus_token(token: &Token) -> Option<Self> {
        if token.ist(tags::SERVER_HEARTBEAT_CHALLENGE) {
            Some(Signal::HeartbeatChallenge)
        } else if token.ist(tags::SERVER_DISCONNECT) {
            Some(Signal::Disconnect)
        } else if token.ist(tags::SERVER_LOGIN_INVALID) {
            Some(Signal::LoginInvalid)
        } else if token.ist(tags::SERVER_NO_LOGIN_SERVERS) {
            Some(Signal::NoLoginServers)
        } else {
            None
        }
    }
}

/// Eine vollstaendige logische Nachricht
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// Kontrollsignal ohne Payload
    Signal(Signal),
    /// Daten-Unit – Tag und Abschluss-Tag sind entfernt
    Data {
        tag: &'static str,
        payload: Vec<Token>,
    },
    /// Fuehrendes Token passt zu keiner bekannten Unit
    Unknown(Token),
}

impl Unit {
    /// Kurzname fuer Logs
    pub fn beschreibung(&self) -> String {
        match self {
            Unit::Signal(signal) => format!("{:?}", signal),
            Unit::Data { tag, payload } => {
                format!("{} ({} Tokens)", tags::kurzname(tag), payload.len())
            }
            Unit::Unknown(token) => format!("unbekannt ({} Bytes)", token.len()),
        }
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Abschluss {
    /// Unit besteht aus genau n Tokens (inklusive Tag)
    Anzahl(usize),
    /// Unit endet mit diesem Tag
    Tag(&'static str),
}

/// Bekannte Daten-Units: fuehrendes Tag -> Abschluss
const DATEN_UNITS: &[(&str, Abschluss)] = &[
    (tags::SERVER_SESSION_KEY, Abschluss::Anzahl(2)),
    (tags::SERVER_SESSION_CREATED, Abschluss::Anzahl(2)),
    (tags::SERVER_LOGIN_SUCCESS, Abschluss::Anzahl(2)),
    (tags::SERVER_ROOMS, Abschluss::Tag(tags::SERVER_ROOMS_FINISHED)),
    (
        tags::SERVER_STARTED_CLIENTS,
        Abschluss::Tag(tags::SERVER_STARTED_CLIENTS_FINISHED),
    ),
    (
        tags::SERVER_LOCKED_CLIENTS,
        Abschluss::Tag(tags::SERVER_LOCKED_CLIENTS_FINISHED),
    ),
];

fn daten_unit(token: &Token) -> Option<(&'static str, Abschluss)> {
    DATEN_UNITS
        .iter()
        .find(|(tag, _)| token.ist(tag))
        .map(|(tag, abschluss)| (*tag, *abschluss))
}

// ---------------------------------------------------------------------------
// BacklogAssembler
// ---------------------------------------------------------------------------

/// Sammelt Tokens der laufenden Unit
#[derive(Debug, Default)]
pub struct BacklogAssembler {
    backlog: Vec<Token>,
    laufend: Option<(&'static str, Abschluss)>,
}

impl BacklogAssembler {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Anzahl der Tokens der laufenden Unit
    pub fn len(&self) -> usize {
        self.backlog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backlog.is_empty()
    }

    /// Verwirft die laufende Unit
    pub fn leeren(&mut self) {
        self.backlog.clear();
        self.laufend = None;
    }

    /// Nimmt ein Token auf und liefert die Unit, falls sie damit fertig ist
    pub fn push(&mut self, token: Token) -> Option<Unit> {
        if token.ist(tags::SERVER_WAIT_SIGNAL) {
            tracing::trace!("Wait-Signal verworfen");
            return None;
        }

        let Some((tag, abschluss)) = self.laufend else {
            return self.beginnen(token);
        };

        let fertig = match abschluss {
            Abschluss::Anzahl(n) => self.backlog.len() + 1 >= n,
            Abschluss::Tag(ende) => token.ist(ende),
        };

        if !fertig {
            self.backlog.push(token);
            return None;
        }

        // Abschluss-Tag gehoert nicht zum Payload, feste Units haben keines
        if let Abschluss::Anzahl(_) = abschluss {
            self.backlog.push(token);
        }
        let mut tokens = std::mem::take(&mut self.backlog);
        self.laufend = None;
        tokens.remove(0);

        Some(Unit::Data {
            tag,
            payload: tokens,
        })
    }

    fn beginnen(&mut self, token: Token) -> Option<Unit> {
        if token.len() == TAG_LEN {
            if let Some(signal) = Signal::aus_token(&token) {
                return Some(Unit::Signal(signal));
            }
        }

        match daten_unit(&token) {
            Some(framing) => {
                self.laufend = Some(framing);
                self.backlog.push(token);
                None
            }
            None => Some(Unit::Unknown(token)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
