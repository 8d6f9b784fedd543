//! Tag-Katalog
//!
//! Alle Tags sind feste ASCII-Literale mit genau `TAG_LEN` Bytes. Das
//! Praefix kodiert die Richtung (`RW:C>S:` Client an Server, `RW:S>C:`
//! Server an Client), aufgefuellt wird mit Punkten.

/// Laenge jedes Tags in Bytes
pub const TAG_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

pub const CLIENT_PUBLIC_KEY: &str = "RW:C>S:PUBLIC_KEY...............";
pub const CLIENT_USERDATA: &str = "RW:C>S:USERDATA.................";
pub const CLIENT_HEARTBEAT: &str = "RW:C>S:HEARTBEAT................";
pub const CLIENT_DISCONNECT: &str = "RW:C>S:DISCONNECT...............";
pub const CLIENT_LOGIN_REQUEST: &str = "RW:C>S:LOGIN_REQUEST............";
pub const CLIENT_LOGOUT_REQUEST: &str = "RW:C>S:LOGOUT_REQUEST...........";
pub const CLIENT_ROOMS_REQUEST: &str = "RW:C>S:ROOMS_REQUEST............";
pub const CLIENT_STARTED_CLIENTS_REQUEST: &str = "RW:C>S:STARTED_CLIENTS_REQUEST..";
pub const CLIENT_LOCKED_CLIENTS_REQUEST: &str = "RW:C>S:LOCKED_CLIENTS_REQUEST...";
pub const CLIENT_SHUTDOWN: &str = "RW:C>S:SHUTDOWN.................";
pub const CLIENT_SHUTDOWN_FINISHED: &str = "RW:C>S:SHUTDOWN_FINISHED........";
pub const CLIENT_RESTART: &str = "RW:C>S:RESTART..................";
pub const CLIENT_RESTART_FINISHED: &str = "RW:C>S:RESTART_FINISHED.........";
pub const CLIENT_LOCK: &str = "RW:C>S:LOCK.....................";
pub const CLIENT_LOCK_FINISHED: &str = "RW:C>S:LOCK_FINISHED............";
pub const CLIENT_UNLOCK: &str = "RW:C>S:UNLOCK...................";
pub const CLIENT_UNLOCK_FINISHED: &str = "RW:C>S:UNLOCK_FINISHED..........";

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

pub const SERVER_SESSION_KEY: &str = "RW:S>C:SESSION_KEY..............";
pub const SERVER_SESSION_CREATED: &str = "RW:S>C:SESSION_CREATED..........";
pub const SERVER_HEARTBEAT_CHALLENGE: &str = "RW:S>C:HEARTBEAT_CHALLENGE......";
pub const SERVER_WAIT_SIGNAL: &str = "RW:S>C:WAIT_SIGNAL..............";
pub const SERVER_DISCONNECT: &str = "RW:S>C:DISCONNECT...............";
pub const SERVER_LOGIN_SUCCESS: &str = "RW:S>C:LOGIN_SUCCESS............";
pub const SERVER_LOGIN_INVALID: &str = "RW:S>C:LOGIN_INVALID............";
pub const SERVER_NO_LOGIN_SERVERS: &str = "RW:S>C:NO_LOGIN_SERVERS.........";
pub const SERVER_ROOMS: &str = "RW:S>C:ROOMS....................";
pub const SERVER_ROOMS_FINISHED: &str = "RW:S>C:ROOMS_FINISHED...........";
pub const SERVER_STARTED_CLIENTS: &str = "RW:S>C:STARTED_CLIENTS..........";
pub const SERVER_STARTED_CLIENTS_FINISHED: &str = "RW:S>C:STARTED_CLIENTS_FINISHED.";
pub const SERVER_LOCKED_CLIENTS: &str = "RW:S>C:LOCKED_CLIENTS...........";
pub const SERVER_LOCKED_CLIENTS_FINISHED: &str = "RW:S>C:LOCKED_CLIENTS_FINISHED..";

/// Alle Tags (fuer Pruefungen und Logs)
pub const ALLE: &[&str] = &[
    CLIENT_PUBLIC_KEY,
    CLIENT_USERDATA,
    CLIENT_HEARTBEAT,
    CLIENT_DISCONNECT,
    CLIENT_LOGIN_REQUEST,
    CLIENT_LOGOUT_REQUEST,
    CLIENT_ROOMS_REQUEST,
    CLIENT_STARTED_CLIENTS_REQUEST,
    CLIENT_LOCKED_CLIENTS_REQUEST,
    CLIENT_SHUTDOWN,
    CLIENT_SHUTDOWN_FINISHED,
    CLIENT_RESTART,
    CLIENT_RESTART_FINISHED,
    CLIENT_LOCK,
    CLIENT_LOCK_FINISHED,
    CLIENT_UNLOCK,
    CLIENT_UNLOCK_FINISHED,
    SERVER_SESSION_KEY,
    SERVER_SESSION_CREATED,
    SERVER_HEARTBEAT_CHALLENGE,
    SERVER_WAIT_SIGNAL,
    SERVER_DISCONNECT,
    SERVER_LOGIN_SUCCESS,
    SERVER_LOGIN_INVALID,
    SERVER_NO_LOGIN_SERVERS,
    SERVER_ROOMS,
    SERVER_ROOMS_FINISHED,
    SERVER_STARTED_CLIENTS,
    SERVER_STARTED_CLIENTS_FINISHED,
    SERVER_LOCKED_CLIENTS,
    SERVER_LOCKED_CLIENTS_FINISHED,
];

/// Kurzname eines Tags fuer Logs (`RW:S>C:ROOMS....` -> `ROOMS`)
pub fn kurzname(tag: &str) -> &str {
    tag.get(7..).unwrap_or(tag).trim_end_matches('.')
}
