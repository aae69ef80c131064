//! Crate-wide error taxonomy.
//!
//! One enum covers every failure mode a caller can observe: transport I/O,
//! wire-format violations, RCON/query protocol state-machine violations, and
//! the handful of recognized textual failure replies the GoldSrc/Source
//! admin commands can send back.

use std::net::AddrParseError;

/// All errors this crate can return.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Socket or stream error. The underlying cause is chained via `#[source]`.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking receive's deadline elapsed.
    #[error("operation timed out")]
    Timeout,

    /// A buffer or textual field did not match the expected grammar.
    #[error("format error: {0}")]
    Format(String),

    /// A response began with a 4-byte header that is neither the
    /// single-packet nor the split-packet marker.
    #[error("unknown packet header: {0:02x?}")]
    UnknownHeader([u8; 4]),

    /// The server returned the sentinel challenge (`-1`) when a real one was
    /// requested, so a player/rules query cannot proceed.
    #[error("server returned the empty challenge sentinel")]
    BadQueryChallenge,

    /// GoldSrc RCON challenge acquisition or refresh failed.
    #[error("rcon challenge request failed")]
    BadRconChallenge,

    /// RCON authentication failed (Source: id `-1` in auth-response; GoldSrc:
    /// reply begins with `bad rcon_password.`).
    #[error("rcon password rejected")]
    BadRconPassword,

    /// Operation attempted while the Source RCON session is not connected.
    #[error("rcon session is not connected")]
    NotConnected,

    /// `connect_rcon` called while already connected.
    #[error("rcon session is already connected")]
    AlreadyConnected,

    /// `listen` called on a `LogListener` that is already bound.
    #[error("listener is already bound")]
    AlreadyListening,

    /// `logaddress_add`/`logaddress_del` reported the hostname/IP couldn't
    /// be resolved.
    #[error("unable to resolve log address")]
    UnableToResolve,

    /// `logaddress_add` reported the address is already registered.
    #[error("address already in log address list")]
    AddressAlreadyInList,

    /// `logaddress_del` reported the address wasn't in the list.
    #[error("address not found in log address list")]
    AddressNotFound,

    /// `logaddress_del` reported nothing was removed.
    #[error("no addresses were removed")]
    NoAddressesAdded,

    /// A command succeeded at the transport layer but its textual reply
    /// matched neither a known success marker nor a recognized failure
    /// string. Carries the raw reply for diagnosis.
    #[error("unrecognized game server reply: {0}")]
    GameServer(String),

    /// A log line matched the outer frame but none of the classifier's
    /// priority patterns (or matched one with an unrecognized inner verb).
    /// Surfaced asynchronously via the listener's exception channel, never
    /// returned synchronously.
    #[error("unrecognized log event: {0}")]
    UnknownEvent(String),

    /// Operation attempted on a disposed `Server` handle.
    #[error("server handle has been disposed")]
    Disposed,

    /// A configured timeout value was outside the legal range (`>= -1`).
    #[error("timeout out of range: {0}ms (must be >= -1)")]
    TimeoutOutOfRange(i64),
}

impl From<AddrParseError> for Error {
    fn from(e: AddrParseError) -> Self {
        Error::Format(e.to_string())
    }
}

impl Error {
    /// True if this error is the timeout sub-kind of I/O error, either the
    /// dedicated [`Error::Timeout`] variant or a `std::io::Error` whose kind
    /// is `WouldBlock`/`TimedOut` (what a blocking socket read yields when
    /// `SO_RCVTIMEO` expires).
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
