use std::{fmt, io};

/// The five request semantics of the protocol.
///
/// The string forms follow the frame names, so `unsupported REQUEST_STREAM` reads the same in
/// logs on both peers.
#[derive(
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
)]
pub enum InteractionModel {
    /// A single one-way message
    #[strum(serialize = "FIRE_AND_FORGET")]
    FireAndForget,
    /// Out-of-band metadata, never gated by the lease
    #[strum(serialize = "METADATA_PUSH")]
    MetadataPush,
    /// One request, one response
    #[strum(serialize = "REQUEST_RESPONSE")]
    RequestResponse,
    /// One request, a finite stream of responses
    #[strum(serialize = "REQUEST_STREAM")]
    RequestStream,
    /// A stream of requests, a stream of responses
    #[strum(serialize = "REQUEST_CHANNEL")]
    RequestChannel,
}

// The default Debug derive ignores the strum names
impl fmt::Debug for InteractionModel {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl InteractionModel {
    /// Whether the model carries a result channel back to the caller.
    #[inline]
    pub fn has_result(&self) -> bool {
        !matches!(self, Self::FireAndForget | Self::MetadataPush)
    }
}

/// Why the lease refused a request
#[derive(strum::Display, strum::AsRefStr, PartialEq, Eq, Clone, Copy, Debug)]
pub enum LeaseDenial {
    #[strum(serialize = "lease expired")]
    Expired,
    #[strum(serialize = "lease exhausted")]
    Exhausted,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RSocketError {
    /// No handler registered for this interaction model
    #[error("unsupported {0}")]
    Unsupported(InteractionModel),
    /// The request was refused by the lease before reaching the peer
    #[error("{0}")]
    LeaseDenied(LeaseDenial),
    #[error("rsocket: invalid URI {0}")]
    InvalidUri(String),
    #[error("rsocket: unsupported protocol {0}")]
    UnsupportedProtocol(String),
    #[error("rsocket: cannot create client transport: {0}")]
    ClientTransport(String),
    #[error("rsocket: io error {kind}: {msg}")]
    Io { kind: io::ErrorKind, msg: String },
    /// Handshake or connection failure inside a concrete transport
    #[error("rsocket: transport error: {0}")]
    Transport(String),
}

impl RSocketError {
    /// The error returned for a request-style model that has no handler.
    #[inline(always)]
    pub const fn unsupported(model: InteractionModel) -> Self {
        Self::Unsupported(model)
    }

    #[inline]
    pub fn is_lease_denied(&self) -> bool {
        matches!(self, Self::LeaseDenied(_))
    }
}

impl From<LeaseDenial> for RSocketError {
    #[inline(always)]
    fn from(d: LeaseDenial) -> Self {
        Self::LeaseDenied(d)
    }
}

impl From<io::Error> for RSocketError {
    #[inline]
    fn from(e: io::Error) -> Self {
        Self::Io { kind: e.kind(), msg: e.to_string() }
    }
}
