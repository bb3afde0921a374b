#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

//! # rsocket
//!
//! Socket-level dispatch for a multiplexed request/response protocol with five interaction
//! models over one duplex connection.
//!
//! - [AbstractResponder]: register handlers for the models you support, the rest fail
//!   predictably with [RSocketError::Unsupported].
//! - [LeasedSocket]: gates every outbound request against a lease, closes exactly once.
//! - [ConnectionUri]: turns `tcp://host:port` or `ws://host:port` into a client or server
//!   transport.
//!
//! ## Components
//!
//! - [`rsocket-core`](https://docs.rs/rsocket-core): Payload, result containers, lease, errors.
//! - [`rsocket-tcp`](https://docs.rs/rsocket-tcp): TCP transport.
//! - [`rsocket-ws`](https://docs.rs/rsocket-ws): WebSocket transport.

pub mod responder;
pub use responder::AbstractResponder;
pub mod socket;
pub use socket::{CloseHook, CloseResult, Closeable, CloseableResponder, DuplexSocket, LeasedSocket};
pub mod transport;
pub use transport::{ClientTransport, Connection, ConnectionUri, Listener, Protocol, ServerTransport};
pub use rsocket_tcp as tcp;
pub use rsocket_ws as ws;

pub use rsocket_core::error::{self, InteractionModel, LeaseDenial, RSocketError};
pub use rsocket_core::lease::{Lease, LeaseWindow};
pub use rsocket_core::{
    Bytes, Flux, FluxSink, LeaseConfig, Mono, Payload, Responder, SocketConfig, TransportConfig,
};
