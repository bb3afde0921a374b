#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

//! # rsocket-ws
//!
//! This crate provides the WebSocket transport for [`rsocket`](https://docs.rs/rsocket), on top
//! of `tokio-tungstenite`.
//!
//! The client dials a full `ws://host:port/` URL. The server binds `host:port` and only upgrades
//! requests for one path, [DEFAULT_WEBSOCKET_PATH] unless configured otherwise.

#[macro_use]
extern crate log;
mod client;
pub use client::*;
mod server;
pub use server::*;

use rsocket_core::error::RSocketError;
use tokio_tungstenite::tungstenite;

fn ws_err(e: tungstenite::Error) -> RSocketError {
    match e {
        tungstenite::Error::Io(e) => e.into(),
        e => RSocketError::Transport(e.to_string()),
    }
}
