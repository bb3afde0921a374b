#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

//! # rsocket-tcp
//!
//! This crate provides the TCP transport for [`rsocket`](https://docs.rs/rsocket).
//! The client side dials `host:port`, the server side binds a listener and hands out accepted
//! streams. Framing is left to the connection layer above.

#[macro_use]
extern crate log;
mod client;
pub use client::*;
mod server;
pub use server::*;

pub use tokio::net::TcpStream;
