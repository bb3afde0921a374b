//! # rsocket-core
//!
//! This crate provides the core types for [`rsocket`](https://docs.rs/rsocket).
//! It includes the interaction contract, payload and result containers, the lease primitive and
//! the error taxonomy shared by the other crates in the workspace.

mod config;
pub use config::*;
pub mod error;
pub mod io;
pub mod lease;
mod payload;
pub use payload::Payload;
mod responder;
pub use responder::Responder;
pub mod rx;
pub use rx::{Flux, FluxSink, Mono};

pub use bytes::Bytes;
