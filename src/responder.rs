//! A [Responder] assembled from closures.
//!
//! Each of the five handlers is optional. A missing request-style handler answers with an
//! already-failed [Mono] or [Flux] carrying [RSocketError::Unsupported] for that model; a missing
//! fire-and-forget or metadata-push handler can only log, there is no channel to fail on.
//!
//! # Example
//!
//! ```rust
//! use rsocket::{AbstractResponder, Mono, Payload, Responder};
//!
//! let responder = AbstractResponder::new()
//!     .on_request_response(|msg: Payload| Mono::just(msg));
//! let _echo = responder.request_response(Payload::from("ping"));
//! ```

use log::*;
use rsocket_core::error::{InteractionModel, RSocketError};
use rsocket_core::{Flux, Mono, Payload, Responder};
use std::fmt;

type SendHandler = Box<dyn Fn(Payload) + Send + Sync>;
type MonoHandler = Box<dyn Fn(Payload) -> Mono + Send + Sync>;
type FluxHandler = Box<dyn Fn(Payload) -> Flux + Send + Sync>;
type ChannelHandler = Box<dyn Fn(Flux) -> Flux + Send + Sync>;

/// An abstract implementation of [Responder], handlers are fixed once built.
#[derive(Default)]
pub struct AbstractResponder {
    ff: Option<SendHandler>,
    mp: Option<SendHandler>,
    rr: Option<MonoHandler>,
    rs: Option<FluxHandler>,
    rc: Option<ChannelHandler>,
}

impl AbstractResponder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_fire_and_forget<F>(mut self, f: F) -> Self
    where
        F: Fn(Payload) + Send + Sync + 'static,
    {
        self.ff = Some(Box::new(f));
        self
    }

    pub fn on_metadata_push<F>(mut self, f: F) -> Self
    where
        F: Fn(Payload) + Send + Sync + 'static,
    {
        self.mp = Some(Box::new(f));
        self
    }

    pub fn on_request_response<F>(mut self, f: F) -> Self
    where
        F: Fn(Payload) -> Mono + Send + Sync + 'static,
    {
        self.rr = Some(Box::new(f));
        self
    }

    pub fn on_request_stream<F>(mut self, f: F) -> Self
    where
        F: Fn(Payload) -> Flux + Send + Sync + 'static,
    {
        self.rs = Some(Box::new(f));
        self
    }

    pub fn on_request_channel<F>(mut self, f: F) -> Self
    where
        F: Fn(Flux) -> Flux + Send + Sync + 'static,
    {
        self.rc = Some(Box::new(f));
        self
    }

    /// Whether a handler was registered for `model`
    pub fn supports(&self, model: InteractionModel) -> bool {
        match model {
            InteractionModel::FireAndForget => self.ff.is_some(),
            InteractionModel::MetadataPush => self.mp.is_some(),
            InteractionModel::RequestResponse => self.rr.is_some(),
            InteractionModel::RequestStream => self.rs.is_some(),
            InteractionModel::RequestChannel => self.rc.is_some(),
        }
    }
}

impl fmt::Debug for AbstractResponder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use strum::IntoEnumIterator;
        let mut l = f.debug_list();
        for model in InteractionModel::iter().filter(|m| self.supports(*m)) {
            l.entry(&model);
        }
        l.finish()
    }
}

impl Responder for AbstractResponder {
    fn fire_and_forget(&self, msg: Payload) {
        match self.ff.as_ref() {
            Some(f) => f(msg),
            None => error!("{}", RSocketError::unsupported(InteractionModel::FireAndForget)),
        }
    }

    fn metadata_push(&self, msg: Payload) {
        match self.mp.as_ref() {
            Some(f) => f(msg),
            None => error!("{}", RSocketError::unsupported(InteractionModel::MetadataPush)),
        }
    }

    fn request_response(&self, msg: Payload) -> Mono {
        match self.rr.as_ref() {
            Some(f) => f(msg),
            None => Mono::error(RSocketError::unsupported(InteractionModel::RequestResponse)),
        }
    }

    fn request_stream(&self, msg: Payload) -> Flux {
        match self.rs.as_ref() {
            Some(f) => f(msg),
            None => Flux::error(RSocketError::unsupported(InteractionModel::RequestStream)),
        }
    }

    fn request_channel(&self, msgs: Flux) -> Flux {
        match self.rc.as_ref() {
            Some(f) => f(msgs),
            None => Flux::error(RSocketError::unsupported(InteractionModel::RequestChannel)),
        }
    }
}
