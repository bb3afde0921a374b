use crate::{Flux, Mono, Payload};
use std::sync::Arc;

/// The contract providing the five interaction models.
///
/// Implemented by the network-backed socket and by local responders alike. Methods without a
/// result channel cannot report failure to the caller.
pub trait Responder: Send + Sync {
    /// A single one-way message.
    fn fire_and_forget(&self, msg: Payload);

    /// Asynchronous metadata, only the metadata half of `msg` is meaningful.
    fn metadata_push(&self, msg: Payload);

    /// Request a single response.
    fn request_response(&self, msg: Payload) -> Mono;

    /// Request a completable stream.
    fn request_stream(&self, msg: Payload) -> Flux;

    /// Request a completable stream in both directions.
    fn request_channel(&self, msgs: Flux) -> Flux;
}

impl<R: Responder + ?Sized> Responder for Arc<R> {
    #[inline(always)]
    fn fire_and_forget(&self, msg: Payload) {
        self.as_ref().fire_and_forget(msg)
    }

    #[inline(always)]
    fn metadata_push(&self, msg: Payload) {
        self.as_ref().metadata_push(msg)
    }

    #[inline(always)]
    fn request_response(&self, msg: Payload) -> Mono {
        self.as_ref().request_response(msg)
    }

    #[inline(always)]
    fn request_stream(&self, msg: Payload) -> Flux {
        self.as_ref().request_stream(msg)
    }

    #[inline(always)]
    fn request_channel(&self, msgs: Flux) -> Flux {
        self.as_ref().request_channel(msgs)
    }
}

impl<R: Responder + ?Sized> Responder for Box<R> {
    #[inline(always)]
    fn fire_and_forget(&self, msg: Payload) {
        self.as_ref().fire_and_forget(msg)
    }

    #[inline(always)]
    fn metadata_push(&self, msg: Payload) {
        self.as_ref().metadata_push(msg)
    }

    #[inline(always)]
    fn request_response(&self, msg: Payload) -> Mono {
        self.as_ref().request_response(msg)
    }

    #[inline(always)]
    fn request_stream(&self, msg: Payload) -> Flux {
        self.as_ref().request_stream(msg)
    }

    #[inline(always)]
    fn request_channel(&self, msgs: Flux) -> Flux {
        self.as_ref().request_channel(msgs)
    }
}
