#![allow(dead_code)]

use captains_log::*;
use rsocket::{DuplexSocket, Flux, Mono, Payload, RSocketError, Responder};
use rstest::*;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::Runtime;

#[fixture]
pub fn runner() -> TestRunner {
    TestRunner::new()
}

pub struct TestRunner {
    rt: Runtime,
}

impl fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "")
    }
}

impl TestRunner {
    pub fn new() -> Self {
        recipe::raw_file_logger("/tmp/rsocket_test.log", Level::Trace).test().build().expect("log");
        Self {
            rt: tokio::runtime::Builder::new_multi_thread()
                .worker_threads(4)
                .enable_all()
                .build()
                .unwrap(),
        }
    }

    pub fn block_on<F: Future<Output = ()> + Send + 'static>(&self, f: F) {
        self.rt.block_on(f);
    }
}

/// Ask the OS for a port nobody listens on, it is always more than one digit.
pub fn free_port() -> u16 {
    let l = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    l.local_addr().expect("addr").port()
}

/// A duplex socket serving requests with a local responder, counting what reached it
pub struct LoopbackSocket<R: Responder> {
    pub responder: R,
    pub requests: AtomicUsize,
    pub closes: AtomicUsize,
    pub close_delay: Duration,
    pub close_err: Option<RSocketError>,
}

impl<R: Responder> LoopbackSocket<R> {
    pub fn new(responder: R) -> Self {
        Self {
            responder,
            requests: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            close_delay: Duration::ZERO,
            close_err: None,
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl<R: Responder> Responder for LoopbackSocket<R> {
    fn fire_and_forget(&self, msg: Payload) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.responder.fire_and_forget(msg)
    }

    fn metadata_push(&self, msg: Payload) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.responder.metadata_push(msg)
    }

    fn request_response(&self, msg: Payload) -> Mono {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.responder.request_response(msg)
    }

    fn request_stream(&self, msg: Payload) -> Flux {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.responder.request_stream(msg)
    }

    fn request_channel(&self, msgs: Flux) -> Flux {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.responder.request_channel(msgs)
    }
}

impl<R: Responder> DuplexSocket for LoopbackSocket<R> {
    fn close(&self) -> Result<(), RSocketError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if !self.close_delay.is_zero() {
            std::thread::sleep(self.close_delay);
        }
        match self.close_err.as_ref() {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}
