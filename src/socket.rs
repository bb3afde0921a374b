//! The admission-controlled socket.
//!
//! [LeasedSocket] wraps a connected [DuplexSocket]. Every outbound request except METADATA_PUSH
//! must first be allowed by the [Lease]; a denied request never reaches the peer. Closing runs the
//! underlying close and the registered hooks exactly once, however many callers race on it.

use log::*;
use parking_lot::{Condvar, Mutex};
use rsocket_core::error::{InteractionModel, RSocketError};
use rsocket_core::lease::Lease;
use rsocket_core::{Flux, LeaseConfig, Mono, Payload, Responder, SocketConfig};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::{self, ThreadId};
use std::time::Duration;
use std::{fmt, mem};

/// The framed, connected socket talking to the remote peer.
pub trait DuplexSocket: Responder {
    fn close(&self) -> Result<(), RSocketError>;
}

/// What the underlying socket reported when closed
pub type CloseResult = Result<(), RSocketError>;

/// A hook receives the result of the underlying close.
pub type CloseHook = Box<dyn FnOnce(&CloseResult) + Send>;

/// Represents a closeable target.
pub trait Closeable {
    fn close(&self) -> Result<(), RSocketError>;

    /// Bind a handler to run when closing.
    fn on_close(&self, hook: CloseHook);
}

/// A [Responder] which supports close events.
pub trait CloseableResponder: Closeable + Responder {}

impl<T: Closeable + Responder> CloseableResponder for T {}

enum ClosePhase {
    Open,
    /// The owning thread is closing the underlying socket
    Closing(ThreadId),
    /// The owning thread is running hooks, the result is final
    Notifying(ThreadId, CloseResult),
    Closed(CloseResult),
}

impl ClosePhase {
    /// Another thread owns the close and has not finished yet
    #[inline]
    fn busy_for(&self, me: ThreadId) -> bool {
        match self {
            Self::Closing(t) | Self::Notifying(t, _) => *t != me,
            _ => false,
        }
    }
}

struct CloseState {
    hooks: Vec<CloseHook>,
    phase: ClosePhase,
}

pub struct LeasedSocket<S: DuplexSocket> {
    socket: S,
    lease: Lease,
    state: Mutex<CloseState>,
    done: Condvar,
}

impl<S: DuplexSocket> fmt::Debug for LeasedSocket<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LeasedSocket({:?}, closed={})", self.lease, self.is_closed())
    }
}

impl<S: DuplexSocket> LeasedSocket<S> {
    /// Wrap a connected socket, no lease is enforced until the first refresh.
    #[inline]
    pub fn new(socket: S) -> Self {
        Self {
            socket,
            lease: Lease::new(),
            state: Mutex::new(CloseState { hooks: Vec::new(), phase: ClosePhase::Open }),
            done: Condvar::new(),
        }
    }

    /// Wrap a connected socket, then install the lease window from `config` if one is set.
    pub fn with_config(socket: S, config: &SocketConfig) -> Self {
        let s = Self::new(socket);
        if let Some(lease) = config.lease.as_ref() {
            s.refresh_lease_from(lease);
        }
        s
    }

    /// Install a new lease window of `quota` requests valid for `ttl`, replacing the old one.
    #[inline]
    pub fn refresh_lease(&self, ttl: Duration, quota: u64) {
        debug!("{:?} refresh lease ttl={:?} quota={}", self, ttl, quota);
        self.lease.refresh_ttl(ttl, quota);
    }

    #[inline]
    pub fn refresh_lease_from(&self, config: &LeaseConfig) {
        self.refresh_lease(config.ttl, config.quota)
    }

    #[inline(always)]
    pub fn lease(&self) -> &Lease {
        &self.lease
    }

    #[inline(always)]
    pub fn inner(&self) -> &S {
        &self.socket
    }

    /// True once the underlying socket has been closed, hooks may still be running.
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self.state.lock().phase, ClosePhase::Notifying(..) | ClosePhase::Closed(_))
    }

    /// Ask the lease for one request of `model`, a send-style denial is logged here.
    fn admit(&self, model: InteractionModel) -> Result<(), RSocketError> {
        match self.lease.allow() {
            Ok(()) => Ok(()),
            Err(e) => {
                if model.has_result() {
                    debug!("request {} denied: {}", model, e);
                } else {
                    warn!("request {} dropped: {}", model, e);
                }
                Err(e.into())
            }
        }
    }

    fn do_close(&self, me: ThreadId) -> CloseResult {
        let res = match catch_unwind(AssertUnwindSafe(|| self.socket.close())) {
            Ok(res) => res,
            Err(e) => {
                let msg = format!("close panicked: {}", panic_msg(e.as_ref()));
                Err(RSocketError::Transport(msg))
            }
        };
        if let Err(e) = res.as_ref() {
            debug!("underlying socket close error: {}", e);
        }
        let hooks = {
            let mut state = self.state.lock();
            state.phase = ClosePhase::Notifying(me, res.clone());
            mem::take(&mut state.hooks)
        };
        // Hooks run without the lock, a hook may register another hook or call close()
        for hook in hooks.into_iter().rev() {
            run_hook(hook, &res);
        }
        self.state.lock().phase = ClosePhase::Closed(res.clone());
        self.done.notify_all();
        res
    }
}

fn run_hook(hook: CloseHook, res: &CloseResult) {
    if let Err(e) = catch_unwind(AssertUnwindSafe(|| hook(res))) {
        error!("handle socket closer failed: {}", panic_msg(e.as_ref()));
    }
}

fn panic_msg(e: &(dyn Any + Send)) -> &str {
    if let Some(s) = e.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = e.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

impl<S: DuplexSocket> Responder for LeasedSocket<S> {
    fn fire_and_forget(&self, msg: Payload) {
        if self.admit(InteractionModel::FireAndForget).is_ok() {
            self.socket.fire_and_forget(msg)
        }
    }

    #[inline]
    fn metadata_push(&self, msg: Payload) {
        self.socket.metadata_push(msg)
    }

    fn request_response(&self, msg: Payload) -> Mono {
        match self.admit(InteractionModel::RequestResponse) {
            Ok(()) => self.socket.request_response(msg),
            Err(e) => Mono::error(e),
        }
    }

    fn request_stream(&self, msg: Payload) -> Flux {
        match self.admit(InteractionModel::RequestStream) {
            Ok(()) => self.socket.request_stream(msg),
            Err(e) => Flux::error(e),
        }
    }

    fn request_channel(&self, msgs: Flux) -> Flux {
        match self.admit(InteractionModel::RequestChannel) {
            Ok(()) => self.socket.request_channel(msgs),
            Err(e) => Flux::error(e),
        }
    }
}

impl<S: DuplexSocket> Closeable for LeasedSocket<S> {
    /// Only the first call closes the socket and notifies hooks, last registered first.
    /// Concurrent callers wait for it and all get the same result. A call made from a hook, on
    /// the closing thread, returns at once with the result known so far.
    fn close(&self) -> Result<(), RSocketError> {
        let me = thread::current().id();
        {
            let mut state = self.state.lock();
            while state.phase.busy_for(me) {
                self.done.wait(&mut state);
            }
            match &state.phase {
                ClosePhase::Open => {}
                ClosePhase::Closing(_) => return Ok(()),
                ClosePhase::Notifying(_, res) | ClosePhase::Closed(res) => return res.clone(),
            }
            state.phase = ClosePhase::Closing(me);
        }
        self.do_close(me)
    }

    /// A hook registered after the underlying close returned is called right away.
    fn on_close(&self, hook: CloseHook) {
        let res = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            match &state.phase {
                ClosePhase::Notifying(_, res) | ClosePhase::Closed(res) => res.clone(),
                ClosePhase::Open | ClosePhase::Closing(_) => {
                    state.hooks.push(hook);
                    return;
                }
            }
        };
        run_hook(hook, &res);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use futures::executor::block_on;
    use rsocket_core::error::LeaseDenial;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSocket {
        ff: AtomicUsize,
        mp: AtomicUsize,
        rr: AtomicUsize,
        rs: AtomicUsize,
        rc: AtomicUsize,
        closed: AtomicUsize,
        close_err: Option<RSocketError>,
    }

    impl Responder for CountingSocket {
        fn fire_and_forget(&self, _msg: Payload) {
            self.ff.fetch_add(1, Ordering::SeqCst);
        }

        fn metadata_push(&self, _msg: Payload) {
            self.mp.fetch_add(1, Ordering::SeqCst);
        }

        fn request_response(&self, msg: Payload) -> Mono {
            self.rr.fetch_add(1, Ordering::SeqCst);
            Mono::just(msg)
        }

        fn request_stream(&self, msg: Payload) -> Flux {
            self.rs.fetch_add(1, Ordering::SeqCst);
            Flux::just(vec![msg])
        }

        fn request_channel(&self, msgs: Flux) -> Flux {
            self.rc.fetch_add(1, Ordering::SeqCst);
            msgs
        }
    }

    impl DuplexSocket for CountingSocket {
        fn close(&self) -> Result<(), RSocketError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            match self.close_err.as_ref() {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }
    }

    fn faulty_hook(_: &CloseResult) {
        panic!("hook fault")
    }

    #[test]
    fn test_no_lease_allows_all() {
        let socket = LeasedSocket::new(CountingSocket::default());
        for _ in 0..1000 {
            socket.fire_and_forget(Payload::from("x"));
            assert!(block_on(socket.request_response(Payload::from("x"))).is_ok());
        }
        assert_eq!(socket.inner().ff.load(Ordering::SeqCst), 1000);
        assert_eq!(socket.inner().rr.load(Ordering::SeqCst), 1000);
        assert!(!socket.lease().is_bounded());
    }

    #[test]
    fn test_lease_gates_requests() {
        let socket = LeasedSocket::new(CountingSocket::default());
        socket.refresh_lease(Duration::from_secs(60), 4);
        assert!(block_on(socket.request_response(Payload::from("1"))).is_ok());
        let items: Vec<_> = block_on(socket.request_stream(Payload::from("2")).collect());
        assert_eq!(items.len(), 1);
        let items: Vec<_> = block_on(socket.request_channel(Flux::empty()).collect());
        assert!(items.is_empty());
        socket.fire_and_forget(Payload::from("4"));

        // quota used up
        let denied = RSocketError::LeaseDenied(LeaseDenial::Exhausted);
        assert_eq!(block_on(socket.request_response(Payload::from("5"))), Err(denied.clone()));
        let items: Vec<_> = block_on(socket.request_stream(Payload::from("6")).collect());
        assert_eq!(items, vec![Err(denied.clone())]);
        let items: Vec<_> = block_on(socket.request_channel(Flux::empty()).collect());
        assert_eq!(items, vec![Err(denied)]);
        socket.fire_and_forget(Payload::from("7"));

        let inner = socket.inner();
        assert_eq!(inner.rr.load(Ordering::SeqCst), 1);
        assert_eq!(inner.rs.load(Ordering::SeqCst), 1);
        assert_eq!(inner.rc.load(Ordering::SeqCst), 1);
        assert_eq!(inner.ff.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_metadata_push_not_gated() {
        let socket = LeasedSocket::new(CountingSocket::default());
        socket.refresh_lease(Duration::from_secs(60), 0);
        for _ in 0..10 {
            socket.metadata_push(Payload::from_metadata("lease"));
        }
        assert_eq!(socket.inner().mp.load(Ordering::SeqCst), 10);
        match socket.lease().window() {
            rsocket_core::lease::LeaseWindow::Bounded { remaining, .. } => assert_eq!(remaining, 0),
            w => panic!("unexpected {:?}", w),
        }
    }

    #[test]
    fn test_lease_expired() {
        let socket = LeasedSocket::new(CountingSocket::default());
        socket.refresh_lease_from(&LeaseConfig::new(Duration::ZERO, 100));
        let r = block_on(socket.request_response(Payload::from("x")));
        assert_eq!(r, Err(RSocketError::LeaseDenied(LeaseDenial::Expired)));
        assert_eq!(socket.inner().rr.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_with_config() {
        let socket = LeasedSocket::new(CountingSocket::default());
        assert!(!socket.lease().is_bounded());
        let config = SocketConfig {
            lease: Some(LeaseConfig::new(Duration::from_secs(60), 1)),
            ..Default::default()
        };
        let socket = LeasedSocket::with_config(CountingSocket::default(), &config);
        assert!(socket.lease().is_bounded());
        assert!(block_on(socket.request_response(Payload::from("1"))).is_ok());
        assert!(block_on(socket.request_response(Payload::from("2"))).is_err());
    }

    #[test]
    fn test_close_hooks_lifo() {
        let socket = LeasedSocket::new(CountingSocket::default());
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let order = order.clone();
            socket.on_close(Box::new(move |res: &CloseResult| {
                assert!(res.is_ok());
                order.lock().push(i);
            }));
        }
        assert!(!socket.is_closed());
        assert_eq!(socket.close(), Ok(()));
        assert!(socket.is_closed());
        assert_eq!(*order.lock(), vec![4, 3, 2, 1, 0]);

        assert_eq!(socket.close(), Ok(()));
        assert_eq!(socket.inner().closed.load(Ordering::SeqCst), 1);
        assert_eq!(order.lock().len(), 5);
    }

    #[test]
    fn test_close_error_passed_to_hooks() {
        let err = RSocketError::Transport("broken pipe".to_string());
        let socket =
            LeasedSocket::new(CountingSocket { close_err: Some(err.clone()), ..Default::default() });
        let seen = Arc::new(Mutex::new(None));
        let _seen = seen.clone();
        socket.on_close(Box::new(move |res: &CloseResult| {
            *_seen.lock() = Some(res.clone());
        }));
        socket.on_close(Box::new(faulty_hook));
        assert_eq!(socket.close(), Err(err.clone()));
        assert_eq!(*seen.lock(), Some(Err(err.clone())));
        // the captured result is returned again
        assert_eq!(socket.close(), Err(err));
    }

    #[test]
    fn test_hook_registered_after_close() {
        let socket = LeasedSocket::new(CountingSocket::default());
        socket.close().expect("close");
        let called = Arc::new(AtomicUsize::new(0));
        let _called = called.clone();
        socket.on_close(Box::new(move |_: &CloseResult| {
            _called.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(called.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hook_registers_hook() {
        let socket = Arc::new(LeasedSocket::new(CountingSocket::default()));
        let called = Arc::new(AtomicUsize::new(0));
        let _socket = socket.clone();
        let _called = called.clone();
        socket.on_close(Box::new(move |_: &CloseResult| {
            let _called = _called.clone();
            _socket.on_close(Box::new(move |_: &CloseResult| {
                _called.fetch_add(1, Ordering::SeqCst);
            }));
        }));
        socket.close().expect("close");
        assert_eq!(called.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hook_calls_close() {
        let err = RSocketError::Transport("reset".to_string());
        let socket = Arc::new(LeasedSocket::new(CountingSocket {
            close_err: Some(err.clone()),
            ..Default::default()
        }));
        let seen = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..2 {
            let _socket = socket.clone();
            let _seen = seen.clone();
            socket.on_close(Box::new(move |_: &CloseResult| {
                let res = _socket.close();
                _seen.lock().push(res);
            }));
        }
        assert_eq!(socket.close(), Err(err.clone()));
        assert_eq!(*seen.lock(), vec![Err(err.clone()), Err(err.clone())]);
        assert_eq!(socket.inner().closed.load(Ordering::SeqCst), 1);
        assert_eq!(socket.close(), Err(err));
    }

    struct PanicOnClose;

    impl Responder for PanicOnClose {
        fn fire_and_forget(&self, _msg: Payload) {}

        fn metadata_push(&self, _msg: Payload) {}

        fn request_response(&self, msg: Payload) -> Mono {
            Mono::just(msg)
        }

        fn request_stream(&self, _msg: Payload) -> Flux {
            Flux::empty()
        }

        fn request_channel(&self, msgs: Flux) -> Flux {
            msgs
        }
    }

    impl DuplexSocket for PanicOnClose {
        fn close(&self) -> Result<(), RSocketError> {
            panic!("socket gone")
        }
    }

    #[test]
    fn test_underlying_close_panics() {
        let socket = LeasedSocket::new(PanicOnClose);
        let called = Arc::new(AtomicUsize::new(0));
        let _called = called.clone();
        socket.on_close(Box::new(move |res: &CloseResult| {
            assert!(res.is_err());
            _called.fetch_add(1, Ordering::SeqCst);
        }));
        let expect = Err(RSocketError::Transport("close panicked: socket gone".to_string()));
        assert_eq!(socket.close(), expect.clone());
        assert!(socket.is_closed());
        assert_eq!(called.load(Ordering::SeqCst), 1);
        assert_eq!(socket.close(), expect);
    }
}
