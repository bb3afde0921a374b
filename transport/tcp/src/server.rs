use rsocket_core::error::RSocketError;
use std::fmt;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};

/// Server-side TCP transport factory, nothing is bound until [TcpServerTransport::bind]
#[derive(Clone)]
pub struct TcpServerTransport {
    addr: String,
}

impl fmt::Debug for TcpServerTransport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tcp server {}", self.addr)
    }
}

impl TcpServerTransport {
    #[inline]
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    #[inline(always)]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub async fn bind(&self) -> Result<TcpServerListener, RSocketError> {
        match TcpListener::bind(self.addr.as_str()).await {
            Ok(listener) => {
                debug!("{:?} listening", self);
                Ok(TcpServerListener { listener })
            }
            Err(e) => {
                error!("{:?} failed to listen: {}", self, e);
                Err(e.into())
            }
        }
    }
}

pub struct TcpServerListener {
    listener: TcpListener,
}

impl fmt::Debug for TcpServerListener {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.listener.local_addr() {
            Ok(addr) => write!(f, "tcp listener {}", addr),
            Err(_) => write!(f, "tcp listener"),
        }
    }
}

impl TcpServerListener {
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), RSocketError> {
        let (stream, peer) = self.listener.accept().await?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!("{:?} set_nodelay for {} failed: {}", self, peer, e);
        }
        trace!("{:?} accepted {}", self, peer);
        Ok((stream, peer))
    }

    #[inline]
    pub fn local_addr(&self) -> Result<SocketAddr, RSocketError> {
        Ok(self.listener.local_addr()?)
    }
}
