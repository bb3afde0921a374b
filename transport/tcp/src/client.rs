use rsocket_core::{TransportConfig, error::RSocketError, io_with_timeout};
use std::fmt;
use std::time::Duration;
use tokio::net::TcpStream;

/// Client-side TCP transport bound to one `host:port`
#[derive(Clone)]
pub struct TcpClientTransport {
    addr: String,
    connect_timeout: Duration,
}

impl fmt::Debug for TcpClientTransport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tcp client {}", self.addr)
    }
}

impl TcpClientTransport {
    #[inline]
    pub fn new(addr: impl Into<String>, config: &TransportConfig) -> Self {
        Self { addr: addr.into(), connect_timeout: config.connect_timeout }
    }

    #[inline(always)]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Zero means no limit
    #[inline(always)]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Dial the server, the host part is resolved by tokio.
    pub async fn connect(&self) -> Result<TcpStream, RSocketError> {
        let stream = match io_with_timeout!(
            self.connect_timeout,
            TcpStream::connect(self.addr.as_str())
        ) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("{:?} connect failed: {}", self, e);
                return Err(e.into());
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            warn!("{:?} set_nodelay failed: {}", self, e);
        }
        debug!("{:?} connected", self);
        Ok(stream)
    }
}
