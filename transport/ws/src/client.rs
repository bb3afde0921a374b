use crate::ws_err;
use rsocket_core::{TransportConfig, error::RSocketError, io_with_timeout};
use std::fmt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub type WsClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client-side WebSocket transport for one URL
#[derive(Clone)]
pub struct WsClientTransport {
    url: String,
    timeout: Duration,
}

impl fmt::Debug for WsClientTransport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ws client {}", self.url)
    }
}

impl WsClientTransport {
    /// The URL is checked here, so a bad host fails at construction instead of on connect.
    pub fn new(url: impl Into<String>, config: &TransportConfig) -> Result<Self, RSocketError> {
        let url = url.into();
        if let Err(e) = url.as_str().into_client_request() {
            return Err(RSocketError::ClientTransport(format!("{}: {}", url, e)));
        }
        let timeout = if config.connect_timeout.is_zero() || config.handshake_timeout.is_zero() {
            Duration::ZERO
        } else {
            config.connect_timeout + config.handshake_timeout
        };
        Ok(Self { url, timeout })
    }

    #[inline(always)]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect plus upgrade handshake, zero means no limit
    #[inline(always)]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Dial and complete the upgrade handshake.
    pub async fn connect(&self) -> Result<WsClientStream, RSocketError> {
        match io_with_timeout!(self.timeout, connect_async(self.url.as_str())) {
            Ok((stream, resp)) => {
                debug!("{:?} connected, status {}", self, resp.status());
                Ok(stream)
            }
            Err(e) => {
                warn!("{:?} connect failed: {}", self, e);
                Err(ws_err(e))
            }
        }
    }
}
