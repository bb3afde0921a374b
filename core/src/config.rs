use std::time::Duration;

#[derive(Clone, Debug, Default)]
pub struct SocketConfig {
    pub transport: TransportConfig,
    /// Lease window installed by the local policy, None to wait for the peer
    pub lease: Option<LeaseConfig>,
}

#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// connect timeout
    pub connect_timeout: Duration,
    /// WebSocket upgrade timeout, both client and server side
    pub handshake_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { connect_timeout: Duration::from_secs(10), handshake_timeout: Duration::from_secs(5) }
    }
}

/// A lease window: `quota` requests within `ttl`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeaseConfig {
    pub ttl: Duration,
    pub quota: u64,
}

impl LeaseConfig {
    #[inline]
    pub fn new(ttl: Duration, quota: u64) -> Self {
        Self { ttl, quota }
    }
}
