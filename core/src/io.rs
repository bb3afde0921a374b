//! I/O helpers shared by the transport crates

/// Await `$f` within `$timeout` on the tokio timer, a zero timeout waits forever.
///
/// On elapse the result is `Err(io::ErrorKind::TimedOut.into())`, so the error type of `$f` must
/// implement `From<std::io::Error>`. The calling crate must depend on tokio with the `time`
/// feature.
#[macro_export]
macro_rules! io_with_timeout {
    ($timeout: expr, $f: expr) => {{
        let timeout: ::std::time::Duration = $timeout;
        if timeout.is_zero() {
            $f.await
        } else {
            match ::tokio::time::timeout(timeout, $f).await {
                Ok(r) => r,
                Err(_) => Err(::std::io::Error::from(::std::io::ErrorKind::TimedOut).into()),
            }
        }
    }};
}
pub use crate::io_with_timeout;
