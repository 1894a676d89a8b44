//! Waiting for the network to come up before the first request goes out.

use std::time::Duration;

use reqwest::Url;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Host and port a URL connects to.
pub fn endpoint_of(url: &Url) -> Option<(String, u16)> {
    Some((url.host_str()?.to_owned(), url.port_or_known_default()?))
}

/// Block until a TCP connection to `host:port` succeeds or `limit` has passed. Returns
/// whether the network came up; giving up is not an error, the requests that follow
/// fail on their own terms.
pub async fn wait_for_network(host: &str, port: u16, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let remaining = deadline.saturating_duration_since(Instant::now());
        let attempt_limit = ATTEMPT_TIMEOUT.min(remaining).max(Duration::from_millis(1));

        match timeout(attempt_limit, TcpStream::connect((host, port))).await {
            Ok(Ok(_)) => {
                info!(host, port, attempt, "Network is up.");
                return true;
            }
            Ok(Err(e)) => debug!(host, port, attempt, error = %e, "connect failed"),
            Err(_) => debug!(host, port, attempt, "connect timed out"),
        }

        if Instant::now() + RETRY_DELAY >= deadline {
            warn!(
                host,
                port,
                attempt,
                "Network did not come up within {:?}, continuing anyway.",
                limit
            );
            return false;
        }
        sleep(RETRY_DELAY).await;
    }
}
