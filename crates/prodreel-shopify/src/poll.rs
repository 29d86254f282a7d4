//! Readiness polling for freshly created file records.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::client::AdminClient;
use crate::error::{ShopifyError, ShopifyResult};

/// Fixed wait between status queries.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1200);

/// Default deadline for a file to reach READY.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(300);

impl AdminClient {
    /// Poll a file's status until it reaches READY or a deadline elapses.
    ///
    /// FAILED and CANCELLED abort immediately with
    /// [`ShopifyError::Processing`]; any other status keeps waiting. Each
    /// iteration suspends for [`POLL_INTERVAL`] between queries; the deadline
    /// is checked against elapsed wall-clock time, so the loop never observes
    /// the asset for longer than `timeout` before raising
    /// [`ShopifyError::Timeout`].
    pub async fn wait_until_ready(&self, file_id: &str, timeout: Duration) -> ShopifyResult<()> {
        let start = Instant::now();
        loop {
            let status = self.file_status(file_id).await?;
            debug!(file_id, status = %status, "polled file status");

            match status.as_str() {
                "READY" => return Ok(()),
                "FAILED" | "CANCELLED" => return Err(ShopifyError::Processing { status }),
                _ => {}
            }

            if start.elapsed() > timeout {
                return Err(ShopifyError::Timeout {
                    last_status: status,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
