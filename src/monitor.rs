use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::MonitorConfig;
use crate::dedup::{fingerprint, DedupSet};
use crate::forwarder::{Forward, ForwardOutcome};
use crate::panel::Panel;
use crate::parser::parse_otp_message;

/// The monitoring loop: one panel session polled sequentially until a
/// session-level failure bubbles up to the supervisor in `main`.
pub struct Monitor<P, F> {
    panel: P,
    forwarder: F,
    seen: DedupSet,
    poll_interval: Duration,
    refresh_every: u32,
}

impl<P: Panel, F: Forward> Monitor<P, F> {
    pub fn new(panel: P, forwarder: F, config: &MonitorConfig) -> Self {
        Self {
            panel,
            forwarder,
            seen: DedupSet::new(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            refresh_every: config.refresh_every.max(1),
        }
    }

    /// Log in, then poll forever. Returns only on a session-fatal
    /// error (login failure, reload failure, browser gone); the caller
    /// restarts from a fresh session.
    pub async fn run(mut self) -> Result<()> {
        self.panel.login().await?;

        info!(
            "Monitoring started - checking every {}ms",
            self.poll_interval.as_millis()
        );

        let mut polls_since_refresh = 0u32;
        loop {
            self.scan().await;
            tokio::time::sleep(self.poll_interval).await;

            polls_since_refresh += 1;
            if polls_since_refresh >= self.refresh_every {
                info!("Refreshing panel view...");
                self.panel.reload().await?;
                polls_since_refresh = 0;
            }
        }
    }

    /// One pass over the rendered messages. Nothing here is fatal:
    /// a failed poll, an unparseable message, or a rejected forward is
    /// logged and the loop keeps going.
    async fn scan(&mut self) {
        let texts = match self.panel.poll_messages().await {
            Ok(texts) => texts,
            Err(e) => {
                warn!("Error checking messages: {e:#}");
                return;
            }
        };

        for text in texts {
            let fp = fingerprint(&text);
            if self.seen.contains(&fp) {
                continue;
            }

            info!("New message: {}...", preview(&text));

            if let Some(otp) = parse_otp_message(&text) {
                info!(
                    "Parsed - Phone: {}, OTP: {}",
                    otp.phone_number, otp.otp_code
                );
                match self.forwarder.forward(&otp, &text).await {
                    Ok(ForwardOutcome::Delivered { delivered_to }) => {
                        info!("OTP forwarded to user {delivered_to}");
                    }
                    Ok(ForwardOutcome::Rejected { message }) => {
                        warn!("OTP not delivered: {message}");
                    }
                    Err(e) => warn!("Error sending to receiver endpoint: {e:#}"),
                }
            }

            // Processed regardless of parse or forward outcome; there
            // is no retry for a failed forward.
            self.seen.insert(fp);
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}
