//! Analytics event channel (spec §9 "fire-and-forget event tracking
//! reframed"): a bounded channel that drains into one background task
//! posting a JSON array. The wire schema is the telemetry vendor's (spec
//! §6); only the bounded enqueue/drop/drain discipline lives in the core.
//!
//! Bounded channel + drop-when-full is the same discipline the teacher uses
//! for its render handoff (`system::bus::SystemBus::render_tx`, capacity 2);
//! here the capacity is larger since analytics events are cheap and bursty.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const CHANNEL_CAPACITY: usize = 256;
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsEvent {
    pub name: String,
    pub payload: Value,
}

/// The producer side: `track()` enqueues without blocking, dropping the
/// event silently when the channel is full (spec §9: "fire-and-forget").
#[derive(Clone)]
pub struct AnalyticsSink {
    tx: Sender<AnalyticsEvent>,
    enabled: bool,
}

impl AnalyticsSink {
    pub fn track(&self, event: AnalyticsEvent) {
        if !self.enabled {
            return;
        }
        if let Err(TrySendError::Full(_)) = self.tx.try_send(event) {
            log::debug!("analytics channel full, dropping event");
        }
    }
}

/// Creates the channel pair. `enabled` mirrors `SettingsFile.send_analytics`
/// (spec §6); when disabled, `track()` is a no-op and the drain task is
/// never spawned.
pub fn channel(enabled: bool) -> (AnalyticsSink, Receiver<AnalyticsEvent>) {
    let (tx, rx) = bounded(CHANNEL_CAPACITY);
    (AnalyticsSink { tx, enabled }, rx)
}

/// Drains queued events into batches and POSTs each batch as a JSON array to
/// `endpoint` (spec §6 "a single HTTPS POST of a JSON event array"). Runs
/// until the sender side is dropped.
///
/// The blocking `crossbeam_channel::recv` that waits for the first event of
/// each batch runs on a blocking-pool thread (`spawn_blocking`) rather than
/// inline, so it parks a blocking-pool thread instead of the tokio worker
/// driving this task.
pub async fn run_drain_task(rx: Receiver<AnalyticsEvent>, endpoint: String) {
    let client = reqwest::Client::new();
    loop {
        let blocking_rx = rx.clone();
        let first = match tokio::task::spawn_blocking(move || blocking_rx.recv()).await {
            Ok(Ok(event)) => event,
            Ok(Err(_)) | Err(_) => return,
        };

        let mut batch = vec![first];
        while let Ok(event) = rx.try_recv() {
            batch.push(event);
        }

        if let Err(error) = client
            .post(&endpoint)
            .timeout(HTTP_TIMEOUT)
            .json(&batch)
            .send()
            .await
        {
            log::warn!("analytics POST failed: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn disabled_sink_never_enqueues() {
        let (sink, rx) = channel(false);
        sink.track(AnalyticsEvent {
            name: "session_end".into(),
            payload: json!({}),
        });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn enabled_sink_enqueues_and_drops_when_full() {
        let (tx, rx) = bounded(1);
        let sink = AnalyticsSink { tx, enabled: true };
        sink.track(AnalyticsEvent {
            name: "a".into(),
            payload: json!(1),
        });
        sink.track(AnalyticsEvent {
            name: "b".into(),
            payload: json!(2),
        });
        let received = rx.try_recv().unwrap();
        assert_eq!(received.name, "a");
        assert!(rx.try_recv().is_err());
    }
}
