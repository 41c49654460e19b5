#![deny(warnings)]

// Handshake event stream for GET /mcp: open -> periodic keep-alive -> close

use crate::server::PROTOCOL_VERSION;
use axum::response::sse::Event;
use futures_util::stream::{self, Stream, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Gap between keep-alive frames
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// What the stream emits. No application data ever flows here.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionFrame {
    /// Sent once, right after the connection opens
    Ready(Value),
    /// Sent every `KEEP_ALIVE_INTERVAL` until the client goes away
    KeepAlive,
}

impl SessionFrame {
    pub fn ready() -> Self {
        SessionFrame::Ready(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "initialized",
            "params": { "protocolVersion": PROTOCOL_VERSION },
        }))
    }

    /// Render as an SSE event; keep-alives are `: ping` comments
    pub fn into_event(self) -> Event {
        match self {
            SessionFrame::Ready(message) => Event::default().data(message.to_string()),
            SessionFrame::KeepAlive => Event::default().comment("ping"),
        }
    }
}

/// Counts event streams that are currently open
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    open: Arc<AtomicUsize>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    fn open(&self) -> SessionGuard {
        let open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(open, "event stream opened");
        SessionGuard {
            open: Arc::clone(&self.open),
        }
    }
}

/// Lives exactly as long as the stream's timer
struct SessionGuard {
    open: Arc<AtomicUsize>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let open = self.open.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::debug!(open, "event stream closed");
    }
}

/// Stream for one connection: a ready frame now, then a keep-alive every
/// `interval`. Dropping the stream (client disconnect) drops the timer.
pub fn session_stream(
    tracker: &SessionTracker,
    interval: Duration,
) -> impl Stream<Item = SessionFrame> + Send + 'static {
    let guard = tracker.open();
    let mut timer = time::interval_at(Instant::now() + interval, interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let keep_alives = stream::unfold((timer, guard), |(mut timer, guard)| async move {
        timer.tick().await;
        Some((SessionFrame::KeepAlive, (timer, guard)))
    });

    stream::once(async { SessionFrame::ready() }).chain(keep_alives)
}
