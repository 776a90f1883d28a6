//! Server-Sent Events (SSE) for real-time updates.
//!
//! Provides SSE streams for the notification bell and live branch feeds.

#![allow(missing_docs)]

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::{extractors::AuthUser, middleware::AppState};

/// SSE event types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SseEvent {
    /// New complaint in the branch feed.
    ComplaintCreated {
        id: String,
        user_id: String,
        category: String,
        title: String,
    },
    /// Complaint edited or status changed.
    ComplaintUpdated { id: String, status: String },
    /// Complaint removed.
    ComplaintRemoved { id: String },
    /// Vote tally moved on a complaint.
    VoteCast {
        complaint_id: String,
        delta: i32,
        score: i32,
    },
    /// New notification for the connected user.
    Notification {
        id: String,
        #[serde(rename = "notificationType")]
        notification_type: String,
        message: String,
        complaint_id: Option<String>,
    },
    /// Connection established.
    Connected,
}

/// SSE broadcast channels for user feeds and branch feeds.
#[derive(Clone)]
pub struct SseBroadcaster {
    /// User-specific events (keyed by user ID).
    user_channels: std::sync::Arc<
        tokio::sync::RwLock<std::collections::HashMap<String, broadcast::Sender<SseEvent>>>,
    >,
    /// Branch feed events (keyed by branch name).
    branch_channels: std::sync::Arc<
        tokio::sync::RwLock<std::collections::HashMap<String, broadcast::Sender<SseEvent>>>,
    >,
}

impl SseBroadcaster {
    /// Create a new SSE broadcaster.
    #[must_use]
    pub fn new() -> Self {
        Self {
            user_channels: std::sync::Arc::new(tokio::sync::RwLock::new(
                std::collections::HashMap::new(),
            )),
            branch_channels: std::sync::Arc::new(tokio::sync::RwLock::new(
                std::collections::HashMap::new(),
            )),
        }
    }

    async fn channel_for(
        map: &tokio::sync::RwLock<std::collections::HashMap<String, broadcast::Sender<SseEvent>>>,
        key: &str,
    ) -> broadcast::Sender<SseEvent> {
        let mut channels = map.write().await;

        if let Some(sender) = channels.get(key)
            && sender.receiver_count() > 0
        {
            return sender.clone();
        }

        let (sender, _) = broadcast::channel(100);
        channels.insert(key.to_string(), sender.clone());
        sender
    }

    /// Get or create a user-specific channel.
    pub async fn user_channel(&self, user_id: &str) -> broadcast::Sender<SseEvent> {
        Self::channel_for(&self.user_channels, user_id).await
    }

    /// Get or create a branch feed channel.
    pub async fn branch_channel(&self, branch: &str) -> broadcast::Sender<SseEvent> {
        Self::channel_for(&self.branch_channels, branch).await
    }

    /// Broadcast an event to a specific user.
    pub async fn broadcast_to_user(&self, user_id: &str, event: SseEvent) {
        let channels = self.user_channels.read().await;
        if let Some(sender) = channels.get(user_id) {
            let _ = sender.send(event);
        }
    }

    /// Broadcast an event to a branch feed.
    pub async fn broadcast_to_branch(&self, branch: &str, event: SseEvent) {
        let channels = self.branch_channels.read().await;
        if let Some(sender) = channels.get(branch) {
            let _ = sender.send(event);
        }
    }

    /// Clean up channels nobody is listening to.
    pub async fn cleanup(&self) {
        let mut channels = self.user_channels.write().await;
        channels.retain(|_, sender| sender.receiver_count() > 0);
        drop(channels);

        let mut channels = self.branch_channels.write().await;
        channels.retain(|_, sender| sender.receiver_count() > 0);
    }
}

impl Default for SseBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

fn event_stream(
    rx: broadcast::Receiver<SseEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        result.ok().map(|event| {
            Ok(Event::default()
                .json_data(&event)
                .unwrap_or_else(|_| Event::default().data("error")))
        })
    });

    // Add initial connected event
    let initial = stream::once(async {
        Ok(Event::default()
            .json_data(&SseEvent::Connected)
            .unwrap_or_else(|_| Event::default().data("connected")))
    });

    initial.chain(stream)
}

/// User-specific SSE stream (the notification bell).
async fn user_stream(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let sender = state.sse_broadcaster.user_channel(&user.id).await;

    Sse::new(event_stream(sender.subscribe())).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

/// Branch feed SSE stream (live complaint list refresh).
async fn branch_stream(
    AuthUser(_user): AuthUser,
    Path(branch): Path<String>,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let sender = state.sse_broadcaster.branch_channel(&branch).await;

    Sse::new(event_stream(sender.subscribe())).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

/// Create SSE router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user", get(user_stream))
        .route("/branch/{branch}", get(branch_stream))
}
