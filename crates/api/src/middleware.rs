//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use campusdesk_common::config::PortalConfig;
use campusdesk_core::{
    AccountService, ComplaintService, NotificationService, StatsService, TeamService,
    UploadService, VoteService,
};

use crate::sse::SseBroadcaster;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub complaint_service: ComplaintService,
    pub vote_service: VoteService,
    pub notification_service: NotificationService,
    pub team_service: TeamService,
    pub upload_service: UploadService,
    pub stats_service: StatsService,
    pub portal: PortalConfig,
    pub sse_broadcaster: SseBroadcaster,
}

/// Authentication middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Try to extract token from header
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        // Authenticate user by token
        if let Ok(user) = state.account_service.authenticate_by_token(token).await {
            req.extensions_mut().insert(user);
        }
    }

    next.run(req).await
}
