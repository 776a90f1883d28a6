//! Campusdesk server entry point.

mod publisher;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{middleware, Router};
use campusdesk_api::{
    middleware::AppState, rate_limit::RateLimiterState, router as api_router, SseBroadcaster,
};
use campusdesk_common::{Config, LocalStorage};
use campusdesk_core::{
    AccountService, ComplaintService, EventPublisherService, NotificationService, RolePolicy,
    StatsService, TeamService, UploadService, VoteService,
};
use campusdesk_db::repositories::{
    ComplaintRepository, NotificationRepository, UploadRepository, UserProfileRepository,
    UserRepository, VoteRepository,
};
use campusdesk_realtime::{PubSubSseBridge, RedisPubSub};
use publisher::{forward_pubsub_event, SsePublisher};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campusdesk=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting campusdesk server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = campusdesk_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    campusdesk_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let user_profile_repo = UserProfileRepository::new(Arc::clone(&db));
    let complaint_repo = ComplaintRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let upload_repo = UploadRepository::new(Arc::clone(&db));

    // Role authority is configuration, applied at the data layer
    let policy = RolePolicy::new(&config.portal);

    // Initialize the SSE broadcaster and the event publisher behind it
    let sse_broadcaster = SseBroadcaster::new();

    let event_publisher: EventPublisherService = if config.redis.enabled {
        info!("Connecting to Redis Pub/Sub...");
        let pubsub = Arc::new(RedisPubSub::new(&config.redis.url).await?);
        pubsub.start().await?;

        let bridge = PubSubSseBridge::new(Arc::clone(&pubsub));
        let bridge_broadcaster = sse_broadcaster.clone();
        bridge
            .start(move |event| {
                let broadcaster = bridge_broadcaster.clone();
                tokio::spawn(async move {
                    forward_pubsub_event(&broadcaster, event).await;
                });
            })
            .await;
        info!("Redis Pub/Sub bridge started");

        pubsub
    } else {
        info!("Redis disabled; realtime events stay in-process");
        Arc::new(SsePublisher::new(sse_broadcaster.clone()))
    };

    // Initialize services
    let account_service =
        AccountService::new(user_repo.clone(), user_profile_repo.clone(), policy.clone());

    let mut notification_service = NotificationService::new(notification_repo);
    notification_service.set_event_publisher(event_publisher.clone());

    let mut complaint_service = ComplaintService::new(
        complaint_repo.clone(),
        user_repo.clone(),
        notification_service.clone(),
    );
    complaint_service.set_event_publisher(event_publisher.clone());

    let mut vote_service = VoteService::new(vote_repo, complaint_repo.clone());
    vote_service.set_event_publisher(event_publisher.clone());

    let team_service = TeamService::new(user_repo, user_profile_repo, policy);

    let storage = Arc::new(LocalStorage::new(
        PathBuf::from(&config.storage.base_path),
        config.storage.base_url.clone(),
    ));
    let upload_service = UploadService::new(upload_repo, storage);

    let stats_service = StatsService::new(complaint_repo);

    // Initialize the API rate limiter
    let rate_limiter = RateLimiterState::new();

    // Create app state
    let state = AppState {
        account_service,
        complaint_service,
        vote_service,
        notification_service,
        team_service,
        upload_service,
        stats_service,
        portal: config.portal.clone(),
        sse_broadcaster,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            campusdesk_api::rate_limit::rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            campusdesk_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
