use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    routing::get,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Request pipeline: credentials, per-request context, guards.
pub mod auth;
pub mod context;
pub mod middleware;

// Terminal handlers and the uniform response contract.
pub mod error;
pub mod handlers;
pub mod models;

// Collaborator contracts and the bundled in-memory implementation.
pub mod memory;
pub mod services;

pub mod config;

// One router per forum resource (posts, topics, users).
pub mod routes;
use routes::{posts::post_routes, topics::topic_routes, users::user_routes};

// --- Public Re-exports ---

pub use auth::{AuthState, TokenAuthProvider};
pub use config::AppConfig;
pub use context::RequestContext;
pub use error::{ApiError, ServiceError};
pub use memory::InMemoryForum;
pub use services::{FlagState, PostState, TopicState, UserState};

/// ApiDoc
///
/// OpenAPI description of every route, served as JSON at `/api-docs/openapi.json`
/// and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::posts::edit_post, handlers::posts::purge_post, handlers::posts::restore_post,
        handlers::posts::delete_post, handlers::posts::vote_post, handlers::posts::unvote_post,
        handlers::posts::bookmark_post, handlers::posts::unbookmark_post,
        handlers::posts::flag_post, handlers::posts::get_post_replies,
        handlers::topics::reply_to_topic, handlers::topics::purge_topic,
        handlers::topics::restore_topic, handlers::topics::delete_topic,
        handlers::topics::follow_topic, handlers::topics::unfollow_topic,
        handlers::users::get_uid, handlers::users::delete_user,
        handlers::users::ban_user, handlers::users::unban_user
    ),
    components(
        schemas(
            error::ApiErrorBody, error::Empty,
            models::EditPostRequest, models::VoteRequest, models::FlagRequest,
            models::TopicReplyRequest, models::VoteResult, models::PostReply,
            models::ResolvedUid,
        )
    ),
    tags(
        (name = "forum-write-api", description = "Forum write API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container of every collaborator the request pipeline needs.
/// Cloned into each request; all members are reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Bearer credential validation.
    pub auth: AuthState,
    pub users: UserState,
    pub posts: PostState,
    pub topics: TopicState,
    pub flags: FlagState,
}

impl AppState {
    /// Wires every service trait to the same in-memory forum.
    pub fn in_memory(forum: Arc<InMemoryForum>, auth: AuthState) -> Self {
        Self {
            auth,
            users: forum.clone(),
            posts: forum.clone(),
            topics: forum.clone(),
            flags: forum,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// Middleware and handlers pull only the collaborator they call.

impl FromRef<AppState> for AuthState {
    fn from_ref(app_state: &AppState) -> AuthState {
        app_state.auth.clone()
    }
}

impl FromRef<AppState> for UserState {
    fn from_ref(app_state: &AppState) -> UserState {
        app_state.users.clone()
    }
}

impl FromRef<AppState> for PostState {
    fn from_ref(app_state: &AppState) -> PostState {
        app_state.posts.clone()
    }
}

impl FromRef<AppState> for TopicState {
    fn from_ref(app_state: &AppState) -> TopicState {
        app_state.topics.clone()
    }
}

impl FromRef<AppState> for FlagState {
    fn from_ref(app_state: &AppState) -> FlagState {
        app_state.flags.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies the observability layers and registers
/// the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Liveness check, unauthenticated.
        .route("/health", get(|| async { "ok" }))
        .nest("/api/v2/posts", post_routes(&state))
        .nest("/api/v2/topics", topic_routes(&state))
        .nest("/api/v2/users", user_routes(&state))
        // Unknown routes and unsupported methods answer with the uniform error body.
        .method_not_allowed_fallback(|| async { ApiError::method_not_allowed() })
        .fallback(|| async { ApiError::not_found() })
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` set by the layer above
/// so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
