use forum_write_api::{
    AppState,
    auth::{AuthState, TokenAuthProvider},
    config::{AppConfig, Env},
    create_router,
    error::ServiceResult,
    memory::InMemoryForum,
    models::ReplyPayload,
    services::TopicService,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initializes logging, wires the in-memory forum and the token
/// provider into the shared state, then serves HTTP until the process is stopped.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise debug for this crate.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "forum_write_api=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    if config.master_token.is_some() {
        tracing::info!("Master token configured; requests using it must carry _uid");
    }

    // 3. Collaborators
    let forum = Arc::new(InMemoryForum::new());
    let provider = Arc::new(TokenAuthProvider::from_config(&config));

    if config.seed_demo_data {
        if let Err(e) = seed_demo_data(&forum, &provider, &config).await {
            tracing::error!(error = %e, "Failed to seed demo data");
        }
    }

    // 4. Unified state and router
    let bind_addr = config.bind_addr;
    let auth: AuthState = provider;
    let app = create_router(AppState::in_memory(forum, auth));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}

/// Creates an administrator, a regular user, one topic with a short reply chain, and
/// a bearer token for each account.
async fn seed_demo_data(
    forum: &InMemoryForum,
    provider: &TokenAuthProvider,
    config: &AppConfig,
) -> ServiceResult<()> {
    let admin = forum.create_user("admin", true).await;
    let demo = forum.create_user("demo", false).await;

    let (tid, main_pid) = forum
        .create_topic(admin, "Welcome", "Welcome to the forum.")
        .await?;
    let first = forum
        .reply(ReplyPayload {
            tid: tid.to_string(),
            uid: demo,
            content: "Glad to be here.".to_string(),
            to_pid: Some(main_pid.to_string()),
        })
        .await?;
    forum
        .reply(ReplyPayload {
            tid: tid.to_string(),
            uid: admin,
            content: "Likewise.".to_string(),
            to_pid: Some(first.pid),
        })
        .await?;

    let admin_token = provider.issue_user_token(admin).await;
    let demo_token = provider.issue_user_token(demo).await;

    // Tokens are only printed where nobody else reads the logs.
    if config.env == Env::Local {
        tracing::info!(uid = admin, token = %admin_token, "Demo administrator token");
        tracing::info!(uid = demo, token = %demo_token, "Demo user token");
    }
    tracing::info!(tid, main_pid, "Demo data seeded");
    Ok(())
}
