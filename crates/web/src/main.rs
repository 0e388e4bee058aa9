use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use importer::{
    ChessComSource, DiscordMemberDirectory, LoggingMemberDirectory, MemberDirectory,
    SyncScheduler,
};
use storage::{Database, InMemoryStore, RatingStore};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod state;

use config::{Config, StorageBackend};
use features::leaderboard::sessions::SessionRegistry;
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::identities::handlers::register,
        features::identities::handlers::admin_register,
        features::identities::handlers::unregister,
        features::identities::handlers::admin_unregister,
        features::identities::handlers::profile,
        features::identities::handlers::refresh,
        features::identities::handlers::trigger_sync,
        features::leaderboard::handlers::get_leaderboard,
        features::leaderboard::handlers::open_session,
        features::leaderboard::handlers::navigate,
    ),
    components(
        schemas(
            storage::dto::identity::RegisterRequest,
            storage::dto::identity::RegistrationResponse,
            storage::dto::identity::ProfileResponse,
            storage::dto::identity::RefreshResponse,
            storage::dto::common::PaginationMeta,
            storage::dto::ranking::Category,
            storage::dto::ranking::RankedEntry,
            storage::models::IdentityId,
            storage::models::RatingValues,
            storage::models::RatingSnapshot,
            storage::models::UpsertOutcome,
            features::leaderboard::handlers::OpenSessionRequest,
            features::leaderboard::handlers::NavigationRequest,
            features::leaderboard::handlers::SessionResponse,
            features::leaderboard::render::RenderedPage,
            features::leaderboard::render::PagePayload,
            features::leaderboard::render::PageRow,
            features::leaderboard::view::Controls,
            features::leaderboard::view::JumpDirection,
            features::leaderboard::view::NavigationAction,
        )
    ),
    tags(
        (name = "identities", description = "Link chat identities to Chess.com accounts"),
        (name = "leaderboards", description = "Rankings and paginated views"),
        (name = "admin", description = "Protected endpoints requiring an API key"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting chess ladder API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    let store = open_store(&config).await?;

    let source = Arc::new(
        ChessComSource::new(&config.user_agent).context("Failed to build Chess.com client")?,
    );
    let directory: Arc<dyn MemberDirectory> = match &config.discord {
        Some(discord) => Arc::new(
            DiscordMemberDirectory::new(&discord.token, &discord.guild_id)
                .context("Failed to build Discord client")?,
        ),
        None => {
            tracing::info!("Discord not configured, role changes will only be logged");
            Arc::new(LoggingMemberDirectory)
        }
    };

    let scheduler = Arc::new(SyncScheduler::new(
        store.clone(),
        source,
        directory,
        config.sync.clone(),
    ));
    let sync_task = scheduler.clone().start();
    tracing::info!(
        "Rating sweeps scheduled every {} hours",
        config.sync.interval.as_secs() / 3600
    );

    let sessions = Arc::new(SessionRegistry::new(config.idle_timeout));
    let reaper_task = sessions.clone().spawn_reaper(Duration::from_secs(30));

    let state = AppState {
        store,
        scheduler,
        sessions,
    };
    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);

    let app = features::router(state, api_keys)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive());

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sync_task.abort();
    reaper_task.abort();
    tracing::info!("Server stopped");

    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn RatingStore>> {
    match (config.storage_backend, &config.database_url) {
        (StorageBackend::Postgres, Some(url)) => {
            tracing::info!(
                "Connecting to database at: {}",
                url.split('@').next_back().unwrap_or("unknown")
            );
            let db = Database::new(url)
                .await
                .context("Failed to initialize database")?;
            tracing::info!("Database connection established");

            tracing::info!("Running database migrations");
            db.run_migrations()
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Database migrations completed successfully");

            Ok(Arc::new(db))
        }
        (StorageBackend::Postgres, None) => anyhow::bail!("DATABASE_URL is required for postgres"),
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
