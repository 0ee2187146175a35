use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use kindred::config::{Settings, StorageBackend};
use kindred::core::{Matchmaker, MatchmakerOptions};
use kindred::routes::{self, AppState};
use kindred::services::{EdgeStore, IdentityCache, MemoryStore, MessageStore, PostgresClient, ProfileStore};
use std::sync::Arc;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for malformed form or query payloads
#[derive(Debug, serde::Serialize)]
pub struct PayloadError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for PayloadError {}

impl error::ResponseError for PayloadError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle form payload errors
pub fn handle_form_payload_error(err: error::UrlencodedError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("Form payload error on {}: {}", req.path(), err);
    PayloadError {
        error: "invalid_form".to_string(),
        message: format!("Invalid form: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    PayloadError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    // Initialize logging; LOG_LEVEL / LOG_FORMAT win over the config file
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Kindred matchmaking service...");

    let (profiles, edges, messages, postgres): (
        Arc<dyn ProfileStore>,
        Arc<dyn EdgeStore>,
        Arc<dyn MessageStore>,
        Option<Arc<PostgresClient>>,
    ) = match settings.storage.backend {
        StorageBackend::Postgres => {
            let client = PostgresClient::from_settings(
                &settings.database.url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
                settings.ledger.max_retries,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;

            info!(
                "PostgreSQL store initialized (max: {} connections)",
                settings.database.max_connections.unwrap_or(10)
            );

            let client = Arc::new(client);
            let profiles: Arc<dyn ProfileStore> = client.clone();
            let edges: Arc<dyn EdgeStore> = client.clone();
            let messages: Arc<dyn MessageStore> = client.clone();
            (profiles, edges, messages, Some(client))
        }
        StorageBackend::Memory => {
            info!("Using in-memory store; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            let profiles: Arc<dyn ProfileStore> = store.clone();
            let edges: Arc<dyn EdgeStore> = store.clone();
            let messages: Arc<dyn MessageStore> = store;
            (profiles, edges, messages, None)
        }
    };

    let identities = IdentityCache::new(settings.cache.identity_capacity, settings.cache.ttl_secs);

    let matchmaker = Matchmaker::new(
        profiles,
        edges,
        messages,
        identities,
        MatchmakerOptions {
            visible_by_default: settings.profiles.visible_by_default,
        },
    );

    let app_state = AppState { matchmaker, postgres };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::form_config().error_handler(handle_form_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
