// Route exports
pub mod api;

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use crate::core::CoreError;
use crate::models::ErrorResponse;

pub use api::AppState;

/// Form extractor settings shared by the server and its tests.
///
/// Chat bodies have no size cap, so the urlencoded limit is lifted entirely.
pub fn form_config() -> web::FormConfig {
    web::FormConfig::default().limit(usize::MAX)
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(api::configure),
    );
}

impl ResponseError for CoreError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // Backend details stay in the logs
            CoreError::Store(err) => {
                tracing::error!("Storage failure: {}", err);
                "internal storage error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.kind().to_string(),
            message,
            status_code: self.http_status(),
        })
    }
}
