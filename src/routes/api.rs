use actix_web::{web, HttpResponse};
use validator::Validate;
use crate::core::{CoreError, Matchmaker};
use crate::models::{
    AckResponse, HealthResponse, LikeResponse, LoginRequest, LoginResponse, MatchesResponse,
    MessagesQuery, MessagesResponse, ProfileResponse, ProfileUpdateForm, SearchQuery,
    SearchResponse, SendMessageForm, SessionUser, TargetForm, ViewerQuery,
};
use crate::services::PostgresClient;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub matchmaker: Matchmaker,
    /// Present when running on the PostgreSQL backend
    pub postgres: Option<Arc<PostgresClient>>,
}

/// Configure all API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/tg-login", web::post().to(login))
        .route("/me", web::get().to(me))
        .route("/me/update", web::post().to(update_me))
        .route("/search", web::get().to(search))
        .route("/like", web::post().to(like))
        .route("/superlike", web::post().to(superlike))
        .route("/matches", web::get().to(matches))
        .route("/messages", web::get().to(messages))
        .route("/messages/send", web::post().to(send_message));
}

fn validate<T: Validate>(value: &T) -> Result<(), CoreError> {
    value.validate().map_err(|errors| {
        tracing::info!("Validation failed: field_errors={:?}", errors);
        CoreError::InvalidOperation(errors.to_string())
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let healthy = match &state.postgres {
        Some(pg) => pg.health_check().await.unwrap_or(false),
        None => true,
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Login by external identity
///
/// POST /api/tg-login (form: tg_id, name?, username?)
///
/// The identity is taken as given; there is no proof verification.
async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginRequest>,
) -> Result<HttpResponse, CoreError> {
    validate(&*form)?;

    let user = state
        .matchmaker
        .login(&form.tg_id, form.name.as_deref(), form.username.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        ok: true,
        user: SessionUser::from(&user),
    }))
}

/// GET /api/me?tg_id=
async fn me(
    state: web::Data<AppState>,
    query: web::Query<ViewerQuery>,
) -> Result<HttpResponse, CoreError> {
    validate(&*query)?;

    let user = state.matchmaker.profile(&query.tg_id).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(user)))
}

/// POST /api/me/update?tg_id= (form: any profile field, invisible_mode as a flag)
async fn update_me(
    state: web::Data<AppState>,
    query: web::Query<ViewerQuery>,
    form: web::Form<ProfileUpdateForm>,
) -> Result<HttpResponse, CoreError> {
    validate(&*query)?;
    validate(&*form)?;

    let update = form.into_inner().into_update()?;
    state.matchmaker.update_profile(&query.tg_id, update).await?;

    Ok(HttpResponse::Ok().json(AckResponse { ok: true }))
}

/// Discovery deck
///
/// GET /api/search?tg_id=&gender=&city=
async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, CoreError> {
    validate(&*query)?;

    let users = state.matchmaker.search(&query.tg_id, &query.filters()).await?;

    tracing::debug!("Returning deck of {} for {}", users.len(), query.tg_id);

    Ok(HttpResponse::Ok().json(SearchResponse { users }))
}

/// POST /api/like?tg_id= (form: target_id)
async fn like(
    state: web::Data<AppState>,
    query: web::Query<ViewerQuery>,
    form: web::Form<TargetForm>,
) -> Result<HttpResponse, CoreError> {
    validate(&*query)?;

    let outcome = state.matchmaker.like(&query.tg_id, form.target_id).await?;

    Ok(HttpResponse::Ok().json(LikeResponse {
        ok: true,
        already: outcome.already_existed,
        is_match: outcome.is_match,
        superlike: false,
    }))
}

/// POST /api/superlike?tg_id= (form: target_id)
async fn superlike(
    state: web::Data<AppState>,
    query: web::Query<ViewerQuery>,
    form: web::Form<TargetForm>,
) -> Result<HttpResponse, CoreError> {
    validate(&*query)?;

    let outcome = state.matchmaker.superlike(&query.tg_id, form.target_id).await?;

    Ok(HttpResponse::Ok().json(LikeResponse {
        ok: true,
        already: outcome.already_existed,
        is_match: outcome.is_match,
        superlike: true,
    }))
}

/// GET /api/matches?tg_id=
async fn matches(
    state: web::Data<AppState>,
    query: web::Query<ViewerQuery>,
) -> Result<HttpResponse, CoreError> {
    validate(&*query)?;

    let matches = state.matchmaker.matches(&query.tg_id).await?;
    Ok(HttpResponse::Ok().json(MatchesResponse { matches }))
}

/// GET /api/messages?tg_id=&partner_id=
async fn messages(
    state: web::Data<AppState>,
    query: web::Query<MessagesQuery>,
) -> Result<HttpResponse, CoreError> {
    validate(&*query)?;

    let messages = state
        .matchmaker
        .get_messages(&query.tg_id, query.partner_id)
        .await?;

    Ok(HttpResponse::Ok().json(MessagesResponse { messages }))
}

/// POST /api/messages/send?tg_id= (form: partner_id, body)
async fn send_message(
    state: web::Data<AppState>,
    query: web::Query<ViewerQuery>,
    form: web::Form<SendMessageForm>,
) -> Result<HttpResponse, CoreError> {
    validate(&*query)?;

    state
        .matchmaker
        .send_message(&query.tg_id, form.partner_id, &form.body)
        .await?;

    Ok(HttpResponse::Ok().json(AckResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use crate::core::MatchmakerOptions;
    use crate::services::{IdentityCache, MemoryStore};

    fn app_state() -> AppState {
        let store = Arc::new(MemoryStore::new());
        AppState {
            matchmaker: Matchmaker::new(
                store.clone(),
                store.clone(),
                store,
                IdentityCache::new(100, 60),
                MatchmakerOptions { visible_by_default: true },
            ),
            postgres: None,
        }
    }

    #[actix_web::test]
    async fn test_health_check_without_database() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .app_data(crate::routes::form_config())
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: HealthResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.status, "healthy");
    }

    #[actix_web::test]
    async fn test_unknown_viewer_is_404() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .app_data(crate::routes::form_config())
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/me?tg_id=ghost").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status().as_u16(), 404);
    }

    #[actix_web::test]
    async fn test_like_then_chat_flow_over_http() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .app_data(crate::routes::form_config())
                .configure(crate::routes::configure_routes),
        )
        .await;

        for id in ["alice", "bob"] {
            let req = test::TestRequest::post()
                .uri("/api/tg-login")
                .set_form([("tg_id", id)])
                .to_request();
            let login: LoginResponse = test::call_and_read_body_json(&app, req).await;
            assert!(login.ok);
        }

        // Not matched yet
        let req = test::TestRequest::post()
            .uri("/api/messages/send?tg_id=alice")
            .set_form([("partner_id", "2"), ("body", "hi")])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 403);

        let req = test::TestRequest::post()
            .uri("/api/superlike?tg_id=alice")
            .set_form([("target_id", "2")])
            .to_request();
        let liked: LikeResponse = test::call_and_read_body_json(&app, req).await;
        assert!(liked.is_match && liked.superlike);

        let req = test::TestRequest::post()
            .uri("/api/messages/send?tg_id=bob")
            .set_form([("partner_id", "1"), ("body", "  hello  ")])
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::get()
            .uri("/api/messages?tg_id=alice&partner_id=2")
            .to_request();
        let conversation: MessagesResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].body, "hello");
        assert!(!conversation.messages[0].is_from_viewer);
    }

    #[actix_web::test]
    async fn test_self_like_and_bad_flag_are_400() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .app_data(crate::routes::form_config())
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/tg-login")
            .set_form([("tg_id", "carol")])
            .to_request();
        let _: LoginResponse = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/like?tg_id=carol")
            .set_form([("target_id", "1")])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 400);

        let req = test::TestRequest::post()
            .uri("/api/me/update?tg_id=carol")
            .set_form([("invisible_mode", "perhaps")])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn test_long_message_is_accepted() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .app_data(crate::routes::form_config())
                .configure(crate::routes::configure_routes),
        )
        .await;

        for id in ["dana", "eli"] {
            let req = test::TestRequest::post()
                .uri("/api/tg-login")
                .set_form([("tg_id", id)])
                .to_request();
            let _: LoginResponse = test::call_and_read_body_json(&app, req).await;
        }

        let req = test::TestRequest::post()
            .uri("/api/superlike?tg_id=dana")
            .set_form([("target_id", "2")])
            .to_request();
        let _: LikeResponse = test::call_and_read_body_json(&app, req).await;

        // Well past actix's default 16 KiB urlencoded limit
        let body = "x".repeat(20_000);
        let req = test::TestRequest::post()
            .uri("/api/messages/send?tg_id=dana")
            .set_form([("partner_id", "2"), ("body", body.as_str())])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 200);

        let req = test::TestRequest::get()
            .uri("/api/messages?tg_id=eli&partner_id=1")
            .to_request();
        let conversation: MessagesResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].body.len(), 20_000);
    }
}
