use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::Config;
use crate::db::KomikStorage;
use crate::handlers::{auth, chapters, install, manga, taxonomy, upload, users};
use crate::middleware::rate_limit::{RateLimits, auth_limit, global_limit};
use crate::security::TokenService;
use crate::service::{AuthService, InstallService};

#[derive(Clone)]
pub struct KomikState {
    pub storage: KomikStorage,
    pub auth: AuthService,
    pub install: InstallService,
    pub config: Arc<Config>,
    pub limits: Arc<RateLimits>,
}

impl KomikState {
    pub fn new(storage: KomikStorage, config: Arc<Config>) -> Self {
        let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl());
        let auth = AuthService::new(storage.clone(), tokens);
        let install = InstallService::new(storage.clone(), auth.clone());
        let limits = Arc::new(RateLimits::new(&config.rate_limit));
        Self {
            storage,
            auth,
            install,
            config,
            limits,
        }
    }
}

/// Explicit origins only: credentials are allowed, so a wildcard is never valid.
fn allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|o| {
            if o.trim() == "*" {
                warn!(origin = %o, "ignoring wildcard CORS origin");
                return None;
            }
            match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            }
        })
        .collect()
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins = allowed_origins(origins);
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

pub fn komik_router(state: KomikState) -> Router {
    let config = state.config.clone();
    let basic = &config.basic;

    // Endpoints that accept credentials get the stricter per-client budget.
    let credentials = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/recover", post(auth::recover))
        .route("/install/create-owner", post(install::create_owner))
        .route("/install/complete", post(install::complete))
        .route_layer(from_fn_with_state(state.clone(), auth_limit));

    let uploads = Router::new()
        .route("/chapters/upload", post(upload::upload))
        .layer(DefaultBodyLimit::max(basic.max_upload_bytes));

    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", post(auth::change_password))
        .route("/users", get(users::list_users))
        .route("/users/{id}/role", put(users::change_role))
        .route("/manga", get(manga::list_manga).post(manga::create_manga))
        .route(
            "/manga/{key}",
            get(manga::get_manga)
                .put(manga::update_manga)
                .delete(manga::delete_manga),
        )
        .route("/chapters", post(chapters::create_chapter))
        .route("/chapters/latest", get(chapters::latest))
        .route("/chapters/manga/{manga_id}", get(chapters::by_manga))
        .route(
            "/chapters/{id}",
            get(chapters::get_chapter)
                .put(chapters::update_chapter)
                .delete(chapters::delete_chapter),
        )
        .route(
            "/genres",
            get(taxonomy::list_genres).post(taxonomy::create_genre),
        )
        .route("/tags", get(taxonomy::list_tags).post(taxonomy::create_tag))
        .route(
            "/authors",
            get(taxonomy::list_authors).post(taxonomy::create_author),
        )
        .route("/install/status", get(install::status))
        .route("/install/test-database", post(install::test_database))
        .merge(credentials)
        .merge(uploads)
        .nest_service("/uploads", ServeDir::new(&basic.upload_dir))
        .layer(from_fn_with_state(state.clone(), global_limit))
        .layer(cors_layer(&basic.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
