pub mod admin;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod err;
pub mod import;
pub mod models;
pub mod password;
pub mod seed;
pub mod session;
pub mod state;
pub mod store;


use axum::handler::Handler;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::{Config, CorsOrigins};
use crate::err::{Envelope, Error};
use crate::state::AppState;

pub type Payload<T> = Result<Json<Envelope<T>>, Error>;

pub fn proceeds<V>(value: V) -> Payload<V>
where
    V: Serialize,
{
    Ok(Json(Envelope::of(value)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::load()?;
    let state = AppState::connect(config).await?;
    if state.config.seed_database {
        seed::seed_database(&state).await?;
    }

    let addr = state.config.bind_addr;
    let app = router(state);
    log::info!("Starting exam seating HTTP server on http://{}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped");
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/student/dashboard", get(dashboard::dashboard_handler))
        .route("/admin/upload-excel", post(admin::upload_handler))
        .route("/admin/students", get(admin::students_handler))
        .route(
            "/admin/students/:enrollment_number",
            delete(admin::delete_student_handler),
        );

    let prefix = state.config.api_prefix.trim_matches('/');
    let app = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&format!("/{}", prefix), api)
    };

    let cors = cors_layer(&state.config.cors_origins);
    app.fallback(err::handler404.into_service()).layer(
        ServiceBuilder::new()
            .layer(cors)
            .layer(Extension(state)),
    )
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        // credentials rule out a literal `*`, so the request origin is echoed
        CorsOrigins::Any => AllowOrigin::predicate(|_, _| true),
        CorsOrigins::List(list) => AllowOrigin::list(list.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| log::warn!("Ignoring invalid CORS origin `{}`", origin))
                .ok()
        })),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT])
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutdown signal received");
}
