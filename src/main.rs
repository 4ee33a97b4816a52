//src/main.rs

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::middleware::auth::auth_guard;

// Comprovantes podem ser fotos/PDFs maiores que o limite padrão do axum
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env().context("Falha ao carregar a configuração")?;
    let bind_addr = config.bind_addr.clone();

    let app_state = AppState::new(config)
        .await
        .context("Falha ao inicializar o estado da aplicação")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let pool = app_state.db_pool.clone();
    let app = app(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {bind_addr}"))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Erro no servidor Axum")?;

    pool.close().await;
    tracing::info!("👋 Pool de conexões encerrado");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao escutar o sinal de desligamento: {}", e);
    }
}

fn app(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout));

    let user_routes = Router::new()
        .route("/", post(handlers::auth::create_user))
        .route("/me", get(handlers::auth::get_me));

    let agent_routes = Router::new()
        .route("/", get(handlers::agents::list_agents))
        .route("/{agent_id}/admin", put(handlers::agents::reassign_agent))
        .route(
            "/me/bank",
            get(handlers::agents::get_my_bank_details).put(handlers::agents::upsert_my_bank_details),
        );

    let payment_routes = Router::new()
        .route("/", get(handlers::payments::list_payments))
        .route("/share", put(handlers::payments::set_agent_share))
        .route("/paid", put(handlers::payments::record_agent_paid))
        .route("/invoice-status", put(handlers::payments::update_invoice_status))
        .route("/invoices", get(handlers::payments::list_invoices))
        .route("/{appointment_id}/status", get(handlers::payments::get_payment_status))
        .route(
            "/proofs",
            get(handlers::proofs::list_proofs)
                .post(handlers::proofs::upload_proof)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/proofs/{t_id}", delete(handlers::proofs::delete_proof));

    // Tudo abaixo exige token (Bearer ou cookie de sessão)
    let protected = Router::new()
        .route("/lead", post(handlers::leads::open_project))
        .route("/leads", post(handlers::leads::create_lead).get(handlers::leads::list_leads))
        .route("/leads/{lead_id}", get(handlers::leads::get_lead))
        .route("/projects", get(handlers::projects::list_projects))
        .route(
            "/projects/{appointment_id}",
            get(handlers::projects::get_project).put(handlers::projects::update_project),
        )
        .route(
            "/remarks",
            get(handlers::projects::list_remarks).post(handlers::projects::add_remark),
        )
        .nest("/users", user_routes)
        .nest("/agents", agent_routes)
        .nest("/payments", payment_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{
        middleware::auth::SESSION_COOKIE,
        models::auth::{Identity, Role},
    };

    // Pool preguiçoso: nenhum destes testes chega a tocar no banco
    fn test_state() -> AppState {
        let config = Config {
            database_url: "postgres://postgres@localhost/ledger_router_tests".to_string(),
            jwt_secret: "router-test-secret".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            db_max_connections: 1,
            db_acquire_timeout: std::time::Duration::from_millis(200),
            token_ttl: chrono::Duration::hours(1),
            upload_dir: std::env::temp_dir(),
            cookie_secure: false,
        };
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState::with_pool(config, pool)
    }

    fn token_for(state: &AppState, role: Role) -> String {
        state
            .auth_service
            .create_token(Identity { user_id: Uuid::new_v4(), role })
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app(test_state())
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let response = app(test_state())
            .oneshot(Request::builder().uri("/api/projects").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Missing or invalid authentication token.");
    }

    #[tokio::test]
    async fn rejects_tampered_tokens() {
        let response = app(test_state())
            .oneshot(
                Request::builder()
                    .uri("/api/projects")
                    .header(header::AUTHORIZATION, "Bearer not.a.jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_cookie_authenticates() {
        let state = test_state();
        let token = token_for(&state, Role::Agent);

        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/api/users/me")
                    .header(header::COOKIE, format!("{SESSION_COOKIE}={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["userId"].is_string());
    }

    #[tokio::test]
    async fn empty_project_patch_is_a_bad_request() {
        let state = test_state();
        let token = token_for(&state, Role::Admin);

        let response = app(state)
            .oneshot(
                Request::builder()
                    .method(Method::PUT)
                    .uri("/api/projects/AP00001")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn agents_cannot_set_commission_share() {
        let state = test_state();
        let token = token_for(&state, Role::Agent);

        let response = app(state)
            .oneshot(
                Request::builder()
                    .method(Method::PUT)
                    .uri("/api/payments/share")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"appointmentId":"AP00001","agentShare":100000}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn negative_share_fails_validation() {
        let state = test_state();
        let token = token_for(&state, Role::Admin);

        let response = app(state)
            .oneshot(
                Request::builder()
                    .method(Method::PUT)
                    .uri("/api/payments/share")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"appointmentId":"AP00001","agentShare":-5}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body.get("details").is_some());
    }

    #[tokio::test]
    async fn oversized_project_value_fails_validation() {
        let state = test_state();
        let token = token_for(&state, Role::Admin);

        let response = app(state)
            .oneshot(
                Request::builder()
                    .method(Method::PUT)
                    .uri("/api/projects/AP00001")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"projectValue":1e27,"commission":100}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body.get("details").is_some());
    }

    #[tokio::test]
    async fn blank_remark_fails_validation() {
        let state = test_state();
        let token = token_for(&state, Role::Agent);

        let response = app(state)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/remarks?appointment_id=AP00001")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"remark":"   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn proof_upload_requires_a_file() {
        let state = test_state();
        let token = token_for(&state, Role::Agent);
        let body = "--XBOUNDARY\r\n\
                    Content-Disposition: form-data; name=\"appointment_id\"\r\n\r\n\
                    AP00001\r\n\
                    --XBOUNDARY--\r\n";

        let response = app(state)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/payments/proofs")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn proof_listing_needs_exactly_one_filter() {
        let state = test_state();
        let token = token_for(&state, Role::Admin);

        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri(format!("/api/payments/proofs?agent_id={}&appointment_id=AP00001", Uuid::new_v4()))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
