//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::{auth_guard, org_guard};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Varredura periódica dos refresh tokens expirados
    let sweep_service = app_state.auth_service.clone();
    let sweep_interval =
        std::time::Duration::from_secs(app_state.settings.token_sweep_interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            if let Err(e) = sweep_service.sweep_expired_tokens().await {
                tracing::error!("Falha na varredura de refresh tokens: {}", e);
            }
        }
    });

    // Rotas de autenticação públicas (sem bearer token)
    let auth_public_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh));

    // Rotas de autenticação protegidas
    let auth_protected_routes = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route("/test-token", get(handlers::auth::test_token))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Rotas de perfil do usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route(
            "/me",
            get(handlers::users::get_me)
                .patch(handlers::users::update_me)
                .delete(handlers::users::delete_me),
        )
        .route("/me/organisations", get(handlers::users::get_my_organisations))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Criação/listagem de organizações: basta estar autenticado
    let organisation_routes = Router::new()
        .route(
            "/",
            post(handlers::organisations::create_organisation)
                .get(handlers::organisations::list_my_organisations),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Rotas com escopo de organização: o x-organisation-id precisa estar
    // dentro do escopo do token (guarda de organização)
    let organisation_scoped_routes = Router::new()
        .route(
            "/current",
            get(handlers::organisations::get_current_organisation)
                .patch(handlers::organisations::update_current_organisation)
                .delete(handlers::organisations::delete_current_organisation),
        )
        .route(
            "/current/members",
            get(handlers::organisations::list_members)
                .post(handlers::organisations::add_member),
        )
        .route(
            "/current/members/{user_id}",
            delete(handlers::organisations::remove_member),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            org_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_public_routes.merge(auth_protected_routes))
        .nest("/api/users", user_routes)
        .nest(
            "/api/organisations",
            organisation_routes.merge(organisation_scoped_routes),
        )
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
