// src/handlers/users.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{UpdateUserPayload, User},
};

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Perfil do usuário autenticado", body = User)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

// Atualização parcial do perfil. Só os campos presentes no payload mudam;
// id, e-mail e senha ficam como estão.
#[utoipa::path(
    patch,
    path = "/api/users/me",
    tag = "Users",
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "Perfil atualizado", body = User)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_me(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let updated = app_state.user_repo.update_profile(user.id, &payload).await?;
    Ok(Json(updated))
}

// Exclusão restritiva: falha enquanto o usuário tiver vínculos com alguma
// organização.
#[utoipa::path(
    delete,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 204, description = "Usuário excluído"),
        (status = 409, description = "Usuário ainda é membro de organizações")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_me(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    app_state.auth_service.delete_user(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// IDs das organizações das quais o usuário autenticado é membro
#[utoipa::path(
    get,
    path = "/api/users/me/organisations",
    tag = "Users",
    responses(
        (status = 200, description = "IDs das organizações do usuário", body = Vec<Uuid>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_my_organisations(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Uuid>>, AppError> {
    let orga_ids = app_state.user_repo.list_organisations(user.id).await?;
    Ok(Json(orga_ids))
}
