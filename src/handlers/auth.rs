// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AuthenticatedUser, CurrentClaims},
    models::auth::{
        AccessTokenResponse, AuthResponse, LoginUserPayload, RefreshTokenPayload,
        RegisterUserPayload, User,
    },
};

// Handler de registro: cria o usuário, a organização inicial dele e devolve
// o par de tokens como num login.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário registrado", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail já em uso")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let (_user, tokens) = app_state.auth_service.register_user(&payload).await?;

    Ok((StatusCode::CREATED, Json(tokens)))
}

// Handler de login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Par de tokens emitido", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let tokens = app_state
        .auth_service
        .login_user(&payload.email, &payload.password, payload.device_fingerprint)
        .await?;

    Ok(Json(tokens))
}

// Troca um refresh token válido por um novo access token. O refresh token
// apresentado segue utilizável até expirar ou ser revogado no logout.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    request_body = RefreshTokenPayload,
    responses(
        (status = 200, description = "Novo access token", body = AccessTokenResponse),
        (status = 401, description = "Refresh token inválido, expirado ou revogado"),
        (status = 404, description = "Usuário do token não existe mais")
    )
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    Json(payload): Json<RefreshTokenPayload>,
) -> Result<Json<AccessTokenResponse>, AppError> {
    let access_token = app_state
        .auth_service
        .refresh_access_token(&payload.refresh_token)
        .await?;

    Ok(Json(AccessTokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

// Logout: revoga o refresh token do chamador. Sempre 204 — revogar duas
// vezes não é erro.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    request_body = RefreshTokenPayload,
    responses(
        (status = 204, description = "Refresh token revogado")
    ),
    security(("api_jwt" = []))
)]
pub async fn logout(
    State(app_state): State<AppState>,
    CurrentClaims(claims): CurrentClaims,
    Json(payload): Json<RefreshTokenPayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .auth_service
        .logout(claims.user_uuid, &payload.refresh_token)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// Ecoa a identidade resolvida a partir do bearer token atual
#[utoipa::path(
    get,
    path = "/api/auth/test-token",
    tag = "Auth",
    responses(
        (status = 200, description = "Token válido, identidade resolvida", body = User),
        (status = 401, description = "Token inválido ou expirado")
    ),
    security(("api_jwt" = []))
)]
pub async fn test_token(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}
