// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{AccessTokenClaims, User},
};

// O nome do cabeçalho que indica a organização-alvo da requisição
const ORGANISATION_ID_HEADER: &str = "x-organisation-id";

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// A verificação central de isolamento entre tenants: a organização pedida
/// precisa estar na lista de escopo do próprio access token.
pub fn require_organisation_access(
    claims: &AccessTokenClaims,
    organisation_id: Uuid,
) -> Result<(), AppError> {
    if claims.orga_uuids.contains(&organisation_id) {
        return Ok(());
    }
    Err(AppError::OrganisationAccessDenied)
}

// Guarda de autenticação: valida o bearer token, resolve o usuário e insere
// ambos (usuário e claims) nos "extensions" da requisição.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(request.headers()) else {
        return Err(AppError::TokenInvalid);
    };

    let claims = app_state.auth_service.validate_access_token(token)?;
    // Assinatura válida não basta: o sujeito precisa ainda existir
    let user = app_state.auth_service.resolve_current_user(token).await?;

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Guarda de organização: tudo o que a guarda de autenticação faz, e ainda
// exige que o x-organisation-id esteja dentro do escopo do token.
pub async fn org_guard(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(request.headers()) else {
        return Err(AppError::TokenInvalid);
    };

    let claims = app_state.auth_service.validate_access_token(token)?;
    let user = app_state.auth_service.resolve_current_user(token).await?;

    let organisation_id = request
        .headers()
        .get(ORGANISATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or(AppError::MissingOrganisationHeader)?;

    require_organisation_access(&claims, organisation_id)?;

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(user);
    request.extensions_mut().insert(OrganisationContext(organisation_id));
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::TokenInvalid)
    }
}

// Extrator das claims do access token (escopo de organizações e papel)
pub struct CurrentClaims(pub AccessTokenClaims);

impl<S> FromRequestParts<S> for CurrentClaims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessTokenClaims>()
            .cloned()
            .map(CurrentClaims)
            .ok_or(AppError::TokenInvalid)
    }
}

// Extrator da organização já verificada pela guarda de organização
#[derive(Debug, Clone, Copy)]
pub struct OrganisationContext(pub Uuid);

impl<S> FromRequestParts<S> for OrganisationContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OrganisationContext>()
            .copied()
            .ok_or(AppError::MissingOrganisationHeader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::permissions::Role;

    fn claims_with_orgas(orga_uuids: Vec<Uuid>) -> AccessTokenClaims {
        AccessTokenClaims {
            user_uuid: Uuid::new_v4(),
            orga_uuids,
            role: Role::Owner,
            exp: i64::MAX,
            jti: Uuid::new_v4(),
            device_fingerprint: None,
        }
    }

    // Isolamento entre tenants: escopo só com A nega acesso a B.
    #[test]
    fn organizacao_fora_do_escopo_e_negada() {
        let orga_a = Uuid::new_v4();
        let orga_b = Uuid::new_v4();
        let claims = claims_with_orgas(vec![orga_a]);

        assert!(require_organisation_access(&claims, orga_a).is_ok());

        let err = require_organisation_access(&claims, orga_b).unwrap_err();
        assert!(matches!(err, AppError::OrganisationAccessDenied));
    }

    #[test]
    fn escopo_vazio_nega_qualquer_organizacao() {
        let claims = claims_with_orgas(vec![]);
        let err = require_organisation_access(&claims, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::OrganisationAccessDenied));
    }
}
