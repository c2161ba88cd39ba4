// src/handlers/organisations.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::{AuthenticatedUser, OrganisationContext},
        rbac::{
            PermMembersManage, PermMembersView, PermOrganisationDelete, PermOrganisationEdit,
            RequirePermission,
        },
    },
    models::organisations::{
        AddMemberPayload, CreateOrganisationPayload, MemberRead, Organisation,
        OrganisationMember, UpdateOrganisationPayload,
    },
};

// Cria uma organização; quem cria vira o primeiro dono.
#[utoipa::path(
    post,
    path = "/api/organisations",
    tag = "Organisations",
    request_body = CreateOrganisationPayload,
    responses(
        (status = 201, description = "Organização criada", body = Organisation),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_organisation(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateOrganisationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let organisation = app_state
        .organisation_service
        .create_with_owner(
            &payload.name,
            payload.trade_name.as_deref(),
            payload.city.as_deref(),
            user.id,
        )
        .await?;

    // Aviso: o escopo do access token atual não inclui a organização nova;
    // um novo login (ou refresh) é que passa a enxergá-la.
    Ok((StatusCode::CREATED, Json(organisation)))
}

// Lista as organizações das quais o chamador é membro
#[utoipa::path(
    get,
    path = "/api/organisations",
    tag = "Organisations",
    responses(
        (status = 200, description = "Organizações do usuário", body = Vec<Organisation>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_organisations(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Organisation>>, AppError> {
    let organisations = app_state
        .organisation_service
        .list_user_organisations(user.id)
        .await?;
    Ok(Json(organisations))
}

// Dados da organização indicada pelo cabeçalho (já verificada pela guarda)
#[utoipa::path(
    get,
    path = "/api/organisations/current",
    tag = "Organisations",
    params(("x-organisation-id" = Uuid, Header, description = "ID da organização")),
    responses(
        (status = 200, description = "Dados da organização", body = Organisation),
        (status = 403, description = "Organização fora do escopo do token")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_current_organisation(
    State(app_state): State<AppState>,
    OrganisationContext(organisation_id): OrganisationContext,
) -> Result<Json<Organisation>, AppError> {
    let organisation = app_state.organisation_service.get(organisation_id).await?;
    Ok(Json(organisation))
}

#[utoipa::path(
    patch,
    path = "/api/organisations/current",
    tag = "Organisations",
    params(("x-organisation-id" = Uuid, Header, description = "ID da organização")),
    request_body = UpdateOrganisationPayload,
    responses(
        (status = 200, description = "Organização atualizada", body = Organisation),
        (status = 403, description = "Papel não permite editar a organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_current_organisation(
    State(app_state): State<AppState>,
    OrganisationContext(organisation_id): OrganisationContext,
    _perm: RequirePermission<PermOrganisationEdit>,
    Json(payload): Json<UpdateOrganisationPayload>,
) -> Result<Json<Organisation>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let organisation = app_state
        .organisation_service
        .update(organisation_id, &payload)
        .await?;
    Ok(Json(organisation))
}

#[utoipa::path(
    delete,
    path = "/api/organisations/current",
    tag = "Organisations",
    params(("x-organisation-id" = Uuid, Header, description = "ID da organização")),
    responses(
        (status = 204, description = "Organização excluída"),
        (status = 403, description = "Apenas donos podem excluir a organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_current_organisation(
    State(app_state): State<AppState>,
    OrganisationContext(organisation_id): OrganisationContext,
    _perm: RequirePermission<PermOrganisationDelete>,
) -> Result<impl IntoResponse, AppError> {
    app_state.organisation_service.delete(organisation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/organisations/current/members",
    tag = "Organisations",
    params(("x-organisation-id" = Uuid, Header, description = "ID da organização")),
    responses(
        (status = 200, description = "Membros da organização", body = Vec<MemberRead>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    OrganisationContext(organisation_id): OrganisationContext,
    _perm: RequirePermission<PermMembersView>,
) -> Result<Json<Vec<MemberRead>>, AppError> {
    let members = app_state
        .organisation_service
        .list_members(organisation_id)
        .await?;
    Ok(Json(members))
}

#[utoipa::path(
    post,
    path = "/api/organisations/current/members",
    tag = "Organisations",
    params(("x-organisation-id" = Uuid, Header, description = "ID da organização")),
    request_body = AddMemberPayload,
    responses(
        (status = 201, description = "Membro vinculado", body = OrganisationMember),
        (status = 403, description = "Papel não permite gerir membros"),
        (status = 409, description = "Usuário já é membro")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_member(
    State(app_state): State<AppState>,
    OrganisationContext(organisation_id): OrganisationContext,
    _perm: RequirePermission<PermMembersManage>,
    Json(payload): Json<AddMemberPayload>,
) -> Result<impl IntoResponse, AppError> {
    let member = app_state
        .organisation_service
        .add_member(organisation_id, payload.user_id, payload.role)
        .await?;

    Ok((StatusCode::CREATED, Json(member)))
}

// Remove um membro. O último dono nunca sai: a operação falha com 409 e não
// muta nada.
#[utoipa::path(
    delete,
    path = "/api/organisations/current/members/{user_id}",
    tag = "Organisations",
    params(
        ("x-organisation-id" = Uuid, Header, description = "ID da organização"),
        ("user_id" = Uuid, Path, description = "ID do membro a remover")
    ),
    responses(
        (status = 204, description = "Membro removido"),
        (status = 404, description = "Usuário não é membro"),
        (status = 409, description = "Seria o último dono")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_member(
    State(app_state): State<AppState>,
    OrganisationContext(organisation_id): OrganisationContext,
    _perm: RequirePermission<PermMembersManage>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .organisation_service
        .remove_member(organisation_id, user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
