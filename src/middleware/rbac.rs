// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::{
        auth::AccessTokenClaims,
        permissions::{require_permission, PermissionAction, Resource},
    },
};

/// 1. O Trait que define o que é uma Permissão exigida por uma rota
pub trait PermissionDef: Send + Sync + 'static {
    fn resource() -> Resource;
    fn action() -> PermissionAction;
}

/// 2. O Extractor (Guardião): avalia a tabela estática de permissões contra
/// o papel que veio dentro do access token. Sem I/O.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // As claims foram inseridas pela guarda de autenticação
        let claims = parts
            .extensions
            .get::<AccessTokenClaims>()
            .ok_or(AppError::TokenInvalid)?;

        require_permission(claims.role, T::resource(), T::action())?;

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermOrganisationEdit;
impl PermissionDef for PermOrganisationEdit {
    fn resource() -> Resource {
        Resource::Organisation
    }
    fn action() -> PermissionAction {
        PermissionAction::Edit
    }
}

pub struct PermOrganisationDelete;
impl PermissionDef for PermOrganisationDelete {
    fn resource() -> Resource {
        Resource::Organisation
    }
    fn action() -> PermissionAction {
        PermissionAction::Delete
    }
}

pub struct PermMembersView;
impl PermissionDef for PermMembersView {
    fn resource() -> Resource {
        Resource::Users
    }
    fn action() -> PermissionAction {
        PermissionAction::View
    }
}

pub struct PermMembersManage;
impl PermissionDef for PermMembersManage {
    fn resource() -> Resource {
        Resource::Users
    }
    fn action() -> PermissionAction {
        PermissionAction::ManageUsers
    }
}
