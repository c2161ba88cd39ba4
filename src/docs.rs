// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::test_token,

        // --- Users ---
        handlers::users::get_me,
        handlers::users::update_me,
        handlers::users::delete_me,
        handlers::users::get_my_organisations,

        // --- Organisations ---
        handlers::organisations::create_organisation,
        handlers::organisations::list_my_organisations,
        handlers::organisations::get_current_organisation,
        handlers::organisations::update_current_organisation,
        handlers::organisations::delete_current_organisation,
        handlers::organisations::list_members,
        handlers::organisations::add_member,
        handlers::organisations::remove_member,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::AuthResponse,
            models::auth::AccessTokenResponse,
            models::auth::RefreshTokenPayload,

            // --- Organisations ---
            models::organisations::Organisation,
            models::organisations::OrganisationMember,
            models::organisations::MemberRead,
            models::organisations::CreateOrganisationPayload,
            models::organisations::UpdateOrganisationPayload,
            models::organisations::AddMemberPayload,

            // --- Permissões ---
            models::permissions::Role,
            models::permissions::Resource,
            models::permissions::PermissionAction,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação, registro e ciclo de vida dos tokens"),
        (name = "Users", description = "Dados do usuário e perfil"),
        (name = "Organisations", description = "Casas de leilão e gestão de membros")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
