// src/models/organisations.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::permissions::Role;

// ---
// 1. Organisation (a casa de leilão — a fronteira de isolamento)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organisation {
    pub id: Uuid,
    pub name: String,
    pub trade_name: Option<String>,
    pub siren_number: Option<i64>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,

    // Taxas padrão praticadas pela casa (em pontos-base)
    pub standard_seller_fees: Option<i32>,
    pub standard_buyer_fees: Option<i32>,
    pub expert_fees: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. OrganisationMember (a "ponte" usuário-organização, com papel)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationMember {
    pub user_id: Uuid,
    pub organisation_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Apenas (organização, papel) — o que o login precisa para montar o token
#[derive(Debug, Clone, FromRow)]
pub struct MembershipRole {
    pub organisation_id: Uuid,
    pub role: Role,
}

// Membro com os dados de perfil, para a listagem de membros
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberRead {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
}

// ---
// 3. Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganisationPayload {
    #[validate(length(min = 1, message = "O nome da organização é obrigatório."))]
    #[schema(example = "Leilões Santos & Filhos")]
    pub name: String,

    pub trade_name: Option<String>,
    pub city: Option<String>,
}

// Atualização parcial: id, created_at e os vínculos de membros nunca passam
// por aqui — a fusão é explícita, campo a campo, no repositório.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganisationPayload {
    #[validate(length(min = 1, message = "O nome da organização não pode ser vazio."))]
    pub name: Option<String>,
    pub trade_name: Option<String>,
    pub siren_number: Option<i64>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub standard_seller_fees: Option<i32>,
    pub standard_buyer_fees: Option<i32>,
    pub expert_fees: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberPayload {
    pub user_id: Uuid,
    pub role: Role,
}
