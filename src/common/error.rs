// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// O tipo de erro único da aplicação. Cada variante carrega a semântica do
// problema; o mapeamento para HTTP acontece em um só lugar, no IntoResponse.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token expirado")]
    TokenExpired,

    #[error("Token inválido")]
    TokenInvalid,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Organização não encontrada")]
    OrganisationNotFound,

    #[error("Vínculo de membro não encontrado")]
    MembershipNotFound,

    #[error("Usuário já é membro desta organização")]
    AlreadyMember,

    #[error("A organização precisa manter pelo menos um dono")]
    LastOwner,

    #[error("Usuário ainda possui vínculos com organizações")]
    UserStillMember,

    #[error("Cabeçalho x-organisation-id ausente ou inválido")]
    MissingOrganisationHeader,

    #[error("Acesso negado à organização solicitada")]
    OrganisationAccessDenied,

    #[error("Permissão insuficiente para esta ação")]
    PermissionDenied,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado.
    // `anyhow::Error` captura o contexto para o log.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            // 401: falhas de autenticação (credenciais ou token)
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.")
            }
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "O token expirou."),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "Token inválido, expirado ou revogado.",
            ),

            AppError::MissingOrganisationHeader => (
                StatusCode::BAD_REQUEST,
                "O cabeçalho x-organisation-id é obrigatório e deve ser um UUID.",
            ),

            // 403: autenticado, mas sem autorização
            AppError::OrganisationAccessDenied => (
                StatusCode::FORBIDDEN,
                "Você não tem acesso à organização solicitada.",
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "Seu papel não permite realizar esta ação.",
            ),

            // 404
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "Usuário não encontrado."),
            AppError::OrganisationNotFound => {
                (StatusCode::NOT_FOUND, "Organização não encontrada.")
            }
            AppError::MembershipNotFound => (
                StatusCode::NOT_FOUND,
                "Usuário não é membro desta organização.",
            ),

            // 409: conflitos de estado
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "Este e-mail já está em uso."),
            AppError::AlreadyMember => (
                StatusCode::CONFLICT,
                "Usuário já é membro desta organização.",
            ),
            AppError::LastOwner => (
                StatusCode::CONFLICT,
                "Não é possível remover o último dono da organização.",
            ),
            AppError::UserStillMember => (
                StatusCode::CONFLICT,
                "Remova os vínculos do usuário com organizações antes de excluí-lo.",
            ),

            // Todos os outros erros (DatabaseError, InternalServerError, Bcrypt)
            // viram 500. O detalhe fica no log; o cliente recebe uma mensagem
            // genérica.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
