// src/models/permissions.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::AppError;

// Papel de um usuário dentro de uma organização.
// Hierarquia: viewer < accountant / external_operator < operator < manager
// < owner. Contador e operador externo ocupam o MESMO nível — por isso a
// comparação é feita por `level()`, e não por derive(Ord).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "organisation_role", rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Accountant,
    ExternalOperator,
    Operator,
    Manager,
    Owner,
}

impl Role {
    /// Nível do papel na hierarquia (quanto maior, mais privilégio).
    pub fn level(self) -> u8 {
        match self {
            Role::Viewer => 0,
            Role::Accountant | Role::ExternalOperator => 1,
            Role::Operator => 2,
            Role::Manager => 3,
            Role::Owner => 4,
        }
    }
}

// Os tipos de recurso de negócio sobre os quais as permissões se aplicam.
// O CRUD em si (clientes, lotes, vendas...) vive fora deste núcleo; aqui só
// importa o vocabulário para a tabela de permissões.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Organisation,
    Clients,
    Sellers,
    Lots,
    Sales,
    Inventories,
    Users,
    Invoices,
    Mails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    View,
    Edit,
    Create,
    Delete,
    ManageUsers,
}

/// Tabela estática papel → ações permitidas. Função pura, sem I/O: é usada
/// tanto pelo extrator de rotas quanto diretamente nos testes.
pub fn has_permission(role: Role, resource: Resource, action: PermissionAction) -> bool {
    use PermissionAction::*;

    match role {
        Role::Viewer => action == View,

        // Contador: visualiza tudo, edita apenas faturas
        Role::Accountant => action == View || (action == Edit && resource == Resource::Invoices),

        // Operador externo (leiloeiro convidado): visualiza tudo, edita
        // apenas lotes e vendas
        Role::ExternalOperator => {
            action == View
                || (action == Edit && matches!(resource, Resource::Lots | Resource::Sales))
        }

        Role::Operator => matches!(action, View | Edit | Create),

        Role::Manager => matches!(action, View | Edit | Create | Delete),

        // Dono: tudo, incluindo a gestão de membros
        Role::Owner => true,
    }
}

/// Versão que falha: erro de permissão se a tabela disser não.
pub fn require_permission(
    role: Role,
    resource: Resource,
    action: PermissionAction,
) -> Result<(), AppError> {
    if has_permission(role, resource, action) {
        return Ok(());
    }
    Err(AppError::PermissionDenied)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [Role; 6] = [
        Role::Viewer,
        Role::Accountant,
        Role::ExternalOperator,
        Role::Operator,
        Role::Manager,
        Role::Owner,
    ];

    const ALL_RESOURCES: [Resource; 9] = [
        Resource::Organisation,
        Resource::Clients,
        Resource::Sellers,
        Resource::Lots,
        Resource::Sales,
        Resource::Inventories,
        Resource::Users,
        Resource::Invoices,
        Resource::Mails,
    ];

    const ALL_ACTIONS: [PermissionAction; 5] = [
        PermissionAction::View,
        PermissionAction::Edit,
        PermissionAction::Create,
        PermissionAction::Delete,
        PermissionAction::ManageUsers,
    ];

    #[test]
    fn tabela_de_permissoes_pontual() {
        assert!(has_permission(
            Role::Viewer,
            Resource::Lots,
            PermissionAction::View
        ));
        assert!(!has_permission(
            Role::Viewer,
            Resource::Lots,
            PermissionAction::Edit
        ));

        assert!(has_permission(
            Role::Accountant,
            Resource::Invoices,
            PermissionAction::Edit
        ));
        assert!(!has_permission(
            Role::Accountant,
            Resource::Lots,
            PermissionAction::Edit
        ));

        assert!(has_permission(
            Role::ExternalOperator,
            Resource::Sales,
            PermissionAction::Edit
        ));
        assert!(!has_permission(
            Role::ExternalOperator,
            Resource::Invoices,
            PermissionAction::Edit
        ));

        assert!(has_permission(
            Role::Operator,
            Resource::Lots,
            PermissionAction::Create
        ));
        assert!(!has_permission(
            Role::Operator,
            Resource::Lots,
            PermissionAction::Delete
        ));

        assert!(has_permission(
            Role::Manager,
            Resource::Lots,
            PermissionAction::Delete
        ));
        assert!(!has_permission(
            Role::Manager,
            Resource::Users,
            PermissionAction::ManageUsers
        ));
    }

    #[test]
    fn dono_pode_tudo() {
        for resource in ALL_RESOURCES {
            for action in ALL_ACTIONS {
                assert!(has_permission(Role::Owner, resource, action));
            }
        }
    }

    // Monotonicidade: se um papel permite uma ação, todo papel de nível
    // ESTRITAMENTE superior também permite. Verificado exaustivamente.
    #[test]
    fn hierarquia_de_papeis_e_monotonica() {
        for resource in ALL_RESOURCES {
            for action in ALL_ACTIONS {
                for lower in ALL_ROLES {
                    for higher in ALL_ROLES {
                        if lower.level() < higher.level()
                            && has_permission(lower, resource, action)
                        {
                            assert!(
                                has_permission(higher, resource, action),
                                "{:?} permite {:?} em {:?}, mas {:?} não",
                                lower,
                                action,
                                resource,
                                higher
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn niveis_dos_papeis() {
        assert!(Role::Viewer.level() < Role::Accountant.level());
        assert_eq!(Role::Accountant.level(), Role::ExternalOperator.level());
        assert!(Role::ExternalOperator.level() < Role::Operator.level());
        assert!(Role::Operator.level() < Role::Manager.level());
        assert!(Role::Manager.level() < Role::Owner.level());
    }

    #[test]
    fn require_permission_nega_com_erro() {
        assert!(require_permission(
            Role::Operator,
            Resource::Lots,
            PermissionAction::Edit
        )
        .is_ok());

        let err = require_permission(
            Role::Viewer,
            Resource::Users,
            PermissionAction::ManageUsers,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied));
    }
}
