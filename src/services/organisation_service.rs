// src/services/organisation_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::OrganisationRepository,
    models::{
        organisations::{
            MemberRead, Organisation, OrganisationMember, UpdateOrganisationPayload,
        },
        permissions::Role,
    },
};

#[derive(Clone)]
pub struct OrganisationService {
    organisation_repo: OrganisationRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl OrganisationService {
    pub fn new(organisation_repo: OrganisationRepository, pool: PgPool) -> Self {
        Self {
            organisation_repo,
            pool,
        }
    }

    /// Cria uma nova organização e, atomicamente, vincula quem a criou como
    /// o primeiro dono. Toda organização mantém pelo menos um dono — este
    /// vínculo inicial é o que a garantia do último dono protege depois.
    pub async fn create_with_owner(
        &self,
        name: &str,
        trade_name: Option<&str>,
        city: Option<&str>,
        owner_id: Uuid,
    ) -> Result<Organisation, AppError> {
        let mut tx = self.pool.begin().await?;

        let organisation = self
            .organisation_repo
            .create(&mut *tx, name, trade_name, city)
            .await?;

        self.organisation_repo
            .add_member(&mut *tx, organisation.id, owner_id, Role::Owner)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "🏛️ Organização {} criada pelo usuário {}",
            organisation.id,
            owner_id
        );

        Ok(organisation)
    }

    pub async fn get(&self, organisation_id: Uuid) -> Result<Organisation, AppError> {
        self.organisation_repo
            .find_by_id(organisation_id)
            .await?
            .ok_or(AppError::OrganisationNotFound)
    }

    pub async fn update(
        &self,
        organisation_id: Uuid,
        update: &UpdateOrganisationPayload,
    ) -> Result<Organisation, AppError> {
        self.organisation_repo.update(organisation_id, update).await
    }

    /// Exclui a organização junto com os vínculos de membros dela, na mesma
    /// transação. Os vínculos pertencem à fronteira que está sendo removida.
    pub async fn delete(&self, organisation_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.organisation_repo
            .delete_members(&mut *tx, organisation_id)
            .await?;
        self.organisation_repo
            .delete(&mut *tx, organisation_id)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn add_member(
        &self,
        organisation_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<OrganisationMember, AppError> {
        self.organisation_repo
            .add_member(&self.pool, organisation_id, user_id, role)
            .await
    }

    /// Remove um membro, protegendo o invariante do último dono: a contagem
    /// e a remoção acontecem na MESMA transação, então uma remoção rejeitada
    /// não muta nada.
    pub async fn remove_member(
        &self,
        organisation_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let role = self
            .organisation_repo
            .member_role(&mut *tx, organisation_id, user_id)
            .await?
            .ok_or(AppError::MembershipNotFound)?;

        if role == Role::Owner {
            let owners = self
                .organisation_repo
                .count_owners(&mut *tx, organisation_id)
                .await?;
            if owners <= 1 {
                return Err(AppError::LastOwner);
            }
        }

        self.organisation_repo
            .remove_member(&mut *tx, organisation_id, user_id)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn list_members(
        &self,
        organisation_id: Uuid,
    ) -> Result<Vec<MemberRead>, AppError> {
        self.organisation_repo.list_members(organisation_id).await
    }

    pub async fn list_user_organisations(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Organisation>, AppError> {
        self.organisation_repo.list_for_user(user_id).await
    }
}
