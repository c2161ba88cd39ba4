// src/db/organisation_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        organisations::{
            MemberRead, Organisation, OrganisationMember, UpdateOrganisationPayload,
        },
        permissions::Role,
    },
};

const ORGANISATION_COLUMNS: &str = "id, name, trade_name, siren_number, address, postal_code, \
     city, standard_seller_fees, standard_buyer_fees, expert_fees, created_at, updated_at";

#[derive(Clone)]
pub struct OrganisationRepository {
    pool: PgPool,
}

impl OrganisationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Cria uma nova organização. Aceita um executor (pool ou transação)
    // para participar da transação "organização + dono".
    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        trade_name: Option<&str>,
        city: Option<&str>,
    ) -> Result<Organisation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let organisation = sqlx::query_as::<_, Organisation>(&format!(
            r#"
            INSERT INTO organisations (name, trade_name, city)
            VALUES ($1, $2, $3)
            RETURNING {ORGANISATION_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(trade_name)
        .bind(city)
        .fetch_one(executor)
        .await?;

        Ok(organisation)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Organisation>, AppError> {
        let maybe_organisation = sqlx::query_as::<_, Organisation>(&format!(
            "SELECT {ORGANISATION_COLUMNS} FROM organisations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_organisation)
    }

    // Atualização parcial: fusão explícita dos campos mutáveis. O id e os
    // vínculos de membros nunca são tocados por aqui.
    pub async fn update(
        &self,
        id: Uuid,
        update: &UpdateOrganisationPayload,
    ) -> Result<Organisation, AppError> {
        let organisation = sqlx::query_as::<_, Organisation>(&format!(
            r#"
            UPDATE organisations SET
                name                 = COALESCE($2, name),
                trade_name           = COALESCE($3, trade_name),
                siren_number         = COALESCE($4, siren_number),
                address              = COALESCE($5, address),
                postal_code          = COALESCE($6, postal_code),
                city                 = COALESCE($7, city),
                standard_seller_fees = COALESCE($8, standard_seller_fees),
                standard_buyer_fees  = COALESCE($9, standard_buyer_fees),
                expert_fees          = COALESCE($10, expert_fees),
                updated_at           = now()
            WHERE id = $1
            RETURNING {ORGANISATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.trade_name.as_deref())
        .bind(update.siren_number)
        .bind(update.address.as_deref())
        .bind(update.postal_code.as_deref())
        .bind(update.city.as_deref())
        .bind(update.standard_seller_fees)
        .bind(update.standard_buyer_fees)
        .bind(update.expert_fees)
        .fetch_optional(&self.pool)
        .await?;

        organisation.ok_or(AppError::OrganisationNotFound)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM organisations WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::OrganisationNotFound);
        }
        Ok(())
    }

    // Remove todos os vínculos de membros da organização. Chamado na mesma
    // transação que o delete acima.
    pub async fn delete_members<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM organisation_members WHERE organisation_id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // Vincula um usuário à organização com um papel
    pub async fn add_member<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<OrganisationMember, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let member = sqlx::query_as::<_, OrganisationMember>(
            r#"
            INSERT INTO organisation_members (user_id, organisation_id, role)
            VALUES ($1, $2, $3)
            RETURNING user_id, organisation_id, role, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(organisation_id)
        .bind(role)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::AlreadyMember;
                }
                if db_err.is_foreign_key_violation() {
                    // Qual das duas pontas do vínculo não existe?
                    return match db_err.constraint() {
                        Some("organisation_members_organisation_id_fkey") => {
                            AppError::OrganisationNotFound
                        }
                        _ => AppError::UserNotFound,
                    };
                }
            }
            e.into()
        })?;

        Ok(member)
    }

    pub async fn remove_member<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM organisation_members WHERE organisation_id = $1 AND user_id = $2",
        )
        .bind(organisation_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::MembershipNotFound);
        }
        Ok(())
    }

    // Papel do usuário dentro da organização, se for membro
    pub async fn member_role<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_scalar::<_, Role>(
            r#"
            SELECT role FROM organisation_members
            WHERE organisation_id = $1 AND user_id = $2
            "#,
        )
        .bind(organisation_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
        Ok(role)
    }

    // Quantos donos a organização ainda tem. Consultado DENTRO da transação
    // de remoção de membro, para a garantia do último dono.
    pub async fn count_owners<'e, E>(
        &self,
        executor: E,
        organisation_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM organisation_members
            WHERE organisation_id = $1 AND role = 'owner'
            "#,
        )
        .bind(organisation_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    pub async fn list_members(&self, organisation_id: Uuid) -> Result<Vec<MemberRead>, AppError> {
        let members = sqlx::query_as::<_, MemberRead>(
            r#"
            SELECT u.id AS user_id, u.email, u.first_name, u.last_name, om.role
            FROM organisation_members om
            JOIN users u ON u.id = om.user_id
            WHERE om.organisation_id = $1
            ORDER BY om.created_at
            "#,
        )
        .bind(organisation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    // Organizações das quais o usuário é membro
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Organisation>, AppError> {
        let organisations = sqlx::query_as::<_, Organisation>(
            r#"
            SELECT o.id, o.name, o.trade_name, o.siren_number, o.address, o.postal_code,
                   o.city, o.standard_seller_fees, o.standard_buyer_fees, o.expert_fees,
                   o.created_at, o.updated_at
            FROM organisations o
            JOIN organisation_members om ON om.organisation_id = o.id
            WHERE om.user_id = $1
            ORDER BY om.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(organisations)
    }
}
