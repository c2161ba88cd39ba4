// src/db/refresh_token_repo.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::RefreshTokenRecord};

// Estado persistido dos refresh tokens. Esta tabela é o único recurso
// mutável compartilhado do núcleo de autenticação: cada operação aqui é um
// único comando SQL atômico (leitura e escrita na mesma instrução), então
// dois revokes ou um revoke e o sweep nunca se intercalam de forma destrutiva.
#[derive(Clone)]
pub struct RefreshTokenRepository {
    pool: PgPool,
}

impl RefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Persiste a linha que permite revogar o token mais tarde. A assinatura
    // sozinha não expressa "foi invalidado antes da hora".
    pub async fn insert(
        &self,
        jti: Uuid,
        user_id: Uuid,
        token_content: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, AppError> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            INSERT INTO refresh_tokens (jti, user_id, token_content, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING jti, user_id, token_content, revoked, expires_at, created_at
            "#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(token_content)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    // A linha "viva" correspondente: não revogada E não expirada segundo o
    // relógio do banco. Quem decide se o token vale é esta consulta, em
    // conjunto com a verificação criptográfica feita antes pelo codec.
    pub async fn find_live(
        &self,
        user_id: Uuid,
        token_content: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT jti, user_id, token_content, revoked, expires_at, created_at
            FROM refresh_tokens
            WHERE user_id = $1
              AND token_content = $2
              AND revoked = FALSE
              AND expires_at > now()
            "#,
        )
        .bind(user_id)
        .bind(token_content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    // Revogação idempotente: revogar um token já revogado ou inexistente é
    // um no-op silencioso — o logout não pode falhar numa segunda chamada.
    pub async fn revoke(&self, user_id: Uuid, token_content: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens SET revoked = TRUE
            WHERE user_id = $1 AND token_content = $2
            "#,
        )
        .bind(user_id)
        .bind(token_content)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // Remove todos os tokens de um usuário. Chamado na transação de exclusão
    // do usuário, antes de apagar a linha em 'users'.
    pub async fn delete_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // Varredura de manutenção: apaga TODA linha expirada, revogada ou não.
    pub async fn delete_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    // Estes testes precisam de um Postgres real apontado por DATABASE_URL
    // (com as migrações aplicadas). Rode com `cargo test -- --ignored`.

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL não definida");
        PgPool::connect(&url).await.expect("falha ao conectar")
    }

    async fn create_test_user(pool: &PgPool) -> Uuid {
        let email = format!("refresh-{}@teste.com", Uuid::new_v4());
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO users (email, password_hash) VALUES ($1, 'x') RETURNING id",
        )
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("falha ao criar usuário de teste")
    }

    #[tokio::test]
    #[ignore] // precisa de banco
    async fn ciclo_de_vida_do_refresh_token() {
        let pool = test_pool().await;
        let repo = RefreshTokenRepository::new(pool.clone());
        let user_id = create_test_user(&pool).await;

        let jti = Uuid::new_v4();
        let token = format!("token-{jti}");
        let expires_at = Utc::now() + Duration::days(7);

        let record = repo.insert(jti, user_id, &token, expires_at).await.unwrap();
        assert!(!record.revoked);

        // Ativo: a linha viva existe
        let live = repo.find_live(user_id, &token).await.unwrap();
        assert!(live.is_some());

        // Revogado: some da consulta viva, mesmo antes de expirar
        repo.revoke(user_id, &token).await.unwrap();
        let live = repo.find_live(user_id, &token).await.unwrap();
        assert!(live.is_none());

        // Revogar de novo (ou revogar algo inexistente) não é erro
        repo.revoke(user_id, &token).await.unwrap();
        repo.revoke(user_id, "não-existe").await.unwrap();
    }

    #[tokio::test]
    #[ignore] // precisa de banco
    async fn sweep_remove_somente_os_expirados() {
        let pool = test_pool().await;
        let repo = RefreshTokenRepository::new(pool.clone());
        let user_id = create_test_user(&pool).await;

        let expired_jti = Uuid::new_v4();
        let live_jti = Uuid::new_v4();
        let expired_token = format!("token-{expired_jti}");
        let live_token = format!("token-{live_jti}");

        repo.insert(expired_jti, user_id, &expired_token, Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        repo.insert(live_jti, user_id, &live_token, Utc::now() + Duration::days(1))
            .await
            .unwrap();

        let swept = repo.delete_expired().await.unwrap();
        assert!(swept >= 1);

        // A linha expirada sumiu; a viva permanece intocada
        let gone = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM refresh_tokens WHERE jti = $1)",
        )
        .bind(expired_jti)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(!gone);

        let live = repo.find_live(user_id, &live_token).await.unwrap();
        assert!(live.is_some());
    }
}
