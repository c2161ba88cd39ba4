// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{OrganisationRepository, RefreshTokenRepository, UserRepository},
    services::{auth::AuthService, organisation_service::OrganisationService, token::TokenCodec},
};

// Toda a configuração vinda do ambiente, carregada UMA vez no arranque e
// injetada nos construtores. Nenhum componente lê variáveis de ambiente por
// conta própria.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub token_secret: String,
    pub refresh_token_secret: String,
    pub domain: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub token_sweep_interval_secs: u64,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL deve ser definida"))?;
        let token_secret = env::var("TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("TOKEN_SECRET deve ser definido"))?;
        let refresh_token_secret = env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("REFRESH_TOKEN_SECRET deve ser definido"))?;

        // Os dois segredos nunca podem coincidir: o isolamento entre access e
        // refresh token depende disso.
        if token_secret == refresh_token_secret {
            anyhow::bail!("TOKEN_SECRET e REFRESH_TOKEN_SECRET devem ser diferentes");
        }

        let domain = env::var("DOMAIN").unwrap_or_else(|_| "localhost".to_string());

        let access_token_expire_minutes = env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60 * 24);

        let refresh_token_expire_days = env::var("REFRESH_TOKEN_EXPIRE_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7);

        let token_sweep_interval_secs = env::var("TOKEN_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        Ok(Self {
            database_url,
            token_secret,
            refresh_token_secret,
            domain,
            access_token_expire_minutes,
            refresh_token_expire_days,
            token_sweep_interval_secs,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Settings,
    pub auth_service: AuthService,
    pub organisation_service: OrganisationService,
    pub user_repo: UserRepository,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let settings = Settings::from_env()?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let organisation_repo = OrganisationRepository::new(db_pool.clone());
        let refresh_token_repo = RefreshTokenRepository::new(db_pool.clone());

        let token_codec =
            TokenCodec::new(&settings.token_secret, &settings.refresh_token_secret);

        let auth_service = AuthService::new(
            user_repo.clone(),
            organisation_repo.clone(),
            refresh_token_repo,
            token_codec,
            &settings,
            db_pool.clone(),
        );

        let organisation_service =
            OrganisationService::new(organisation_repo, db_pool.clone());

        Ok(Self {
            db_pool,
            settings,
            auth_service,
            organisation_service,
            user_repo,
        })
    }
}
