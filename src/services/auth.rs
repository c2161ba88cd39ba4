// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::Settings,
    db::{OrganisationRepository, RefreshTokenRepository, UserRepository},
    models::{
        auth::{
            AccessTokenClaims, AuthResponse, RefreshTokenClaims, RegisterUserPayload, User,
        },
        organisations::MembershipRole,
        permissions::Role,
    },
    services::token::TokenCodec,
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    organisation_repo: OrganisationRepository,
    refresh_token_repo: RefreshTokenRepository,
    codec: TokenCodec,
    domain: String,
    access_token_expire_minutes: i64,
    refresh_token_expire_days: i64,
    pool: PgPool,
}

// O escopo que entra no access token: as organizações do usuário e o maior
// papel entre os vínculos. Consultado fresco a cada login e a cada refresh.
fn scope_from_memberships(memberships: &[MembershipRole]) -> (Vec<Uuid>, Role) {
    let orga_uuids = memberships.iter().map(|m| m.organisation_id).collect();
    let role = memberships
        .iter()
        .map(|m| m.role)
        .max_by_key(|role| role.level())
        .unwrap_or(Role::Viewer);
    (orga_uuids, role)
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        organisation_repo: OrganisationRepository,
        refresh_token_repo: RefreshTokenRepository,
        codec: TokenCodec,
        settings: &Settings,
        pool: PgPool,
    ) -> Self {
        Self {
            user_repo,
            organisation_repo,
            refresh_token_repo,
            codec,
            domain: settings.domain.clone(),
            access_token_expire_minutes: settings.access_token_expire_minutes,
            refresh_token_expire_days: settings.refresh_token_expire_days,
            pool,
        }
    }

    /// Registra um novo usuário e, na MESMA transação, cria a organização
    /// inicial dele com o vínculo de dono. Devolve o usuário criado e o par
    /// de tokens, como se ele tivesse acabado de fazer login.
    pub async fn register_user(
        &self,
        payload: &RegisterUserPayload,
    ) -> Result<(User, AuthResponse), AppError> {
        // Hashing fora da transação (não toca no banco e é pesado)
        let password_clone = payload.password.to_owned();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let mut tx = self.pool.begin().await?;

        let new_user = self
            .user_repo
            .create_user(
                &mut *tx,
                &payload.email,
                &hashed_password,
                payload.first_name.as_deref(),
                payload.last_name.as_deref(),
            )
            .await?;

        let orga_name = format!("Organização de {}", new_user.display_name());
        let organisation = self
            .organisation_repo
            .create(&mut *tx, &orga_name, None, None)
            .await?;

        // O criador nasce como dono — toda organização mantém pelo menos um
        self.organisation_repo
            .add_member(&mut *tx, organisation.id, new_user.id, Role::Owner)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "🆕 Usuário {} registrado com a organização {}",
            new_user.id,
            organisation.id
        );

        let tokens = self
            .issue_token_pair(new_user.id, vec![organisation.id], Role::Owner, None)
            .await?;

        Ok((new_user, tokens))
    }

    pub async fn login_user(
        &self,
        email: &str,
        password: &str,
        device_fingerprint: Option<String>,
    ) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Executa a verificação em um thread separado
        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let memberships = self.user_repo.list_memberships(user.id).await?;
        let (orga_uuids, role) = scope_from_memberships(&memberships);

        self.issue_token_pair(user.id, orga_uuids, role, device_fingerprint)
            .await
    }

    async fn issue_token_pair(
        &self,
        user_id: Uuid,
        orga_uuids: Vec<Uuid>,
        role: Role,
        device_fingerprint: Option<String>,
    ) -> Result<AuthResponse, AppError> {
        let access_token =
            self.issue_access_token(user_id, orga_uuids, role, device_fingerprint.clone())?;
        let refresh_token = self.issue_refresh_token(user_id, device_fingerprint).await?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        })
    }

    /// Emite um access token: jti novo, exp = agora + TTL. Sem efeitos
    /// colaterais — nada é persistido.
    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        orga_uuids: Vec<Uuid>,
        role: Role,
        device_fingerprint: Option<String>,
    ) -> Result<String, AppError> {
        let expires_at = Utc::now() + Duration::minutes(self.access_token_expire_minutes);

        let claims = AccessTokenClaims {
            user_uuid: user_id,
            orga_uuids,
            role,
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
            device_fingerprint,
        };

        self.codec.encode_access(&claims)
    }

    /// Emite um refresh token E persiste a linha correspondente — é a linha
    /// que torna a revogação possível.
    pub async fn issue_refresh_token(
        &self,
        user_id: Uuid,
        device_fingerprint: Option<String>,
    ) -> Result<String, AppError> {
        let expires_at = Utc::now() + Duration::days(self.refresh_token_expire_days);

        let claims = RefreshTokenClaims {
            jti: Uuid::new_v4(),
            user_uuid: user_id,
            exp: expires_at.timestamp(),
            iss: self.domain.clone(),
            device_fingerprint,
        };

        let token = self.codec.encode_refresh(&claims)?;

        self.refresh_token_repo
            .insert(claims.jti, user_id, &token, expires_at)
            .await?;

        Ok(token)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, AppError> {
        self.codec.decode_access(token)
    }

    /// Valida o token e resolve o usuário no banco. Uma assinatura válida
    /// não garante que o sujeito ainda exista.
    pub async fn resolve_current_user(&self, token: &str) -> Result<User, AppError> {
        let claims = self.codec.decode_access(token)?;
        self.user_repo
            .find_by_id(claims.user_uuid)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Validação dupla do refresh token: a decodificação criptográfica E a
    /// linha persistida (não revogada, não expirada) precisam concordar.
    pub async fn validate_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
    ) -> Result<RefreshTokenClaims, AppError> {
        let claims = self.codec.decode_refresh(token)?;

        self.refresh_token_repo
            .find_live(user_id, token)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        Ok(claims)
    }

    /// Troca um refresh token válido por um novo access token. Os vínculos
    /// são consultados de novo — o escopo reflete o estado ATUAL, não o do
    /// login original. O refresh token apresentado não é rotacionado.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, AppError> {
        let claims = self.codec.decode_refresh(refresh_token)?;

        let user = self
            .user_repo
            .find_by_id(claims.user_uuid)
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.validate_refresh_token(refresh_token, user.id).await?;

        let memberships = self.user_repo.list_memberships(user.id).await?;
        let (orga_uuids, role) = scope_from_memberships(&memberships);

        self.issue_access_token(user.id, orga_uuids, role, claims.device_fingerprint)
    }

    /// Logout: revoga o refresh token apresentado. Idempotente — revogar de
    /// novo, ou revogar um token desconhecido, é sucesso silencioso.
    pub async fn logout(&self, user_id: Uuid, refresh_token: &str) -> Result<(), AppError> {
        self.refresh_token_repo.revoke(user_id, refresh_token).await
    }

    /// Varredura periódica: remove as linhas expiradas, revogadas ou não.
    pub async fn sweep_expired_tokens(&self) -> Result<u64, AppError> {
        let swept = self.refresh_token_repo.delete_expired().await?;
        if swept > 0 {
            tracing::info!("🧹 Varredura removeu {} refresh token(s) expirado(s)", swept);
        }
        Ok(swept)
    }

    /// Exclusão restritiva: um usuário com vínculos de organização não pode
    /// ser excluído. Os refresh tokens dele saem na mesma transação.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if self.user_repo.has_memberships(&mut *tx, user_id).await? {
            return Err(AppError::UserStillMember);
        }

        self.refresh_token_repo
            .delete_for_user(&mut *tx, user_id)
            .await?;
        self.user_repo.delete_user(&mut *tx, user_id).await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> Settings {
        Settings {
            database_url: "postgres://postgres@localhost/teste".to_string(),
            token_secret: "segredo-de-access".to_string(),
            refresh_token_secret: "segredo-de-refresh".to_string(),
            domain: "localhost".to_string(),
            access_token_expire_minutes: 30,
            refresh_token_expire_days: 7,
            token_sweep_interval_secs: 3600,
        }
    }

    // Pool preguiçosa: o serviço pode ser construído (e as partes puras
    // testadas) sem nenhum banco de pé.
    fn test_service(settings: &Settings) -> AuthService {
        let pool = PgPool::connect_lazy(&settings.database_url).unwrap();
        AuthService::new(
            UserRepository::new(pool.clone()),
            OrganisationRepository::new(pool.clone()),
            RefreshTokenRepository::new(pool.clone()),
            TokenCodec::new(&settings.token_secret, &settings.refresh_token_secret),
            settings,
            pool,
        )
    }

    fn membership(role: Role) -> MembershipRole {
        MembershipRole {
            organisation_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn escopo_usa_o_maior_papel() {
        let memberships = vec![
            membership(Role::Viewer),
            membership(Role::Manager),
            membership(Role::Operator),
        ];

        let (orga_uuids, role) = scope_from_memberships(&memberships);
        assert_eq!(orga_uuids.len(), 3);
        assert_eq!(role, Role::Manager);
    }

    #[test]
    fn escopo_sem_vinculos_cai_para_viewer() {
        let (orga_uuids, role) = scope_from_memberships(&[]);
        assert!(orga_uuids.is_empty());
        assert_eq!(role, Role::Viewer);
    }

    #[tokio::test]
    async fn access_token_emitido_valida_com_o_mesmo_escopo() {
        let settings = test_settings();
        let service = test_service(&settings);

        let user_id = Uuid::new_v4();
        let orga_uuids = vec![Uuid::new_v4()];

        let token = service
            .issue_access_token(user_id, orga_uuids.clone(), Role::Owner, None)
            .unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.user_uuid, user_id);
        assert_eq!(claims.orga_uuids, orga_uuids);
        assert_eq!(claims.role, Role::Owner);
    }

    #[tokio::test]
    async fn ttl_negativo_gera_token_ja_expirado() {
        let mut settings = test_settings();
        settings.access_token_expire_minutes = -5;
        let service = test_service(&settings);

        let token = service
            .issue_access_token(Uuid::new_v4(), vec![], Role::Viewer, None)
            .unwrap();

        let err = service.validate_access_token(&token).unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    // Fluxo completo contra um Postgres real (migrações aplicadas).
    // Rode com `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore] // precisa de banco
    async fn fluxo_de_registro_login_refresh_e_logout() {
        let mut settings = test_settings();
        settings.database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL não definida");
        let service = test_service(&settings);

        let email = format!("fluxo-{}@teste.com", Uuid::new_v4());
        let payload = RegisterUserPayload {
            email: email.clone(),
            password: "senha-segura".to_string(),
            first_name: Some("Ana".to_string()),
            last_name: Some("Souza".to_string()),
        };
        let (user, tokens) = service.register_user(&payload).await.unwrap();

        // O token do registro carrega papel de dono e exatamente a
        // organização criada junto com o usuário
        let claims = service.validate_access_token(&tokens.access_token).unwrap();
        assert_eq!(claims.user_uuid, user.id);
        assert_eq!(claims.role, Role::Owner);
        assert_eq!(claims.orga_uuids.len(), 1);

        // Login com o mesmo par e-mail/senha chega ao mesmo escopo
        let login_tokens = service
            .login_user(&email, "senha-segura", None)
            .await
            .unwrap();
        let login_claims = service
            .validate_access_token(&login_tokens.access_token)
            .unwrap();
        assert_eq!(login_claims.role, Role::Owner);
        assert_eq!(login_claims.orga_uuids, claims.orga_uuids);

        // Senha errada nunca entra
        let err = service
            .login_user(&email, "senha-errada", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        // Refresh funciona enquanto o token está vivo
        let new_access = service
            .refresh_access_token(&login_tokens.refresh_token)
            .await
            .unwrap();
        service.validate_access_token(&new_access).unwrap();

        // Depois do logout, o MESMO refresh token nunca mais vale
        service
            .logout(user.id, &login_tokens.refresh_token)
            .await
            .unwrap();
        let err = service
            .refresh_access_token(&login_tokens.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TokenInvalid));

        // Logout repetido continua sendo sucesso silencioso
        service
            .logout(user.id, &login_tokens.refresh_token)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cada_emissao_tem_jti_proprio() {
        let settings = test_settings();
        let service = test_service(&settings);
        let user_id = Uuid::new_v4();

        let token_a = service
            .issue_access_token(user_id, vec![], Role::Viewer, None)
            .unwrap();
        let token_b = service
            .issue_access_token(user_id, vec![], Role::Viewer, None)
            .unwrap();

        let claims_a = service.validate_access_token(&token_a).unwrap();
        let claims_b = service.validate_access_token(&token_b).unwrap();
        assert_ne!(claims_a.jti, claims_b.jti);
    }
}
