// src/services/token.rs

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use crate::{
    common::error::AppError,
    models::auth::{AccessTokenClaims, RefreshTokenClaims},
};

// O codec de tokens: serializa claims em uma string compacta assinada e faz
// o caminho inverso verificando assinatura e expiração.
//
// São DOIS pares de chaves independentes — um para access tokens, outro para
// refresh tokens. Um token assinado com o segredo de refresh nunca pode
// passar pela decodificação de access, e vice-versa.
#[derive(Clone)]
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    algorithm: Algorithm,
}

impl TokenCodec {
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_ref()),
            access_decoding: DecodingKey::from_secret(access_secret.as_ref()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_ref()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_ref()),
            algorithm: Algorithm::HS256,
        }
    }

    // Sem leeway: expirou, expirou.
    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation
    }

    pub fn encode_access(&self, claims: &AccessTokenClaims) -> Result<String, AppError> {
        encode(&Header::new(self.algorithm), claims, &self.access_encoding)
            .map_err(|e| anyhow::anyhow!("Falha ao assinar access token: {e}").into())
    }

    pub fn decode_access(&self, token: &str) -> Result<AccessTokenClaims, AppError> {
        decode::<AccessTokenClaims>(token, &self.access_decoding, &self.validation())
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    pub fn encode_refresh(&self, claims: &RefreshTokenClaims) -> Result<String, AppError> {
        encode(&Header::new(self.algorithm), claims, &self.refresh_encoding)
            .map_err(|e| anyhow::anyhow!("Falha ao assinar refresh token: {e}").into())
    }

    pub fn decode_refresh(&self, token: &str) -> Result<RefreshTokenClaims, AppError> {
        decode::<RefreshTokenClaims>(token, &self.refresh_decoding, &self.validation())
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }
}

// Expiração é o único caso com semântica própria; todo o resto (assinatura
// errada, formato quebrado, claim faltando) é um token inválido.
fn map_decode_error(error: jsonwebtoken::errors::Error) -> AppError {
    match error.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::TokenInvalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::permissions::Role;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn codec() -> TokenCodec {
        TokenCodec::new("segredo-de-access", "segredo-de-refresh")
    }

    fn access_claims(exp_offset: Duration) -> AccessTokenClaims {
        AccessTokenClaims {
            user_uuid: Uuid::new_v4(),
            orga_uuids: vec![Uuid::new_v4(), Uuid::new_v4()],
            role: Role::Manager,
            exp: (Utc::now() + exp_offset).timestamp(),
            jti: Uuid::new_v4(),
            device_fingerprint: Some("ff:aa:01".to_string()),
        }
    }

    fn refresh_claims(exp_offset: Duration) -> RefreshTokenClaims {
        RefreshTokenClaims {
            jti: Uuid::new_v4(),
            user_uuid: Uuid::new_v4(),
            exp: (Utc::now() + exp_offset).timestamp(),
            iss: "localhost".to_string(),
            device_fingerprint: None,
        }
    }

    #[test]
    fn access_token_ida_e_volta() {
        let codec = codec();
        let claims = access_claims(Duration::minutes(30));

        let token = codec.encode_access(&claims).unwrap();
        let decoded = codec.decode_access(&token).unwrap();

        assert_eq!(decoded.user_uuid, claims.user_uuid);
        assert_eq!(decoded.orga_uuids, claims.orga_uuids);
        assert_eq!(decoded.role, claims.role);
        assert_eq!(decoded.jti, claims.jti);
        assert_eq!(decoded.device_fingerprint, claims.device_fingerprint);
    }

    #[test]
    fn refresh_token_ida_e_volta() {
        let codec = codec();
        let claims = refresh_claims(Duration::days(7));

        let token = codec.encode_refresh(&claims).unwrap();
        let decoded = codec.decode_refresh(&token).unwrap();

        assert_eq!(decoded.jti, claims.jti);
        assert_eq!(decoded.user_uuid, claims.user_uuid);
        assert_eq!(decoded.iss, "localhost");
    }

    #[test]
    fn access_token_expirado_e_rejeitado() {
        let codec = codec();
        // Assinatura perfeitamente válida, exp no passado
        let claims = access_claims(Duration::minutes(-5));
        let token = codec.encode_access(&claims).unwrap();

        let err = codec.decode_access(&token).unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn refresh_token_expirado_e_rejeitado() {
        let codec = codec();
        let claims = refresh_claims(Duration::days(-1));
        let token = codec.encode_refresh(&claims).unwrap();

        let err = codec.decode_refresh(&token).unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn token_adulterado_e_rejeitado() {
        let codec = codec();
        let token = codec
            .encode_access(&access_claims(Duration::minutes(30)))
            .unwrap();

        // Troca o último caractere da assinatura
        let mut tampered = token[..token.len() - 1].to_string();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });

        let err = codec.decode_access(&tampered).unwrap_err();
        assert!(matches!(err, AppError::TokenInvalid));
    }

    #[test]
    fn lixo_nao_e_token() {
        let codec = codec();
        let err = codec.decode_access("isto.não.é-um-jwt").unwrap_err();
        assert!(matches!(err, AppError::TokenInvalid));
    }

    // Os dois pares de segredos são independentes: um token de refresh nunca
    // passa pelo caminho de decodificação de access, e vice-versa.
    #[test]
    fn segredos_de_access_e_refresh_sao_isolados() {
        let codec = codec();

        let refresh_token = codec
            .encode_refresh(&refresh_claims(Duration::days(7)))
            .unwrap();
        let err = codec.decode_access(&refresh_token).unwrap_err();
        assert!(matches!(err, AppError::TokenInvalid));

        let access_token = codec
            .encode_access(&access_claims(Duration::minutes(30)))
            .unwrap();
        let err = codec.decode_refresh(&access_token).unwrap_err();
        assert!(matches!(err, AppError::TokenInvalid));
    }
}
