// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{AgentRepository, UserRepository},
    models::auth::{Claims, CreateUserPayload, Identity, Role, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    agent_repo: AgentRepository,
    jwt_secret: String,
    token_ttl: chrono::Duration,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        agent_repo: AgentRepository,
        jwt_secret: String,
        token_ttl: chrono::Duration,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, agent_repo, jwt_secret, token_ttl, pool }
    }

    /// Login por e-mail ou username. Usuário inexistente e senha errada
    /// retornam o mesmo erro.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<(String, Identity), AppError> {
        let user = self.user_repo
            .find_by_login(login)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))?
        // Hash corrompido no banco também é "credencial inválida" para quem chama
        .unwrap_or(false);

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let identity = Identity { user_id: user.id, role: user.role };
        let token = self.create_token(identity)?;

        tracing::info!("🔑 Login de {} ({:?})", user.id, user.role);
        Ok((token, identity))
    }

    /// Valida assinatura e expiração; não consulta o banco.
    pub fn decode_token(&self, token: &str) -> Result<Identity, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(Identity {
            user_id: token_data.claims.sub,
            role: token_data.claims.role,
        })
    }

    pub fn create_token(&self, identity: Identity) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: identity.user_id,
            role: identity.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    /// Superadmin cria admins e agentes; admin cria apenas agentes, que ficam sob ele.
    pub async fn create_user(&self, creator: &Identity, input: &CreateUserPayload) -> Result<User, AppError> {
        ensure_can_create(creator, input.role)?;

        // 1. Hashing (fora da transação, não toca no banco)
        let password_clone = input.password.clone();
        let hashed_password = tokio::task::spawn_blocking(move || {
            hash(&password_clone, bcrypt::DEFAULT_COST)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Password hashing task failed: {}", e))??;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let user = self.user_repo
            .create_user(
                &mut *tx,
                &input.email,
                input.username.as_deref(),
                &hashed_password,
                &input.full_name,
                input.phone.as_deref(),
                input.role,
            )
            .await?;

        if user.role == Role::Agent {
            let supervisor = (creator.role == Role::Admin).then_some(creator.user_id);
            self.agent_repo
                .create_agent(
                    &mut *tx,
                    user.id,
                    &user.full_name,
                    supervisor,
                    user.phone.as_deref(),
                    Some(&user.email),
                )
                .await?;
        }

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!("👤 Usuário {} ({:?}) criado por {}", user.id, user.role, creator.user_id);
        Ok(user)
    }
}

fn ensure_can_create(creator: &Identity, role: Role) -> Result<(), AppError> {
    let allowed = match creator.role {
        Role::Superadmin => matches!(role, Role::Admin | Role::Agent),
        Role::Admin => role == Role::Agent,
        Role::Agent => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::forbidden(format!("{:?} cannot create {:?} accounts.", creator.role, role)))
    }
}

#[cfg(test)]
mod tests {
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    use super::*;

    fn service(secret: &str, ttl: chrono::Duration) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AuthService::new(
            UserRepository::new(pool.clone()),
            AgentRepository::new(pool.clone()),
            secret.to_string(),
            ttl,
            pool,
        )
    }

    #[tokio::test]
    async fn token_round_trips_identity_and_role() {
        let auth = service("secret", chrono::Duration::hours(1));
        let identity = Identity { user_id: Uuid::new_v4(), role: Role::Admin };

        let token = auth.create_token(identity).unwrap();
        assert_eq!(auth.decode_token(&token).unwrap(), identity);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let issuer = service("secret-a", chrono::Duration::hours(1));
        let verifier = service("secret-b", chrono::Duration::hours(1));
        let token = issuer
            .create_token(Identity { user_id: Uuid::new_v4(), role: Role::Agent })
            .unwrap();

        assert!(matches!(verifier.decode_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        // Bem além da tolerância padrão de 60s do jsonwebtoken
        let auth = service("secret", chrono::Duration::hours(-2));
        let token = auth
            .create_token(Identity { user_id: Uuid::new_v4(), role: Role::Agent })
            .unwrap();

        assert!(matches!(auth.decode_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let auth = service("secret", chrono::Duration::hours(1));
        assert!(matches!(auth.decode_token("not-a-jwt"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn creation_hierarchy() {
        let root = Identity { user_id: Uuid::new_v4(), role: Role::Superadmin };
        let admin = Identity { user_id: Uuid::new_v4(), role: Role::Admin };
        let agent = Identity { user_id: Uuid::new_v4(), role: Role::Agent };

        assert!(ensure_can_create(&root, Role::Admin).is_ok());
        assert!(ensure_can_create(&root, Role::Agent).is_ok());
        assert!(ensure_can_create(&root, Role::Superadmin).is_err());
        assert!(ensure_can_create(&admin, Role::Agent).is_ok());
        assert!(ensure_can_create(&admin, Role::Admin).is_err());
        assert!(ensure_can_create(&agent, Role::Agent).is_err());
    }
}
