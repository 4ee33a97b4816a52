// src/config.rs

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{AgentRepository, LeadRepository, PaymentRepository, ProjectRepository, ProofRepository, UserRepository},
    services::{
        agent_service::AgentService, auth::AuthService, lead_service::LeadService,
        payment_service::PaymentService, project_service::ProjectService,
        proof_service::ProofService, storage::ArtifactStore,
    },
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub token_ttl: chrono::Duration,
    pub upload_dir: PathBuf,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    pub fn from_source<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| get(key).with_context(|| format!("{key} must be set"));

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout: Duration::from_secs(parse_or(&get, "DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            token_ttl: chrono::Duration::hours(parse_or(&get, "TOKEN_TTL_HOURS", 24 * 7)?),
            upload_dir: get("UPLOAD_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./uploads")),
            cookie_secure: parse_or(&get, "COOKIE_SECURE", false)?,
        })
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Config,
    pub auth_service: AuthService,
    pub agent_service: AgentService,
    pub lead_service: LeadService,
    pub project_service: ProjectService,
    pub payment_service: PaymentService,
    pub proof_service: ProofService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(config, db_pool))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(config: Config, db_pool: PgPool) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let agent_repo = AgentRepository::new(db_pool.clone());
        let lead_repo = LeadRepository::new(db_pool.clone());
        let project_repo = ProjectRepository::new(db_pool.clone());
        let payment_repo = PaymentRepository::new(db_pool.clone());
        let proof_repo = ProofRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            agent_repo.clone(),
            config.jwt_secret.clone(),
            config.token_ttl,
            db_pool.clone(),
        );
        let agent_service = AgentService::new(agent_repo.clone(), user_repo.clone());
        let lead_service = LeadService::new(lead_repo, agent_service.clone(), db_pool.clone());
        let project_service = ProjectService::new(
            project_repo.clone(),
            lead_service.clone(),
            agent_service.clone(),
            db_pool.clone(),
        );
        let payment_service = PaymentService::new(payment_repo, project_repo.clone(), db_pool.clone());
        let proof_service = ProofService::new(
            proof_repo,
            project_repo,
            ArtifactStore::new(config.upload_dir.clone()),
            db_pool.clone(),
        );

        Self {
            db_pool,
            config,
            auth_service,
            agent_service,
            lead_service,
            project_service,
            payment_service,
            proof_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults_for_optional_keys() {
        let config = Config::from_source(source(&[
            ("DATABASE_URL", "postgres://localhost/ledger"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.db_acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.token_ttl, chrono::Duration::hours(168));
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
        assert!(!config.cookie_secure);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_source(source(&[("DATABASE_URL", "postgres://localhost/ledger")]))
            .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn rejects_unparsable_numbers() {
        let err = Config::from_source(source(&[
            ("DATABASE_URL", "postgres://localhost/ledger"),
            ("JWT_SECRET", "s3cret"),
            ("DB_MAX_CONNECTIONS", "many"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
    }
}
