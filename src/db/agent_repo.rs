// src/db/agent_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::agent::{Agent, AgentSummary, BankDetails, UpsertBankDetailsPayload},
};

#[derive(Clone)]
pub struct AgentRepository {
    pool: PgPool,
}

impl AgentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PERFIL
    // =========================================================================

    pub async fn create_agent<'e, E>(
        &self,
        executor: E,
        agent_id: Uuid,
        agent_name: &str,
        admin_id: Option<Uuid>,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<Agent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agent = sqlx::query_as::<_, Agent>(
            r#"
            INSERT INTO agents (agent_id, agent_name, admin_id, phone, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING agent_id, agent_name, admin_id, phone, email, address, created_at
            "#,
        )
        .bind(agent_id)
        .bind(agent_name)
        .bind(admin_id)
        .bind(phone)
        .bind(email)
        .fetch_one(executor)
        .await?;

        Ok(agent)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, agent_id: Uuid) -> Result<Option<Agent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agent = sqlx::query_as::<_, Agent>(
            "SELECT agent_id, agent_name, admin_id, phone, email, address, created_at FROM agents WHERE agent_id = $1",
        )
        .bind(agent_id)
        .fetch_optional(executor)
        .await?;

        Ok(agent)
    }

    /// Lista agentes com `is_active` derivado: algum projeto criado desde `active_since`.
    pub async fn list_agents(
        &self,
        admin_id: Option<Uuid>,
        active_since: DateTime<Utc>,
    ) -> Result<Vec<AgentSummary>, AppError> {
        let agents = sqlx::query_as::<_, AgentSummary>(
            r#"
            SELECT
                a.agent_id, a.agent_name, a.admin_id, a.phone, a.email, a.address, a.created_at,
                EXISTS (
                    SELECT 1 FROM projects p
                    WHERE p.agent_id = a.agent_id AND p.created_at >= $2
                ) AS is_active
            FROM agents a
            WHERE ($1::uuid IS NULL OR a.admin_id = $1)
            ORDER BY a.agent_name ASC
            "#,
        )
        .bind(admin_id)
        .bind(active_since)
        .fetch_all(&self.pool)
        .await?;

        Ok(agents)
    }

    pub async fn reassign_admin(&self, agent_id: Uuid, admin_id: Uuid) -> Result<Option<Agent>, AppError> {
        let agent = sqlx::query_as::<_, Agent>(
            r#"
            UPDATE agents SET admin_id = $2
            WHERE agent_id = $1
            RETURNING agent_id, agent_name, admin_id, phone, email, address, created_at
            "#,
        )
        .bind(agent_id)
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(agent)
    }

    // =========================================================================
    //  DADOS BANCÁRIOS
    // =========================================================================

    pub async fn get_bank_details(&self, agent_id: Uuid) -> Result<Option<BankDetails>, AppError> {
        let details = sqlx::query_as::<_, BankDetails>("SELECT * FROM agent_bank_details WHERE agent_id = $1")
            .bind(agent_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(details)
    }

    // UPSERT (Insert or Update)
    pub async fn upsert_bank_details(
        &self,
        agent_id: Uuid,
        input: &UpsertBankDetailsPayload,
    ) -> Result<BankDetails, AppError> {
        let details = sqlx::query_as::<_, BankDetails>(
            r#"
            INSERT INTO agent_bank_details
                (agent_id, holder_name, bank_name, account_number, ifsc_code, upi_id, qr_code_ref)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (agent_id)
            DO UPDATE SET
                holder_name = EXCLUDED.holder_name,
                bank_name = EXCLUDED.bank_name,
                account_number = EXCLUDED.account_number,
                ifsc_code = EXCLUDED.ifsc_code,
                upi_id = EXCLUDED.upi_id,
                qr_code_ref = EXCLUDED.qr_code_ref,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(agent_id)
        .bind(&input.holder_name)
        .bind(&input.bank_name)
        .bind(&input.account_number)
        .bind(&input.ifsc_code)
        .bind(&input.upi_id)
        .bind(&input.qr_code_ref)
        .fetch_one(&self.pool)
        .await?;

        Ok(details)
    }
}
