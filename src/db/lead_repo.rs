// src/db/lead_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::lead::{Lead, LeadContact, LeadWithLatestProject},
};

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_lead<'e, E>(
        &self,
        executor: E,
        lead_id: &str,
        admin_id: Option<Uuid>,
        contact: &LeadContact,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (lead_id, admin_id, name, phone, email, address_line, city, state, pincode)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(lead_id)
        .bind(admin_id)
        .bind(&contact.name)
        .bind(&contact.phone)
        .bind(&contact.email)
        .bind(&contact.address_line)
        .bind(&contact.city)
        .bind(&contact.state)
        .bind(&contact.pincode)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, || format!("Lead '{lead_id}' already exists.")))
    }

    /// Insere o lead apenas se o ID ainda não existir. Retorna `true` se criou.
    pub async fn insert_lead_if_missing<'e, E>(
        &self,
        executor: E,
        lead_id: &str,
        admin_id: Option<Uuid>,
        contact: &LeadContact,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO leads (lead_id, admin_id, name, phone, email, address_line, city, state, pincode)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (lead_id) DO NOTHING
            "#,
        )
        .bind(lead_id)
        .bind(admin_id)
        .bind(&contact.name)
        .bind(&contact.phone)
        .bind(&contact.email)
        .bind(&contact.address_line)
        .bind(&contact.city)
        .bind(&contact.state)
        .bind(&contact.pincode)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, lead_id: &str) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE lead_id = $1")
            .bind(lead_id)
            .fetch_optional(executor)
            .await?;

        Ok(lead)
    }

    /// Lead mais antigo com o telefone. Com `owner_admin_id`, só entre os leads
    /// daquele admin (direto ou por algum projeto dele).
    pub async fn find_by_phone<'e, E>(
        &self,
        executor: E,
        phone: &str,
        owner_admin_id: Option<Uuid>,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            SELECT l.* FROM leads l
            WHERE l.phone = $1
              AND (
                $2::uuid IS NULL
                OR l.admin_id = $2
                OR EXISTS (SELECT 1 FROM projects p WHERE p.lead_id = l.lead_id AND p.admin_id = $2)
              )
            ORDER BY l.created_at ASC
            LIMIT 1
            "#,
        )
        .bind(phone)
        .bind(owner_admin_id)
        .fetch_optional(executor)
        .await?;

        Ok(lead)
    }

    /// O lead é do admin: criado sob ele ou ligado a algum projeto dele.
    pub async fn is_owned_by<'e, E>(&self, executor: E, lead_id: &str, admin_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let owned = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM leads WHERE lead_id = $1 AND admin_id = $2)
                OR EXISTS (SELECT 1 FROM projects WHERE lead_id = $1 AND admin_id = $2)
            "#,
        )
        .bind(lead_id)
        .bind(admin_id)
        .fetch_one(executor)
        .await?;

        Ok(owned)
    }

    /// Leads com o projeto mais recente. `admin_id`/`agent_id` nulos = sem filtro.
    pub async fn list_with_latest_project(
        &self,
        admin_id: Option<Uuid>,
        agent_id: Option<Uuid>,
    ) -> Result<Vec<LeadWithLatestProject>, AppError> {
        let leads = sqlx::query_as::<_, LeadWithLatestProject>(
            r#"
            SELECT
                l.*,
                p.appointment_id, p.agent_id, p.project_value, p.payment_status,
                p.created_at AS project_created_at
            FROM leads l
            LEFT JOIN LATERAL (
                SELECT appointment_id, agent_id, admin_id, project_value, payment_status, created_at
                FROM projects
                WHERE projects.lead_id = l.lead_id
                ORDER BY created_at DESC
                LIMIT 1
            ) p ON TRUE
            WHERE ($1::uuid IS NULL OR l.admin_id = $1 OR p.admin_id = $1)
              AND ($2::uuid IS NULL OR p.agent_id = $2)
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(admin_id)
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(leads)
    }

    /// Dono do lead, ou agente/admin de algum projeto ligado a ele.
    pub async fn is_visible_to(&self, lead_id: &str, user_id: Uuid) -> Result<bool, AppError> {
        let visible: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM leads WHERE lead_id = $1 AND admin_id = $2)
                OR EXISTS (
                    SELECT 1 FROM projects
                    WHERE lead_id = $1 AND (agent_id = $2 OR admin_id = $2)
                )
            "#,
        )
        .bind(lead_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(visible)
    }
}
