// src/db/project_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{Identity, Role},
        lead::LeadContact,
        project::{PaymentStatus, Project, ProjectPatch, Remark},
    },
};

/// Valores derivados calculados pelo serviço e gravados junto com o patch.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivedFields {
    pub agent_share: Option<Decimal>,
    pub agent_due: Option<Decimal>,
    pub admin_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PROJETOS
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_project<'e, E>(
        &self,
        executor: E,
        appointment_id: &str,
        lead_id: &str,
        agent_id: Option<Uuid>,
        admin_id: Option<Uuid>,
        client: &LeadContact,
        location: Option<&str>,
        project_value: Decimal,
        commission: Decimal,
        agent_share: Decimal,
        property_type: Option<&str>,
        details: Option<&str>,
    ) -> Result<Project, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Sem pagamento ainda: due == share
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (
                appointment_id, lead_id, agent_id, admin_id,
                client_name, client_phone, location,
                project_value, commission, agent_share, agent_due,
                property_type, details
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(appointment_id)
        .bind(lead_id)
        .bind(agent_id)
        .bind(admin_id)
        .bind(&client.name)
        .bind(&client.phone)
        .bind(location)
        .bind(project_value)
        .bind(commission)
        .bind(agent_share)
        .bind(property_type)
        .bind(details)
        .fetch_one(executor)
        .await?;

        Ok(project)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, appointment_id: &str) -> Result<Option<Project>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE appointment_id = $1")
            .bind(appointment_id)
            .fetch_optional(executor)
            .await?;

        Ok(project)
    }

    /// Mesma busca, mas trava a linha até o fim da transação.
    pub async fn lock_by_id<'e, E>(&self, executor: E, appointment_id: &str) -> Result<Option<Project>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let project = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE appointment_id = $1 FOR UPDATE",
        )
        .bind(appointment_id)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }

    /// UPDATE dinâmico: só entram no SET os campos presentes no patch.
    pub async fn apply_patch<'e, E>(
        &self,
        executor: E,
        appointment_id: &str,
        patch: &ProjectPatch,
        derived: DerivedFields,
    ) -> Result<Project, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE projects SET updated_at = NOW()");

        macro_rules! set_if_some {
            ($column:literal, $value:expr) => {
                if let Some(v) = $value {
                    qb.push(concat!(", ", $column, " = ")).push_bind(v);
                }
            };
        }

        set_if_some!("agent_id", patch.agent_id);
        set_if_some!("client_name", patch.client_name.clone());
        set_if_some!("client_phone", patch.client_phone.clone());
        set_if_some!("location", patch.location.clone());
        set_if_some!("project_value", patch.project_value);
        set_if_some!("commission", patch.commission);
        set_if_some!("property_type", patch.property_type.clone());
        set_if_some!("details", patch.details.clone());
        set_if_some!("cold_call_date", patch.cold_call_date);
        set_if_some!("cold_call_time", patch.cold_call_time);
        set_if_some!("cold_call_status", patch.cold_call_status.clone());
        set_if_some!("site_visit_date", patch.site_visit_date);
        set_if_some!("site_visit_time", patch.site_visit_time);
        set_if_some!("site_visit_status", patch.site_visit_status.clone());
        set_if_some!("booking_date", patch.booking_date);
        set_if_some!("booking_time", patch.booking_time);
        set_if_some!("booking_status", patch.booking_status.clone());
        set_if_some!("booking_id", patch.booking_id.clone());
        set_if_some!("agent_share", derived.agent_share);
        set_if_some!("agent_due", derived.agent_due);
        set_if_some!("admin_id", derived.admin_id);

        qb.push(" WHERE appointment_id = ").push_bind(appointment_id.to_owned());
        qb.push(" RETURNING *");

        let project = qb
            .build_query_as::<Project>()
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("Project"))?;

        Ok(project)
    }

    /// Grava share/paid/due/status de uma vez.
    pub async fn update_financials<'e, E>(
        &self,
        executor: E,
        appointment_id: &str,
        agent_share: Decimal,
        agent_paid: Decimal,
        agent_due: Decimal,
        payment_status: PaymentStatus,
    ) -> Result<Project, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET agent_share = $2, agent_paid = $3, agent_due = $4, payment_status = $5, updated_at = NOW()
            WHERE appointment_id = $1
            RETURNING *
            "#,
        )
        .bind(appointment_id)
        .bind(agent_share)
        .bind(agent_paid)
        .bind(agent_due)
        .bind(payment_status)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("Project"))?;

        Ok(project)
    }

    /// Escopo pela identidade: agente vê os seus, admin os que possui, superadmin todos.
    pub async fn list_for(&self, identity: &Identity) -> Result<Vec<Project>, AppError> {
        let query = match identity.role {
            Role::Agent => sqlx::query_as::<_, Project>(
                "SELECT * FROM projects WHERE agent_id = $1 ORDER BY created_at DESC",
            )
            .bind(identity.user_id),
            Role::Admin => sqlx::query_as::<_, Project>(
                "SELECT * FROM projects WHERE admin_id = $1 ORDER BY created_at DESC",
            )
            .bind(identity.user_id),
            Role::Superadmin => sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at DESC"),
        };

        let projects = query.fetch_all(&self.pool).await?;

        Ok(projects)
    }

    // =========================================================================
    //  OBSERVAÇÕES
    // =========================================================================

    pub async fn insert_remark(&self, appointment_id: &str, author_id: Uuid, text: &str) -> Result<Remark, AppError> {
        let remark = sqlx::query_as::<_, Remark>(
            r#"
            INSERT INTO remarks (appointment_id, author_id, remark)
            VALUES ($1, $2, $3)
            RETURNING remark_id, appointment_id, author_id, remark, created_at
            "#,
        )
        .bind(appointment_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        Ok(remark)
    }

    pub async fn list_remarks(&self, appointment_id: &str) -> Result<Vec<Remark>, AppError> {
        let remarks = sqlx::query_as::<_, Remark>(
            r#"
            SELECT remark_id, appointment_id, author_id, remark, created_at
            FROM remarks
            WHERE appointment_id = $1
            ORDER BY created_at DESC, remark_id DESC
            "#,
        )
        .bind(appointment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(remarks)
    }
}
