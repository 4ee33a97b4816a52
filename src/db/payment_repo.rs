// src/db/payment_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::{
        auth::{Identity, Role},
        payment::{Invoice, PaymentView},
        project::PaymentStatus,
    },
};

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  FATURAS (append-only)
    // =========================================================================

    pub async fn append_invoice<'e, E>(
        &self,
        executor: E,
        invoice_id: &str,
        seq: i64,
        appointment_id: &str,
        agent_share: Decimal,
        payment_status: PaymentStatus,
    ) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (invoice_id, seq, appointment_id, agent_share, payment_status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING invoice_id, seq, appointment_id, agent_share, payment_status, created_at, updated_at
            "#,
        )
        .bind(invoice_id)
        .bind(seq)
        .bind(appointment_id)
        .bind(agent_share)
        .bind(payment_status)
        .fetch_one(executor)
        .await?;

        Ok(invoice)
    }

    /// Atualiza somente a fatura mais recente do projeto.
    pub async fn update_latest_invoice_status<'e, E>(
        &self,
        executor: E,
        appointment_id: &str,
        payment_status: PaymentStatus,
    ) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices SET payment_status = $2, updated_at = NOW()
            WHERE invoice_id = (
                SELECT invoice_id FROM invoices
                WHERE appointment_id = $1
                ORDER BY seq DESC
                LIMIT 1
            )
            RETURNING invoice_id, seq, appointment_id, agent_share, payment_status, created_at, updated_at
            "#,
        )
        .bind(appointment_id)
        .bind(payment_status)
        .fetch_optional(executor)
        .await?;

        Ok(invoice)
    }

    pub async fn latest_invoice<'e, E>(&self, executor: E, appointment_id: &str) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, seq, appointment_id, agent_share, payment_status, created_at, updated_at
            FROM invoices
            WHERE appointment_id = $1
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(appointment_id)
        .fetch_optional(executor)
        .await?;

        Ok(invoice)
    }

    pub async fn list_invoices(&self, appointment_id: &str) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, seq, appointment_id, agent_share, payment_status, created_at, updated_at
            FROM invoices
            WHERE appointment_id = $1
            ORDER BY seq DESC
            "#,
        )
        .bind(appointment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    // =========================================================================
    //  VISÃO DE PAGAMENTOS
    // =========================================================================

    /// `due` é sempre recalculado aqui, mesmo estando gravado na tabela.
    /// Dados bancários só aparecem para admin/superadmin.
    pub async fn list_payments(&self, identity: &Identity) -> Result<Vec<PaymentView>, AppError> {
        let include_bank = identity.is_admin_or_above();
        let scope = match identity.role {
            Role::Agent => "p.agent_id = $1",
            Role::Admin => "p.admin_id = $1",
            Role::Superadmin => "$1::uuid IS NOT NULL",
        };

        let sql = format!(
            r#"
            SELECT
                p.appointment_id, p.lead_id, p.client_name, p.project_value, p.commission,
                p.agent_id, a.agent_name, p.admin_id,
                p.agent_share, p.agent_paid,
                GREATEST(p.agent_share - p.agent_paid, 0) AS due,
                p.payment_status,
                CASE WHEN $2 THEN b.holder_name END AS holder_name,
                CASE WHEN $2 THEN b.bank_name END AS bank_name,
                CASE WHEN $2 THEN b.account_number END AS account_number,
                CASE WHEN $2 THEN b.ifsc_code END AS ifsc_code,
                CASE WHEN $2 THEN b.upi_id END AS upi_id,
                CASE WHEN $2 THEN b.qr_code_ref END AS qr_code_ref,
                p.created_at
            FROM projects p
            LEFT JOIN agents a ON a.agent_id = p.agent_id
            LEFT JOIN agent_bank_details b ON b.agent_id = p.agent_id
            WHERE {scope}
            ORDER BY p.created_at DESC
            "#
        );

        let payments = sqlx::query_as::<_, PaymentView>(&sql)
            .bind(identity.user_id)
            .bind(include_bank)
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }
}
