// src/services/payment_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::{
        db_utils::{next_display_id, DisplayIdKind},
        error::AppError,
    },
    db::{PaymentRepository, ProjectRepository},
    models::{
        auth::Identity,
        payment::{EffectivePaymentStatus, Invoice, PaymentView, SetAgentShareResponse},
        project::{compute_agent_due, round_to_cents, PaymentStatus},
    },
    services::project_service::{require_access, require_owning_admin},
};

#[derive(Clone)]
pub struct PaymentService {
    repo: PaymentRepository,
    project_repo: ProjectRepository,
    pool: PgPool,
}

impl PaymentService {
    pub fn new(repo: PaymentRepository, project_repo: ProjectRepository, pool: PgPool) -> Self {
        Self { repo, project_repo, pool }
    }

    /// Define o agent_share, recalcula o due e SEMPRE anexa uma fatura nova.
    pub async fn set_agent_share(
        &self,
        caller: &Identity,
        appointment_id: &str,
        new_share: Decimal,
        new_status: Option<PaymentStatus>,
    ) -> Result<SetAgentShareResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let project = self.project_repo
            .lock_by_id(&mut *tx, appointment_id)
            .await?
            .ok_or(AppError::NotFound("Project"))?;
        require_owning_admin(caller, &project)?;

        let new_share = round_to_cents(new_share);
        let status = new_status.unwrap_or(project.payment_status);
        let due = compute_agent_due(new_share, project.agent_paid);

        let updated = self.project_repo
            .update_financials(&mut *tx, appointment_id, new_share, project.agent_paid, due, status)
            .await?;

        let (seq, invoice_id) = next_display_id(&mut *tx, DisplayIdKind::Invoice).await?;
        let invoice = self.repo
            .append_invoice(&mut *tx, &invoice_id, seq, appointment_id, updated.agent_share, updated.payment_status)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "🧾 Fatura {} para {}: share {} ({:?})",
            invoice.invoice_id, appointment_id, invoice.agent_share, invoice.payment_status
        );

        Ok(SetAgentShareResponse {
            invoice_id: invoice.invoice_id,
            agent_share: updated.agent_share,
            agent_due: updated.agent_due,
        })
    }

    /// Registra quanto já foi pago ao agente. O `admin_id` é relido (com lock)
    /// antes da escrita.
    pub async fn record_agent_paid(
        &self,
        caller: &Identity,
        appointment_id: &str,
        new_paid: Decimal,
        new_status: PaymentStatus,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let project = self.project_repo
            .lock_by_id(&mut *tx, appointment_id)
            .await?
            .ok_or(AppError::NotFound("Project"))?;
        require_owning_admin(caller, &project)?;

        let new_paid = round_to_cents(new_paid);
        let due = compute_agent_due(project.agent_share, new_paid);
        self.project_repo
            .update_financials(&mut *tx, appointment_id, project.agent_share, new_paid, due, new_status)
            .await?;

        tx.commit().await?;

        tracing::info!("💸 Projeto {}: pago {}, devido {} ({:?})", appointment_id, new_paid, due, new_status);
        Ok(())
    }

    /// Atualiza o status da fatura mais recente. Não toca no status do projeto.
    pub async fn update_invoice_status(
        &self,
        caller: &Identity,
        appointment_id: &str,
        new_status: PaymentStatus,
    ) -> Result<Invoice, AppError> {
        let mut tx = self.pool.begin().await?;

        let project = self.project_repo
            .lock_by_id(&mut *tx, appointment_id)
            .await?
            .ok_or(AppError::NotFound("Project"))?;
        require_owning_admin(caller, &project)?;

        let invoice = self.repo
            .update_latest_invoice_status(&mut *tx, appointment_id, new_status)
            .await?
            .ok_or(AppError::NotFound("Invoice"))?;

        tx.commit().await?;
        Ok(invoice)
    }

    pub async fn list_invoices(&self, caller: &Identity, appointment_id: &str) -> Result<Vec<Invoice>, AppError> {
        let project = self.project_repo
            .find_by_id(&self.pool, appointment_id)
            .await?
            .ok_or(AppError::NotFound("Project"))?;
        require_access(caller, &project)?;

        self.repo.list_invoices(appointment_id).await
    }

    /// O status do projeto é o vigente; a fatura mais recente vem junto para
    /// deixar visível quando os dois divergem.
    pub async fn effective_payment_status(
        &self,
        caller: &Identity,
        appointment_id: &str,
    ) -> Result<EffectivePaymentStatus, AppError> {
        let project = self.project_repo
            .find_by_id(&self.pool, appointment_id)
            .await?
            .ok_or(AppError::NotFound("Project"))?;
        require_access(caller, &project)?;

        let latest = self.repo.latest_invoice(&self.pool, appointment_id).await?;
        Ok(EffectivePaymentStatus::new(project.appointment_id, project.payment_status, latest.as_ref()))
    }

    pub async fn list_payments(&self, caller: &Identity) -> Result<Vec<PaymentView>, AppError> {
        self.repo.list_payments(caller).await
    }
}
