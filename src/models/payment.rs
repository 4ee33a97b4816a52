// src/models/payment.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::project::{validate_money, PaymentStatus};

/// Linha imutável do histórico de repasses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[schema(example = "INV00001")]
    pub invoice_id: String,
    #[serde(skip)]
    pub seq: i64,
    pub appointment_id: String,
    pub agent_share: Decimal,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Visão desnormalizada para as telas de pagamentos.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub appointment_id: String,
    pub lead_id: String,
    pub client_name: String,
    pub project_value: Decimal,
    pub commission: Decimal,
    pub agent_id: Option<Uuid>,
    pub agent_name: Option<String>,
    pub admin_id: Option<Uuid>,
    pub agent_share: Decimal,
    pub agent_paid: Decimal,
    /// Recalculado na leitura: max(share - paid, 0)
    pub due: Decimal,
    pub payment_status: PaymentStatus,

    // Dados bancários (só na visão do admin)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifsc_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_ref: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetAgentSharePayload {
    #[validate(length(min = 1, message = "appointmentId is required."))]
    pub appointment_id: String,
    #[validate(custom(function = "validate_money"))]
    pub agent_share: Decimal,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetAgentShareResponse {
    pub invoice_id: String,
    pub agent_share: Decimal,
    pub agent_due: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordAgentPaidPayload {
    #[validate(length(min = 1, message = "appointmentId is required."))]
    pub appointment_id: String,
    #[validate(custom(function = "validate_money"))]
    pub agent_paid: Decimal,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceStatusPayload {
    #[validate(length(min = 1, message = "appointmentId is required."))]
    pub appointment_id: String,
    pub payment_status: PaymentStatus,
}

/// O status do projeto é o estado atual; o da fatura é histórico.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePaymentStatus {
    pub appointment_id: String,
    pub payment_status: PaymentStatus,
    pub latest_invoice_id: Option<String>,
    pub latest_invoice_status: Option<PaymentStatus>,
    pub in_sync: bool,
}

impl EffectivePaymentStatus {
    pub fn new(appointment_id: String, project_status: PaymentStatus, latest: Option<&Invoice>) -> Self {
        let latest_invoice_status = latest.map(|i| i.payment_status);
        Self {
            appointment_id,
            payment_status: project_status,
            latest_invoice_id: latest.map(|i| i.invoice_id.clone()),
            latest_invoice_status,
            in_sync: latest_invoice_status.is_none_or(|s| s == project_status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(status: PaymentStatus) -> Invoice {
        Invoice {
            invoice_id: "INV00001".into(),
            seq: 1,
            appointment_id: "AP00001".into(),
            agent_share: Decimal::from(100_000),
            payment_status: status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn project_status_wins_and_divergence_is_reported() {
        let latest = invoice(PaymentStatus::Due);
        let status = EffectivePaymentStatus::new("AP00001".into(), PaymentStatus::Partial, Some(&latest));

        assert_eq!(status.payment_status, PaymentStatus::Partial);
        assert_eq!(status.latest_invoice_status, Some(PaymentStatus::Due));
        assert!(!status.in_sync);
    }

    #[test]
    fn no_invoice_counts_as_in_sync() {
        let status = EffectivePaymentStatus::new("AP00001".into(), PaymentStatus::Due, None);
        assert!(status.in_sync);
        assert!(status.latest_invoice_id.is_none());
    }
}
