// src/models/lead.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::project::PaymentStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[schema(example = "C00013")]
    pub lead_id: String,
    pub admin_id: Option<Uuid>,
    #[schema(example = "Anita Sharma")]
    pub name: String,
    #[schema(example = "+91 98765 43210")]
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub lead_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Campos de contato usados tanto na criação quanto na recriação de um lead.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadContact {
    #[validate(length(min = 1, message = "Client name is required."))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid e-mail."))]
    pub email: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

/// Lead com o projeto mais recente (se houver).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadWithLatestProject {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub lead: Lead,
    pub appointment_id: Option<String>,
    pub agent_id: Option<Uuid>,
    pub project_value: Option<Decimal>,
    pub payment_status: Option<PaymentStatus>,
    pub project_created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadResponse {
    pub lead_id: String,
}
