// src/models/agent.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub agent_id: Uuid,
    #[schema(example = "Ravi Kumar")]
    pub agent_name: String,
    pub admin_id: Option<Uuid>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Agente com o status "ativo" calculado na consulta (não é persistido).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub agent: Agent,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub agent_id: Uuid,
    pub holder_name: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    #[schema(example = "HDFC0001234")]
    pub ifsc_code: Option<String>,
    #[schema(example = "ravi@okhdfc")]
    pub upi_id: Option<String>,
    pub qr_code_ref: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertBankDetailsPayload {
    pub holder_name: Option<String>,
    pub bank_name: Option<String>,
    #[validate(length(min = 6, max = 20, message = "Account number must have 6 to 20 characters."))]
    pub account_number: Option<String>,
    #[validate(length(equal = 11, message = "IFSC code must have 11 characters."))]
    pub ifsc_code: Option<String>,
    pub upi_id: Option<String>,
    pub qr_code_ref: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReassignAgentPayload {
    pub admin_id: Uuid,
}
