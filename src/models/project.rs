// src/models/project.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::lead::LeadContact;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status")]
pub enum PaymentStatus {
    Due,
    Partial,
    Paid,
}

// --- Regras de negócio ---

/// Teto das colunas NUMERIC(14,2): valores precisam ficar abaixo de 10^12.
pub const MONEY_LIMIT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Arredonda para a escala gravada no banco (centavos), meio para longe do zero.
pub fn round_to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `agent_share = round(project_value * commission / 100)`, em unidades inteiras de moeda.
/// `None` quando a conta estoura o `Decimal`.
pub fn compute_agent_share(project_value: Decimal, commission: Decimal) -> Option<Decimal> {
    project_value
        .checked_mul(commission)?
        .checked_div(Decimal::ONE_HUNDRED)
        .map(|share| share.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
}

/// `agent_due = max(agent_share - agent_paid, 0)`
pub fn compute_agent_due(agent_share: Decimal, agent_paid: Decimal) -> Decimal {
    (agent_share - agent_paid).max(Decimal::ZERO)
}

// Os validadores olham o valor já arredondado, que é o que vai para o banco.
pub fn validate_percentage(value: &Decimal) -> Result<(), ValidationError> {
    let value = round_to_cents(*value);
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new("range").with_message("Must be between 0 and 100.".into()));
    }
    Ok(())
}

pub fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    let value = round_to_cents(*value);
    if value < Decimal::ZERO {
        return Err(ValidationError::new("range").with_message("Must not be negative.".into()));
    }
    if value >= MONEY_LIMIT {
        return Err(ValidationError::new("range").with_message("Must be below 1000000000000.".into()));
    }
    Ok(())
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Must not be blank.".into()));
    }
    Ok(())
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[schema(example = "AP00002")]
    pub appointment_id: String,
    #[schema(example = "C00013")]
    pub lead_id: String,
    pub agent_id: Option<Uuid>,
    pub admin_id: Option<Uuid>,

    pub client_name: String,
    pub client_phone: Option<String>,
    pub location: Option<String>,

    // Termos comerciais
    #[schema(example = "1000000")]
    pub project_value: Decimal,
    #[schema(example = "10")]
    pub commission: Decimal,
    pub agent_share: Decimal,
    pub agent_paid: Decimal,
    pub agent_due: Decimal,
    pub payment_status: PaymentStatus,

    pub property_type: Option<String>,
    pub details: Option<String>,

    // Pipeline: cold call -> visita -> reserva
    pub cold_call_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, example = "10:30:00")]
    pub cold_call_time: Option<NaiveTime>,
    pub cold_call_status: Option<String>,
    pub site_visit_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub site_visit_time: Option<NaiveTime>,
    pub site_visit_status: Option<String>,
    pub booking_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub booking_time: Option<NaiveTime>,
    pub booking_status: Option<String>,
    pub booking_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Termos comerciais informados na abertura do projeto.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommercialTerms {
    #[validate(custom(function = "validate_money"))]
    pub project_value: Decimal,
    #[validate(custom(function = "validate_percentage"))]
    pub commission: Decimal,
    pub location: Option<String>,
    pub property_type: Option<String>,
    pub details: Option<String>,
}

/// Payload do `POST /lead`: cria (ou reaproveita) o lead e abre o projeto.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenProjectPayload {
    /// Lead existente; se ausente, procuramos pelo telefone ou criamos um novo.
    pub lead_id: Option<String>,
    #[validate(nested)]
    pub client: LeadContact,
    pub agent_id: Option<Uuid>,
    #[validate(nested)]
    pub terms: CommercialTerms,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenProjectResponse {
    pub lead_id: String,
    pub appointment_id: String,
    pub lead_created: bool,
}

/// Atualização parcial: só os campos presentes são gravados.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub agent_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub location: Option<String>,
    #[validate(custom(function = "validate_money"))]
    pub project_value: Option<Decimal>,
    #[validate(custom(function = "validate_percentage"))]
    pub commission: Option<Decimal>,
    pub property_type: Option<String>,
    pub details: Option<String>,

    pub cold_call_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub cold_call_time: Option<NaiveTime>,
    pub cold_call_status: Option<String>,
    pub site_visit_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub site_visit_time: Option<NaiveTime>,
    pub site_visit_status: Option<String>,
    pub booking_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub booking_time: Option<NaiveTime>,
    pub booking_status: Option<String>,
    pub booking_id: Option<String>,
}

impl ProjectPatch {
    /// Campos que só o admin dono do projeto pode alterar.
    pub fn touches_commercial_terms(&self) -> bool {
        self.agent_id.is_some() || self.project_value.is_some() || self.commission.is_some()
    }

    pub fn touches_share(&self) -> bool {
        self.project_value.is_some() || self.commission.is_some()
    }

    /// Cópia com valor e comissão na escala do banco.
    pub fn normalized(&self) -> Self {
        Self {
            project_value: self.project_value.map(round_to_cents),
            commission: self.commission.map(round_to_cents),
            ..self.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.agent_id.is_none()
            && self.client_name.is_none()
            && self.client_phone.is_none()
            && self.location.is_none()
            && self.project_value.is_none()
            && self.commission.is_none()
            && self.property_type.is_none()
            && self.details.is_none()
            && self.cold_call_date.is_none()
            && self.cold_call_time.is_none()
            && self.cold_call_status.is_none()
            && self.site_visit_date.is_none()
            && self.site_visit_time.is_none()
            && self.site_visit_status.is_none()
            && self.booking_date.is_none()
            && self.booking_time.is_none()
            && self.booking_status.is_none()
            && self.booking_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Remark {
    pub remark_id: i64,
    pub appointment_id: String,
    pub author_id: Uuid,
    pub remark: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddRemarkPayload {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 2000, message = "Remark must have at most 2000 characters.")
    )]
    pub remark: String,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn share_is_value_times_commission_percent() {
        assert_eq!(compute_agent_share(dec("1000000"), dec("10")), Some(dec("100000")));
        assert_eq!(compute_agent_share(dec("250000"), dec("2.5")), Some(dec("6250")));
        assert_eq!(compute_agent_share(dec("999"), dec("0")), Some(Decimal::ZERO));
    }

    #[test]
    fn share_rounds_half_away_from_zero() {
        // 1001 * 5% = 50.05 -> 50
        assert_eq!(compute_agent_share(dec("1001"), dec("5")), Some(dec("50")));
        // 1010 * 5% = 50.5 -> 51
        assert_eq!(compute_agent_share(dec("1010"), dec("5")), Some(dec("51")));
    }

    #[test]
    fn share_overflow_is_reported_not_panicked() {
        assert_eq!(compute_agent_share(Decimal::MAX, dec("100")), None);
        assert!(compute_agent_share(dec("999999999999.99"), dec("100")).is_some());
    }

    #[test]
    fn money_is_rounded_to_cents_half_away_from_zero() {
        assert_eq!(round_to_cents(dec("12.345")), dec("12.35"));
        assert_eq!(round_to_cents(dec("12.344")), dec("12.34"));
        assert_eq!(round_to_cents(dec("1000000")), dec("1000000"));
    }

    #[test]
    fn money_must_fit_the_column() {
        assert_eq!(MONEY_LIMIT, Decimal::from(1_000_000_000_000i64));
        assert!(validate_money(&dec("0")).is_ok());
        assert!(validate_money(&dec("999999999999.99")).is_ok());
        // arredonda para 10^12
        assert!(validate_money(&dec("999999999999.995")).is_err());
        assert!(validate_money(&Decimal::from_scientific("1e27").unwrap()).is_err());
        assert!(validate_money(&dec("-0.01")).is_err());
    }

    #[test]
    fn normalized_patch_matches_stored_scale() {
        let patch = ProjectPatch {
            project_value: Some(dec("1000.005")),
            commission: Some(dec("12.345")),
            location: Some("Pune".into()),
            ..Default::default()
        };
        let normalized = patch.normalized();
        assert_eq!(normalized.project_value, Some(dec("1000.01")));
        assert_eq!(normalized.commission, Some(dec("12.35")));
        assert_eq!(normalized.location.as_deref(), Some("Pune"));
    }

    #[test]
    fn blank_remarks_fail_validation() {
        let blank = AddRemarkPayload { remark: "   \n\t".into() };
        assert!(blank.validate().is_err());

        let ok = AddRemarkPayload { remark: "  called back  ".into() };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn due_never_goes_negative() {
        assert_eq!(compute_agent_due(dec("100000"), dec("40000")), dec("60000"));
        assert_eq!(compute_agent_due(dec("100000"), dec("100000")), Decimal::ZERO);
        assert_eq!(compute_agent_due(dec("100000"), dec("120000")), Decimal::ZERO);
    }

    #[test]
    fn percentage_bounds() {
        assert!(validate_percentage(&dec("0")).is_ok());
        assert!(validate_percentage(&dec("100")).is_ok());
        assert!(validate_percentage(&dec("100.01")).is_err());
        assert!(validate_percentage(&dec("-1")).is_err());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ProjectPatch::default().is_empty());

        let patch = ProjectPatch {
            site_visit_status: Some("Scheduled".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert!(!patch.touches_commercial_terms());
    }

    #[test]
    fn commission_change_touches_share() {
        let patch = ProjectPatch {
            commission: Some(dec("12")),
            ..Default::default()
        };
        assert!(patch.touches_share());
        assert!(patch.touches_commercial_terms());
    }

    #[test]
    fn patch_validation_rejects_out_of_range_commission() {
        let patch = ProjectPatch {
            commission: Some(dec("140")),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn payment_status_uses_plain_names_in_json() {
        assert_eq!(serde_json::to_string(&PaymentStatus::Partial).unwrap(), "\"Partial\"");
        let status: PaymentStatus = serde_json::from_str("\"Paid\"").unwrap();
        assert_eq!(status, PaymentStatus::Paid);
    }
}
