// src/models/proof.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const PROOF_DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Clone, FromRow)]
pub struct TransactionProof {
    pub t_id: i64,
    pub appointment_id: String,
    pub agent_id: Option<Uuid>,
    pub admin_id: Option<Uuid>,
    pub transaction_proof: String,
    pub date: DateTime<Utc>,
}

/// Formato de saída: a data já vem formatada para exibição.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProofView {
    pub t_id: i64,
    pub appointment_id: String,
    pub agent_id: Option<Uuid>,
    pub admin_id: Option<Uuid>,
    #[schema(example = "proofs/4b1d..._receipt.pdf")]
    pub transaction_proof: String,
    #[schema(example = "16-10-2026")]
    pub date: String,
}

impl From<TransactionProof> for ProofView {
    fn from(p: TransactionProof) -> Self {
        Self {
            t_id: p.t_id,
            appointment_id: p.appointment_id,
            agent_id: p.agent_id,
            admin_id: p.admin_id,
            transaction_proof: p.transaction_proof,
            date: p.date.format(PROOF_DATE_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProofFilterQuery {
    pub agent_id: Option<Uuid>,
    pub appointment_id: Option<String>,
}

/// Filtro de listagem: exatamente um dos dois.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofFilter {
    Agent(Uuid),
    Appointment(String),
}

impl ProofFilterQuery {
    pub fn into_filter(self) -> Option<ProofFilter> {
        match (self.agent_id, self.appointment_id) {
            (Some(agent_id), None) => Some(ProofFilter::Agent(agent_id)),
            (None, Some(appointment_id)) if !appointment_id.is_empty() => {
                Some(ProofFilter::Appointment(appointment_id))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn view_formats_date_for_display() {
        let proof = TransactionProof {
            t_id: 7,
            appointment_id: "AP00003".into(),
            agent_id: None,
            admin_id: None,
            transaction_proof: "proofs/x.png".into(),
            date: Utc.with_ymd_and_hms(2026, 3, 5, 14, 0, 0).unwrap(),
        };

        let view = ProofView::from(proof);
        assert_eq!(view.date, "05-03-2026");
        assert_eq!(view.t_id, 7);
    }

    #[test]
    fn filter_requires_exactly_one_key() {
        let agent = Uuid::new_v4();
        let both = ProofFilterQuery { agent_id: Some(agent), appointment_id: Some("AP00001".into()) };
        let none = ProofFilterQuery { agent_id: None, appointment_id: None };
        let by_agent = ProofFilterQuery { agent_id: Some(agent), appointment_id: None };

        assert_eq!(both.into_filter(), None);
        assert_eq!(none.into_filter(), None);
        assert_eq!(by_agent.into_filter(), Some(ProofFilter::Agent(agent)));
    }
}
