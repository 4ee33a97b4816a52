// src/services/agent_service.rs

use chrono::{DateTime, Months, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AgentRepository, UserRepository},
    models::{
        agent::{Agent, AgentSummary, BankDetails, UpsertBankDetailsPayload},
        auth::{Identity, Role},
    },
};

/// Janela que define um agente "ativo".
const ACTIVE_WINDOW_MONTHS: u32 = 3;

/// Início da janela de atividade: `now` menos 3 meses de calendário.
pub fn active_since(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(ACTIVE_WINDOW_MONTHS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[derive(Clone)]
pub struct AgentService {
    repo: AgentRepository,
    user_repo: UserRepository,
}

impl AgentService {
    pub fn new(repo: AgentRepository, user_repo: UserRepository) -> Self {
        Self { repo, user_repo }
    }

    /// Ponto único para descobrir o admin responsável por um agente.
    pub async fn resolve_owning_admin<'e, E>(&self, executor: E, agent_id: Uuid) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agent = self.repo
            .find_by_id(executor, agent_id)
            .await?
            .ok_or(AppError::NotFound("Agent"))?;

        Ok(agent.admin_id)
    }

    pub async fn list_agents(&self, caller: &Identity) -> Result<Vec<AgentSummary>, AppError> {
        let scope = match caller.role {
            Role::Superadmin => None,
            Role::Admin => Some(caller.user_id),
            Role::Agent => return Err(AppError::forbidden("Agents cannot list other agents.")),
        };

        self.repo.list_agents(scope, active_since(Utc::now())).await
    }

    pub async fn reassign_admin(&self, caller: &Identity, agent_id: Uuid, admin_id: Uuid) -> Result<Agent, AppError> {
        if caller.role != Role::Superadmin {
            return Err(AppError::forbidden("Only a superadmin can reassign agents."));
        }

        if self.user_repo.find_role(admin_id).await? != Some(Role::Admin) {
            return Err(AppError::bad_request("Target user is not an admin."));
        }

        let agent = self.repo
            .reassign_admin(agent_id, admin_id)
            .await?
            .ok_or(AppError::NotFound("Agent"))?;

        tracing::info!("🔁 Agente {} agora supervisionado por {}", agent_id, admin_id);
        Ok(agent)
    }

    pub async fn get_bank_details(&self, caller: &Identity) -> Result<BankDetails, AppError> {
        ensure_agent(caller)?;
        self.repo
            .get_bank_details(caller.user_id)
            .await?
            .ok_or(AppError::NotFound("Bank details"))
    }

    pub async fn upsert_bank_details(
        &self,
        caller: &Identity,
        input: &UpsertBankDetailsPayload,
    ) -> Result<BankDetails, AppError> {
        ensure_agent(caller)?;
        self.repo.upsert_bank_details(caller.user_id, input).await
    }
}

fn ensure_agent(caller: &Identity) -> Result<(), AppError> {
    if caller.is_agent() {
        Ok(())
    } else {
        Err(AppError::forbidden("Only agents have bank details."))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn active_window_is_three_calendar_months() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        assert_eq!(active_since(now), Utc.with_ymd_and_hms(2026, 7, 16, 12, 0, 0).unwrap());
    }

    #[test]
    fn active_window_clamps_to_month_end() {
        let now = Utc.with_ymd_and_hms(2026, 5, 31, 0, 0, 0).unwrap();
        assert_eq!(active_since(now), Utc.with_ymd_and_hms(2026, 2, 28, 0, 0, 0).unwrap());
    }
}
