// src/services/lead_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{next_display_id, DisplayIdKind},
        error::AppError,
    },
    db::LeadRepository,
    models::{
        auth::{Identity, Role},
        lead::{Lead, LeadContact, LeadWithLatestProject},
    },
    services::agent_service::AgentService,
};

#[derive(Clone)]
pub struct LeadService {
    repo: LeadRepository,
    agent_service: AgentService,
    pool: PgPool,
}

impl LeadService {
    pub fn new(repo: LeadRepository, agent_service: AgentService, pool: PgPool) -> Self {
        Self { repo, agent_service, pool }
    }

    /// Admin dono dos leads criados por `caller`.
    pub async fn owner_admin_for(&self, conn: &mut PgConnection, caller: &Identity) -> Result<Option<Uuid>, AppError> {
        match caller.role {
            Role::Admin => Ok(Some(caller.user_id)),
            Role::Superadmin => Ok(None),
            Role::Agent => self.agent_service.resolve_owning_admin(&mut *conn, caller.user_id).await,
        }
    }

    pub async fn create_lead(&self, caller: &Identity, contact: &LeadContact) -> Result<Lead, AppError> {
        let mut tx = self.pool.begin().await?;

        let owner = self.owner_admin_for(&mut *tx, caller).await?;
        let lead = self.insert_new_lead(&mut *tx, owner, contact).await?;

        tx.commit().await?;

        tracing::info!("📇 Lead {} criado", lead.lead_id);
        Ok(lead)
    }

    /// Aloca o próximo ID e insere, na conexão (transação) recebida.
    pub async fn insert_new_lead(
        &self,
        conn: &mut PgConnection,
        owner_admin_id: Option<Uuid>,
        contact: &LeadContact,
    ) -> Result<Lead, AppError> {
        let (_, lead_id) = next_display_id(&mut *conn, DisplayIdKind::Lead).await?;
        self.repo.insert_lead(&mut *conn, &lead_id, owner_admin_id, contact).await
    }

    /// Lead explícito, ou o primeiro lead com o mesmo telefone.
    /// Fora do superadmin, só vale lead do admin dono (`owner_admin_id`): id
    /// alheio é 403, telefone alheio é ignorado e um lead novo será criado.
    pub async fn find_reusable(
        &self,
        conn: &mut PgConnection,
        caller: &Identity,
        owner_admin_id: Option<Uuid>,
        lead_id: Option<&str>,
        contact: &LeadContact,
    ) -> Result<Option<Lead>, AppError> {
        let unrestricted = caller.role == Role::Superadmin;

        if let Some(lead_id) = lead_id {
            let lead = self.repo
                .find_by_id(&mut *conn, lead_id)
                .await?
                .ok_or(AppError::NotFound("Lead"))?;

            if !unrestricted {
                let owned = match owner_admin_id {
                    Some(admin_id) => self.repo.is_owned_by(&mut *conn, lead_id, admin_id).await?,
                    None => false,
                };
                if !owned {
                    return Err(AppError::forbidden(format!("No access to lead {lead_id}.")));
                }
            }
            return Ok(Some(lead));
        }

        let Some(phone) = contact.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) else {
            return Ok(None);
        };

        match (unrestricted, owner_admin_id) {
            (true, _) => self.repo.find_by_phone(&mut *conn, phone, None).await,
            (false, Some(admin_id)) => self.repo.find_by_phone(&mut *conn, phone, Some(admin_id)).await,
            (false, None) => Ok(None),
        }
    }

    /// Garante que o lead exista; recria a partir de `fallback` se faltar.
    /// Retorna `true` quando precisou criar.
    pub async fn ensure_lead(
        &self,
        conn: &mut PgConnection,
        lead_id: &str,
        owner_admin_id: Option<Uuid>,
        fallback: &LeadContact,
    ) -> Result<bool, AppError> {
        let created = self.repo
            .insert_lead_if_missing(&mut *conn, lead_id, owner_admin_id, fallback)
            .await?;

        if created {
            tracing::info!("🩹 Lead {} recriado a partir do projeto", lead_id);
        }
        Ok(created)
    }

    pub async fn get_lead(&self, caller: &Identity, lead_id: &str) -> Result<Lead, AppError> {
        let lead = self.repo
            .find_by_id(&self.pool, lead_id)
            .await?
            .ok_or(AppError::NotFound("Lead"))?;

        if caller.role != Role::Superadmin && !self.repo.is_visible_to(lead_id, caller.user_id).await? {
            return Err(AppError::forbidden(format!("No access to lead {lead_id}.")));
        }
        Ok(lead)
    }

    pub async fn list_leads(
        &self,
        caller: &Identity,
        agent_filter: Option<Uuid>,
    ) -> Result<Vec<LeadWithLatestProject>, AppError> {
        let (admin_scope, agent_scope) = match caller.role {
            Role::Superadmin => (None, agent_filter),
            Role::Admin => (Some(caller.user_id), agent_filter),
            Role::Agent => {
                if agent_filter.is_some_and(|id| id != caller.user_id) {
                    return Err(AppError::forbidden("Agents can only list their own leads."));
                }
                (None, Some(caller.user_id))
            }
        };

        self.repo.list_with_latest_project(admin_scope, agent_scope).await
    }
}
