// src/services/project_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{next_display_id, DisplayIdKind},
        error::AppError,
    },
    db::{project_repo::DerivedFields, ProjectRepository},
    models::{
        auth::{Identity, Role},
        lead::LeadContact,
        project::{
            compute_agent_due, compute_agent_share, round_to_cents, OpenProjectPayload, OpenProjectResponse,
            Project, ProjectPatch, Remark, MONEY_LIMIT,
        },
    },
    services::{agent_service::AgentService, lead_service::LeadService},
};

/// Como o chamador se relaciona com um projeto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAccess {
    /// O agente atribuído: mexe no pipeline, não nos termos comerciais.
    Agent,
    /// O admin dono (ou um superadmin): acesso total.
    Admin,
}

/// `None` = sem acesso. Decidido pelo papel do token, não por tabela.
pub fn project_access(caller: &Identity, agent_id: Option<Uuid>, admin_id: Option<Uuid>) -> Option<ProjectAccess> {
    match caller.role {
        Role::Superadmin => Some(ProjectAccess::Admin),
        Role::Admin if admin_id == Some(caller.user_id) => Some(ProjectAccess::Admin),
        Role::Agent if agent_id == Some(caller.user_id) => Some(ProjectAccess::Agent),
        _ => None,
    }
}

fn agent_share_for(project_value: Decimal, commission: Decimal) -> Result<Decimal, AppError> {
    if project_value >= MONEY_LIMIT {
        return Err(AppError::bad_request("Project value must be below 1000000000000."));
    }
    compute_agent_share(project_value, commission)
        .ok_or_else(|| AppError::bad_request("Project value and commission are out of range."))
}

pub(crate) fn require_access(caller: &Identity, project: &Project) -> Result<ProjectAccess, AppError> {
    project_access(caller, project.agent_id, project.admin_id).ok_or_else(|| {
        AppError::forbidden(format!("No access to appointment {}.", project.appointment_id))
    })
}

pub(crate) fn require_owning_admin(caller: &Identity, project: &Project) -> Result<(), AppError> {
    match require_access(caller, project)? {
        ProjectAccess::Admin => Ok(()),
        ProjectAccess::Agent => Err(AppError::forbidden(format!(
            "Only the owning admin can change appointment {}.",
            project.appointment_id
        ))),
    }
}

#[derive(Clone)]
pub struct ProjectService {
    repo: ProjectRepository,
    lead_service: LeadService,
    agent_service: AgentService,
    pool: PgPool,
}

impl ProjectService {
    pub fn new(repo: ProjectRepository, lead_service: LeadService, agent_service: AgentService, pool: PgPool) -> Self {
        Self { repo, lead_service, agent_service, pool }
    }

    /// Abre um projeto (e, se preciso, o lead) numa única transação.
    pub async fn open_project(&self, caller: &Identity, input: &OpenProjectPayload) -> Result<OpenProjectResponse, AppError> {
        let agent_id = match caller.role {
            Role::Agent => {
                if input.agent_id.is_some_and(|id| id != caller.user_id) {
                    return Err(AppError::forbidden("Agents can only open projects for themselves."));
                }
                Some(caller.user_id)
            }
            Role::Admin | Role::Superadmin => input.agent_id,
        };

        let mut tx = self.pool.begin().await?;

        // 1. Admin dono: via agente, ou o próprio admin quando não há agente
        let resolved_admin = match agent_id {
            Some(agent_id) => self.agent_service.resolve_owning_admin(&mut *tx, agent_id).await?,
            None => None,
        };
        if caller.role == Role::Admin && agent_id.is_some() && resolved_admin != Some(caller.user_id) {
            return Err(AppError::forbidden("That agent is supervised by another admin."));
        }
        let admin_id = resolved_admin.or((caller.role == Role::Admin).then_some(caller.user_id));

        // 2. Lead: reaproveita (só se for do mesmo admin) ou cria
        let (lead_id, lead_created) = match self.lead_service
            .find_reusable(&mut *tx, caller, admin_id, input.lead_id.as_deref(), &input.client)
            .await?
        {
            Some(lead) => (lead.lead_id, false),
            None => {
                let lead = self.lead_service.insert_new_lead(&mut *tx, admin_id, &input.client).await?;
                (lead.lead_id, true)
            }
        };

        // 3. Projeto, já com o agent_share calculado sobre os valores na escala do banco
        let terms = &input.terms;
        let project_value = round_to_cents(terms.project_value);
        let commission = round_to_cents(terms.commission);
        let agent_share = agent_share_for(project_value, commission)?;
        let (_, appointment_id) = next_display_id(&mut *tx, DisplayIdKind::Appointment).await?;

        let project = self.repo
            .insert_project(
                &mut *tx,
                &appointment_id,
                &lead_id,
                agent_id,
                admin_id,
                &input.client,
                terms.location.as_deref(),
                project_value,
                commission,
                agent_share,
                terms.property_type.as_deref(),
                terms.details.as_deref(),
            )
            .await?;

        // Se algo acima falhou, o `?` descarta `tx` e o Drop faz o rollback.
        tx.commit().await?;

        tracing::info!(
            "📐 Projeto {} aberto para o lead {} (novo lead: {}, share: {})",
            project.appointment_id, lead_id, lead_created, project.agent_share
        );

        Ok(OpenProjectResponse {
            lead_id,
            appointment_id: project.appointment_id,
            lead_created,
        })
    }

    pub async fn update_project(
        &self,
        caller: &Identity,
        appointment_id: &str,
        patch: &ProjectPatch,
    ) -> Result<Project, AppError> {
        if patch.is_empty() {
            return Err(AppError::bad_request("No updatable fields supplied."));
        }
        let patch = &patch.normalized();

        let mut tx = self.pool.begin().await?;

        let current = self.repo
            .lock_by_id(&mut *tx, appointment_id)
            .await?
            .ok_or(AppError::NotFound("Project"))?;

        let access = require_access(caller, &current)?;
        if patch.touches_commercial_terms() && access != ProjectAccess::Admin {
            return Err(AppError::forbidden("Commercial terms can only be changed by the owning admin."));
        }

        let mut derived = DerivedFields::default();

        // agent_share e agent_due acompanham valor/comissão no mesmo UPDATE
        if patch.touches_share() {
            let value = patch.project_value.unwrap_or(current.project_value);
            let commission = patch.commission.unwrap_or(current.commission);
            let share = agent_share_for(value, commission)?;
            derived.agent_share = Some(share);
            derived.agent_due = Some(compute_agent_due(share, current.agent_paid));
        }

        if let Some(new_agent) = patch.agent_id.filter(|id| Some(*id) != current.agent_id) {
            let agent_admin = self.agent_service.resolve_owning_admin(&mut *tx, new_agent).await?;
            if caller.role == Role::Admin && agent_admin != Some(caller.user_id) {
                return Err(AppError::forbidden("That agent is supervised by another admin."));
            }
            if current.admin_id.is_none() {
                derived.admin_id = agent_admin;
            }
        }

        let updated = self.repo.apply_patch(&mut *tx, appointment_id, patch, derived).await?;

        // Atribuição de agente: o lead referenciado precisa existir
        if patch.agent_id.is_some() {
            let fallback = LeadContact {
                name: updated.client_name.clone(),
                phone: updated.client_phone.clone(),
                ..Default::default()
            };
            self.lead_service
                .ensure_lead(&mut *tx, &updated.lead_id, updated.admin_id, &fallback)
                .await?;
        }

        tx.commit().await?;

        tracing::info!("✏️ Projeto {} atualizado por {}", appointment_id, caller.user_id);
        Ok(updated)
    }

    pub async fn get_project(&self, caller: &Identity, appointment_id: &str) -> Result<Project, AppError> {
        let project = self.find_project(appointment_id).await?;
        require_access(caller, &project)?;
        Ok(project)
    }

    pub async fn list_projects(&self, caller: &Identity) -> Result<Vec<Project>, AppError> {
        self.repo.list_for(caller).await
    }

    // =========================================================================
    //  OBSERVAÇÕES
    // =========================================================================

    pub async fn add_remark(&self, caller: &Identity, appointment_id: &str, text: &str) -> Result<Remark, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::bad_request("Remark must not be blank."));
        }

        let project = self.find_project(appointment_id).await?;
        require_access(caller, &project)?;

        self.repo.insert_remark(appointment_id, caller.user_id, text).await
    }

    pub async fn list_remarks(&self, caller: &Identity, appointment_id: &str) -> Result<Vec<Remark>, AppError> {
        let project = self.find_project(appointment_id).await?;
        require_access(caller, &project)?;

        self.repo.list_remarks(appointment_id).await
    }

    async fn find_project(&self, appointment_id: &str) -> Result<Project, AppError> {
        self.repo
            .find_by_id(&self.pool, appointment_id)
            .await?
            .ok_or(AppError::NotFound("Project"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity { user_id: Uuid::new_v4(), role }
    }

    #[test]
    fn owning_agent_and_admin_have_access() {
        let agent = identity(Role::Agent);
        let admin = identity(Role::Admin);

        assert_eq!(
            project_access(&agent, Some(agent.user_id), Some(admin.user_id)),
            Some(ProjectAccess::Agent)
        );
        assert_eq!(
            project_access(&admin, Some(agent.user_id), Some(admin.user_id)),
            Some(ProjectAccess::Admin)
        );
    }

    #[test]
    fn foreign_agent_and_admin_are_refused() {
        let owner_agent = identity(Role::Agent);
        let owner_admin = identity(Role::Admin);
        let other_agent = identity(Role::Agent);
        let other_admin = identity(Role::Admin);

        assert_eq!(project_access(&other_agent, Some(owner_agent.user_id), Some(owner_admin.user_id)), None);
        assert_eq!(project_access(&other_admin, Some(owner_agent.user_id), Some(owner_admin.user_id)), None);
    }

    #[test]
    fn role_in_token_decides_even_if_ids_collide() {
        // Mesmo UUID como agent_id e admin_id: o papel do token decide.
        let id = Uuid::new_v4();
        let as_admin = Identity { user_id: id, role: Role::Admin };
        let as_agent = Identity { user_id: id, role: Role::Agent };

        assert_eq!(project_access(&as_admin, Some(id), Some(id)), Some(ProjectAccess::Admin));
        assert_eq!(project_access(&as_agent, Some(id), Some(id)), Some(ProjectAccess::Agent));
    }

    #[test]
    fn superadmin_acts_as_owner_everywhere() {
        let root = identity(Role::Superadmin);
        assert_eq!(project_access(&root, None, None), Some(ProjectAccess::Admin));
    }

    #[test]
    fn unassigned_project_is_admin_only() {
        let agent = identity(Role::Agent);
        assert_eq!(project_access(&agent, None, Some(Uuid::new_v4())), None);
    }
}
