// src/services/proof_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{ProjectRepository, ProofRepository},
    models::{
        auth::{Identity, Role},
        proof::{ProofFilter, ProofView},
    },
    services::{project_service::require_access, storage::ArtifactStore},
};

const PROOF_FOLDER: &str = "proofs";

/// Dono único do arquivo e da linha de log de cada comprovante.
#[derive(Clone)]
pub struct ProofService {
    repo: ProofRepository,
    project_repo: ProjectRepository,
    store: ArtifactStore,
    pool: PgPool,
}

impl ProofService {
    pub fn new(repo: ProofRepository, project_repo: ProjectRepository, store: ArtifactStore, pool: PgPool) -> Self {
        Self { repo, project_repo, store, pool }
    }

    pub async fn upload_proof(
        &self,
        caller: &Identity,
        appointment_id: &str,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<ProofView, AppError> {
        if bytes.is_empty() {
            return Err(AppError::bad_request("Uploaded file is empty."));
        }

        let project = self.project_repo
            .find_by_id(&self.pool, appointment_id)
            .await?
            .ok_or(AppError::NotFound("Project"))?;
        require_access(caller, &project)?;

        // 1. Arquivo primeiro; 2. linha de log; se (2) falhar, desfaz (1).
        let reference = self.store.save(PROOF_FOLDER, bytes, file_name).await?;

        let inserted = self.repo
            .insert_proof(appointment_id, project.agent_id, project.admin_id, &reference)
            .await;

        match inserted {
            Ok(proof) => {
                tracing::info!("📎 Comprovante {} anexado a {}", proof.t_id, appointment_id);
                Ok(proof.into())
            }
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&reference).await {
                    tracing::error!("Falha ao remover artefato órfão {}: {}", reference, cleanup);
                }
                Err(e)
            }
        }
    }

    pub async fn list_proofs(&self, caller: &Identity, filter: ProofFilter) -> Result<Vec<ProofView>, AppError> {
        match &filter {
            ProofFilter::Appointment(appointment_id) => {
                let project = self.project_repo
                    .find_by_id(&self.pool, appointment_id)
                    .await?
                    .ok_or(AppError::NotFound("Project"))?;
                require_access(caller, &project)?;
            }
            ProofFilter::Agent(agent_id) => {
                if caller.role == Role::Agent && *agent_id != caller.user_id {
                    return Err(AppError::forbidden("Agents can only list their own proofs."));
                }
            }
        }

        let proofs = self.repo.list(&filter).await?;

        // Admin só enxerga os comprovantes dos próprios projetos
        let visible = proofs
            .into_iter()
            .filter(|p| caller.role != Role::Admin || p.admin_id == Some(caller.user_id))
            .map(ProofView::from)
            .collect();

        Ok(visible)
    }

    /// Remove a linha e depois o arquivo.
    pub async fn delete_proof(&self, caller: &Identity, t_id: i64) -> Result<(), AppError> {
        let proof = self.repo
            .find_by_id(t_id)
            .await?
            .ok_or(AppError::NotFound("Proof"))?;

        let project = self.project_repo
            .find_by_id(&self.pool, &proof.appointment_id)
            .await?
            .ok_or(AppError::NotFound("Project"))?;
        require_access(caller, &project)?;

        if !self.repo.delete_proof(t_id).await? {
            return Err(AppError::NotFound("Proof"));
        }

        if let Err(e) = self.store.delete(&proof.transaction_proof).await {
            tracing::error!("Comprovante {} removido, mas o arquivo ficou: {}", t_id, e);
        }

        tracing::info!("🗑️ Comprovante {} removido por {}", t_id, caller.user_id);
        Ok(())
    }
}
