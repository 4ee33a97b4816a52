// src/db/proof_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::proof::{ProofFilter, TransactionProof},
};

#[derive(Clone)]
pub struct ProofRepository {
    pool: PgPool,
}

impl ProofRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_proof(
        &self,
        appointment_id: &str,
        agent_id: Option<Uuid>,
        admin_id: Option<Uuid>,
        reference: &str,
    ) -> Result<TransactionProof, AppError> {
        let proof = sqlx::query_as::<_, TransactionProof>(
            r#"
            INSERT INTO transaction_proofs (appointment_id, agent_id, admin_id, transaction_proof)
            VALUES ($1, $2, $3, $4)
            RETURNING t_id, appointment_id, agent_id, admin_id, transaction_proof, date
            "#,
        )
        .bind(appointment_id)
        .bind(agent_id)
        .bind(admin_id)
        .bind(reference)
        .fetch_one(&self.pool)
        .await?;

        Ok(proof)
    }

    pub async fn find_by_id(&self, t_id: i64) -> Result<Option<TransactionProof>, AppError> {
        let proof = sqlx::query_as::<_, TransactionProof>(
            "SELECT t_id, appointment_id, agent_id, admin_id, transaction_proof, date FROM transaction_proofs WHERE t_id = $1",
        )
        .bind(t_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(proof)
    }

    pub async fn list(&self, filter: &ProofFilter) -> Result<Vec<TransactionProof>, AppError> {
        let query = match filter {
            ProofFilter::Agent(agent_id) => sqlx::query_as::<_, TransactionProof>(
                r#"
                SELECT t_id, appointment_id, agent_id, admin_id, transaction_proof, date
                FROM transaction_proofs
                WHERE agent_id = $1
                ORDER BY date DESC, t_id DESC
                "#,
            )
            .bind(*agent_id),
            ProofFilter::Appointment(appointment_id) => sqlx::query_as::<_, TransactionProof>(
                r#"
                SELECT t_id, appointment_id, agent_id, admin_id, transaction_proof, date
                FROM transaction_proofs
                WHERE appointment_id = $1
                ORDER BY date DESC, t_id DESC
                "#,
            )
            .bind(appointment_id.clone()),
        };

        let proofs = query.fetch_all(&self.pool).await?;
        Ok(proofs)
    }

    /// Retorna `true` se alguma linha foi removida.
    pub async fn delete_proof(&self, t_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM transaction_proofs WHERE t_id = $1")
            .bind(t_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
