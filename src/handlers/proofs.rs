// src/handlers/proofs.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::proof::{ProofFilterQuery, ProofView},
};

/// Corpo multipart do upload (apenas para a documentação).
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadProofForm {
    pub appointment_id: String,
    #[schema(content_media_type = "application/octet-stream")]
    pub file: Vec<u8>,
}

// GET /api/payments/proofs?agent_id=|appointment_id=
#[utoipa::path(
    get,
    path = "/api/payments/proofs",
    tag = "Proofs",
    params(ProofFilterQuery),
    responses(
        (status = 200, description = "Comprovantes, mais recentes primeiro", body = [ProofView]),
        (status = 400, description = "Informe exatamente um filtro")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_proofs(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Query(query): Query<ProofFilterQuery>,
) -> Result<Json<Vec<ProofView>>, AppError> {
    let filter = query
        .into_filter()
        .ok_or_else(|| AppError::bad_request("Provide exactly one of agent_id or appointment_id."))?;

    let proofs = app_state.proof_service.list_proofs(&identity, filter).await?;
    Ok(Json(proofs))
}

// POST /api/payments/proofs
#[utoipa::path(
    post,
    path = "/api/payments/proofs",
    tag = "Proofs",
    request_body(content = UploadProofForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Comprovante armazenado", body = ProofView),
        (status = 400, description = "Campos ausentes ou arquivo vazio")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_proof(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut appointment_id: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::BadRequest(e.body_text()))? {
        match field.name() {
            Some("appointment_id") => {
                let value = field.text().await.map_err(|e| AppError::BadRequest(e.body_text()))?;
                appointment_id = Some(value.trim().to_owned());
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("proof").to_owned();
                let bytes = field.bytes().await.map_err(|e| AppError::BadRequest(e.body_text()))?;
                file = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let appointment_id = appointment_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("appointment_id is required."))?;
    let (file_name, bytes) = file.ok_or_else(|| AppError::bad_request("file is required."))?;

    let proof = app_state.proof_service
        .upload_proof(&identity, &appointment_id, &bytes, &file_name)
        .await?;

    Ok((StatusCode::CREATED, Json(proof)))
}

// DELETE /api/payments/proofs/{t_id}
#[utoipa::path(
    delete,
    path = "/api/payments/proofs/{t_id}",
    tag = "Proofs",
    params(("t_id" = i64, Path, description = "ID do comprovante")),
    responses(
        (status = 204, description = "Comprovante e arquivo removidos"),
        (status = 404, description = "Comprovante não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_proof(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(t_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.proof_service.delete_proof(&identity, t_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
