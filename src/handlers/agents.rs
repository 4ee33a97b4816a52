// src/handlers/agents.rs

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AdminUser, AuthenticatedUser, SuperadminUser},
    models::agent::{Agent, AgentSummary, BankDetails, ReassignAgentPayload, UpsertBankDetailsPayload},
};

// GET /api/agents
#[utoipa::path(
    get,
    path = "/api/agents",
    tag = "Agents",
    responses((status = 200, description = "Agentes com status de atividade", body = [AgentSummary])),
    security(("api_jwt" = []))
)]
pub async fn list_agents(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
) -> Result<Json<Vec<AgentSummary>>, AppError> {
    let agents = app_state.agent_service.list_agents(&identity).await?;
    Ok(Json(agents))
}

// PUT /api/agents/{agent_id}/admin
#[utoipa::path(
    put,
    path = "/api/agents/{agent_id}/admin",
    tag = "Agents",
    request_body = ReassignAgentPayload,
    params(("agent_id" = Uuid, Path, description = "ID do agente")),
    responses(
        (status = 200, description = "Agente reatribuído", body = Agent),
        (status = 404, description = "Agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn reassign_agent(
    State(app_state): State<AppState>,
    SuperadminUser(identity): SuperadminUser,
    Path(agent_id): Path<Uuid>,
    Json(payload): Json<ReassignAgentPayload>,
) -> Result<Json<Agent>, AppError> {
    let agent = app_state.agent_service
        .reassign_admin(&identity, agent_id, payload.admin_id)
        .await?;
    Ok(Json(agent))
}

// GET /api/agents/me/bank
#[utoipa::path(
    get,
    path = "/api/agents/me/bank",
    tag = "Agents",
    responses(
        (status = 200, description = "Dados bancários do agente", body = BankDetails),
        (status = 404, description = "Ainda não cadastrados")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_my_bank_details(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<Json<BankDetails>, AppError> {
    let details = app_state.agent_service.get_bank_details(&identity).await?;
    Ok(Json(details))
}

// PUT /api/agents/me/bank
#[utoipa::path(
    put,
    path = "/api/agents/me/bank",
    tag = "Agents",
    request_body = UpsertBankDetailsPayload,
    responses((status = 200, description = "Dados bancários salvos", body = BankDetails)),
    security(("api_jwt" = []))
)]
pub async fn upsert_my_bank_details(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(payload): Json<UpsertBankDetailsPayload>,
) -> Result<Json<BankDetails>, AppError> {
    payload.validate()?;

    let details = app_state.agent_service.upsert_bank_details(&identity, &payload).await?;
    Ok(Json(details))
}
