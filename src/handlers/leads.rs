// src/handlers/leads.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        lead::{CreateLeadResponse, Lead, LeadContact, LeadWithLatestProject},
        project::{OpenProjectPayload, OpenProjectResponse},
    },
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeadListQuery {
    /// Filtra pelos leads cujo projeto mais recente é deste agente
    pub agent_id: Option<Uuid>,
}

// POST /api/lead
#[utoipa::path(
    post,
    path = "/api/lead",
    tag = "Leads",
    request_body = OpenProjectPayload,
    responses(
        (status = 201, description = "Projeto aberto (lead criado ou reaproveitado)", body = OpenProjectResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Lead ou agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn open_project(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(payload): Json<OpenProjectPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let opened = app_state.project_service.open_project(&identity, &payload).await?;

    Ok((StatusCode::CREATED, Json(opened)))
}

// POST /api/leads
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = LeadContact,
    responses((status = 201, description = "Lead criado", body = CreateLeadResponse)),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(payload): Json<LeadContact>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let lead = app_state.lead_service.create_lead(&identity, &payload).await?;

    Ok((StatusCode::CREATED, Json(CreateLeadResponse { lead_id: lead.lead_id })))
}

// GET /api/leads?agent_id=
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(LeadListQuery),
    responses((status = 200, description = "Leads com o projeto mais recente", body = [LeadWithLatestProject])),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Query(query): Query<LeadListQuery>,
) -> Result<Json<Vec<LeadWithLatestProject>>, AppError> {
    let leads = app_state.lead_service.list_leads(&identity, query.agent_id).await?;
    Ok(Json(leads))
}

// GET /api/leads/{lead_id}
#[utoipa::path(
    get,
    path = "/api/leads/{lead_id}",
    tag = "Leads",
    params(("lead_id" = String, Path, description = "ID do lead, ex.: C00013")),
    responses(
        (status = 200, description = "Lead", body = Lead),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(lead_id): Path<String>,
) -> Result<Json<Lead>, AppError> {
    let lead = app_state.lead_service.get_lead(&identity, &lead_id).await?;
    Ok(Json(lead))
}
