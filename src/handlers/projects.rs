// src/handlers/projects.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::project::{AddRemarkPayload, Project, ProjectPatch, Remark},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AppointmentQuery {
    /// ID do projeto, ex.: AP00003
    pub appointment_id: String,
}

// GET /api/projects
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Projects",
    responses((status = 200, description = "Projetos visíveis ao usuário", body = [Project])),
    security(("api_jwt" = []))
)]
pub async fn list_projects(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<Json<Vec<Project>>, AppError> {
    let projects = app_state.project_service.list_projects(&identity).await?;
    Ok(Json(projects))
}

// GET /api/projects/{appointment_id}
#[utoipa::path(
    get,
    path = "/api/projects/{appointment_id}",
    tag = "Projects",
    params(("appointment_id" = String, Path, description = "ID do projeto")),
    responses(
        (status = 200, description = "Projeto", body = Project),
        (status = 403, description = "Sem acesso"),
        (status = 404, description = "Projeto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_project(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(appointment_id): Path<String>,
) -> Result<Json<Project>, AppError> {
    let project = app_state.project_service.get_project(&identity, &appointment_id).await?;
    Ok(Json(project))
}

// PUT /api/projects/{appointment_id}
#[utoipa::path(
    put,
    path = "/api/projects/{appointment_id}",
    tag = "Projects",
    request_body = ProjectPatch,
    params(("appointment_id" = String, Path, description = "ID do projeto")),
    responses(
        (status = 200, description = "Projeto atualizado", body = Project),
        (status = 400, description = "Nenhum campo enviado ou valor inválido"),
        (status = 403, description = "Sem acesso"),
        (status = 404, description = "Projeto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_project(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(appointment_id): Path<String>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<Project>, AppError> {
    // Patch vazio é rejeitado antes de tocar no banco
    if patch.is_empty() {
        return Err(AppError::bad_request("No updatable fields supplied."));
    }
    patch.validate()?;

    let project = app_state.project_service
        .update_project(&identity, &appointment_id, &patch)
        .await?;
    Ok(Json(project))
}

// GET /api/remarks?appointment_id=
#[utoipa::path(
    get,
    path = "/api/remarks",
    tag = "Projects",
    params(AppointmentQuery),
    responses((status = 200, description = "Observações, mais recentes primeiro", body = [Remark])),
    security(("api_jwt" = []))
)]
pub async fn list_remarks(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Vec<Remark>>, AppError> {
    let remarks = app_state.project_service
        .list_remarks(&identity, &query.appointment_id)
        .await?;
    Ok(Json(remarks))
}

// POST /api/remarks?appointment_id=
#[utoipa::path(
    post,
    path = "/api/remarks",
    tag = "Projects",
    params(AppointmentQuery),
    request_body = AddRemarkPayload,
    responses((status = 201, description = "Observação registrada", body = Remark)),
    security(("api_jwt" = []))
)]
pub async fn add_remark(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Query(query): Query<AppointmentQuery>,
    Json(payload): Json<AddRemarkPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let remark = app_state.project_service
        .add_remark(&identity, &query.appointment_id, &payload.remark)
        .await?;

    Ok((StatusCode::CREATED, Json(remark)))
}
