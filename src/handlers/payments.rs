// src/handlers/payments.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::projects::AppointmentQuery,
    middleware::auth::{AdminUser, AuthenticatedUser},
    models::payment::{
        EffectivePaymentStatus, Invoice, PaymentView, RecordAgentPaidPayload, SetAgentSharePayload,
        SetAgentShareResponse, UpdateInvoiceStatusPayload,
    },
};

// GET /api/payments
#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "Payments",
    responses((status = 200, description = "Visão de pagamentos por projeto", body = [PaymentView])),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<Json<Vec<PaymentView>>, AppError> {
    let payments = app_state.payment_service.list_payments(&identity).await?;
    Ok(Json(payments))
}

// PUT /api/payments/share
#[utoipa::path(
    put,
    path = "/api/payments/share",
    tag = "Payments",
    request_body = SetAgentSharePayload,
    responses(
        (status = 200, description = "Share gravado e fatura emitida", body = SetAgentShareResponse),
        (status = 403, description = "Apenas o admin responsável")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_agent_share(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
    Json(payload): Json<SetAgentSharePayload>,
) -> Result<Json<SetAgentShareResponse>, AppError> {
    payload.validate()?;

    let result = app_state.payment_service
        .set_agent_share(&identity, &payload.appointment_id, payload.agent_share, payload.payment_status)
        .await?;

    Ok(Json(result))
}

// PUT /api/payments/paid
#[utoipa::path(
    put,
    path = "/api/payments/paid",
    tag = "Payments",
    request_body = RecordAgentPaidPayload,
    responses(
        (status = 204, description = "Pagamento registrado"),
        (status = 403, description = "Apenas o admin responsável")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_agent_paid(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
    Json(payload): Json<RecordAgentPaidPayload>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    app_state.payment_service
        .record_agent_paid(&identity, &payload.appointment_id, payload.agent_paid, payload.payment_status)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// PUT /api/payments/invoice-status
#[utoipa::path(
    put,
    path = "/api/payments/invoice-status",
    tag = "Payments",
    request_body = UpdateInvoiceStatusPayload,
    responses(
        (status = 200, description = "Fatura mais recente atualizada", body = Invoice),
        (status = 404, description = "Projeto sem faturas")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_invoice_status(
    State(app_state): State<AppState>,
    AdminUser(identity): AdminUser,
    Json(payload): Json<UpdateInvoiceStatusPayload>,
) -> Result<Json<Invoice>, AppError> {
    payload.validate()?;

    let invoice = app_state.payment_service
        .update_invoice_status(&identity, &payload.appointment_id, payload.payment_status)
        .await?;
    Ok(Json(invoice))
}

// GET /api/payments/invoices?appointment_id=
#[utoipa::path(
    get,
    path = "/api/payments/invoices",
    tag = "Payments",
    params(AppointmentQuery),
    responses((status = 200, description = "Histórico de faturas, mais recentes primeiro", body = [Invoice])),
    security(("api_jwt" = []))
)]
pub async fn list_invoices(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let invoices = app_state.payment_service
        .list_invoices(&identity, &query.appointment_id)
        .await?;
    Ok(Json(invoices))
}

// GET /api/payments/{appointment_id}/status
#[utoipa::path(
    get,
    path = "/api/payments/{appointment_id}/status",
    tag = "Payments",
    params(("appointment_id" = String, Path, description = "ID do projeto")),
    responses((status = 200, description = "Status vigente e última fatura", body = EffectivePaymentStatus)),
    security(("api_jwt" = []))
)]
pub async fn get_payment_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(appointment_id): Path<String>,
) -> Result<Json<EffectivePaymentStatus>, AppError> {
    let status = app_state.payment_service
        .effective_payment_status(&identity, &appointment_id)
        .await?;
    Ok(Json(status))
}
