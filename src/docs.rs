// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::create_user,

        // --- Agents ---
        handlers::agents::list_agents,
        handlers::agents::reassign_agent,
        handlers::agents::get_my_bank_details,
        handlers::agents::upsert_my_bank_details,

        // --- Leads ---
        handlers::leads::open_project,
        handlers::leads::create_lead,
        handlers::leads::list_leads,
        handlers::leads::get_lead,

        // --- Projects ---
        handlers::projects::list_projects,
        handlers::projects::get_project,
        handlers::projects::update_project,
        handlers::projects::list_remarks,
        handlers::projects::add_remark,

        // --- Payments ---
        handlers::payments::list_payments,
        handlers::payments::set_agent_share,
        handlers::payments::record_agent_paid,
        handlers::payments::update_invoice_status,
        handlers::payments::list_invoices,
        handlers::payments::get_payment_status,

        // --- Proofs ---
        handlers::proofs::list_proofs,
        handlers::proofs::upload_proof,
        handlers::proofs::delete_proof,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::Identity,
            models::auth::LoginUserPayload,
            models::auth::CreateUserPayload,
            models::auth::AuthResponse,

            // --- Agents ---
            models::agent::Agent,
            models::agent::AgentSummary,
            models::agent::BankDetails,
            models::agent::UpsertBankDetailsPayload,
            models::agent::ReassignAgentPayload,

            // --- Leads ---
            models::lead::Lead,
            models::lead::LeadContact,
            models::lead::LeadWithLatestProject,
            models::lead::CreateLeadResponse,

            // --- Projects ---
            models::project::PaymentStatus,
            models::project::Project,
            models::project::CommercialTerms,
            models::project::OpenProjectPayload,
            models::project::OpenProjectResponse,
            models::project::ProjectPatch,
            models::project::Remark,
            models::project::AddRemarkPayload,

            // --- Payments ---
            models::payment::Invoice,
            models::payment::PaymentView,
            models::payment::SetAgentSharePayload,
            models::payment::SetAgentShareResponse,
            models::payment::RecordAgentPaidPayload,
            models::payment::UpdateInvoiceStatusPayload,
            models::payment::EffectivePaymentStatus,

            // --- Proofs ---
            models::proof::ProofView,
            handlers::proofs::UploadProofForm,
        )
    ),
    tags(
        (name = "Auth", description = "Login e sessão"),
        (name = "Users", description = "Identidade e criação de contas"),
        (name = "Agents", description = "Agentes, supervisão e dados bancários"),
        (name = "Leads", description = "Clientes e abertura de projetos"),
        (name = "Projects", description = "Projetos, pipeline e observações"),
        (name = "Payments", description = "Comissões, pagamentos e faturas"),
        (name = "Proofs", description = "Comprovantes de transação")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_ledger_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/lead",
            "/api/projects/{appointment_id}",
            "/api/payments/share",
            "/api/payments/proofs",
            "/api/payments/proofs/{t_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
