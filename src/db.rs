pub mod user_repo;
pub use user_repo::UserRepository;
pub mod agent_repo;
pub use agent_repo::AgentRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod project_repo;
pub use project_repo::ProjectRepository;
pub mod payment_repo;
pub use payment_repo::PaymentRepository;
pub mod proof_repo;
pub use proof_repo::ProofRepository;
