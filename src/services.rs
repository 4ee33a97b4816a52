pub mod agent_service;
pub mod auth;
pub mod lead_service;
pub mod payment_service;
pub mod project_service;
pub mod proof_service;
pub mod storage;
