pub mod agents;
pub mod auth;
pub mod leads;
pub mod payments;
pub mod projects;
pub mod proofs;
