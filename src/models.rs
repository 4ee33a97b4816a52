pub mod agent;
pub mod auth;
pub mod lead;
pub mod payment;
pub mod project;
pub mod proof;
