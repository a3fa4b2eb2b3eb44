pub mod auth;
pub mod workflow;
