//! ClaimDesk core: configuration, API client, session handling and the
//! auth/workflow state machines shared by the CLI and the dashboard.

pub mod api;
pub mod auth;
pub mod config;
pub mod logging;
pub mod models;
pub mod session;
pub mod workflow;
