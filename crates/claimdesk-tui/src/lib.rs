//! Full-screen claim review dashboard.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr, stdout};

use anyhow::Result;
use claimdesk_core::session::SessionStore;
pub use features::{auth, workflow};
pub use runtime::DashboardRuntime;

/// Runs the dashboard until the user quits.
///
/// # Errors
/// Returns an error if stdout is not a terminal or the terminal cannot be
/// driven.
pub async fn run_dashboard(store: SessionStore) -> Result<()> {
    if !stdout().is_terminal() {
        anyhow::bail!(
            "The dashboard requires a terminal.\n\
             Use `claimdesk analyze` and `claimdesk history` for non-interactive use."
        );
    }

    tracing::info!(api = %store.settings().base_url, "starting dashboard");
    {
        let mut runtime = DashboardRuntime::new(store)?;
        runtime.run()?;
    }

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}
