//! Auth feature: login/registration screen.

mod render;
mod state;
mod update;

pub use render::render_auth;
pub use state::{AuthField, AuthViewState};
pub use update::{handle_auth_response, handle_key, handle_paste};
