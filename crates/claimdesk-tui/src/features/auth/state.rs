use claimdesk_core::auth::{AuthForm, AuthMode};

/// Focusable inputs of the auth screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthField {
    #[default]
    Email,
    Password,
    FullName,
}

impl AuthField {
    pub fn label(self) -> &'static str {
        match self {
            AuthField::Email => "Email",
            AuthField::Password => "Password",
            AuthField::FullName => "Full name",
        }
    }
}

const LOGIN_FIELDS: &[AuthField] = &[AuthField::Email, AuthField::Password];
const REGISTER_FIELDS: &[AuthField] = &[AuthField::FullName, AuthField::Email, AuthField::Password];

#[derive(Debug, Default)]
pub struct AuthViewState {
    pub form: AuthForm,
    pub focus: AuthField,
}

impl AuthViewState {
    /// Fields shown for the current mode, in focus order.
    pub fn fields(&self) -> &'static [AuthField] {
        match self.form.mode {
            AuthMode::Login => LOGIN_FIELDS,
            AuthMode::Register => REGISTER_FIELDS,
        }
    }

    pub fn value(&self, field: AuthField) -> &str {
        match field {
            AuthField::Email => &self.form.email,
            AuthField::Password => &self.form.password,
            AuthField::FullName => &self.form.full_name,
        }
    }

    pub fn focused_value_mut(&mut self) -> &mut String {
        match self.focus {
            AuthField::Email => &mut self.form.email,
            AuthField::Password => &mut self.form.password,
            AuthField::FullName => &mut self.form.full_name,
        }
    }

    pub fn focus_next(&mut self) {
        self.move_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.move_focus(self.fields().len() - 1);
    }

    fn move_focus(&mut self, step: usize) {
        let fields = self.fields();
        let current = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(current + step) % fields.len()];
    }

    /// Keeps focus on a visible field after a mode switch.
    pub fn ensure_focus_visible(&mut self) {
        if !self.fields().contains(&self.focus) {
            self.focus = AuthField::Email;
        }
    }

    /// Clears secrets once the workflow view takes over.
    pub fn reset_after_sign_in(&mut self) {
        self.form.password.clear();
        self.form.error = None;
        self.focus = AuthField::Password;
    }
}
