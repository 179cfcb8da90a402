//! Registration form: field edits, validation on submit, and the list of
//! completed registrations.

use crate::validation::{is_valid_email, non_blank, ValidationError, MIN_PASSWORD_LEN};
use cartwheel_core::effect::Effect;
use cartwheel_core::reducer::Reducer;
use cartwheel_core::{smallvec, SmallVec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text fields of the form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// Full name
    Name,
    /// Email address
    Email,
    /// Password
    Password,
    /// Password confirmation
    ConfirmPassword,
}

/// Current form contents
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
    /// Password confirmation
    pub confirm_password: String,
    /// Terms of service checkbox
    pub accept_terms: bool,
}

impl RegistrationForm {
    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
            Field::ConfirmPassword => &mut self.confirm_password,
        }
    }

    /// Checks the form, reporting the first problem found
    ///
    /// # Errors
    ///
    /// Returns the first failing rule, in field order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("Name"));
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("Email"));
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("Password"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if !self.accept_terms {
            return Err(ValidationError::TermsNotAccepted);
        }
        Ok(())
    }
}

/// A completed registration (the password is not kept)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Trimmed name
    pub name: String,
    /// Trimmed email
    pub email: String,
    /// Submission time
    pub submitted_at: DateTime<Utc>,
}

/// State of the registration feature
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationState {
    /// Form being edited
    pub form: RegistrationForm,
    /// Why the last submit failed, cleared by a successful one
    #[serde(skip)]
    pub last_error: Option<ValidationError>,
    /// Successful submissions, oldest first
    pub registrations: Vec<Registration>,
}

/// Actions for the registration feature
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistrationAction {
    /// Replace a text field
    SetField {
        /// Field to edit
        field: Field,
        /// New contents
        value: String,
    },
    /// Flip the terms checkbox
    ToggleTerms,
    /// Validate and, if valid, record the registration
    Submit {
        /// Submission time
        at: DateTime<Utc>,
    },
    /// Empty the form and forget the last error
    Reset,
}

/// Reducer for the registration feature
#[derive(Clone, Copy, Debug, Default)]
pub struct RegistrationReducer;

impl RegistrationReducer {
    /// Creates a new registration reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for RegistrationReducer {
    type State = RegistrationState;
    type Action = RegistrationAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            RegistrationAction::SetField { field, value } => {
                *state.form.field_mut(field) = value;
            },
            RegistrationAction::ToggleTerms => {
                state.form.accept_terms = !state.form.accept_terms;
            },
            RegistrationAction::Submit { at } => match state.form.validate() {
                Ok(()) => {
                    let form = std::mem::take(&mut state.form);
                    state.registrations.push(Registration {
                        name: non_blank(&form.name).unwrap_or_default(),
                        email: non_blank(&form.email).unwrap_or_default(),
                        submitted_at: at,
                    });
                    state.last_error = None;
                    tracing::debug!(total = state.registrations.len(), "Registration recorded");
                },
                Err(error) => {
                    tracing::debug!(%error, "Registration rejected");
                    state.last_error = Some(error);
                },
            },
            RegistrationAction::Reset => {
                state.form = RegistrationForm::default();
                state.last_error = None;
            },
        }

        smallvec![Effect::None]
    }
}
