use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FieldErrors;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Sign-up form. Uniqueness of fullname and email is checked against the
/// database by the handler; everything here is field-local.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        validate_fullname(&self.fullname, &mut errors);
        validate_email_field(&self.email, &mut errors);
        validate_password_pair(&self.password, &self.confirm_password, &mut errors);
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

impl LoginForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        validate_email_field(&self.email, &mut errors);
        if self.password.is_empty() {
            errors.push("password", "This field is required");
        }
        errors
    }
}

/// Account-settings form, assembled from the multipart fields. The picture
/// is handled separately by the handler.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub fullname: String,
    pub email: String,
}

impl ProfileForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        validate_fullname(&self.fullname, &mut errors);
        validate_email_field(&self.email, &mut errors);
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct RequestResetForm {
    pub email: String,
}

impl RequestResetForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        validate_email_field(&self.email, &mut errors);
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    pub confirm_password: String,
}

impl ResetPasswordForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        validate_password_pair(&self.password, &self.confirm_password, &mut errors);
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login or refresh. The refresh token is only
/// present when the caller asked to be remembered.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
}

fn validate_fullname(fullname: &str, errors: &mut FieldErrors) {
    let len = fullname.chars().count();
    if len == 0 {
        errors.push("fullname", "This field is required");
    } else if !(2..=40).contains(&len) {
        errors.push("fullname", "Full name must be between 2 and 40 characters");
    }
}

fn validate_email_field(email: &str, errors: &mut FieldErrors) {
    if email.is_empty() {
        errors.push("email", "This field is required");
    } else if !is_valid_email(email) {
        errors.push("email", "Invalid email address");
    }
}

fn validate_password_pair(password: &str, confirm: &str, errors: &mut FieldErrors) {
    if password.is_empty() {
        errors.push("password", "This field is required");
    } else if password.len() < 8 {
        errors.push("password", "Password must be at least 8 characters");
    }
    if confirm != password {
        errors.push("confirm_password", "Passwords must match");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            fullname: "Jamie Rivera".into(),
            email: "jamie@example.com".into(),
            password: "hunter2hunter2".into(),
            confirm_password: "hunter2hunter2".into(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(register_form().validate().is_empty());
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let mut form = register_form();
        form.confirm_password = "something-else".into();
        let errors = form.validate();
        assert!(errors.get("confirm_password").is_some());
        assert!(errors.get("password").is_none());
    }

    #[test]
    fn fullname_length_bounds() {
        let mut form = register_form();
        form.fullname = "J".into();
        assert!(form.validate().get("fullname").is_some());

        form.fullname = "x".repeat(41);
        assert!(form.validate().get("fullname").is_some());

        form.fullname = "Jo".into();
        assert!(form.validate().get("fullname").is_none());
    }

    #[test]
    fn malformed_email_is_rejected() {
        for bad in ["plainaddress", "no@tld", "spaces in@example.com", ""] {
            let mut form = register_form();
            form.email = bad.into();
            assert!(form.validate().get("email").is_some(), "accepted {bad:?}");
        }
    }

    #[test]
    fn short_password_is_rejected() {
        let mut form = register_form();
        form.password = "short".into();
        form.confirm_password = "short".into();
        assert!(form.validate().get("password").is_some());
    }

    #[test]
    fn login_requires_password() {
        let form = LoginForm {
            email: "jamie@example.com".into(),
            password: String::new(),
            remember: false,
        };
        assert!(form.validate().get("password").is_some());
    }

    #[test]
    fn auth_response_omits_absent_refresh_token() {
        let response = AuthResponse {
            access_token: "abc".into(),
            refresh_token: None,
            user: PublicUser {
                id: Uuid::new_v4(),
                fullname: "Jamie Rivera".into(),
                email: "jamie@example.com".into(),
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("refresh_token"));
        assert!(json.contains("jamie@example.com"));
    }
}
