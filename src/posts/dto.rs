use serde::Deserialize;

use crate::auth::dto::is_valid_email;
use crate::error::FieldErrors;

/// Form shared by post creation and editing.
#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    pub job_timeframe: String,
    pub payment: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl PostForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for (field, value) in [
            ("title", &self.title),
            ("content", &self.content),
            ("job_timeframe", &self.job_timeframe),
            ("payment", &self.payment),
        ] {
            if value.trim().is_empty() {
                errors.push(field, "This field is required");
            }
        }
        if self.email.is_empty() {
            errors.push("email", "This field is required");
        } else if !is_valid_email(&self.email) {
            errors.push("email", "Invalid email address");
        }
        // Phone stays optional and unchecked.
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_form() -> PostForm {
        PostForm {
            title: "Lawn mowing".into(),
            content: "Mow my front lawn, should take about an hour.".into(),
            job_timeframe: "This weekend".into(),
            payment: "$25".into(),
            email: "poster@example.com".into(),
            phone: None,
        }
    }

    #[test]
    fn valid_post_passes_without_phone() {
        assert!(post_form().validate().is_empty());
    }

    #[test]
    fn required_fields_are_enforced() {
        let mut form = post_form();
        form.title = "  ".into();
        form.payment = String::new();
        let errors = form.validate();
        assert!(errors.get("title").is_some());
        assert!(errors.get("payment").is_some());
        assert!(errors.get("content").is_none());
    }

    #[test]
    fn contact_email_must_be_well_formed() {
        let mut form = post_form();
        form.email = "not-an-email".into();
        assert!(form.validate().get("email").is_some());
    }
}
