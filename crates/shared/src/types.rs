//! Types shared between the API server and the billing crate

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated user attached to a request
///
/// Produced by the API's auth middleware from a verified session token.
/// Email is optional on the token; billing actions refuse sessions without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl SessionUser {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: Some(email.into()),
            name: None,
        }
    }

    /// Email if present and non-blank
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// Billing interval of a paid plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_email_is_treated_as_missing() {
        let mut user = SessionUser::new(Uuid::new_v4(), "   ");
        assert_eq!(user.email(), None);

        user.email = None;
        assert_eq!(user.email(), None);

        user.email = Some(" dev@example.com ".to_string());
        assert_eq!(user.email(), Some("dev@example.com"));
    }

    #[test]
    fn test_interval_serializes_lowercase() {
        let json = serde_json::to_string(&BillingInterval::Yearly).unwrap();
        assert_eq!(json, "\"yearly\"");
    }
}
