//! Session domain types — issued views and lookup classification
//!
//! Plain serializable views shared between the actor and the API layer.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Email shape: word chars, dots, dashes around a single `@`, with a
/// dotted TLD. Permissive on purpose; registration is the gatekeeper.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").expect("email pattern compiles"));

/// How a raw lookup credential gets routed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    /// Input matched the email shape
    ByEmail(String),
    /// Input parsed as a numeric user id
    ById(i64),
    /// Neither email nor id; can never match a user
    Unmatchable,
}

impl UserLookup {
    /// Classify a lookup credential as an email or a numeric id
    pub fn classify(input: &str) -> Self {
        if EMAIL_RE.is_match(input) {
            return Self::ByEmail(input.to_string());
        }
        match input.parse::<i64>() {
            Ok(id) => Self::ById(id),
            Err(_) => Self::Unmatchable,
        }
    }
}

/// Registration and lookup view of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub user_id: i64,
    pub user_name: String,
    pub email: String,
    pub role_id: i64,
}

/// Access/refresh pair issued by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_routes_emails() {
        assert_eq!(
            UserLookup::classify("user@domain.co"),
            UserLookup::ByEmail("user@domain.co".to_string())
        );
        assert_eq!(
            UserLookup::classify("first.last-x@sub.domain.org"),
            UserLookup::ByEmail("first.last-x@sub.domain.org".to_string())
        );
    }

    #[test]
    fn test_classifier_routes_numeric_ids() {
        assert_eq!(UserLookup::classify("12345"), UserLookup::ById(12345));
        assert_eq!(UserLookup::classify("1"), UserLookup::ById(1));
    }

    #[test]
    fn test_classifier_rejects_everything_else() {
        assert_eq!(UserLookup::classify("not-an-email"), UserLookup::Unmatchable);
        assert_eq!(UserLookup::classify("a@b"), UserLookup::Unmatchable);
        assert_eq!(UserLookup::classify(""), UserLookup::Unmatchable);
    }

    #[test]
    fn test_views_serialize_camel_case() {
        let details = UserDetails {
            user_id: 1,
            user_name: "Alice".to_string(),
            email: "alice@x.com".to_string(),
            role_id: 2,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["userId"], 1);
        assert_eq!(json["userName"], "Alice");
        assert_eq!(json["roleId"], 2);

        let pair = TokenPair {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            token_type: "Bearer".to_string(),
        };
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["tokenType"], "Bearer");
    }
}
