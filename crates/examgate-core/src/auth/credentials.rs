//! Credential and role extraction from login responses.
//!
//! Deployments disagree on where the login response carries the bearer
//! token, so extraction probes an ordered list of JSON paths and takes the
//! first non-empty string.

use serde_json::Value;

/// Candidate locations of the credential, in priority order.
const CREDENTIAL_PATHS: &[&[&str]] = &[
    &["token"],
    &["accessToken"],
    &["jwt"],
    &["data", "token"],
    &["data", "accessToken"],
    &["data", "jwt"],
    &["user", "token"],
    &["user", "accessToken"],
    &["user", "jwt"],
];

/// Candidate locations of the role, in priority order.
const ROLE_PATHS: &[&[&str]] = &[&["role"], &["data", "role"], &["user", "role"]];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub credential: String,
    pub role: Option<String>,
}

/// Find the credential and role in a login response.
///
/// Returns `None` when no candidate path holds a non-empty string credential.
pub fn extract_login_credentials(response: &Value) -> Option<LoginCredentials> {
    let credential = probe(response, CREDENTIAL_PATHS)?;
    Some(LoginCredentials {
        credential: credential.to_string(),
        role: probe(response, ROLE_PATHS).map(str::to_string),
    })
}

fn probe<'a>(value: &'a Value, paths: &[&[&str]]) -> Option<&'a str> {
    paths.iter().find_map(|path| {
        path.iter()
            .try_fold(value, |node, key| node.get(*key))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn credential_of(response: Value) -> Option<String> {
        extract_login_credentials(&response).map(|c| c.credential)
    }

    #[test]
    fn test_supported_response_shapes() {
        for response in [
            json!({"token": "x"}),
            json!({"accessToken": "x"}),
            json!({"jwt": "x"}),
            json!({"data": {"token": "x"}}),
            json!({"data": {"accessToken": "x"}}),
            json!({"data": {"jwt": "x"}}),
            json!({"user": {"token": "x"}}),
        ] {
            assert_eq!(credential_of(response.clone()).as_deref(), Some("x"), "{response}");
        }
    }

    #[test]
    fn test_first_candidate_wins() {
        let response = json!({"jwt": "third", "accessToken": "second", "data": {"token": "nested"}});
        assert_eq!(credential_of(response).as_deref(), Some("second"));
    }

    #[test]
    fn test_empty_and_non_string_candidates_are_skipped() {
        let response = json!({"token": "", "accessToken": 12, "jwt": null, "data": {"token": "x"}});
        assert_eq!(credential_of(response).as_deref(), Some("x"));
    }

    #[test]
    fn test_missing_credential() {
        assert_eq!(credential_of(json!({"role": "admin"})), None);
        assert_eq!(credential_of(json!({"data": "token"})), None);
        assert_eq!(credential_of(json!(null)), None);
        assert_eq!(credential_of(json!("token")), None);
    }

    #[test]
    fn test_role_probing() {
        let top = extract_login_credentials(&json!({"token": "x", "role": "admin"}));
        assert_eq!(top.and_then(|c| c.role).as_deref(), Some("admin"));

        let nested = extract_login_credentials(&json!({"data": {"token": "x", "role": "user"}}));
        assert_eq!(nested.and_then(|c| c.role).as_deref(), Some("user"));

        let user = extract_login_credentials(&json!({"token": "x", "user": {"role": "admin"}}));
        assert_eq!(user.and_then(|c| c.role).as_deref(), Some("admin"));

        let none = extract_login_credentials(&json!({"token": "x"}));
        assert_eq!(none.and_then(|c| c.role), None);
    }
}
