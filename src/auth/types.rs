//! Request and response bodies of the portal auth endpoints. Verification payloads
//! carry authenticator output and session tokens, so they must never be logged.

use crate::auth::permissions::PermissionMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CeremonyKind {
    #[serde(alias = "register", alias = "registration")]
    Register,
    #[serde(alias = "login", alias = "authentication")]
    Login,
}

impl std::fmt::Display for CeremonyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register => f.write_str("REGISTER"),
            Self::Login => f.write_str("LOGIN"),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OptionsRequest<'a> {
    pub email: &'a str,
}

/// Answer of an options endpoint. `options` is either the parameters object or the
/// same object encoded as a JSON string.
#[derive(Clone, Debug, Deserialize)]
pub struct OptionsResponse {
    #[serde(default, alias = "type", alias = "kind")]
    pub flow: Option<CeremonyKind>,
    #[serde(alias = "publicKey")]
    pub options: Value,
}

#[derive(Debug, Serialize)]
pub struct RegisterVerificationRequest<'a> {
    pub email: &'a str,
    pub att_resp: &'a Value,
    pub challenge: &'a str,
    pub user_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct LoginVerificationRequest<'a> {
    pub email: &'a str,
    pub auth_resp: &'a Value,
    pub challenge: &'a str,
}

#[derive(Deserialize)]
pub struct VerificationResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub permissions: Option<PermissionMap>,
}

#[derive(Debug, Serialize)]
pub struct VerifyEmailRequest<'a> {
    pub token: &'a str,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flow_accepts_server_spellings() {
        let parsed: OptionsResponse =
            serde_json::from_value(json!({"flow": "REGISTER", "options": "{}"})).unwrap();
        assert_eq!(parsed.flow, Some(CeremonyKind::Register));

        let parsed: OptionsResponse =
            serde_json::from_value(json!({"type": "login", "options": {}})).unwrap();
        assert_eq!(parsed.flow, Some(CeremonyKind::Login));

        let parsed: OptionsResponse =
            serde_json::from_value(json!({"publicKey": {"challenge": "abc"}})).unwrap();
        assert_eq!(parsed.flow, None);
        assert_eq!(parsed.options["challenge"], "abc");
    }

    #[test]
    fn verification_response_tolerates_missing_fields() {
        let parsed: VerificationResponse =
            serde_json::from_value(json!({"message": "Success"})).unwrap();
        assert!(parsed.token.is_none());
        assert!(parsed.permissions.is_none());
    }

    #[test]
    fn register_request_uses_wire_names() {
        let attestation = json!({"id": "cred"});
        let body = serde_json::to_value(RegisterVerificationRequest {
            email: "a@x.com",
            att_resp: &attestation,
            challenge: "c",
            user_id: "u",
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"email": "a@x.com", "att_resp": {"id": "cred"}, "challenge": "c", "user_id": "u"})
        );
    }
}
