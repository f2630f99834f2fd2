//! Bodies exchanged with the authentication endpoints.
//!
//! Every type here travels "on the wire" as JSON. Field names follow the
//! API's camelCase convention (`accessToken`, `agencyScope`), which is why
//! most structs carry `#[serde(rename_all = "camelCase")]`.
//!
//! Response types are lenient about presence: every field is optional so
//! a response missing a token or the role still decodes, and the session
//! layer can report *which* invariant it violates. A field of the wrong
//! JSON type does not decode.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The role a session was issued for.
///
/// The set of roles is open-ended on the server side, so unknown values
/// are kept verbatim in [`Role::Other`] instead of failing to decode.
/// Only `superadmin` has special meaning to the client: it is the one
/// role that is not bound to an agency.
///
/// On the wire a role is a plain lowercase string (`"agence"`), handled
/// by the `from`/`into` conversions below.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Platform administrator. Sees every agency; has no agency scope.
    SuperAdmin,
    /// A travel agency's own staff.
    Agence,
    /// A supplier (hotel, bus company) attached to an agency.
    Fournisseur,
    /// An end customer of an agency.
    Client,
    /// A branch office of an agency.
    Succursale,
    /// Any role this client does not know about.
    Other(String),
}

impl Role {
    /// Whether sessions with this role may omit an agency scope.
    pub fn is_unscoped(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// The wire representation of this role.
    pub fn as_str(&self) -> &str {
        match self {
            Role::SuperAdmin => "superadmin",
            Role::Agence => "agence",
            Role::Fournisseur => "fournisseur",
            Role::Client => "client",
            Role::Succursale => "succursale",
            Role::Other(other) => other,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "superadmin" => Role::SuperAdmin,
            "agence" => Role::Agence,
            "fournisseur" => Role::Fournisseur,
            "client" => Role::Client,
            "succursale" => Role::Succursale,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(other) => other,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AgencyId
// ---------------------------------------------------------------------------

/// Identifier of the agency a session is scoped to.
///
/// Newtype wrapper so an agency id cannot be confused with a token or a
/// username even though all of them are strings underneath. The API
/// sometimes sends the id as a JSON number, so deserialization accepts
/// both `"A1"` and `42`; serialization always writes a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AgencyId(String);

impl AgencyId {
    /// Wraps a raw agency identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AgencyId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => AgencyId(text),
            Raw::Number(number) => AgencyId(number.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Login exchange
// ---------------------------------------------------------------------------

/// What the user typed into the login form.
///
/// `Debug` is implemented by hand so the secret never reaches a log line.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Username or e-mail address.
    pub identifier: String,
    /// Password.
    pub secret: String,
}

impl Credentials {
    pub fn new(
        identifier: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Response body of the login endpoint.
///
/// A well-formed response carries both tokens, a role, and an agency
/// scope unless the role is `superadmin`. That rule is enforced by the
/// session layer, not here.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency_scope: Option<AgencyId>,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .field("agency_scope", &self.agency_scope)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Refresh exchange
// ---------------------------------------------------------------------------

/// Request body of the refresh endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl RefreshRequest {
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshRequest")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Response body of the refresh endpoint.
///
/// `refresh_token` is only present when the server rotates refresh
/// tokens; otherwise the old one stays valid.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for RefreshResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshResponse")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Role
    // =====================================================================

    #[test]
    fn test_role_deserializes_known_values() {
        let roles: Vec<Role> = serde_json::from_str(
            r#"["superadmin","agence","fournisseur","client","succursale"]"#,
        )
        .unwrap();

        assert_eq!(
            roles,
            vec![
                Role::SuperAdmin,
                Role::Agence,
                Role::Fournisseur,
                Role::Client,
                Role::Succursale,
            ]
        );
    }

    #[test]
    fn test_role_unknown_value_is_preserved() {
        let role: Role = serde_json::from_str(r#""chauffeur""#).unwrap();

        assert_eq!(role, Role::Other("chauffeur".into()));
        assert_eq!(serde_json::to_string(&role).unwrap(), r#""chauffeur""#);
    }

    #[test]
    fn test_role_only_superadmin_is_unscoped() {
        assert!(Role::SuperAdmin.is_unscoped());
        assert!(!Role::Agence.is_unscoped());
        assert!(!Role::Succursale.is_unscoped());
        assert!(!Role::Other("superadmin2".into()).is_unscoped());
    }

    #[test]
    fn test_role_display_matches_wire_value() {
        assert_eq!(Role::Fournisseur.to_string(), "fournisseur");
    }

    // =====================================================================
    // AgencyId
    // =====================================================================

    #[test]
    fn test_agency_id_accepts_string_and_number() {
        let from_text: AgencyId = serde_json::from_str(r#""A1""#).unwrap();
        let from_number: AgencyId = serde_json::from_str("42").unwrap();

        assert_eq!(from_text.as_str(), "A1");
        assert_eq!(from_number.as_str(), "42");
    }

    #[test]
    fn test_agency_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&AgencyId::new("42")).unwrap();
        assert_eq!(json, r#""42""#);
    }

    // =====================================================================
    // Login / refresh bodies
    // =====================================================================

    #[test]
    fn test_credentials_json_format() {
        let json =
            serde_json::to_value(Credentials::new("ops@agence.tn", "pw"))
                .unwrap();

        assert_eq!(json["identifier"], "ops@agence.tn");
        assert_eq!(json["secret"], "pw");
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let printed = format!("{:?}", Credentials::new("ops", "hunter2"));

        assert!(printed.contains("ops"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_login_response_missing_fields_decode_as_none() {
        let resp: LoginResponse =
            serde_json::from_str(r#"{"accessToken":"a"}"#).unwrap();

        assert_eq!(resp.access_token.as_deref(), Some("a"));
        assert!(resp.refresh_token.is_none());
        assert!(resp.role.is_none());
        assert!(resp.agency_scope.is_none());
    }

    #[test]
    fn test_login_response_debug_redacts_tokens() {
        let resp = LoginResponse {
            access_token: Some("secret-access".into()),
            refresh_token: Some("secret-refresh".into()),
            role: Some(Role::Agence),
            agency_scope: Some(AgencyId::new("A1")),
        };
        let printed = format!("{resp:?}");

        assert!(!printed.contains("secret-access"));
        assert!(!printed.contains("secret-refresh"));
        assert!(printed.contains("A1"));
    }

    #[test]
    fn test_refresh_request_json_format() {
        let json = serde_json::to_value(RefreshRequest::new("r-9")).unwrap();
        assert_eq!(json, serde_json::json!({ "refreshToken": "r-9" }));
    }

    #[test]
    fn test_refresh_response_without_rotation() {
        let resp: RefreshResponse =
            serde_json::from_str(r#"{"accessToken":"a-2"}"#).unwrap();

        assert_eq!(resp.access_token.as_deref(), Some("a-2"));
        assert!(resp.refresh_token.is_none());
    }
}
