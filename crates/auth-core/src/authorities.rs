//! Claim-to-authority mapping.
//!
//! Turns the role claims an identity provider puts in a token into the
//! internal authority strings the policy engine understands. Keycloak
//! nests realm roles under `realm_access.roles`; other providers emit a
//! flat `roles` list. The mapper walks an ordered list of claim paths
//! and uses the first one that resolves to a list.

use crate::claims::Claims;
use serde_json::Value;
use std::collections::HashSet;

/// Prefix prepended to every mapped role name.
pub const DEFAULT_AUTHORITY_PREFIX: &str = "ROLE_";

/// Claim paths tried in order, first list wins.
pub const DEFAULT_ROLE_CLAIM_PATHS: [&str; 2] = ["realm_access.roles", "roles"];

/// Maps role claims to a set of authority names.
#[derive(Debug, Clone)]
pub struct AuthorityMapper {
    prefix: String,
    claim_paths: Vec<String>,
}

impl AuthorityMapper {
    /// Create a mapper with a custom prefix and claim-path precedence.
    #[must_use]
    pub fn new(prefix: String, claim_paths: Vec<String>) -> Self {
        Self {
            prefix,
            claim_paths,
        }
    }

    /// Map role claims to authorities.
    ///
    /// The first configured path that resolves to a JSON list is the
    /// sole source; there is no merging across paths. Role names are
    /// uppercased before prefixing, so role `user` becomes authority
    /// `ROLE_USER`. Non-string list entries are skipped. Any other
    /// claim shape (absent, scalar, nested object, null) contributes
    /// no roles.
    #[must_use]
    pub fn map(&self, claims: &Claims) -> HashSet<String> {
        let roles = self
            .claim_paths
            .iter()
            .find_map(|path| resolve_role_list(claims, path));

        let Some(roles) = roles else {
            tracing::debug!(target: "auth.authorities", "No role claim found in token");
            return HashSet::new();
        };

        roles
            .iter()
            .filter_map(Value::as_str)
            .map(|role| format!("{}{}", self.prefix, role.to_uppercase()))
            .collect()
    }
}

impl Default for AuthorityMapper {
    fn default() -> Self {
        Self::new(
            DEFAULT_AUTHORITY_PREFIX.to_string(),
            DEFAULT_ROLE_CLAIM_PATHS
                .iter()
                .map(ToString::to_string)
                .collect(),
        )
    }
}

/// Walk a dotted claim path and return the list it points at, if any.
///
/// Total over claim shapes: every segment must land on a nested object
/// except the last, which must be a list. Anything else is `None`.
fn resolve_role_list<'a>(claims: &'a Claims, path: &str) -> Option<&'a Vec<Value>> {
    let mut segments = path.split('.');

    let first = segments.next()?;
    let mut value = claims.claim(first)?;

    for segment in segments {
        match value {
            Value::Object(map) => value = map.get(segment)?,
            _ => return None,
        }
    }

    match value {
        Value::Array(list) => Some(list),
        _ => None,
    }
}
