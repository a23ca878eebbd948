//! Resource permissions and the access decision used to hide portal controls.
//! This is a UX gate only; the API enforces the same rules server side.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource key used when a resource has no entry of its own.
pub const DEFAULT_RESOURCE: &str = "DEFAULT";

pub const ACTION_LIST: &str = "list";
pub const ACTION_SHOW: &str = "show";
pub const ACTION_CREATE: &str = "create";
pub const ACTION_EDIT: &str = "edit";
pub const ACTION_DELETE: &str = "delete";

/// Resource identifier to allowed actions, as returned by the login endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMap(BTreeMap<String, Vec<String>>);

impl PermissionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `action` to `resource`, ignoring duplicates.
    pub fn grant(&mut self, resource: impl Into<String>, action: impl Into<String>) {
        let actions = self.0.entry(resource.into()).or_default();
        let action = action.into();
        if !actions.contains(&action) {
            actions.push(action);
        }
    }

    /// Actions for `resource`, falling back to [`DEFAULT_RESOURCE`]. A resource that is
    /// present with an empty list does not fall back.
    #[must_use]
    pub fn resolve(&self, resource: &str) -> Option<&[String]> {
        self.0
            .get(resource)
            .or_else(|| self.0.get(DEFAULT_RESOURCE))
            .map(Vec::as_slice)
    }

    #[must_use]
    pub fn allows(&self, resource: &str, action: &str) -> bool {
        has_access(resource, action, self)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<R, A> FromIterator<(R, Vec<A>)> for PermissionMap
where
    R: Into<String>,
    A: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (R, Vec<A>)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (resource, actions) in iter {
            let resource = resource.into();
            // keep resources with no actions, they block the DEFAULT fallback
            map.0.entry(resource.clone()).or_default();
            for action in actions {
                map.grant(resource.clone(), action);
            }
        }
        map
    }
}

/// Whether `action` on `resource_id` is allowed. Denies when neither the resource
/// nor `DEFAULT` has an entry.
#[must_use]
pub fn has_access(resource_id: &str, action: &str, permissions: &PermissionMap) -> bool {
    permissions
        .resolve(resource_id)
        .is_some_and(|actions| actions.iter().any(|allowed| allowed == action))
}

/// A single `role -> (resource, action)` grant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleRule {
    pub role: String,
    pub resource: String,
    pub action: String,
}

impl RoleRule {
    pub fn new(
        role: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            resource: resource.into(),
            action: action.into(),
        }
    }
}

/// Derives a permission map from token roles when the login response carries none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RolePolicy {
    rules: Vec<RoleRule>,
}

impl RolePolicy {
    #[must_use]
    pub fn new(rules: Vec<RoleRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn permissions_for<S: AsRef<str>>(&self, roles: &[S]) -> PermissionMap {
        let mut map = PermissionMap::new();
        for rule in &self.rules {
            if roles.iter().any(|role| role.as_ref() == rule.role) {
                map.grant(rule.resource.clone(), rule.action.clone());
            }
        }
        map
    }
}

impl Default for RolePolicy {
    /// Mirrors the rules the portal seeds: `user` can browse, `admin` can do everything.
    fn default() -> Self {
        let read = [ACTION_LIST, ACTION_SHOW];
        let write = [ACTION_CREATE, ACTION_EDIT, ACTION_DELETE];

        let mut rules = Vec::new();
        for action in read {
            rules.push(RoleRule::new("user", DEFAULT_RESOURCE, action));
        }
        for action in read.iter().chain(write.iter()) {
            rules.push(RoleRule::new("admin", DEFAULT_RESOURCE, *action));
        }

        Self { rules }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perms(entries: Vec<(&str, Vec<&str>)>) -> PermissionMap {
        entries.into_iter().collect()
    }

    #[test]
    fn explicit_resource_entry_allows_listed_actions() {
        let map = perms(vec![("assets", vec!["list", "show"])]);
        assert!(has_access("assets", "list", &map));
        assert!(has_access("assets", "show", &map));
        assert!(!has_access("assets", "delete", &map));
    }

    #[test]
    fn missing_resource_falls_back_to_default() {
        let map = perms(vec![
            ("assets", vec!["list"]),
            (DEFAULT_RESOURCE, vec!["list", "edit"]),
        ]);
        assert!(has_access("users", "edit", &map));
        assert!(!has_access("users", "delete", &map));
        // explicit entries win over DEFAULT
        assert!(!has_access("assets", "edit", &map));
    }

    #[test]
    fn empty_resource_entry_does_not_fall_back() {
        let map = perms(vec![("shares", vec![]), (DEFAULT_RESOURCE, vec!["list"])]);
        assert!(!has_access("shares", "list", &map));
        assert!(has_access("assets", "list", &map));
    }

    #[test]
    fn empty_map_denies_everything() {
        let map = PermissionMap::new();
        for resource in ["assets", "users", DEFAULT_RESOURCE, ""] {
            for action in [ACTION_LIST, ACTION_SHOW, ACTION_CREATE, ACTION_EDIT, ACTION_DELETE] {
                assert!(!has_access(resource, action, &map));
            }
        }
    }

    #[test]
    fn grant_deduplicates() {
        let mut map = PermissionMap::new();
        map.grant("assets", "list");
        map.grant("assets", "list");
        assert_eq!(map.resolve("assets"), Some(&["list".to_string()][..]));
    }

    #[test]
    fn permission_map_round_trips_as_plain_object() {
        let map: PermissionMap =
            serde_json::from_str(r#"{"assets":["list"],"DEFAULT":["show"]}"#).unwrap();
        assert!(map.allows("assets", "list"));
        assert!(map.allows("users", "show"));
        assert_eq!(
            serde_json::to_value(&map).unwrap(),
            serde_json::json!({"DEFAULT": ["show"], "assets": ["list"]})
        );
    }

    #[test]
    fn default_policy_matches_seeded_roles() {
        let policy = RolePolicy::default();

        let user = policy.permissions_for(&["user"]);
        assert!(user.allows("assets", ACTION_LIST));
        assert!(user.allows("assets", ACTION_SHOW));
        assert!(!user.allows("assets", ACTION_EDIT));

        let admin = policy.permissions_for(&["admin"]);
        for action in [ACTION_LIST, ACTION_SHOW, ACTION_CREATE, ACTION_EDIT, ACTION_DELETE] {
            assert!(admin.allows("users", action));
        }

        assert!(policy.permissions_for::<&str>(&[]).is_empty());
        assert!(policy.permissions_for(&["guest"]).is_empty());
    }
}
