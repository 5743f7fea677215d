use super::Kind;
use crate::node::Resource;
use crate::value::{to_properties, Properties};

/// Account user
///
/// `groups` and `roles` are memberships managed elsewhere, `id` is only used for externally
/// managed users. None of them are sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub user_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// disable instead of delete when the resource is deleted
    #[serde(default)]
    pub disable_as_user_deletion: bool,
    #[serde(default)]
    pub workspace_access: Option<bool>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub id: Option<String>,
}

impl Kind for User {
    const KIND_NAME: &'static str = "User";
}

impl Resource for User {
    fn kind_name(&self) -> &str {
        Self::KIND_NAME
    }

    fn key(&self) -> String {
        self.user_name.clone()
    }

    fn properties(&self) -> Properties {
        to_properties(self)
    }

    fn excluded_fields(&self) -> &[&str] {
        &["groups", "roles", "id"]
    }
}
