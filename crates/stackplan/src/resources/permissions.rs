use super::Kind;
use crate::node::{Resource, ResourceNode};
use crate::value::{to_properties, Properties};

/// A single access grant
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Permission {
    pub permission_level: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub service_principal_name: Option<String>,
}

impl Permission {
    pub fn group(group_name: impl Into<String>, permission_level: impl Into<String>) -> Self {
        Self {
            permission_level: permission_level.into(),
            group_name: Some(group_name.into()),
            user_name: None,
            service_principal_name: None,
        }
    }
}

/// Set of access grants on one object
///
/// Exactly one of the object fields is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Permissions {
    pub access_controls: Vec<Permission>,
    #[serde(default)]
    pub warehouse_id: Option<String>,
    #[serde(default)]
    pub workspace_file_path: Option<String>,
    #[serde(default)]
    pub workspace_file_id: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub cluster_id: Option<String>,
    #[serde(default)]
    pub pipeline_id: Option<String>,
    #[serde(default)]
    pub notebook_id: Option<String>,
    #[serde(default)]
    pub directory_path: Option<String>,
}

impl Permissions {
    /// Node granting these permissions on resource `parent`, named `permissions-{parent}`
    pub(crate) fn on(self, parent: &str) -> ResourceNode {
        ResourceNode::new(self).with_name(format!("permissions-{parent}"))
    }
}

impl Kind for Permissions {
    const KIND_NAME: &'static str = "Permissions";
}

impl Resource for Permissions {
    fn kind_name(&self) -> &str {
        Self::KIND_NAME
    }

    fn properties(&self) -> Properties {
        to_properties(self)
    }

    fn renamed_fields(&self) -> &[(&str, &str)] {
        &[("warehouse_id", "sql_endpoint_id")]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn backend_field_names() {
        let node = ResourceNode::new(Permissions {
            access_controls: vec![Permission::group("account users", "CAN_USE")],
            warehouse_id: Some("${resources.wh.id}".to_string()),
            ..Default::default()
        });

        let properties = node.properties();
        assert_eq!(
            properties.keys().collect::<Vec<_>>(),
            vec!["access_controls", "sql_endpoint_id"]
        );
        assert_eq!(
            properties["sql_endpoint_id"],
            Value::from("${resources.wh.id}")
        );
        assert_eq!(node.resource_name(), Ok("permissions".to_string()));
    }
}
