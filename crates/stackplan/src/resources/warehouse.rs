use super::{Kind, Permission, Permissions};
use crate::node::{Resource, ResourceNode};
use crate::value::{to_properties, Properties};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ClusterSize {
    #[serde(rename = "2X-Small")]
    XxSmall,
    #[serde(rename = "X-Small")]
    XSmall,
    Small,
    Medium,
    Large,
    #[serde(rename = "X-Large")]
    XLarge,
    #[serde(rename = "2X-Large")]
    XxLarge,
    #[serde(rename = "3X-Large")]
    XxxLarge,
    #[serde(rename = "4X-Large")]
    XxxxLarge,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseChannel {
    /// `CHANNEL_NAME_CURRENT` or `CHANNEL_NAME_PREVIEW`
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseCustomTag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseTags {
    #[serde(default)]
    pub custom_tags: Vec<WarehouseCustomTag>,
}

/// SQL warehouse (compute endpoint for SQL workloads)
///
/// ```yaml
/// name: default
/// cluster_size: 2X-Small
/// auto_stop_mins: 30
/// channel: { name: CHANNEL_NAME_PREVIEW }
/// enable_photon: true
/// permissions:
///   - group_name: account users
///     permission_level: CAN_USE
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqlWarehouse {
    pub name: String,
    pub cluster_size: ClusterSize,
    #[serde(default)]
    pub auto_stop_mins: Option<i64>,
    #[serde(default)]
    pub channel: Option<WarehouseChannel>,
    #[serde(default)]
    pub enable_photon: Option<bool>,
    #[serde(default)]
    pub enable_serverless_compute: Option<bool>,
    #[serde(default)]
    pub instance_profile_arn: Option<String>,
    #[serde(default)]
    pub jdbc_url: Option<String>,
    #[serde(default)]
    pub max_num_clusters: Option<i64>,
    #[serde(default)]
    pub min_num_clusters: Option<i64>,
    #[serde(default)]
    pub num_clusters: Option<i64>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    /// `COST_OPTIMIZED` or `RELIABILITY_OPTIMIZED`
    #[serde(default)]
    pub spot_instance_policy: Option<String>,
    #[serde(default)]
    pub tags: Option<WarehouseTags>,
    /// `CLASSIC` or `PRO`
    #[serde(default)]
    pub warehouse_type: Option<String>,
}

impl SqlWarehouse {
    pub fn new(name: impl Into<String>, cluster_size: ClusterSize) -> Self {
        Self {
            name: name.into(),
            cluster_size,
            auto_stop_mins: None,
            channel: None,
            enable_photon: None,
            enable_serverless_compute: None,
            instance_profile_arn: None,
            jdbc_url: None,
            max_num_clusters: None,
            min_num_clusters: None,
            num_clusters: None,
            permissions: vec![],
            spot_instance_policy: None,
            tags: None,
            warehouse_type: None,
        }
    }
}

impl Kind for SqlWarehouse {
    const KIND_NAME: &'static str = "SqlWarehouse";
}

impl Resource for SqlWarehouse {
    fn kind_name(&self) -> &str {
        Self::KIND_NAME
    }

    fn key(&self) -> String {
        self.name.clone()
    }

    fn properties(&self) -> Properties {
        to_properties(self)
    }

    fn excluded_fields(&self) -> &[&str] {
        &["permissions"]
    }

    fn additional_core_resources(&self, resource_name: &str) -> Vec<ResourceNode> {
        if self.permissions.is_empty() {
            return vec![];
        }

        let permissions = Permissions {
            access_controls: self.permissions.clone(),
            warehouse_id: Some(format!("${{resources.{resource_name}.id}}")),
            ..Default::default()
        };
        vec![permissions.on(resource_name)]
    }
}
