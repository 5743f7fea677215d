use super::{Kind, Permission, Permissions};
use crate::node::{Resource, ResourceNode};
use crate::value::{to_properties, Properties};
use std::path::Path;

/// File deployed into the workspace
///
/// The workspace `path` defaults to `{dirpath}{filename}`, or to whatever follows
/// `/workspacefiles/` in `source`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "WorkspaceFileSpec")]
pub struct WorkspaceFile {
    /// local file
    pub source: String,
    pub dirpath: Option<String>,
    pub path: String,
    pub permissions: Vec<Permission>,
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkspaceFileSpec {
    source: String,
    #[serde(default)]
    dirpath: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    permissions: Vec<Permission>,
}

impl TryFrom<WorkspaceFileSpec> for WorkspaceFile {
    type Error = WorkspaceFileError;

    fn try_from(spec: WorkspaceFileSpec) -> Result<Self, Self::Error> {
        WorkspaceFile::new(spec.source, spec.dirpath, spec.path, spec.permissions)
    }
}

impl WorkspaceFile {
    pub fn new(
        source: String,
        dirpath: Option<String>,
        path: Option<String>,
        permissions: Vec<Permission>,
    ) -> Result<Self, WorkspaceFileError> {
        let path = match (path, &dirpath) {
            (Some(path), _) => path,
            (None, Some(dirpath)) => format!("{dirpath}{}", filename(&source)),
            (None, None) => match source.rsplit_once("/workspacefiles/") {
                Some((_, relative)) => format!("/{relative}"),
                None => return Err(WorkspaceFileError::MissingDirpath(source)),
            },
        };

        Ok(Self {
            source,
            dirpath,
            path,
            permissions,
        })
    }

    pub fn filename(&self) -> &str {
        filename(&self.source)
    }
}

fn filename(source: &str) -> &str {
    Path::new(source)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(source)
}

impl Kind for WorkspaceFile {
    const KIND_NAME: &'static str = "WorkspaceFile";
}

impl Resource for WorkspaceFile {
    fn kind_name(&self) -> &str {
        Self::KIND_NAME
    }

    /// `path` without extension, `/` replaced by `-`
    fn key(&self) -> String {
        let stem = Path::new(&self.path).with_extension("");
        let key = stem.to_string_lossy().replace('/', "-");
        match key.strip_prefix('-') {
            Some(stripped) => stripped.to_string(),
            None => key,
        }
    }

    fn properties(&self) -> Properties {
        to_properties(self)
    }

    fn excluded_fields(&self) -> &[&str] {
        &["permissions", "dirpath"]
    }

    fn additional_core_resources(&self, resource_name: &str) -> Vec<ResourceNode> {
        if self.permissions.is_empty() {
            return vec![];
        }

        let permissions = Permissions {
            access_controls: self.permissions.clone(),
            workspace_file_path: Some(self.path.clone()),
            ..Default::default()
        };
        vec![permissions.on(resource_name)]
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceFileError {
    #[error("`dirpath` must be set for `{0}` as it is not in a `workspacefiles` directory")]
    MissingDirpath(String),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_path() {
        let file = WorkspaceFile::new(
            "./files/init.py".to_string(),
            Some("/.stack/scripts/".to_string()),
            None,
            vec![],
        )
        .unwrap();
        assert_eq!(file.path, "/.stack/scripts/init.py");
        assert_eq!(file.filename(), "init.py");

        let file = WorkspaceFile::new(
            "./workspacefiles/jobs/run.py".to_string(),
            None,
            None,
            vec![],
        )
        .unwrap();
        assert_eq!(file.path, "/jobs/run.py");

        let file = WorkspaceFile::new(
            "./x.py".to_string(),
            Some("/ignored/".to_string()),
            Some("/explicit/y.py".to_string()),
            vec![],
        )
        .unwrap();
        assert_eq!(file.path, "/explicit/y.py");
    }

    #[test]
    fn missing_dirpath() {
        assert_eq!(
            WorkspaceFile::new("./x.py".to_string(), None, None, vec![]),
            Err(WorkspaceFileError::MissingDirpath("./x.py".to_string()))
        );

        let result = serde_yaml::from_str::<WorkspaceFile>("source: ./x.py");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("not in a `workspacefiles` directory"));
    }

    #[test]
    fn key_and_name() {
        let file = WorkspaceFile::new(
            "./workspacefiles/jobs/run.py".to_string(),
            None,
            None,
            vec![],
        )
        .unwrap();
        let node = ResourceNode::new(file);

        assert_eq!(node.resource.key(), "jobs-run");
        assert_eq!(node.resource_name(), Ok("workspace-file-jobs-run".to_string()));

        let hidden = WorkspaceFile::new(
            "init.py".to_string(),
            Some("/.stack/".to_string()),
            None,
            vec![],
        )
        .unwrap();
        assert_eq!(
            ResourceNode::new(hidden).resource_name(),
            Ok("workspace-file--stack-init".to_string())
        );
    }

    #[test]
    fn properties_and_permissions() {
        let file = WorkspaceFile::new(
            "init.py".to_string(),
            Some("/scripts/".to_string()),
            None,
            vec![Permission::group("users", "CAN_READ")],
        )
        .unwrap();

        assert_eq!(
            ResourceNode::new(file.clone())
                .properties()
                .keys()
                .collect::<Vec<_>>(),
            vec!["source", "path"]
        );

        let children = file.additional_core_resources("workspace-file-scripts-init");
        assert_eq!(
            children[0].resource_name(),
            Ok("permissions-workspace-file-scripts-init".to_string())
        );
        assert_eq!(
            children[0].properties()["workspace_file_path"],
            crate::value::Value::from("/scripts/init.py")
        );
    }
}
