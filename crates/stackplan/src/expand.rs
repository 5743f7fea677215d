//! Expansion of a resource tree into its core resources
//!
//! A declared resource may imply more resources (for example a permission set granted on a
//! warehouse). [expand] walks a root depth-first, pre-order, asking each node for its additional
//! core resources and producing a flat list in which every resource follows the resources it
//! depends on.
//!
//! While walking, each child
//! - inherits the provider of its parent unless it declares its own
//! - depends on its parent (or, if the parent is not deployed itself, on whatever the parent
//!   depends on)
use crate::name::NamingError;
use crate::node::ResourceNode;

/// A resource that will be deployed, together with its resolved name
#[derive(Debug, Clone)]
pub struct CoreResource {
    pub name: String,
    pub node: ResourceNode,
}

/// Expands `root` into its ordered core resources
///
/// The result is computed from scratch on every call; the same root always yields the same list.
#[tracing::instrument(level = "debug", skip_all)]
pub fn expand(root: &ResourceNode) -> Result<Vec<CoreResource>, ExpandError> {
    let mut expander = Expander::default();
    let name = root.resource_name()?;
    expander.visit(root.clone(), name)?;

    tracing::debug!(
        resources = ?expander.result.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        "expanded"
    );
    Ok(expander.result)
}

#[derive(Default)]
struct Expander {
    /// names of the nodes currently being expanded, outermost first
    stack: Vec<String>,
    result: Vec<CoreResource>,
}

impl Expander {
    fn visit(&mut self, node: ResourceNode, name: String) -> Result<(), ExpandError> {
        if let Some(position) = self.stack.iter().position(|ancestor| ancestor == &name) {
            let mut cycle = self.stack[position..].to_vec();
            cycle.push(name);
            return Err(GraphCycleError::new(cycle).into());
        }

        let children = node.additional_core_resources(&name);
        let is_core = node.self_as_core_resource();
        let provider = node.options.provider.clone();
        let inherited_dependencies: Vec<String> = if is_core {
            vec![name.clone()]
        } else {
            node.options.dependencies().collect()
        };

        tracing::trace!(%name, is_core, children = children.len(), "visiting");
        if is_core {
            self.result.push(CoreResource {
                name: name.clone(),
                node,
            });
        }

        self.stack.push(name);
        for mut child in children {
            if child.options.provider.is_none() {
                child.options.provider.clone_from(&provider);
            }

            for dependency in &inherited_dependencies {
                child.options.add_dependency(dependency);
            }

            let child_name = child.resource_name()?;
            self.visit(child, child_name)?;
        }
        self.stack.pop();

        Ok(())
    }
}

/// Expansion reached a resource that is already being expanded
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, derive_new::new)]
#[error("dependency cycle detected: {}", .cycle.join(" -> "))]
pub struct GraphCycleError {
    pub cycle: Vec<String>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExpandError {
    #[error(transparent)]
    Naming(#[from] NamingError),
    #[error(transparent)]
    Cycle(#[from] GraphCycleError),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::node::{DeployOptions, Resource};
    use crate::value::Properties;
    use pretty_assertions::assert_eq;

    /// Declares one `Leaf` child per entry of `children`
    #[derive(Debug, Clone)]
    struct Parent {
        key: String,
        children: Vec<(String, Option<String>)>,
        core: bool,
    }

    impl Resource for Parent {
        fn kind_name(&self) -> &str {
            "Parent"
        }

        fn key(&self) -> String {
            self.key.clone()
        }

        fn properties(&self) -> Properties {
            Properties::new()
        }

        fn additional_core_resources(&self, resource_name: &str) -> Vec<ResourceNode> {
            self.children
                .iter()
                .map(|(key, provider)| {
                    ResourceNode::new(Leaf {
                        key: format!("{resource_name}-{key}"),
                    })
                    .with_options(DeployOptions {
                        provider: provider.clone(),
                        ..Default::default()
                    })
                })
                .collect()
        }

        fn self_as_core_resource(&self) -> bool {
            self.core
        }
    }

    #[derive(Debug, Clone)]
    struct Leaf {
        key: String,
    }

    impl Resource for Leaf {
        fn kind_name(&self) -> &str {
            "Leaf"
        }

        fn key(&self) -> String {
            self.key.clone()
        }

        fn properties(&self) -> Properties {
            Properties::new()
        }
    }

    /// Declares a copy of itself as its only child
    #[derive(Debug, Clone)]
    struct Ouroboros;

    impl Resource for Ouroboros {
        fn kind_name(&self) -> &str {
            "Ouroboros"
        }

        fn properties(&self) -> Properties {
            Properties::new()
        }

        fn additional_core_resources(&self, _resource_name: &str) -> Vec<ResourceNode> {
            vec![ResourceNode::new(Ouroboros)]
        }
    }

    /// Declares a `Parent` with children, nesting one level deeper
    #[derive(Debug, Clone)]
    struct GrandParent;

    impl Resource for GrandParent {
        fn kind_name(&self) -> &str {
            "GrandParent"
        }

        fn key(&self) -> String {
            "g".to_string()
        }

        fn properties(&self) -> Properties {
            Properties::new()
        }

        fn additional_core_resources(&self, _resource_name: &str) -> Vec<ResourceNode> {
            vec![
                ResourceNode::new(Parent {
                    key: "p1".to_string(),
                    children: vec![("a".to_string(), None)],
                    core: true,
                }),
                ResourceNode::new(Leaf {
                    key: "l2".to_string(),
                }),
            ]
        }
    }

    fn parent(children: &[(&str, Option<&str>)], core: bool) -> Parent {
        Parent {
            key: "p".to_string(),
            children: children
                .iter()
                .map(|(k, p)| (k.to_string(), p.map(str::to_string)))
                .collect(),
            core,
        }
    }

    fn names(resources: &[CoreResource]) -> Vec<&str> {
        resources.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn leaf_is_itself() {
        let root = ResourceNode::new(Leaf {
            key: "x".to_string(),
        });
        let resources = expand(&root).unwrap();
        assert_eq!(names(&resources), vec!["leaf-x"]);
        assert!(resources[0].node.options.depends_on.is_empty());
    }

    #[test]
    fn non_core_leaf_is_nothing() {
        let root = ResourceNode::new(parent(&[], false));
        assert!(expand(&root).unwrap().is_empty());
    }

    #[test]
    fn children_depend_on_parent() {
        let root = ResourceNode::new(parent(&[("a", None), ("b", None)], true));
        let resources = expand(&root).unwrap();

        assert_eq!(names(&resources), vec!["parent-p", "leaf-parent-p-a", "leaf-parent-p-b"]);
        for child in &resources[1..] {
            assert!(child.node.options.depends_on("parent-p"));
        }
    }

    #[test]
    fn existing_dependency_is_not_duplicated() {
        #[derive(Debug)]
        struct Explicit;

        impl Resource for Explicit {
            fn kind_name(&self) -> &str {
                "Explicit"
            }

            fn properties(&self) -> Properties {
                Properties::new()
            }

            fn additional_core_resources(&self, resource_name: &str) -> Vec<ResourceNode> {
                let mut options = DeployOptions::default();
                options
                    .depends_on
                    .insert(format!("${{resources.{resource_name}}}"));
                vec![ResourceNode::new(Leaf {
                    key: "c".to_string(),
                })
                .with_options(options)]
            }
        }

        let resources = expand(&ResourceNode::new(Explicit)).unwrap();
        assert_eq!(
            resources[1].node.options.depends_on.len(),
            1,
            "{:?}",
            resources[1].node.options
        );
    }

    #[test]
    fn provider_is_inherited_but_never_overwritten() {
        let root = ResourceNode::new(parent(&[("a", None), ("b", Some("other"))], true))
            .with_options(DeployOptions {
                provider: Some("main".to_string()),
                ..Default::default()
            });
        let resources = expand(&root).unwrap();

        let providers: Vec<_> = resources
            .iter()
            .map(|r| r.node.options.provider.as_deref())
            .collect();
        assert_eq!(providers, vec![Some("main"), Some("main"), Some("other")]);
    }

    #[test]
    fn provider_never_flows_upwards() {
        let root = ResourceNode::new(parent(&[("a", Some("child"))], true));
        let resources = expand(&root).unwrap();
        assert_eq!(resources[0].node.options.provider, None);
    }

    #[test]
    fn depth_first_pre_order() {
        let root = ResourceNode::new(GrandParent).with_options(DeployOptions {
            provider: Some("main".to_string()),
            ..Default::default()
        });
        let resources = expand(&root).unwrap();

        assert_eq!(
            names(&resources),
            vec![
                "grand-parent-g",
                "parent-p1",
                "leaf-parent-p1-a",
                "leaf-l2"
            ]
        );
        assert!(resources[1].node.options.depends_on("grand-parent-g"));
        assert!(resources[2].node.options.depends_on("parent-p1"));
        assert!(!resources[2].node.options.depends_on("grand-parent-g"));
        assert!(resources
            .iter()
            .all(|r| r.node.options.provider.as_deref() == Some("main")));
    }

    #[test]
    fn children_of_containers_inherit_container_dependencies() {
        let mut options = DeployOptions::default();
        options.depends_on.insert("upstream".to_string());
        let root = ResourceNode::new(parent(&[("a", None)], false)).with_options(options);
        let resources = expand(&root).unwrap();

        assert_eq!(names(&resources), vec!["leaf-parent-p-a"]);
        assert!(resources[0].node.options.depends_on("upstream"));
        assert!(!resources[0].node.options.depends_on("parent-p"));
    }

    #[test]
    fn idempotent() {
        let root = ResourceNode::new(GrandParent);
        let first = expand(&root).unwrap();
        let second = expand(&root).unwrap();

        assert_eq!(names(&first), names(&second));
        let options = |resources: &[CoreResource]| {
            resources
                .iter()
                .map(|r| r.node.options.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(options(&first), options(&second));
    }

    #[test]
    fn never_precedes_a_dependency() {
        let resources = expand(&ResourceNode::new(GrandParent)).unwrap();
        for (index, resource) in resources.iter().enumerate() {
            for dependency in resource.node.options.dependencies() {
                let position = resources.iter().position(|r| r.name == dependency);
                assert!(position.is_some_and(|p| p < index), "{dependency}");
            }
        }
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let error = expand(&ResourceNode::new(Ouroboros)).unwrap_err();
        assert_eq!(
            error,
            ExpandError::Cycle(GraphCycleError::new(vec![
                "ouroboros".to_string(),
                "ouroboros".to_string()
            ]))
        );
        assert_eq!(
            error.to_string(),
            "dependency cycle detected: ouroboros -> ouroboros"
        );
    }

    #[test]
    fn invalid_child_name_fails() {
        let root = ResourceNode::new(parent(&[("a b", None)], true));
        assert!(matches!(expand(&root), Err(ExpandError::Naming(_))));
    }
}
