//! Pre-flight validation and ordering of one deployment run
//!
//! A [Plan] is built from any number of root resources. Building it
//! 1. expands every root (see [crate::expand])
//! 2. rejects duplicate names
//! 3. turns every `${resources.<name>...}` found in a resource's properties or options into a
//!    dependency
//! 4. rejects dependencies on resources that are not part of the plan
//! 5. orders resources so that each one follows everything it depends on
//!
//! The order is stable: a resource only moves later when one of its dependencies forces it to.
//! Nothing is sent to a backend before all of this succeeded.
use crate::expand::{expand, CoreResource, ExpandError, GraphCycleError};
use crate::name::NamingError;
use crate::node::{Lookup, ResourceNode};
use crate::reference::{Reference, UnresolvedReferenceError};
use crate::value::{Properties, Value};
use crate::visit::VisitStringsMut;
use indexmap::{IndexMap, IndexSet};

#[derive(Debug, Clone)]
pub struct Plan {
    resources: Vec<CoreResource>,
}

impl Plan {
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn from_roots<'a>(
        roots: impl IntoIterator<Item = &'a ResourceNode>,
    ) -> Result<Self, PlanError> {
        let mut resources = vec![];
        for root in roots {
            resources.extend(expand(root)?);
        }

        let mut names = IndexSet::new();
        for resource in &resources {
            if !names.insert(resource.name.clone()) {
                return Err(NamingError::Duplicate(resource.name.clone()).into());
            }
        }

        for resource in &mut resources {
            for reference in referenced_resources(&resource.node) {
                let Reference::Resource { name, .. } = &reference else {
                    continue;
                };

                if !names.contains(name) {
                    return Err(UnresolvedReferenceError::UnknownResource {
                        placeholder: reference.to_string(),
                        resource: name.clone(),
                    }
                    .into());
                }

                if resource.node.options.add_dependency(name) {
                    tracing::debug!(resource = %resource.name, dependency = %name, "implicit dependency");
                }
            }

            if let Some(dependency) = resource
                .node
                .options
                .dependencies()
                .find(|dependency| !names.contains(dependency))
            {
                return Err(PlanError::UnknownDependency {
                    resource: resource.name.clone(),
                    dependency,
                });
            }
        }

        let resources = order(resources)?;
        Ok(Self { resources })
    }

    pub fn resources(&self) -> &[CoreResource] {
        &self.resources
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|r| r.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&CoreResource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Resource placeholders in a node's projected properties, lookup id and textual options
fn referenced_resources(node: &ResourceNode) -> Vec<Reference> {
    let mut found = vec![];
    let mut collect = |s: &str| {
        found.extend(
            Reference::find_all(s).filter(|r| matches!(r, Reference::Resource { .. })),
        );
    };

    let mut properties = node.properties();
    properties.visit_strings_mut(&mut |leaf: &mut Value| {
        if let Some(s) = leaf.as_str() {
            collect(s);
        }
    });

    if let Some(lookup) = &node.lookup {
        collect(&lookup.id);
    }

    let options = &node.options;
    for text in options.provider.iter().chain(&options.parent).chain(&options.aliases) {
        collect(text.as_str());
    }

    found
}

/// Stable topological order: repeatedly take the earliest resource whose dependencies are placed
fn order(resources: Vec<CoreResource>) -> Result<Vec<CoreResource>, GraphCycleError> {
    let positions: IndexMap<&str, usize> = resources
        .iter()
        .enumerate()
        .map(|(index, r)| (r.name.as_str(), index))
        .collect();

    let dependencies: Vec<Vec<usize>> = resources
        .iter()
        .map(|r| {
            r.node
                .options
                .dependencies()
                .filter_map(|d| positions.get(d.as_str()).copied())
                .collect()
        })
        .collect();

    let mut placed = vec![false; resources.len()];
    let mut order = Vec::with_capacity(resources.len());
    while order.len() < resources.len() {
        let next = (0..resources.len())
            .find(|&index| !placed[index] && dependencies[index].iter().all(|&d| placed[d]));

        let Some(next) = next else {
            return Err(find_cycle(&resources, &dependencies, &placed));
        };

        if order.len() != next {
            tracing::debug!(resource = %resources[next].name, "moved after its dependencies");
        }
        placed[next] = true;
        order.push(next);
    }

    let mut slots: Vec<Option<CoreResource>> = resources.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect())
}

/// Follows unplaced dependencies until a resource repeats
///
/// Only called when every unplaced resource has at least one unplaced dependency.
fn find_cycle(
    resources: &[CoreResource],
    dependencies: &[Vec<usize>],
    placed: &[bool],
) -> GraphCycleError {
    let mut path: Vec<usize> = vec![];
    let mut current = placed.iter().position(|p| !p);

    while let Some(index) = current {
        if let Some(start) = path.iter().position(|&p| p == index) {
            let mut cycle: Vec<String> = path[start..]
                .iter()
                .map(|&p| resources[p].name.clone())
                .collect();
            cycle.push(resources[index].name.clone());
            return GraphCycleError::new(cycle);
        }

        path.push(index);
        current = dependencies[index].iter().copied().find(|&d| !placed[d]);
    }

    GraphCycleError::new(path.iter().map(|&p| resources[p].name.clone()).collect())
}

impl serde::Serialize for Plan {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.resources.iter().map(PlanEntry::from))
    }
}

#[derive(serde::Serialize)]
struct PlanEntry<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    type_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lookup: Option<&'a Lookup>,
    #[serde(skip_serializing_if = "Properties::is_empty")]
    properties: Properties,
}

impl<'a> From<&'a CoreResource> for PlanEntry<'a> {
    fn from(resource: &'a CoreResource) -> Self {
        Self {
            name: &resource.name,
            type_id: resource.node.type_id(),
            provider: resource.node.options.provider.as_deref(),
            depends_on: resource.node.options.dependencies().collect(),
            lookup: resource.node.lookup.as_ref(),
            properties: resource.node.properties(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error(transparent)]
    Naming(#[from] NamingError),
    #[error(transparent)]
    Cycle(#[from] GraphCycleError),
    #[error(transparent)]
    Reference(#[from] UnresolvedReferenceError),
    #[error("resource `{resource}` depends on `{dependency}`, which is not part of the deployment")]
    UnknownDependency { resource: String, dependency: String },
}

impl From<ExpandError> for PlanError {
    fn from(value: ExpandError) -> Self {
        match value {
            ExpandError::Naming(e) => e.into(),
            ExpandError::Cycle(e) => e.into(),
        }
    }
}
