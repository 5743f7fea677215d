//! Deployment of a [Plan] through a [Backend]
//!
//! Resources are deployed strictly in plan order. Right before a resource is handed to the backend
//! its placeholders are resolved against the outputs recorded so far. The first failure aborts the
//! run; whatever was deployed before stays recorded.
use crate::backend::{Backend, BackendError};
use crate::expand::CoreResource;
use crate::node::{DeployOptions, ResourceNode};
use crate::plan::{Plan, PlanError};
use crate::reference::{
    resolve_properties, resolve_str, Context, UnresolvedReferenceError, Variables,
};
use crate::store::OutputStore;
use indexmap::IndexMap;

/// Outputs recorded for every deployed resource, if the backend provides them
pub const WELL_KNOWN_OUTPUTS: &[&str] = &["id", "object_id"];

/// Drives one deployment run
///
/// Owns the run's [OutputStore], so two drivers never see each other's outputs.
pub struct DeploymentDriver<'r, B: Backend> {
    backend: &'r mut B,
    variables: &'r Variables,
    outputs: OutputStore,
    handles: IndexMap<String, B::Handle>,
}

impl<'r, B: Backend> DeploymentDriver<'r, B> {
    pub fn new(backend: &'r mut B, variables: &'r Variables) -> Self {
        Self {
            backend,
            variables,
            outputs: OutputStore::default(),
            handles: IndexMap::new(),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(resources = plan.len()))]
    pub fn deploy(&mut self, plan: &Plan) -> Result<(), DeployError> {
        for resource in plan.resources() {
            self.deploy_one(resource)?;
        }

        tracing::info!(
            deployed = ?self.outputs.deployed().collect::<Vec<_>>(),
            "deployment finished"
        );
        Ok(())
    }

    fn deploy_one(&mut self, resource: &CoreResource) -> Result<(), DeployError> {
        let CoreResource { name, node } = resource;
        let type_id = node.type_id();
        let context = Context::new(&self.outputs, self.variables);

        let reference_error = |source| DeployError::Reference {
            resource: name.clone(),
            source,
        };
        let backend_error = |source| DeployError::Backend {
            resource: name.clone(),
            source,
        };

        let handle = match &node.lookup {
            Some(lookup) => {
                let id = resolve_str(&lookup.id, &context)
                    .map_err(reference_error)?
                    .to_template_string();
                tracing::info!(%name, %type_id, %id, "looking up");
                self.backend
                    .lookup(&type_id, &id)
                    .inspect_err(|error| tracing::error!(%name, %error, "lookup failed"))
                    .map_err(backend_error)?
            }
            None => {
                let properties =
                    resolve_properties(&node.properties(), &context).map_err(reference_error)?;
                let options = resolve_options(&node.options, &context).map_err(reference_error)?;
                tracing::info!(%name, %type_id, "creating");
                self.backend
                    .create(&type_id, name, &properties, &options)
                    .inspect_err(|error| {
                        tracing::error!(%name, %error, "backend rejected resource")
                    })
                    .map_err(backend_error)?
            }
        };

        self.outputs.mark_deployed(name);
        for attribute in WELL_KNOWN_OUTPUTS {
            if let Some(value) = self.backend.read_output(&handle, attribute) {
                self.outputs.record(name, attribute, value);
            }
        }
        self.handles.insert(name.clone(), handle);

        Ok(())
    }

    /// Outputs recorded so far
    pub fn outputs(&self) -> &OutputStore {
        &self.outputs
    }

    /// Backend handles by resource name, in deployment order
    pub fn handles(&self) -> &IndexMap<String, B::Handle> {
        &self.handles
    }

    pub fn into_handles(self) -> IndexMap<String, B::Handle> {
        self.handles
    }
}

/// Options as handed to the backend: placeholders substituted, dependencies as plain names
fn resolve_options(
    options: &DeployOptions,
    context: &Context,
) -> Result<DeployOptions, UnresolvedReferenceError> {
    let text = |s: &String| resolve_str(s, context).map(|value| value.to_template_string());

    Ok(DeployOptions {
        depends_on: options.dependencies().collect(),
        provider: options.provider.as_ref().map(text).transpose()?,
        parent: options.parent.as_ref().map(text).transpose()?,
        aliases: options.aliases.iter().map(text).collect::<Result<_, _>>()?,
        ..options.clone()
    })
}

/// Plans and deploys a single root resource with a fresh output store
pub fn deploy<B: Backend>(
    root: &ResourceNode,
    backend: &mut B,
    variables: &Variables,
) -> Result<IndexMap<String, B::Handle>, DeployError> {
    let plan = Plan::from_roots([root])?;
    let mut driver = DeploymentDriver::new(backend, variables);
    driver.deploy(&plan)?;
    Ok(driver.into_handles())
}

#[derive(thiserror::Error, Debug)]
pub enum DeployError {
    #[error("invalid deployment plan")]
    Plan(#[from] PlanError),
    #[error("failed to resolve placeholders of `{resource}`")]
    Reference {
        resource: String,
        #[source]
        source: UnresolvedReferenceError,
    },
    #[error("backend rejected `{resource}`")]
    Backend {
        resource: String,
        #[source]
        source: BackendError,
    },
}
