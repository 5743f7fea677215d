//! # stackplan - declarative resource graphs
//!
//! Describe cloud resources in stack documents, let `stackplan` work out what has to be created in
//! which order and hand each resource to a provisioning backend.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `stackplan` works internally.
//!
//! ### Terms
//!
//! - a **resource** is anything that implements [node::Resource]: a kind name, a key and a bag of
//!   [value::Properties]
//! - a **node** ([node::ResourceNode]) is a resource plus what the user said about deploying it:
//!   an explicit name, [node::DeployOptions] and maybe a [node::Lookup]
//! - a **core resource** is a node that is actually sent to the backend. Some nodes only exist to
//!   declare others (they are containers) and are never sent themselves.
//! - a **placeholder** is `${resources.<name>.<attribute>}` or `${vars.<name>}` inside a string
//!
//! ### Loading files
//!
//! A stack document is YAML (or JSON) and is parsed into [stack::StackConfig]. `stackplan` can be
//! used with multiple documents. [documents::StackDocuments] keeps all of them and tracks their
//! original source path so errors can point at the file that caused them.
//! At this point the loaded documents only have to match the document layout; the fields of each
//! resource entry are not looked at yet.
//!
//! ### Building nodes
//!
//! see [stack::Stack::new]
//!
//! Documents are merged in load order and every resource entry is deserialized into its kind
//! ([resources]). An entry with a `lookup` skips this step and refers to an existing resource
//! instead.
//!
//! ### Naming
//!
//! see [name::resource_name]
//!
//! Every node gets a deterministic name from its type id and key, e.g. a [resources::SqlWarehouse]
//! named `default` becomes `sql-warehouse-default`. Placeholders in a key are replaced by the name
//! they point at, so names never depend on deployment results.
//!
//! ### Expansion
//!
//! see [expand::expand]
//!
//! **Example**
//!
//! ```yaml
//! warehouses:
//!   - name: default
//!     cluster_size: Small
//!     permissions:
//!       - group_name: users
//!         permission_level: CAN_USE
//! ```
//!
//! | **core resource** | **depends on** | **notable property** |
//! |-------------------|----------------|----------------------|
//! | `sql-warehouse-default` | | |
//! | `permissions-sql-warehouse-default` | `sql-warehouse-default` | `sql_endpoint_id: ${resources.sql-warehouse-default.id}` |
//!
//! A node is walked depth first. Children inherit the provider of their parent and depend on it.
//!
//! ### Planning
//!
//! see [plan::Plan::from_roots]
//!
//! All roots of a stack are expanded and checked together before anything is deployed: names are
//! unique, every placeholder points at a resource of the plan (which also makes it a dependency)
//! and there is no dependency cycle. The resulting order only deviates from the declaration order
//! where a dependency requires it.
//!
//! ### Deployment
//!
//! see [deploy::DeploymentDriver]
//!
//! Resources are deployed one by one in plan order. Right before a resource is handed to the
//! [backend::Backend] its placeholders are substituted ([reference::resolve_properties]) with the
//! outputs recorded so far ([store::OutputStore]) and the stack variables. A placeholder that is
//! the whole string keeps the type of its value; anywhere else the value is spliced in as text.
//!
//! ### Output
//!
//! The plan, the recorded outputs and the calls of [backend::PreviewBackend] serialize via [serde].
//!
pub mod backend;
pub mod deploy;
pub mod documents;
pub mod expand;
pub mod name;
pub mod node;
pub mod plan;
pub mod reference;
pub mod resources;
pub mod stack;
pub mod store;
pub mod value;
mod visit;
