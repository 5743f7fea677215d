//! Concrete resource kinds
//!
//! | kind | type id | key | implicit children |
//! |---|---|---|---|
//! | [SqlWarehouse] | `sql-warehouse` | `name` | [Permissions] if `permissions` is set |
//! | [WorkspaceFile] | `workspace-file` | `path` without extension | [Permissions] if `permissions` is set |
//! | [User] | `user` | `user_name` | |
//! | [Permissions] | `permissions` | | |
mod permissions;
mod user;
mod warehouse;
mod workspace_file;

pub use permissions::{Permission, Permissions};
pub use user::User;
pub use warehouse::{
    ClusterSize, SqlWarehouse, WarehouseChannel, WarehouseCustomTag, WarehouseTags,
};
pub use workspace_file::{WorkspaceFile, WorkspaceFileError};

/// A resource kind that can be declared in a stack document
pub trait Kind: crate::node::Resource + serde::de::DeserializeOwned + 'static {
    const KIND_NAME: &'static str;
}
