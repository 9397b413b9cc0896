//! Core domain logic for Trellis layout and menu trees.
//! Path addressing, ordering reconciliation and document persistence live here.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod registry;
pub mod repo;
pub mod service;
pub mod tree;

pub use config::{AdminConfig, ConfigError, ParticleDefinition};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::attributes::Attributes;
pub use model::document::{Document, DocumentKind};
pub use model::node::{Child, Node, NodeKind, NodePatch, PatchError};
pub use model::path::{NodePath, PathError};
pub use reconcile::{OrderedItem, Ordering, OrderingReconciler, ReconcileError, Submission};
pub use registry::layout::LayoutRegistry;
pub use registry::menu::MenuItemRegistry;
pub use registry::{DefaultsProvider, NoDefaults, NodeRegistry, RegistryError};
pub use repo::document_repo::{DocumentStore, SqliteDocumentStore, StoreError, StoreResult};
pub use service::layout_service::LayoutService;
pub use service::menu_service::{MenuItemView, MenuLevel, MenuService};
pub use service::ServiceError;
pub use tree::path_tree::PathTree;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
