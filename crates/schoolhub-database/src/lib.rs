//! # schoolhub-database
//!
//! PostgreSQL data access for SchoolHub: the connection gateway, filter
//! clause composition, query templates, the row scanner, batched relation
//! loading, batch execution and the repositories built from them.

pub mod batch;
pub mod connection;
pub mod error;
pub mod filter;
pub mod migration;
pub mod record;
pub mod relation;
pub mod repositories;
pub mod repository;
pub mod template;

#[cfg(test)]
mod test_support;

pub use batch::{BatchExecutor, BatchReport, Statement};
pub use connection::{DatabasePool, Gateway, Intent, Operation, SessionMode};
pub use filter::{ArgList, Clause, FilterSpec, compose};
pub use record::{AuxColumns, ParentKey, Record, Scanned, Total};
pub use relation::{PgRelation, RelationEdge, RelationSource, Stitch};
pub use repository::EntityRepository;
pub use template::QueryTemplate;
