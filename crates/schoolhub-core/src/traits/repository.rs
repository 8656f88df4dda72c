//! Generic repository trait for database access.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::pagination::Page;

/// Generic CRUD repository trait.
///
/// `Filter` is the entity's sparse filter spec. Entity-specific query
/// methods (relation loading, upserts) are defined on the concrete
/// repository structs.
#[async_trait]
pub trait Repository<Entity, Filter>: Send + Sync + 'static
where
    Entity: Send + Sync + 'static,
    Filter: Send + Sync + 'static,
{
    /// Find an entity by its primary key, failing with `NotFound` when absent.
    async fn find_by_id(&self, id: &str) -> AppResult<Entity>;

    /// List entities matching `filter`, with the total match count.
    async fn list(&self, filter: &Filter) -> AppResult<Page<Entity>>;

    /// Create a new entity and return it as stored.
    async fn create(&self, entity: &Entity) -> AppResult<Entity>;

    /// Update an existing entity and return the updated version.
    async fn update(&self, entity: &Entity) -> AppResult<Entity>;

    /// Delete an entity by its primary key. Returns `true` if deleted.
    async fn delete(&self, id: &str) -> AppResult<bool>;
}
