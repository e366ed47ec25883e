use async_trait::async_trait;

use tablekit_core::{Record, Result};

use super::Collection;
use crate::model::Model;

/// Entity-specific behavior plugged into the generic collection engine.
///
/// `before_create` runs ahead of attribute validation and may reject the item. The after hooks
/// run once the primary write has succeeded; they cannot fail the operation and are expected to
/// log their own errors.
#[async_trait]
pub trait CollectionExtension: Send + Sync {
    /// Entities this extension writes to besides its own.
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    async fn before_create(&self, _collection: &Collection, _item: &Record) -> Result<()> {
        Ok(())
    }

    async fn after_create(&self, _collection: &Collection, _created: &Model) {}

    /// Called once per removed key, with the key attributes as given by the caller.
    async fn after_remove(&self, _collection: &Collection, _keys: &Record) {}
}

/// Extension with no entity-specific behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtension;

impl CollectionExtension for NoExtension {}
