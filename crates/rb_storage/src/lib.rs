use std::path::Path;
use std::sync::Arc;

use rb_core::{ArticleStorage, Error, Result};
use tracing::info;

pub mod backends;

pub use backends::*;

/// Builds the named storage backend. `db_path` is only used by `sqlite`.
#[cfg_attr(not(feature = "sqlite"), allow(unused_variables))]
pub async fn create_storage(kind: &str, db_path: &Path) -> Result<Arc<dyn ArticleStorage>> {
    match kind {
        "memory" => {
            info!("💾 Using in-memory article storage");
            Ok(Arc::new(InMemoryStorage::new()))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            info!("💾 Using SQLite article storage at {}", db_path.display());
            Ok(Arc::new(SQLiteStorage::new_with_path(db_path).await?))
        }
        other => Err(Error::Configuration(format!(
            "Unsupported storage backend: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage("memory", Path::new("unused.db")).await.unwrap();
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_backend() {
        let result = create_storage("mongo", Path::new("unused.db")).await;
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_create_sqlite_storage_uses_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("articles.db");
        let storage = create_storage("sqlite", &db_path).await.unwrap();
        assert!(storage.list().await.unwrap().is_empty());
        assert!(db_path.exists());
    }

    #[cfg(not(feature = "sqlite"))]
    #[tokio::test]
    async fn test_sqlite_requires_feature() {
        let result = create_storage("sqlite", Path::new("unused.db")).await;
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
