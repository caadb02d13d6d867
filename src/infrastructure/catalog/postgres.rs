use async_trait::async_trait;
use sqlx::types::Json;
use tracing::{debug, info};

use super::{CatalogError, CatalogStore};
use crate::infrastructure::db::pool::DbPool;
use crate::modules::content::model::{ContentItem, ContentStatus, RenditionMap};

/// Catalog rows in a Postgres table with the rendition map held as JSONB.
#[derive(Clone)]
pub struct PgCatalog {
    pool: DbPool,
    table: String,
}

impl PgCatalog {
    pub fn new(pool: DbPool, table: &str) -> Self {
        Self {
            pool,
            table: table.to_string(),
        }
    }

    pub async fn ensure_schema(&self) -> Result<(), CatalogError> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{}" (
                content_id TEXT PRIMARY KEY,
                content_provider_id TEXT NOT NULL,
                url TEXT NOT NULL,
                "status" TEXT NOT NULL,
                res_urls JSONB NOT NULL DEFAULT '{{}}'::jsonb
            )
            "#,
            self.table
        );

        sqlx::query(&ddl).execute(&self.pool).await.map_err(backend)?;

        info!("✅ Postgres catalog ready (table '{}')", self.table);
        Ok(())
    }
}

fn backend(e: sqlx::Error) -> CatalogError {
    CatalogError::Backend(e.to_string())
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn insert(&self, item: &ContentItem) -> Result<(), CatalogError> {
        let sql = format!(
            r#"
            INSERT INTO "{}" (content_id, content_provider_id, url, "status", res_urls)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (content_id) DO UPDATE
            SET content_provider_id = EXCLUDED.content_provider_id,
                url = EXCLUDED.url,
                "status" = EXCLUDED."status",
                res_urls = EXCLUDED.res_urls
            "#,
            self.table
        );

        sqlx::query(&sql)
            .bind(&item.content_id)
            .bind(&item.content_provider_id)
            .bind(&item.url)
            .bind(item.status.as_str())
            .bind(Json(&item.res_urls))
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        debug!(content_id = %item.content_id, "Stored content row in Postgres");
        Ok(())
    }

    async fn update_status_and_renditions(
        &self,
        content_id: &str,
        status: ContentStatus,
        renditions: &RenditionMap,
    ) -> Result<(), CatalogError> {
        let sql = format!(
            r#"UPDATE "{}" SET "status" = $1, res_urls = $2 WHERE content_id = $3"#,
            self.table
        );

        let result = sqlx::query(&sql)
            .bind(status.as_str())
            .bind(Json(renditions))
            .bind(content_id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(content_id.to_string()));
        }

        debug!(content_id, %status, "Updated content row in Postgres");
        Ok(())
    }
}
