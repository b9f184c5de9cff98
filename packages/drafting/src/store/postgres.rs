//! PostgreSQL document store.
//!
//! Production backend over pgvector (ANN) and pg_trgm (lexical) indexes.
//! The schema ships inline and is applied on construction; it is part of
//! the external contract, including the `rrf_score` helper function and
//! the one-profile-per-category constraint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{DraftingError, Result};
use crate::traits::store::{DocumentStore, DraftStore, DraftSummary, StoredDraft};
use crate::types::{ArticleType, Draft, Passage, StyleKind, StyleRecord};

/// Minimum trigram similarity for the lexical lane.
const TRIGRAM_MIN_SIMILARITY: f64 = 0.1;

/// PostgreSQL-backed article store.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and apply the schema.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(storage_err)?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool and apply the schema.
    pub async fn from_pool(pool: PgPool) -> Result<Self> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn run_migrations(&self) -> Result<()> {
        // Extensions first; both must exist for the index DDL below.
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        sqlx::query("CREATE EXTENSION IF NOT EXISTS pg_trgm")
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        sqlx::query(
            r#"
            DO $$ BEGIN
                CREATE TYPE article_category AS ENUM
                    ('ANNOUNCEMENT', 'EVENT_REPORT', 'INTERVIEW', 'CULTURE');
            EXCEPTION WHEN duplicate_object THEN NULL;
            END $$
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE OR REPLACE FUNCTION rrf_score(rank integer, k integer)
            RETURNS double precision
            AS $$ SELECT 1.0 / (rank + k)::double precision $$
            LANGUAGE SQL IMMUTABLE
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                body TEXT NOT NULL,
                attrs JSONB NOT NULL DEFAULT '{}',
                embedding vector(768),
                category article_category NOT NULL,
                source TEXT NOT NULL,
                chunk_index INT NOT NULL DEFAULT 0,
                total_chunks INT NOT NULL DEFAULT 1,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        for ddl in [
            r#"CREATE INDEX IF NOT EXISTS idx_documents_embedding
               ON documents USING hnsw (embedding vector_cosine_ops)"#,
            r#"CREATE INDEX IF NOT EXISTS idx_documents_body_trgm
               ON documents USING gin (body gin_trgm_ops)"#,
            "CREATE INDEX IF NOT EXISTS idx_documents_category ON documents (category)",
            "CREATE INDEX IF NOT EXISTS idx_documents_source ON documents (source)",
            "CREATE INDEX IF NOT EXISTS idx_documents_attrs ON documents USING gin (attrs)",
        ] {
            sqlx::query(ddl).execute(&self.pool).await.ok();
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS style_profiles (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                category article_category NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('profile', 'excerpt')),
                body TEXT NOT NULL,
                embedding vector(768),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        // At most one rulebook per category; excerpts are unconstrained.
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_style_profiles_one_profile
            ON style_profiles (category) WHERE kind = 'profile'
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_style_profiles_embedding
            ON style_profiles USING hnsw (embedding vector_cosine_ops)
            "#,
        )
        .execute(&self.pool)
        .await
        .ok();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS generated_articles (
                id UUID PRIMARY KEY,
                input_material TEXT NOT NULL,
                category article_category NOT NULL,
                content JSONB NOT NULL,
                markdown TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        for ddl in [
            r#"CREATE INDEX IF NOT EXISTS idx_generated_articles_created_at
               ON generated_articles (created_at DESC)"#,
            r#"CREATE INDEX IF NOT EXISTS idx_generated_articles_category
               ON generated_articles (category)"#,
        ] {
            sqlx::query(ddl).execute(&self.pool).await.ok();
        }

        info!("document store schema applied");
        Ok(())
    }

    /// Insert a corpus passage. Exposed for seeding; the production corpus
    /// is written by the external ingester.
    pub async fn insert_passage(&self, passage: &Passage) -> Result<()> {
        let attrs = serde_json::Value::Object(passage.attrs.clone());

        sqlx::query(
            r#"
            INSERT INTO documents
                (id, body, attrs, embedding, category, source, chunk_index, total_chunks)
            VALUES ($1, $2, $3, $4::vector, $5::article_category, $6, $7, $8)
            "#,
        )
        .bind(passage.id)
        .bind(&passage.body)
        .bind(&attrs)
        .bind(passage.embedding.as_ref().map(|e| vector_literal(e)))
        .bind(passage.category.as_str())
        .bind(&passage.source)
        .bind(passage.chunk_index)
        .bind(passage.total_chunks)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    /// Insert or update the style rulebook for a category. Used by the
    /// seeding tool; the partial unique index keys the conflict.
    pub async fn upsert_style_profile(
        &self,
        category: ArticleType,
        body: &str,
        embedding: &[f32],
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO style_profiles (id, category, kind, body, embedding)
            VALUES ($1, $2::article_category, 'profile', $3, $4::vector)
            ON CONFLICT (category) WHERE kind = 'profile' DO UPDATE SET
                body = EXCLUDED.body,
                embedding = EXCLUDED.embedding,
                updated_at = NOW()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category.as_str())
        .bind(body)
        .bind(vector_literal(embedding))
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    /// Insert a style record. The partial unique index rejects a second
    /// profile for the same category.
    pub async fn insert_style_record(&self, record: &StyleRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO style_profiles (id, category, kind, body, embedding)
            VALUES ($1, $2::article_category, $3, $4, $5::vector)
            "#,
        )
        .bind(record.id)
        .bind(record.category.as_str())
        .bind(record.kind.as_str())
        .bind(&record.body)
        .bind(record.embedding.as_ref().map(|e| vector_literal(e)))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DraftingError::Invariant(format!(
                    "style profile already exists for {}",
                    record.category
                )))
            }
            Err(e) => Err(storage_err(e)),
        }
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    #[instrument(skip(self, query_vec), fields(category = %category, limit = limit))]
    async fn vector_search(
        &self,
        query_vec: &[f32],
        category: ArticleType,
        limit: usize,
    ) -> Result<Vec<Passage>> {
        let rows = sqlx::query_as::<_, PassageRow>(
            r#"
            SELECT id, body, attrs, category::text AS category, source,
                   chunk_index, total_chunks, created_at
            FROM documents
            WHERE category = $2::article_category AND embedding IS NOT NULL
            ORDER BY embedding <=> $1::vector
            LIMIT $3
            "#,
        )
        .bind(vector_literal(query_vec))
        .bind(category.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(retrieval_err)?;

        debug!(result_count = rows.len(), "vector search completed");
        rows.into_iter().map(PassageRow::into_passage).collect()
    }

    #[instrument(skip(self), fields(category = %category, limit = limit))]
    async fn trigram_search(
        &self,
        query_text: &str,
        category: ArticleType,
        limit: usize,
    ) -> Result<Vec<Passage>> {
        let rows = sqlx::query_as::<_, PassageRow>(
            r#"
            SELECT id, body, attrs, category::text AS category, source,
                   chunk_index, total_chunks, created_at
            FROM documents
            WHERE category = $2::article_category
              AND similarity(body, $1) > $4
            ORDER BY similarity(body, $1) DESC
            LIMIT $3
            "#,
        )
        .bind(query_text)
        .bind(category.as_str())
        .bind(limit as i64)
        .bind(TRIGRAM_MIN_SIMILARITY)
        .fetch_all(&self.pool)
        .await
        .map_err(retrieval_err)?;

        debug!(result_count = rows.len(), "trigram search completed");
        rows.into_iter().map(PassageRow::into_passage).collect()
    }

    #[instrument(skip(self), fields(category = %category))]
    async fn style_profile(&self, category: ArticleType) -> Result<Option<StyleRecord>> {
        let row = sqlx::query_as::<_, StyleRow>(
            r#"
            SELECT id, category::text AS category, kind, body, created_at, updated_at
            FROM style_profiles
            WHERE category = $1::article_category AND kind = 'profile'
            LIMIT 1
            "#,
        )
        .bind(category.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(retrieval_err)?;

        row.map(StyleRow::into_record).transpose()
    }

    #[instrument(skip(self, query_vec), fields(category = %category, limit = limit))]
    async fn style_excerpts(
        &self,
        query_vec: &[f32],
        category: ArticleType,
        limit: usize,
    ) -> Result<Vec<StyleRecord>> {
        let rows = sqlx::query_as::<_, StyleRow>(
            r#"
            SELECT id, category::text AS category, kind, body, created_at, updated_at
            FROM style_profiles
            WHERE category = $2::article_category
              AND kind = 'excerpt'
              AND embedding IS NOT NULL
            ORDER BY embedding <=> $1::vector
            LIMIT $3
            "#,
        )
        .bind(vector_literal(query_vec))
        .bind(category.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(retrieval_err)?;

        rows.into_iter().map(StyleRow::into_record).collect()
    }
}

#[async_trait]
impl DraftStore for PostgresStore {
    #[instrument(skip(self, input_material, draft), fields(draft_id = %draft.id))]
    async fn save_draft(&self, input_material: &str, draft: &Draft) -> Result<Uuid> {
        let content = serde_json::to_value(draft).map_err(|e| storage_err(Box::new(e)))?;

        sqlx::query(
            r#"
            INSERT INTO generated_articles (id, input_material, category, content, markdown)
            VALUES ($1, $2, $3::article_category, $4, $5)
            "#,
        )
        .bind(draft.id)
        .bind(input_material)
        .bind(draft.category.as_str())
        .bind(&content)
        .bind(draft.to_markdown())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        debug!(draft_id = %draft.id, "draft saved");
        Ok(draft.id)
    }

    async fn list_drafts(&self, limit: usize, offset: usize) -> Result<Vec<DraftSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT id, category::text AS category,
                   COALESCE(content->>'theme', '') AS theme, created_at
            FROM generated_articles
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.into_iter().map(SummaryRow::into_summary).collect()
    }

    async fn get_draft(&self, id: Uuid) -> Result<StoredDraft> {
        let row = sqlx::query_as::<_, StoredRow>(
            r#"
            SELECT id, input_material, category::text AS category,
                   content, markdown, created_at
            FROM generated_articles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        row.ok_or_else(|| DraftingError::NotFound(format!("draft {id}")))?
            .into_stored()
    }

    async fn delete_draft(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM generated_articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(DraftingError::NotFound(format!("draft {id}")));
        }
        Ok(())
    }
}

/// pgvector literal form: `[0.1,0.2,...]`.
fn vector_literal(vector: &[f32]) -> String {
    let mut out = String::with_capacity(vector.len() * 10 + 2);
    out.push('[');
    for (i, v) in vector.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

fn storage_err(e: impl std::error::Error + Send + Sync + 'static) -> DraftingError {
    DraftingError::Storage(Box::new(e))
}

fn retrieval_err(e: sqlx::Error) -> DraftingError {
    DraftingError::Retrieval(e.to_string())
}

#[derive(Debug, FromRow)]
struct PassageRow {
    id: Uuid,
    body: String,
    attrs: serde_json::Value,
    category: String,
    source: String,
    chunk_index: i32,
    total_chunks: i32,
    created_at: DateTime<Utc>,
}

impl PassageRow {
    fn into_passage(self) -> Result<Passage> {
        let attrs = match self.attrs {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };

        Ok(Passage {
            id: self.id,
            body: self.body,
            attrs,
            embedding: None,
            category: self.category.parse()?,
            source: self.source,
            chunk_index: self.chunk_index,
            total_chunks: self.total_chunks,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct StyleRow {
    id: Uuid,
    category: String,
    kind: String,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StyleRow {
    fn into_record(self) -> Result<StyleRecord> {
        Ok(StyleRecord {
            id: self.id,
            category: self.category.parse()?,
            kind: self.kind.parse::<StyleKind>()?,
            body: self.body,
            embedding: None,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    id: Uuid,
    category: String,
    theme: String,
    created_at: DateTime<Utc>,
}

impl SummaryRow {
    fn into_summary(self) -> Result<DraftSummary> {
        Ok(DraftSummary {
            id: self.id,
            category: self.category.parse()?,
            theme: self.theme,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct StoredRow {
    id: Uuid,
    input_material: String,
    category: String,
    content: serde_json::Value,
    markdown: String,
    created_at: DateTime<Utc>,
}

impl StoredRow {
    fn into_stored(self) -> Result<StoredDraft> {
        let draft: Draft = serde_json::from_value(self.content)
            .map_err(|e| DraftingError::Storage(Box::new(e)))?;

        Ok(StoredDraft {
            id: self.id,
            input_material: self.input_material,
            category: self.category.parse()?,
            draft,
            markdown: self.markdown,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[0.5, -1.0, 2.0]), "[0.5,-1,2]");
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[test]
    fn test_trigram_threshold_matches_contract() {
        assert_eq!(TRIGRAM_MIN_SIMILARITY, 0.1);
    }
}
