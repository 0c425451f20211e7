use async_trait::async_trait;
use spotmap_core::error::{Result, SpotmapError};
use spotmap_core::models::{EntityKind, LocationId, Page, RemoteQuery, TextMatch, WireLocation};
use sqlx::{Postgres, QueryBuilder};

use super::PostgresStore;
use crate::ports::LocationStore;

/// Escape `%`, `_` and `\` so the needle matches literally inside ILIKE
pub fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, text_match: Option<&TextMatch>) {
    let Some(text_match) = text_match.filter(|m| !m.columns.is_empty()) else {
        return;
    };

    let pattern = format!("%{}%", escape_like(&text_match.needle));
    builder.push(" WHERE (");
    let mut columns = builder.separated(" OR ");
    for column in &text_match.columns {
        columns.push(format_args!("t.{} ILIKE ", column));
        columns.push_bind_unseparated(pattern.clone());
    }
    builder.push(")");
}

/// Page query: filter, order with NULLs last, then LIMIT/OFFSET
pub fn render_select(query: &RemoteQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT to_jsonb(t) AS row FROM ");
    builder.push(query.collection).push(" t");
    push_filter(&mut builder, query.text_match.as_ref());

    if !query.order.is_empty() {
        builder.push(" ORDER BY ");
        let mut order = builder.separated(", ");
        for clause in &query.order {
            order.push(format_args!(
                "t.{} {} NULLS LAST",
                clause.column,
                clause.direction.as_sql()
            ));
        }
    }

    builder.push(" LIMIT ").push_bind(query.range.limit() as i64);
    builder.push(" OFFSET ").push_bind(query.range.offset() as i64);
    builder
}

/// Count of every row matching the filter, ignoring the range
pub fn render_count(query: &RemoteQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM ");
    builder.push(query.collection).push(" t");
    push_filter(&mut builder, query.text_match.as_ref());
    builder
}

fn store_error(action: &str, err: sqlx::Error) -> SpotmapError {
    SpotmapError::Store(format!("Failed to {}: {}", action, err))
}

#[async_trait]
impl LocationStore for PostgresStore {
    async fn fetch_page(&self, query: &RemoteQuery) -> Result<Page> {
        let mut select = render_select(query);
        let values: Vec<serde_json::Value> = select
            .build_query_scalar()
            .fetch_all(self.pool())
            .await
            .map_err(|e| SpotmapError::fetch(query.kind, e))?;

        let mut count = render_count(query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(|e| SpotmapError::fetch(query.kind, e))?;

        let rows = values
            .into_iter()
            .map(serde_json::from_value::<WireLocation>)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!(
            collection = query.collection,
            rows = rows.len(),
            total,
            "Fetched page"
        );

        Ok(Page { rows, total_count: total.max(0) as u64 })
    }

    async fn set_availability(
        &self,
        kind: EntityKind,
        id: &LocationId,
        available: bool,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET available = $1, updated_at = now() WHERE id::text = $2",
            kind.collection()
        );
        let result = sqlx::query(&sql)
            .bind(available)
            .bind(id.to_string())
            .execute(self.pool())
            .await
            .map_err(|e| store_error("update availability", e))?;

        if result.rows_affected() == 0 {
            return Err(SpotmapError::NotFound { kind, id: id.to_string() });
        }
        Ok(())
    }

    async fn update_point(&self, kind: EntityKind, id: &LocationId, literal: &str) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET location = ST_GeogFromText($1), updated_at = now() WHERE id::text = $2",
            kind.collection()
        );
        let result = sqlx::query(&sql)
            .bind(literal)
            .bind(id.to_string())
            .execute(self.pool())
            .await
            .map_err(|e| store_error("update location", e))?;

        if result.rows_affected() == 0 {
            return Err(SpotmapError::NotFound { kind, id: id.to_string() });
        }
        Ok(())
    }

    async fn delete_location(
        &self,
        kind: EntityKind,
        id: &LocationId,
    ) -> Result<Option<WireLocation>> {
        let sql = format!(
            "DELETE FROM {} AS t WHERE t.id::text = $1 RETURNING to_jsonb(t)",
            kind.collection()
        );
        let deleted: Option<serde_json::Value> = sqlx::query_scalar(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| store_error("delete location", e))?;

        Ok(deleted.map(serde_json::from_value).transpose()?)
    }
}
