//! Postgres-backed document store.
//!
//! Each collection is a table `(id TEXT PRIMARY KEY, doc JSONB NOT NULL)`.
//! Secondary unique indexes are expression indexes over `doc->>'field'`, named
//! after the [`UniqueIndex`] they implement so duplicate-key failures can be
//! traced back to the index that fired.
//!
//! ## Error Mapping
//!
//! | PostgreSQL code | StoreError |
//! |---|---|
//! | `23505` unique violation | `DuplicateKey` (index = constraint name) |
//! | `40001` / `40P01` / `55P03` | `WriteConflict` |
//! | anything else | `Backend` |
//!
//! Acquisition stamps the lock field with `UPDATE … RETURNING`, so the row
//! lock is held until the transaction ends; a concurrent acquirer blocks
//! behind it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{Span, instrument};

use super::{
    BulkWriteResult, Clause, Collection, Document, DocumentStore, Filter, ID_FIELD, LOCK_FIELD, StoreError,
    StoreTransaction, UniqueIndex, WriteOp,
};

#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: Arc<PgPool>,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error(None, "connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create every collection table and unique index if missing.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for collection in Collection::ALL {
            for statement in schema_sql(collection) {
                sqlx::query(&statement)
                    .execute(&*self.pool)
                    .await
                    .map_err(|e| map_sqlx_error(Some(collection), "migrate", e))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(None, "begin_transaction", e))?;
        Ok(Box::new(PostgresTransaction { tx: Some(tx) }))
    }

    #[instrument(skip(self, collection, filter), fields(collection = %collection), err)]
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let (sql, binds) = select_sql(collection, filter, Some(1))?;
        let row = bind_all(sqlx::query(&sql), binds)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(Some(collection), "find_one", e))?;
        row.map(|r| doc_from_row(collection, &r)).transpose()
    }
}

pub struct PostgresTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PostgresTransaction {
    fn tx(&mut self) -> Result<&mut Transaction<'static, Postgres>, StoreError> {
        self.tx.as_mut().ok_or(StoreError::TransactionClosed)
    }
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    #[instrument(skip(self, collection, filter), fields(collection = %collection), err)]
    async fn find_one(&mut self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let (sql, binds) = select_sql(collection, filter, Some(1))?;
        let tx = self.tx()?;
        let row = bind_all(sqlx::query(&sql), binds)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error(Some(collection), "find_one", e))?;
        row.map(|r| doc_from_row(collection, &r)).transpose()
    }

    #[instrument(skip(self, collection, filter), fields(collection = %collection, found = tracing::field::Empty), err)]
    async fn find_many(&mut self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let (sql, binds) = select_sql(collection, filter, None)?;
        let tx = self.tx()?;
        let rows = bind_all(sqlx::query(&sql), binds)
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error(Some(collection), "find_many", e))?;

        Span::current().record("found", rows.len());
        rows.iter().map(|r| doc_from_row(collection, r)).collect()
    }

    #[instrument(skip(self, collection, token), fields(collection = %collection), err)]
    async fn acquire(&mut self, collection: Collection, id: &str, token: &str) -> Result<Option<Document>, StoreError> {
        let sql = acquire_sql(collection);
        let tx = self.tx()?;
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(Value::String(token.to_string()))
            .bind(vec![LOCK_FIELD.to_string()])
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error(Some(collection), "acquire", e))?;
        row.map(|r| doc_from_row(collection, &r)).transpose()
    }

    #[instrument(skip(self, collection, ops), fields(collection = %collection, ops = ops.len()), err)]
    async fn bulk_write(&mut self, collection: Collection, ops: Vec<WriteOp>) -> Result<BulkWriteResult, StoreError> {
        let tx = self.tx()?;
        let mut result = BulkWriteResult::default();

        for op in ops {
            match op {
                WriteOp::InsertOne { document } => {
                    let id = document
                        .get(ID_FIELD)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| StoreError::Serialization {
                            collection,
                            message: format!("document without string `{ID_FIELD}`"),
                        })?;
                    sqlx::query(&insert_sql(collection))
                        .bind(id)
                        .bind(Value::Object(document))
                        .execute(&mut **tx)
                        .await
                        .map_err(|e| map_sqlx_error(Some(collection), "insert_one", e))?;
                    result.inserted += 1;
                }
                WriteOp::UpdateOne { id, set, unset } => {
                    let done = sqlx::query(&update_sql(collection))
                        .bind(id)
                        .bind(Value::Object(set))
                        .bind(unset)
                        .execute(&mut **tx)
                        .await
                        .map_err(|e| map_sqlx_error(Some(collection), "update_one", e))?;
                    result.modified += done.rows_affected() as usize;
                }
                WriteOp::DeleteOne { id } => {
                    let done = sqlx::query(&delete_sql(collection))
                        .bind(id)
                        .execute(&mut **tx)
                        .await
                        .map_err(|e| map_sqlx_error(Some(collection), "delete_one", e))?;
                    result.deleted += done.rows_affected() as usize;
                }
            }
        }

        Ok(result)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::TransactionClosed)?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(None, "commit_transaction", e))
    }

    async fn abort(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::TransactionClosed)?;
        tx.rollback()
            .await
            .map_err(|e| map_sqlx_error(None, "rollback", e))
    }

    fn is_open(&self) -> bool {
        self.tx.is_some()
    }
}

/// A value bound to a positional parameter.
#[derive(Debug, Clone, PartialEq)]
enum Bind {
    Text(String),
    TextArray(Vec<String>),
}

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>,
    binds: Vec<Bind>,
) -> sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments> {
    for bind in binds {
        query = match bind {
            Bind::Text(s) => query.bind(s),
            Bind::TextArray(v) => query.bind(v),
        };
    }
    query
}

/// `doc->>'field'` renders scalars as text: strings unquoted, everything else
/// in its JSON spelling.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn field_expr(field: &str) -> Result<String, StoreError> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreError::Backend(format!("illegal field name `{field}`")));
    }
    if field == ID_FIELD {
        Ok(ID_FIELD.to_string())
    } else {
        Ok(format!("doc->>'{field}'"))
    }
}

fn select_sql(collection: Collection, filter: &Filter, limit: Option<u32>) -> Result<(String, Vec<Bind>), StoreError> {
    let mut sql = format!("SELECT doc FROM {}", collection.name());
    let mut binds = Vec::with_capacity(filter.clauses().len());

    for (i, clause) in filter.clauses().iter().enumerate() {
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        let n = i + 1;
        match clause {
            Clause::Eq(field, value) => {
                sql.push_str(&format!("{} = ${n}", field_expr(field)?));
                binds.push(Bind::Text(as_text(value)));
            }
            Clause::In(field, values) => {
                sql.push_str(&format!("{} = ANY(${n})", field_expr(field)?));
                binds.push(Bind::TextArray(values.iter().map(as_text).collect()));
            }
        }
    }

    sql.push_str(" ORDER BY id");
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    Ok((sql, binds))
}

fn insert_sql(collection: Collection) -> String {
    format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", collection.name())
}

fn update_sql(collection: Collection) -> String {
    format!(
        "UPDATE {} SET doc = (doc || $2::jsonb) - $3::text[] WHERE id = $1",
        collection.name()
    )
}

fn delete_sql(collection: Collection) -> String {
    format!("DELETE FROM {} WHERE id = $1", collection.name())
}

fn acquire_sql(collection: Collection) -> String {
    format!(
        "UPDATE {} SET doc = jsonb_set(doc, $3::text[], $2::jsonb, true) WHERE id = $1 RETURNING doc",
        collection.name()
    )
}

fn schema_sql(collection: Collection) -> Vec<String> {
    let table = collection.name();
    let id_index = collection.id_index();
    let mut statements = vec![format!(
        "CREATE TABLE IF NOT EXISTS {table} (id TEXT CONSTRAINT {} PRIMARY KEY, doc JSONB NOT NULL)",
        id_index.name
    )];
    statements.extend(collection.unique_indexes()[1..].iter().map(|index| unique_index_sql(table, index)));
    statements
}

fn unique_index_sql(table: &str, index: &UniqueIndex) -> String {
    let columns = index
        .fields
        .iter()
        .map(|f| format!("(doc->>'{f}')"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE UNIQUE INDEX IF NOT EXISTS {} ON {table} ({columns})", index.name)
}

fn doc_from_row(collection: Collection, row: &sqlx::postgres::PgRow) -> Result<Document, StoreError> {
    let value: Value = row.try_get("doc").map_err(|e| StoreError::Serialization {
        collection,
        message: e.to_string(),
    })?;
    match value {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::Serialization {
            collection,
            message: format!("expected object, found {other}"),
        }),
    }
}

fn map_sqlx_error(collection: Option<Collection>, operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match (db_err.code().as_deref(), collection) {
                (Some("23505"), Some(collection)) => StoreError::DuplicateKey {
                    collection,
                    index: db_err.constraint().unwrap_or("unknown").to_string(),
                },
                (Some("40001" | "40P01" | "55P03"), _) => StoreError::WriteConflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn select_builds_text_comparisons() {
        let filter = Filter::eq("status", "pending").and_eq("author_id", "u1");
        let (sql, binds) = select_sql(Collection::AddMovieContributions, &filter, None).unwrap();
        assert_eq!(
            sql,
            "SELECT doc FROM add_movie_contributions WHERE doc->>'status' = $1 AND doc->>'author_id' = $2 ORDER BY id"
        );
        assert_eq!(binds, vec![Bind::Text("pending".into()), Bind::Text("u1".into())]);
    }

    #[test]
    fn select_by_ids_uses_primary_key_and_any() {
        let filter = Filter::any_of(ID_FIELD, vec![json!("a"), json!("b")]);
        let (sql, binds) = select_sql(Collection::Persons, &filter, Some(1)).unwrap();
        assert_eq!(sql, "SELECT doc FROM persons WHERE id = ANY($1) ORDER BY id LIMIT 1");
        assert_eq!(binds, vec![Bind::TextArray(vec!["a".into(), "b".into()])]);
    }

    #[test]
    fn non_string_values_bind_as_json_text() {
        let (_, binds) = select_sql(Collection::Roles, &Filter::eq("is_main", true), None).unwrap();
        assert_eq!(binds, vec![Bind::Text("true".into())]);
    }

    #[test]
    fn hostile_field_names_are_refused() {
        let filter = Filter::eq("x' OR '1'='1", "y");
        assert!(select_sql(Collection::Users, &filter, None).is_err());
    }

    #[test]
    fn schema_names_indexes_after_unique_index() {
        let statements = schema_sql(Collection::Writers);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("CONSTRAINT writers_id PRIMARY KEY"));
        assert_eq!(
            statements[1],
            "CREATE UNIQUE INDEX IF NOT EXISTS writers_person_movie_writing ON writers \
             ((doc->>'person_id'), (doc->>'movie_id'), (doc->>'writing'))"
        );
    }

    #[test]
    fn update_merges_set_and_strips_unset() {
        assert_eq!(
            update_sql(Collection::Movies),
            "UPDATE movies SET doc = (doc || $2::jsonb) - $3::text[] WHERE id = $1"
        );
    }
}
