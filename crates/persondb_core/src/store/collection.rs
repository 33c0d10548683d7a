//! Collection handle over the `documents` table.
//!
//! # Invariants
//! - Every statement is scoped to one `collection` value.
//! - Multi-document writes run inside one transaction.
//! - `find_one_and_update` and `find_by_id_and_remove` are single statements
//!   returning the post-image and pre-image respectively.

use super::query::{FieldUpdate, Filter, FindOptions, ID_FIELD};
use super::{Document, StoreError, StoreResult};
use log::debug;
use rusqlite::types::Value as SqlValue;
use rusqlite::{
    ffi, params, params_from_iter, Connection, Row, Transaction, TransactionBehavior,
};
use serde_json::Value;

/// Borrowed handle to one named collection.
pub struct Collection<'conn> {
    conn: &'conn Connection,
    name: String,
}

impl<'conn> Collection<'conn> {
    pub fn new(conn: &'conn Connection, name: impl Into<String>) -> Self {
        Self {
            conn,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts one document keyed by its `id` field.
    pub fn insert_one(&self, document: &Document) -> StoreResult<()> {
        insert_on(self.conn, &self.name, document)
    }

    /// Inserts all documents or none.
    ///
    /// The first failing document aborts the batch and rolls back every
    /// insert made before it.
    pub fn insert_many(&self, documents: &[Document]) -> StoreResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for document in documents {
            insert_on(&tx, &self.name, document)?;
        }
        tx.commit()?;
        debug!(
            "event=insert_many module=store status=ok collection={} count={}",
            self.name,
            documents.len()
        );
        Ok(())
    }

    /// Returns matching documents after sort, limit and projection.
    pub fn find(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>> {
        if let Some(projection) = &options.projection {
            projection.check()?;
        }

        let mut binds = vec![SqlValue::Text(self.name.clone())];
        let mut sql = String::from("SELECT id, body FROM documents WHERE collection = ?");
        sql.push_str(&filter.to_sql(&mut binds)?);
        sql.push_str(&options.to_sql(&mut binds)?);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            let document = parse_document_row(row)?;
            documents.push(match &options.projection {
                Some(projection) => projection.apply(document),
                None => document,
            });
        }
        Ok(documents)
    }

    /// Returns the earliest inserted match, if any.
    pub fn find_one(&self, filter: &Filter) -> StoreResult<Option<Document>> {
        let options = FindOptions::default().limit(1);
        Ok(self.find(filter, &options)?.into_iter().next())
    }

    pub fn find_by_id(&self, id: &str) -> StoreResult<Option<Document>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, body FROM documents WHERE collection = ?1 AND id = ?2;")?;
        let mut rows = stmt.query(params![self.name, id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_document_row(row)?)),
            None => Ok(None),
        }
    }

    /// Overwrites the whole stored body of the document sharing `id`.
    ///
    /// Returns `false` when no such document exists.
    pub fn replace_one(&self, document: &Document) -> StoreResult<bool> {
        let id = document_id(document)?;
        let body = serde_json::to_string(document)?;
        let changed = self.conn.execute(
            "UPDATE documents
             SET body = ?1, updated_at = CAST(unixepoch('subsec') * 1000 AS INTEGER)
             WHERE collection = ?2 AND id = ?3;",
            params![body, self.name, id],
        )?;
        Ok(changed > 0)
    }

    /// Applies `updates` to the first match and returns the updated document.
    pub fn find_one_and_update(
        &self,
        filter: &Filter,
        updates: &[FieldUpdate],
    ) -> StoreResult<Option<Document>> {
        let mut binds = Vec::new();
        let mut set_expr = String::from("json_set(body");
        for update in updates {
            update.bind(&mut binds)?;
            set_expr.push_str(", ?, ?");
        }
        set_expr.push(')');

        binds.push(SqlValue::Text(self.name.clone()));
        let mut sql = format!(
            "UPDATE documents
             SET body = {set_expr}, updated_at = CAST(unixepoch('subsec') * 1000 AS INTEGER)
             WHERE rowid = (
                SELECT rowid FROM documents WHERE collection = ?"
        );
        sql.push_str(&filter.to_sql(&mut binds)?);
        sql.push_str(" ORDER BY created_at ASC, rowid ASC LIMIT 1) RETURNING id, body;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_document_row(row)?)),
            None => Ok(None),
        }
    }

    /// Deletes one document and returns its body as it was before deletion.
    pub fn find_by_id_and_remove(&self, id: &str) -> StoreResult<Option<Document>> {
        let mut stmt = self.conn.prepare(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2 RETURNING id, body;",
        )?;
        let mut rows = stmt.query(params![self.name, id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_document_row(row)?)),
            None => Ok(None),
        }
    }

    /// Deletes every match and returns how many documents were removed.
    pub fn delete_many(&self, filter: &Filter) -> StoreResult<usize> {
        let mut binds = vec![SqlValue::Text(self.name.clone())];
        let mut sql = String::from("DELETE FROM documents WHERE collection = ?");
        sql.push_str(&filter.to_sql(&mut binds)?);
        let deleted = self.conn.execute(&sql, params_from_iter(binds))?;
        debug!(
            "event=delete_many module=store status=ok collection={} deleted={}",
            self.name, deleted
        );
        Ok(deleted)
    }

    pub fn count(&self, filter: &Filter) -> StoreResult<u64> {
        let mut binds = vec![SqlValue::Text(self.name.clone())];
        let mut sql = String::from("SELECT COUNT(*) FROM documents WHERE collection = ?");
        sql.push_str(&filter.to_sql(&mut binds)?);
        let count = self
            .conn
            .query_row(&sql, params_from_iter(binds), |row| row.get::<_, i64>(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn insert_on(conn: &Connection, collection: &str, document: &Document) -> StoreResult<()> {
    let id = document_id(document)?;
    let body = serde_json::to_string(document)?;
    conn.execute(
        "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3);",
        params![collection, id, body],
    )
    .map_err(|err| match err.sqlite_error() {
        Some(failure) if failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
            StoreError::DuplicateId(id.to_string())
        }
        _ => StoreError::Sqlite(err),
    })?;
    Ok(())
}

fn document_id(document: &Document) -> StoreResult<&str> {
    match document.get(ID_FIELD) {
        Some(Value::String(id)) if !id.is_empty() => Ok(id),
        _ => Err(StoreError::MissingId),
    }
}

fn parse_document_row(row: &Row<'_>) -> StoreResult<Document> {
    let id: String = row.get("id")?;
    let body: String = row.get("body")?;
    match serde_json::from_str::<Value>(&body)? {
        Value::Object(document) => Ok(document),
        _ => Err(StoreError::MalformedDocument { id }),
    }
}
