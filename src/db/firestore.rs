// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore implementation of the document store.
//!
//! Parent keys map onto subcollections, so an event of user 42 lives at
//! `users/42/events/{id}`. Queries without a parent run as collection
//! group queries (`all_descendants`). The numeric ID is also written into
//! the document as `doc_id` so query results can be mapped back to keys.

use crate::db::{DocumentStore, EntityId, Fields, Filter, FilterOp, Key};
use crate::error::AppError;
use async_trait::async_trait;

const DOC_ID_FIELD: &str = "doc_id";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Resolve the document path a kind lives under.
    fn parent_path(&self, parent: Option<Key>) -> Result<String, AppError> {
        let client = self.get_client()?;
        match parent {
            Some(key) => client
                .parent_path(key.kind, key.id.to_string())
                .map(|path| path.to_string())
                .map_err(|e| AppError::Database(e.to_string())),
            None => Ok(client.get_documents_path().to_string()),
        }
    }
}

/// Pull the numeric ID back out of a stored document and drop
/// Firestore-injected metadata.
fn split_doc_id(mut fields: Fields) -> Option<(EntityId, Fields)> {
    let id = match fields.remove(DOC_ID_FIELD)? {
        serde_json::Value::String(s) => s.parse().ok()?,
        serde_json::Value::Number(n) => n.as_u64()?,
        _ => return None,
    };
    fields.retain(|name, _| !name.starts_with("_firestore"));
    Some((id, fields))
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    async fn put(
        &self,
        kind: &str,
        parent: Option<Key>,
        id: Option<EntityId>,
        mut fields: Fields,
    ) -> Result<EntityId, AppError> {
        let id = match id {
            Some(id) => id,
            None => crate::db::generate_id()?,
        };
        let parent_path = self.parent_path(parent)?;
        fields.insert(
            DOC_ID_FIELD.to_string(),
            serde_json::Value::String(id.to_string()),
        );

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(kind)
            .document_id(id.to_string())
            .parent(&parent_path)
            .object(&fields)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(id)
    }

    async fn get(
        &self,
        kind: &str,
        id: EntityId,
        parent: Option<Key>,
    ) -> Result<Option<Fields>, AppError> {
        let parent_path = self.parent_path(parent)?;

        let doc: Option<Fields> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(kind)
            .parent(&parent_path)
            .obj()
            .one(id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(doc.and_then(split_doc_id).map(|(_, fields)| fields))
    }

    async fn delete(
        &self,
        kind: &str,
        id: EntityId,
        parent: Option<Key>,
    ) -> Result<(), AppError> {
        let parent_path = self.parent_path(parent)?;

        self.get_client()?
            .fluent()
            .delete()
            .from(kind)
            .document_id(id.to_string())
            .parent(&parent_path)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn query(
        &self,
        kind: &str,
        parent: Option<Key>,
        filters: &[Filter],
    ) -> Result<Vec<(EntityId, Fields)>, AppError> {
        let parent_path = self.parent_path(parent)?;

        let select = self
            .get_client()?
            .fluent()
            .select()
            .from(kind)
            .parent(&parent_path);

        // Kind-wide lookups (sessions by token, sweeps) span every user.
        let select = if parent.is_none() {
            select.all_descendants()
        } else {
            select
        };

        let select = if filters.is_empty() {
            select
        } else {
            let filters = filters.to_vec();
            select.filter(move |q| {
                q.for_all(filters.iter().map(|f| {
                    let field = q.field(f.field.as_str());
                    let value = f.value.clone();
                    match f.op {
                        FilterOp::Equal => field.eq(value),
                        FilterOp::LessThan => field.less_than(value),
                        FilterOp::LessThanOrEqual => field.less_than_or_equal(value),
                        FilterOp::GreaterThan => field.greater_than(value),
                        FilterOp::GreaterThanOrEqual => field.greater_than_or_equal(value),
                    }
                }))
            })
        };

        let docs: Vec<Fields> = select
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let total = docs.len();
        let results: Vec<(EntityId, Fields)> = docs.into_iter().filter_map(split_doc_id).collect();
        if results.len() != total {
            tracing::warn!(
                kind,
                skipped = total - results.len(),
                "Skipped documents without a numeric doc_id"
            );
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn split_doc_id_extracts_id_and_strips_metadata() {
        let fields = json!({
            "doc_id": "123",
            "name": "Birthday",
            "_firestore_id": "123",
        })
        .as_object()
        .cloned()
        .unwrap();

        let (id, fields) = split_doc_id(fields).unwrap();
        assert_eq!(id, 123);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["name"], "Birthday");
    }

    #[test]
    fn split_doc_id_rejects_missing_id() {
        let fields = json!({"name": "x"}).as_object().cloned().unwrap();
        assert!(split_doc_id(fields).is_none());
    }

    #[tokio::test]
    async fn offline_client_reports_database_error() {
        let db = FirestoreDb::new_mock();
        let err = db.get("users", 1, None).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
