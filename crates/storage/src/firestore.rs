//! Firestore REST adapter.
//!
//! The hosted backend keeps per-user documents under
//! `users/{uid}/medals/{medalId}` with an aggregate counter at
//! `users/{uid}/stats/medals`, and reading/exercise documents under sibling
//! subcollections. This adapter speaks the Firestore REST v1 surface:
//! `listDocuments` for collection reads and `PATCH` with an `updateMask` for
//! set-with-merge writes.

use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use yachay_core::model::{BookId, ExerciseId, MedalId, ReadingPosition, UserId};

use crate::repository::{
    ExerciseResult, MedalRecord, MedalRepository, MedalStats, ProgressRepository, RemoteStore,
    StoreError, parse_kind, score_from_i64,
};

const BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Connection settings for the hosted document store.
#[derive(Clone, Debug)]
pub struct FirestoreConfig {
    pub project_id: String,
    /// OAuth2/Firebase ID token presented as a bearer token.
    pub id_token: String,
}

impl FirestoreConfig {
    /// Reads `YACHAY_FIRESTORE_PROJECT` and `YACHAY_FIRESTORE_TOKEN`.
    /// Returns `None` when either is missing or blank, so callers can fall
    /// back to a local store.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let project_id = env::var("YACHAY_FIRESTORE_PROJECT").ok()?;
        let id_token = env::var("YACHAY_FIRESTORE_TOKEN").ok()?;
        if project_id.trim().is_empty() || id_token.trim().is_empty() {
            return None;
        }
        Some(Self {
            project_id,
            id_token,
        })
    }
}

#[derive(Clone)]
pub struct FirestoreStore {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreStore {
    #[must_use]
    pub fn new(config: FirestoreConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn documents_root(&self) -> String {
        format!(
            "{BASE_URL}/projects/{}/databases/(default)/documents",
            self.config.project_id
        )
    }

    fn collection_url(&self, user: &UserId, collection: &str) -> String {
        format!("{}/users/{}/{collection}", self.documents_root(), user)
    }

    fn document_url(&self, user: &UserId, collection: &str, id: &str) -> String {
        format!("{}/{id}", self.collection_url(user, collection))
    }

    async fn get_document(&self, url: &str) -> Result<Option<Value>, StoreError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.id_token)
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::Connection(format!(
                "GET {url} returned {}",
                response.status()
            )));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Some(body))
    }

    /// Reads every page of a `listDocuments` response, following
    /// `nextPageToken` until the server stops returning one.
    async fn list_collection(&self, url: &str) -> Result<Vec<Value>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(url).bearer_auth(&self.config.id_token);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let response = request
                .send()
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?;

            if !response.status().is_success() {
                return Err(StoreError::Connection(format!(
                    "GET {url} returned {}",
                    response.status()
                )));
            }
            let body: Value = response
                .json()
                .await
                .map_err(|e| StoreError::Serialization(e.to_string()))?;

            documents.extend(page_documents(&body));
            match next_page_token(&body) {
                Some(token) => page_token = Some(token.to_owned()),
                None => return Ok(documents),
            }
        }
    }

    async fn merge_document(
        &self,
        url: &str,
        fields: Value,
        mask: &[&str],
    ) -> Result<(), StoreError> {
        let mut request = self
            .client
            .patch(url)
            .bearer_auth(&self.config.id_token)
            .json(&json!({ "fields": fields }));
        for path in mask {
            request = request.query(&[("updateMask.fieldPaths", *path)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Connection(format!(
                "PATCH {url} returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

impl RemoteStore {
    /// Build a `RemoteStore` backed by the Firestore REST API.
    #[must_use]
    pub fn firestore(config: FirestoreConfig) -> Self {
        let store = FirestoreStore::new(config);
        let medals: Arc<dyn MedalRepository> = Arc::new(store.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(store);
        Self { medals, progress }
    }
}

//
// ─── FIELD VALUE ENCODING ──────────────────────────────────────────────────────
//

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

fn integer_value(v: i64) -> Value {
    // Firestore integers travel as strings.
    json!({ "integerValue": v.to_string() })
}

fn timestamp_value(t: DateTime<Utc>) -> Value {
    json!({ "timestampValue": t.to_rfc3339() })
}

fn get_string(fields: &Value, key: &str) -> Result<String, StoreError> {
    fields
        .get(key)
        .and_then(|v| v.get("stringValue"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| StoreError::Serialization(format!("missing string field: {key}")))
}

fn get_integer(fields: &Value, key: &str) -> Result<i64, StoreError> {
    fields
        .get(key)
        .and_then(|v| v.get("integerValue"))
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| StoreError::Serialization(format!("missing integer field: {key}")))
}

fn get_timestamp(fields: &Value, key: &str) -> Result<DateTime<Utc>, StoreError> {
    let raw = fields
        .get(key)
        .and_then(|v| v.get("timestampValue"))
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Serialization(format!("missing timestamp field: {key}")))?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(format!("bad timestamp in {key}: {e}")))
}

fn get_timestamp_opt(fields: &Value, key: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
    if fields.get(key).is_none() {
        return Ok(None);
    }
    get_timestamp(fields, key).map(Some)
}

/// Documents carried by one `listDocuments` page. An empty collection comes
/// back without a `documents` key at all.
fn page_documents(body: &Value) -> Vec<Value> {
    body.get("documents")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Continuation token for the next `listDocuments` page, if any. The server
/// signals the last page by omitting the token (or sending an empty one).
fn next_page_token(body: &Value) -> Option<&str> {
    body.get("nextPageToken")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
}

/// Last path segment of a document resource name
/// (`projects/…/documents/users/u1/medals/quiz_b1` → `quiz_b1`).
fn document_id(document: &Value) -> Result<String, StoreError> {
    document
        .get("name")
        .and_then(Value::as_str)
        .and_then(|name| name.rsplit('/').next())
        .map(ToOwned::to_owned)
        .ok_or_else(|| StoreError::Serialization("document has no name".into()))
}

fn medal_fields(record: &MedalRecord) -> Value {
    let mut fields = json!({
        "category": string_value(record.category.as_str()),
        "title": string_value(&record.title),
        "description": string_value(&record.description),
        "earnedAt": timestamp_value(record.earned_at),
    });
    if let Some(synced_at) = record.synced_at {
        fields["syncedAt"] = timestamp_value(synced_at);
    }
    fields
}

fn decode_medal(document: &Value) -> Result<MedalRecord, StoreError> {
    let fields = document
        .get("fields")
        .ok_or_else(|| StoreError::Serialization("document has no fields".into()))?;
    let category_raw = get_string(fields, "category")?;
    Ok(MedalRecord {
        id: MedalId::new(document_id(document)?),
        category: category_raw
            .parse()
            .map_err(|_| StoreError::Serialization(format!("invalid category: {category_raw}")))?,
        title: get_string(fields, "title")?,
        description: get_string(fields, "description")?,
        earned_at: get_timestamp(fields, "earnedAt")?,
        synced_at: get_timestamp_opt(fields, "syncedAt")?,
    })
}

//
// ─── REPOSITORY IMPLS ──────────────────────────────────────────────────────────
//

#[async_trait]
impl MedalRepository for FirestoreStore {
    async fn list_medals(&self, user: &UserId) -> Result<Vec<MedalRecord>, StoreError> {
        let documents = self
            .list_collection(&self.collection_url(user, "medals"))
            .await?;
        let mut records = Vec::with_capacity(documents.len());
        for document in &documents {
            records.push(decode_medal(document)?);
        }
        records.sort_by_key(|r| r.earned_at);
        Ok(records)
    }

    async fn merge_medal(&self, user: &UserId, record: &MedalRecord) -> Result<(), StoreError> {
        let url = self.document_url(user, "medals", record.id.as_str());
        let mask: &[&str] = if record.synced_at.is_some() {
            &["category", "title", "description", "earnedAt", "syncedAt"]
        } else {
            &["category", "title", "description", "earnedAt"]
        };
        self.merge_document(&url, medal_fields(record), mask).await
    }

    async fn get_stats(&self, user: &UserId) -> Result<Option<MedalStats>, StoreError> {
        let url = self.document_url(user, "stats", "medals");
        let Some(document) = self.get_document(&url).await? else {
            return Ok(None);
        };
        let fields = document
            .get("fields")
            .ok_or_else(|| StoreError::Serialization("stats document has no fields".into()))?;
        let count = get_integer(fields, "count")?;
        Ok(Some(MedalStats {
            count: u32::try_from(count)
                .map_err(|_| StoreError::Serialization(format!("invalid count: {count}")))?,
            updated_at: get_timestamp(fields, "updatedAt")?,
        }))
    }

    async fn put_stats(&self, user: &UserId, stats: &MedalStats) -> Result<(), StoreError> {
        let url = self.document_url(user, "stats", "medals");
        let fields = json!({
            "count": integer_value(i64::from(stats.count)),
            "updatedAt": timestamp_value(stats.updated_at),
        });
        self.merge_document(&url, fields, &["count", "updatedAt"])
            .await
    }
}

#[async_trait]
impl ProgressRepository for FirestoreStore {
    async fn upsert_reading_position(
        &self,
        user: &UserId,
        book: &BookId,
        position: &ReadingPosition,
    ) -> Result<(), StoreError> {
        let url = self.document_url(user, "reading", book.as_str());
        let fields = json!({
            "currentUnit": integer_value(i64::from(position.current_unit)),
            "totalUnits": integer_value(i64::from(position.total_units)),
            "lastAccessed": timestamp_value(position.last_accessed),
        });
        self.merge_document(&url, fields, &["currentUnit", "totalUnits", "lastAccessed"])
            .await
    }

    async fn get_reading_position(
        &self,
        user: &UserId,
        book: &BookId,
    ) -> Result<Option<ReadingPosition>, StoreError> {
        let url = self.document_url(user, "reading", book.as_str());
        let Some(document) = self.get_document(&url).await? else {
            return Ok(None);
        };
        let fields = document
            .get("fields")
            .ok_or_else(|| StoreError::Serialization("reading document has no fields".into()))?;
        let current = get_integer(fields, "currentUnit")?;
        let total = get_integer(fields, "totalUnits")?;
        Ok(Some(ReadingPosition {
            current_unit: u32::try_from(current)
                .map_err(|_| StoreError::Serialization(format!("invalid currentUnit: {current}")))?,
            total_units: u32::try_from(total)
                .map_err(|_| StoreError::Serialization(format!("invalid totalUnits: {total}")))?,
            last_accessed: get_timestamp(fields, "lastAccessed")?,
        }))
    }

    async fn upsert_exercise_result(
        &self,
        user: &UserId,
        result: &ExerciseResult,
    ) -> Result<(), StoreError> {
        let url = self.document_url(user, "exercises", result.exercise_id.as_str());
        let fields = json!({
            "kind": string_value(result.kind.as_str()),
            "score": integer_value(i64::from(result.score)),
            "completedAt": timestamp_value(result.completed_at),
        });
        self.merge_document(&url, fields, &["kind", "score", "completedAt"])
            .await
    }

    async fn list_exercise_results(&self, user: &UserId) -> Result<Vec<ExerciseResult>, StoreError> {
        let documents = self
            .list_collection(&self.collection_url(user, "exercises"))
            .await?;
        let mut results = Vec::with_capacity(documents.len());
        for document in &documents {
            let fields = document
                .get("fields")
                .ok_or_else(|| StoreError::Serialization("exercise document has no fields".into()))?;
            let kind_raw = get_string(fields, "kind")?;
            results.push(ExerciseResult {
                exercise_id: ExerciseId::new(document_id(document)?),
                kind: parse_kind(&kind_raw)?,
                score: score_from_i64(get_integer(fields, "score")?)?,
                completed_at: get_timestamp(fields, "completedAt")?,
            });
        }
        results.sort_by_key(|r| r.completed_at);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yachay_core::model::MedalCategory;
    use yachay_core::time::fixed_now;

    fn record() -> MedalRecord {
        MedalRecord {
            id: MedalId::new("quiz_kuntur"),
            category: MedalCategory::Quiz,
            title: "Reading expert".into(),
            description: "desc".into(),
            earned_at: fixed_now(),
            synced_at: Some(fixed_now()),
        }
    }

    #[test]
    fn medal_fields_round_trip() {
        let encoded = medal_fields(&record());
        let document = json!({
            "name": "projects/p/databases/(default)/documents/users/u1/medals/quiz_kuntur",
            "fields": encoded,
        });
        assert_eq!(decode_medal(&document).unwrap(), record());
    }

    #[test]
    fn unsynced_medal_omits_synced_at() {
        let mut unsynced = record();
        unsynced.synced_at = None;
        let fields = medal_fields(&unsynced);
        assert!(fields.get("syncedAt").is_none());
    }

    #[test]
    fn document_id_takes_last_segment() {
        let document = json!({ "name": "projects/p/databases/(default)/documents/users/u1/stats/medals" });
        assert_eq!(document_id(&document).unwrap(), "medals");
    }

    #[test]
    fn urls_nest_under_the_user() {
        let store = FirestoreStore::new(FirestoreConfig {
            project_id: "demo".into(),
            id_token: "token".into(),
        });
        let user = UserId::new("u1");
        assert_eq!(
            store.collection_url(&user, "medals"),
            "https://firestore.googleapis.com/v1/projects/demo/databases/(default)/documents/users/u1/medals"
        );
        assert_eq!(
            store.document_url(&user, "stats", "medals"),
            "https://firestore.googleapis.com/v1/projects/demo/databases/(default)/documents/users/u1/stats/medals"
        );
    }

    #[test]
    fn paged_listings_are_followed_until_the_token_stops() {
        let page1 = json!({
            "documents": [{ "name": "users/u1/medals/m1" }],
            "nextPageToken": "t1",
        });
        let page2 = json!({
            "documents": [{ "name": "users/u1/medals/m2" }],
        });

        assert_eq!(next_page_token(&page1), Some("t1"));
        assert_eq!(next_page_token(&page2), None);
        // An empty token also ends the walk.
        assert_eq!(next_page_token(&json!({ "nextPageToken": "" })), None);

        let mut documents = page_documents(&page1);
        documents.extend(page_documents(&page2));
        assert_eq!(documents.len(), 2);

        // An empty collection has no `documents` key at all.
        assert!(page_documents(&json!({})).is_empty());
    }

    #[test]
    fn integer_values_travel_as_strings() {
        let v = integer_value(42);
        assert_eq!(v["integerValue"], "42");
        let fields = json!({ "count": v });
        assert_eq!(get_integer(&fields, "count").unwrap(), 42);
    }
}
