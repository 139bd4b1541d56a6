use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use tokio::sync::RwLock;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found")]
    NotFound,
    #[error("access denied")]
    Forbidden,
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("download token expired")]
    TokenExpired,
    #[error("download token invalid")]
    TokenInvalid,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub owner_id: String,
    pub size: usize,
}

#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Store bytes under a `{collection}/{ownerId}/{filename...}` path,
    /// silently overwriting any existing object.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        owner_id: &str,
        content_type: Option<String>,
    ) -> StorageResult<()>;

    /// Return the object when the requester owns it or is an admin. A missing
    /// path is NotFound before any ownership check.
    async fn fetch(&self, path: &str, requester: &str, is_admin: bool) -> StorageResult<StoredObject>;

    /// Mint an unguessable token redeemable for the path until it expires.
    /// Each call yields an independent token.
    async fn issue_signed_url(
        &self,
        path: &str,
        requester: &str,
        is_admin: bool,
        ttl_minutes: i64,
    ) -> StorageResult<String>;

    /// Redeem a token for its path. Expired tokens are evicted on lookup.
    async fn resolve_signed_url(&self, token: &str) -> StorageResult<String>;

    async fn delete(&self, path: &str, requester: &str, is_admin: bool) -> StorageResult<()>;

    /// List paths under `{collection}/{owner_id}/`.
    async fn list_by_owner(&self, collection: &str, owner_id: &str) -> StorageResult<Vec<String>>;
}

pub fn validate_path(path: &str) -> StorageResult<()> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 3 || segments.iter().any(|segment| segment.is_empty()) {
        return Err(StorageError::InvalidPath(format!(
            "expected collection/owner/filename, got {path:?}"
        )));
    }
    Ok(())
}

struct SignedToken {
    path: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct ObjectState {
    objects: HashMap<String, StoredObject>,
    tokens: HashMap<String, SignedToken>,
}

#[derive(Default)]
pub struct MemoryObjectStore {
    state: RwLock<ObjectState>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

fn check_access(object: &StoredObject, requester: &str, is_admin: bool) -> StorageResult<()> {
    if is_admin || object.owner_id == requester {
        Ok(())
    } else {
        Err(StorageError::Forbidden)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        owner_id: &str,
        content_type: Option<String>,
    ) -> StorageResult<()> {
        validate_path(path)?;

        let size = bytes.len();
        let mut state = self.state.write().await;
        state.objects.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type,
                owner_id: owner_id.to_string(),
                size,
            },
        );
        Ok(())
    }

    async fn fetch(&self, path: &str, requester: &str, is_admin: bool) -> StorageResult<StoredObject> {
        validate_path(path)?;

        let state = self.state.read().await;
        let object = state.objects.get(path).ok_or(StorageError::NotFound)?;
        check_access(object, requester, is_admin)?;
        Ok(object.clone())
    }

    async fn issue_signed_url(
        &self,
        path: &str,
        requester: &str,
        is_admin: bool,
        ttl_minutes: i64,
    ) -> StorageResult<String> {
        validate_path(path)?;

        let mut state = self.state.write().await;
        let object = state.objects.get(path).ok_or(StorageError::NotFound)?;
        check_access(object, requester, is_admin)?;

        let token = Self::generate_token();
        state.tokens.insert(
            token.clone(),
            SignedToken {
                path: path.to_string(),
                expires_at: Utc::now() + Duration::minutes(ttl_minutes),
            },
        );
        Ok(token)
    }

    async fn resolve_signed_url(&self, token: &str) -> StorageResult<String> {
        let mut state = self.state.write().await;
        let entry = state.tokens.get(token).ok_or(StorageError::TokenInvalid)?;

        if Utc::now() >= entry.expires_at {
            state.tokens.remove(token);
            return Err(StorageError::TokenExpired);
        }

        Ok(entry.path.clone())
    }

    async fn delete(&self, path: &str, requester: &str, is_admin: bool) -> StorageResult<()> {
        validate_path(path)?;

        let mut state = self.state.write().await;
        let object = state.objects.get(path).ok_or(StorageError::NotFound)?;
        check_access(object, requester, is_admin)?;
        state.objects.remove(path);
        Ok(())
    }

    async fn list_by_owner(&self, collection: &str, owner_id: &str) -> StorageResult<Vec<String>> {
        let prefix = format!("{collection}/{owner_id}/");
        let state = self.state.read().await;
        let mut paths: Vec<String> = state
            .objects
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .cloned()
            .collect();
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_object(path: &str, owner: &str) -> MemoryObjectStore {
        let store = MemoryObjectStore::new();
        store
            .upload(path, b"contents".to_vec(), owner, Some("text/plain".into()))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn rejects_paths_with_fewer_than_three_segments() {
        let store = MemoryObjectStore::new();
        let result = store.upload("documents/u1", b"x".to_vec(), "u1", None).await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn ownership_matrix_on_fetch() {
        let store = store_with_object("documents/u1/a.txt", "u1").await;

        assert!(store.fetch("documents/u1/a.txt", "u1", false).await.is_ok());
        assert!(matches!(
            store.fetch("documents/u1/a.txt", "u2", false).await,
            Err(StorageError::Forbidden)
        ));
        assert!(store.fetch("documents/u1/a.txt", "u2", true).await.is_ok());
    }

    #[tokio::test]
    async fn missing_path_is_not_found_before_forbidden() {
        let store = MemoryObjectStore::new();
        let result = store.fetch("documents/u1/absent.txt", "u2", false).await;
        assert!(matches!(result, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn upload_overwrites_silently() {
        let store = store_with_object("documents/u1/a.txt", "u1").await;
        store
            .upload("documents/u1/a.txt", b"new".to_vec(), "u1", None)
            .await
            .unwrap();

        let object = store.fetch("documents/u1/a.txt", "u1", false).await.unwrap();
        assert_eq!(object.bytes, b"new");
        assert_eq!(object.size, 3);
    }

    #[tokio::test]
    async fn signed_url_round_trip() {
        let store = store_with_object("documents/u1/a.txt", "u1").await;
        let token = store
            .issue_signed_url("documents/u1/a.txt", "u1", false, 15)
            .await
            .unwrap();

        let path = store.resolve_signed_url(&token).await.unwrap();
        assert_eq!(path, "documents/u1/a.txt");
    }

    #[tokio::test]
    async fn signed_url_requires_ownership() {
        let store = store_with_object("documents/u1/a.txt", "u1").await;
        let result = store
            .issue_signed_url("documents/u1/a.txt", "u2", false, 15)
            .await;
        assert!(matches!(result, Err(StorageError::Forbidden)));
    }

    #[tokio::test]
    async fn each_issue_call_mints_an_independent_token() {
        let store = store_with_object("documents/u1/a.txt", "u1").await;
        let first = store
            .issue_signed_url("documents/u1/a.txt", "u1", false, 15)
            .await
            .unwrap();
        let second = store
            .issue_signed_url("documents/u1/a.txt", "u1", false, 15)
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(store.resolve_signed_url(&first).await.is_ok());
        assert!(store.resolve_signed_url(&second).await.is_ok());
    }

    #[tokio::test]
    async fn expired_tokens_are_evicted_on_lookup() {
        let store = store_with_object("documents/u1/a.txt", "u1").await;
        let token = store
            .issue_signed_url("documents/u1/a.txt", "u1", false, -1)
            .await
            .unwrap();

        assert!(matches!(
            store.resolve_signed_url(&token).await,
            Err(StorageError::TokenExpired)
        ));
        // Evicted: a second lookup no longer knows the token.
        assert!(matches!(
            store.resolve_signed_url(&token).await,
            Err(StorageError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let store = MemoryObjectStore::new();
        assert!(matches!(
            store.resolve_signed_url("deadbeef").await,
            Err(StorageError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn list_is_prefix_filtered_by_owner() {
        let store = MemoryObjectStore::new();
        store
            .upload("verification_docs/u1/bar.pdf", b"a".to_vec(), "u1", None)
            .await
            .unwrap();
        store
            .upload("verification_docs/u1/license.pdf", b"b".to_vec(), "u1", None)
            .await
            .unwrap();
        store
            .upload("verification_docs/u2/other.pdf", b"c".to_vec(), "u2", None)
            .await
            .unwrap();

        let paths = store.list_by_owner("verification_docs", "u1").await.unwrap();
        assert_eq!(
            paths,
            vec![
                "verification_docs/u1/bar.pdf".to_string(),
                "verification_docs/u1/license.pdf".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn delete_enforces_ownership() {
        let store = store_with_object("documents/u1/a.txt", "u1").await;
        assert!(matches!(
            store.delete("documents/u1/a.txt", "u2", false).await,
            Err(StorageError::Forbidden)
        ));

        store.delete("documents/u1/a.txt", "u1", false).await.unwrap();
        assert!(matches!(
            store.fetch("documents/u1/a.txt", "u1", false).await,
            Err(StorageError::NotFound)
        ));
    }
}
