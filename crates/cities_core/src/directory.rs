use async_trait::async_trait;
use shared::domain::{City, CityDraft, CityId, UserId};
use shared::error::DirectoryError;

/// Capability interface over a city backend. The container only ever talks
/// to this trait; adapters translate the four operations onto whatever wire
/// or storage scheme the backend actually uses.
#[async_trait]
pub trait CityDirectory: Send + Sync {
    /// Every city stored for `user`, in backend order.
    async fn list(&self, user: &UserId) -> Result<Vec<City>, DirectoryError>;

    /// A single city, or `None` when the backend has no record with `id`.
    async fn get_by_id(&self, user: &UserId, id: &CityId)
        -> Result<Option<City>, DirectoryError>;

    /// Persists `draft` and returns it with the id the backend assigned.
    async fn create(&self, user: &UserId, draft: CityDraft) -> Result<City, DirectoryError>;

    /// Removes the record with `id`; `false` when no such record existed.
    async fn delete(&self, user: &UserId, id: &CityId) -> Result<bool, DirectoryError>;
}

/// Placeholder wired in when no backend has been configured. Every call
/// fails, so the container surfaces the misconfiguration as a rejection
/// instead of hanging or silently returning nothing.
pub struct MissingCityDirectory;

#[async_trait]
impl CityDirectory for MissingCityDirectory {
    async fn list(&self, user: &UserId) -> Result<Vec<City>, DirectoryError> {
        Err(DirectoryError::transport(format!(
            "no city backend configured; cannot list cities for user {user}"
        )))
    }

    async fn get_by_id(
        &self,
        _user: &UserId,
        id: &CityId,
    ) -> Result<Option<City>, DirectoryError> {
        Err(DirectoryError::transport(format!(
            "no city backend configured; cannot fetch city {id}"
        )))
    }

    async fn create(&self, user: &UserId, _draft: CityDraft) -> Result<City, DirectoryError> {
        Err(DirectoryError::transport(format!(
            "no city backend configured; cannot create a city for user {user}"
        )))
    }

    async fn delete(&self, _user: &UserId, id: &CityId) -> Result<bool, DirectoryError> {
        Err(DirectoryError::transport(format!(
            "no city backend configured; cannot delete city {id}"
        )))
    }
}
