use async_trait::async_trait;
use serde_json::Map;
use shared::domain::{City, CityDraft, CityId, UserId};
use shared::error::DirectoryError;
use shared::protocol::CitiesDocument;
use storage::DocumentStore;
use tracing::debug;
use uuid::Uuid;

use crate::directory::CityDirectory;

/// Collection that holds one cities document per user, keyed by user id.
pub const CITIES_COLLECTION: &str = "cities";

/// Adapter over the local document store. The whole per-user list lives in
/// a single document, so every mutation is read-modify-write on that body.
pub struct DocumentCityDirectory {
    store: DocumentStore,
}

impl DocumentCityDirectory {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Reads the user's document, writing an empty one first if this user
    /// has never stored cities before.
    async fn load_or_init(&self, user: &UserId) -> Result<CitiesDocument, DirectoryError> {
        let existing = self
            .store
            .read_document(CITIES_COLLECTION, user.as_str())
            .await
            .map_err(DirectoryError::store)?;

        let Some(body) = existing else {
            let empty = CitiesDocument::default();
            let body = serde_json::to_value(&empty).map_err(DirectoryError::decode)?;
            self.store
                .create_document(CITIES_COLLECTION, user.as_str(), &body)
                .await
                .map_err(DirectoryError::store)?;
            debug!(user = %user, "initialized empty cities document");
            return Ok(empty);
        };

        serde_json::from_value(body).map_err(DirectoryError::decode)
    }

    async fn write_cities(&self, user: &UserId, cities: &[City]) -> Result<(), DirectoryError> {
        let mut fields = Map::new();
        fields.insert(
            "cities".to_string(),
            serde_json::to_value(cities).map_err(DirectoryError::decode)?,
        );
        self.store
            .update_document(CITIES_COLLECTION, user.as_str(), fields)
            .await
            .map_err(DirectoryError::store)
    }
}

#[async_trait]
impl CityDirectory for DocumentCityDirectory {
    async fn list(&self, user: &UserId) -> Result<Vec<City>, DirectoryError> {
        let document = self.load_or_init(user).await?;
        debug!(user = %user, count = document.cities.len(), "document backend listed cities");
        Ok(document.cities)
    }

    async fn get_by_id(
        &self,
        user: &UserId,
        id: &CityId,
    ) -> Result<Option<City>, DirectoryError> {
        let document = self.load_or_init(user).await?;
        Ok(document.cities.into_iter().find(|city| city.id == *id))
    }

    async fn create(&self, user: &UserId, draft: CityDraft) -> Result<City, DirectoryError> {
        let mut document = self.load_or_init(user).await?;
        let city = draft.with_id(CityId::Text(Uuid::new_v4().to_string()));
        document.cities.push(city.clone());
        self.write_cities(user, &document.cities).await?;
        debug!(user = %user, id = %city.id, "document backend created city");
        Ok(city)
    }

    async fn delete(&self, user: &UserId, id: &CityId) -> Result<bool, DirectoryError> {
        let mut document = self.load_or_init(user).await?;
        let before = document.cities.len();
        document.cities.retain(|city| city.id != *id);
        if document.cities.len() == before {
            return Ok(false);
        }

        self.write_cities(user, &document.cities).await?;
        debug!(user = %user, id = %id, "document backend deleted city");
        Ok(true)
    }
}
