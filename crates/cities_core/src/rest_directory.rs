use async_trait::async_trait;
use reqwest::StatusCode;
use shared::domain::{City, CityDraft, CityId, UserId};
use shared::error::DirectoryError;
use tracing::debug;

use crate::directory::CityDirectory;

/// Where the placeholder REST backend listens when nothing else is
/// configured.
pub const DEFAULT_REST_BASE_URL: &str = "http://localhost:8000";

/// Adapter over the development REST backend. The backend keeps a single
/// global `/cities` collection, so the signed-in user gates the calls on the
/// client side but never reaches the wire.
pub struct RestCityDirectory {
    http: reqwest::Client,
    base_url: String,
}

impl RestCityDirectory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn cities_url(&self) -> String {
        format!("{}/cities", self.base_url)
    }

    fn city_url(&self, id: &CityId) -> String {
        format!("{}/cities/{id}", self.base_url)
    }
}

impl Default for RestCityDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_REST_BASE_URL)
    }
}

#[async_trait]
impl CityDirectory for RestCityDirectory {
    async fn list(&self, _user: &UserId) -> Result<Vec<City>, DirectoryError> {
        let response = self
            .http
            .get(self.cities_url())
            .send()
            .await
            .map_err(DirectoryError::transport)?;
        if !response.status().is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                status: response.status().as_u16(),
            });
        }

        let cities: Vec<City> = response.json().await.map_err(DirectoryError::decode)?;
        debug!(count = cities.len(), "rest backend listed cities");
        Ok(cities)
    }

    async fn get_by_id(
        &self,
        _user: &UserId,
        id: &CityId,
    ) -> Result<Option<City>, DirectoryError> {
        let response = self
            .http
            .get(self.city_url(id))
            .send()
            .await
            .map_err(DirectoryError::transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                status: response.status().as_u16(),
            });
        }

        let city: City = response.json().await.map_err(DirectoryError::decode)?;
        Ok(Some(city))
    }

    async fn create(&self, _user: &UserId, draft: CityDraft) -> Result<City, DirectoryError> {
        let response = self
            .http
            .post(self.cities_url())
            .json(&draft)
            .send()
            .await
            .map_err(DirectoryError::transport)?;
        if !response.status().is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                status: response.status().as_u16(),
            });
        }

        let city: City = response.json().await.map_err(DirectoryError::decode)?;
        debug!(id = %city.id, "rest backend created city");
        Ok(city)
    }

    async fn delete(&self, _user: &UserId, id: &CityId) -> Result<bool, DirectoryError> {
        let response = self
            .http
            .delete(self.city_url(id))
            .send()
            .await
            .map_err(DirectoryError::transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                status: response.status().as_u16(),
            });
        }

        debug!(id = %id, "rest backend deleted city");
        Ok(true)
    }
}
