use std::sync::Arc;

use async_trait::async_trait;
use shared::domain::{CityDraft, CityId, UserId};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

pub mod directory;
pub mod document_directory;
pub mod rest_directory;
pub mod state;

pub use directory::{CityDirectory, MissingCityDirectory};
pub use document_directory::{DocumentCityDirectory, CITIES_COLLECTION};
pub use rest_directory::{RestCityDirectory, DEFAULT_REST_BASE_URL};
pub use state::{CitiesEvent, CitiesState};

/// User-facing rejection texts. Backends report rich errors to the log; the
/// state only ever carries one of these.
const LOAD_ERROR_TEXT: &str = "There was an error loading data...";
const SEND_ERROR_TEXT: &str = "There was an error sending data...";
const DELETE_ERROR_TEXT: &str = "There was an error deleting city...";

/// Consumer-facing contract of the cities container. Operations never fail
/// at the call site: rejections become state and a `Rejected` event.
#[async_trait]
pub trait CitiesHandle: Send + Sync {
    async fn set_active_user(&self, user: Option<UserId>);
    async fn load_cities(&self);
    async fn get_city(&self, id: CityId);
    async fn create_city(&self, draft: CityDraft);
    async fn delete_city(&self, id: CityId);
    async fn state(&self) -> CitiesState;
    fn subscribe_events(&self) -> broadcast::Receiver<CitiesEvent>;
}

/// Client-side state container for the cities feature. Owns the canonical
/// `CitiesState`, serializes every mutation behind one lock, and broadcasts
/// each applied event to subscribers.
pub struct CitiesController {
    directory: Arc<dyn CityDirectory>,
    inner: Mutex<ControllerInner>,
    events: broadcast::Sender<CitiesEvent>,
}

struct ControllerInner {
    state: CitiesState,
    active_user: Option<UserId>,
    /// Bumped on every user switch. Completions stamped with an older value
    /// are dropped instead of applied.
    generation: u64,
}

impl CitiesController {
    pub fn new() -> Arc<Self> {
        Self::new_with_directory(Arc::new(MissingCityDirectory))
    }

    pub fn new_with_directory(directory: Arc<dyn CityDirectory>) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        Arc::new(Self {
            directory,
            inner: Mutex::new(ControllerInner {
                state: CitiesState::default(),
                active_user: None,
                generation: 0,
            }),
            events,
        })
    }

    /// Switches the signed-in user. In-flight operations for the previous
    /// user keep running but their completions no longer apply; a fresh load
    /// starts for the new user.
    pub async fn set_active_user(self: &Arc<Self>, user: Option<UserId>) {
        {
            let mut guard = self.inner.lock().await;
            guard.generation += 1;
            guard.active_user = user.clone();
        }

        let Some(user) = user else {
            debug!("active user cleared; skipping city load");
            return;
        };

        debug!(user = %user, "active user changed; loading cities");
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            controller.load_cities().await;
        });
    }

    pub async fn active_user(&self) -> Option<UserId> {
        self.inner.lock().await.active_user.clone()
    }

    pub async fn state(&self) -> CitiesState {
        self.inner.lock().await.state.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CitiesEvent> {
        self.events.subscribe()
    }

    /// Loads the full city list for the active user and replaces the state
    /// list with the result.
    pub async fn load_cities(&self) {
        let Some((user, generation)) = self.operation_context().await else {
            warn!("load_cities called with no active user");
            return;
        };
        if !self.dispatch(generation, CitiesEvent::Loading).await {
            return;
        }

        match self.directory.list(&user).await {
            Ok(cities) => {
                debug!(user = %user, count = cities.len(), "cities loaded");
                self.dispatch(generation, CitiesEvent::CitiesLoaded(cities))
                    .await;
            }
            Err(err) => {
                warn!(user = %user, error = %err, "city list failed");
                self.dispatch(generation, CitiesEvent::Rejected(LOAD_ERROR_TEXT.to_string()))
                    .await;
            }
        }
    }

    /// Fetches one city and makes it the selection. Skips the backend
    /// entirely when `id` already matches the selected city.
    pub async fn get_city(&self, id: CityId) {
        let (user, generation) = {
            let guard = self.inner.lock().await;
            if guard
                .state
                .current_city
                .as_ref()
                .is_some_and(|current| current.id == id)
            {
                debug!(id = %id, "city already selected; skipping fetch");
                return;
            }
            let Some(user) = guard.active_user.clone() else {
                warn!(id = %id, "get_city called with no active user");
                return;
            };
            (user, guard.generation)
        };
        if !self.dispatch(generation, CitiesEvent::Loading).await {
            return;
        }

        match self.directory.get_by_id(&user, &id).await {
            Ok(Some(city)) => {
                self.dispatch(generation, CitiesEvent::CityLoaded(city))
                    .await;
            }
            Ok(None) => {
                warn!(user = %user, id = %id, "city not found");
                self.dispatch(generation, CitiesEvent::Rejected(LOAD_ERROR_TEXT.to_string()))
                    .await;
            }
            Err(err) => {
                warn!(user = %user, id = %id, error = %err, "city fetch failed");
                self.dispatch(generation, CitiesEvent::Rejected(LOAD_ERROR_TEXT.to_string()))
                    .await;
            }
        }
    }

    /// Persists a new city for the active user, then appends the stored
    /// record to the list and selects it.
    pub async fn create_city(&self, draft: CityDraft) {
        let Some((user, generation)) = self.operation_context().await else {
            warn!("create_city called with no active user");
            return;
        };
        if !self.dispatch(generation, CitiesEvent::Loading).await {
            return;
        }

        match self.directory.create(&user, draft).await {
            Ok(city) => {
                debug!(user = %user, id = %city.id, "city created");
                self.dispatch(generation, CitiesEvent::CityCreated(city))
                    .await;
            }
            Err(err) => {
                warn!(user = %user, error = %err, "city create failed");
                self.dispatch(generation, CitiesEvent::Rejected(SEND_ERROR_TEXT.to_string()))
                    .await;
            }
        }
    }

    /// Deletes a city by id. The local list is only filtered once the
    /// backend confirms, so a failed delete leaves the record in place.
    pub async fn delete_city(&self, id: CityId) {
        let Some((user, generation)) = self.operation_context().await else {
            warn!(id = %id, "delete_city called with no active user");
            return;
        };
        if !self.dispatch(generation, CitiesEvent::Loading).await {
            return;
        }

        match self.directory.delete(&user, &id).await {
            Ok(existed) => {
                if !existed {
                    debug!(user = %user, id = %id, "delete targeted a missing city");
                }
                self.dispatch(generation, CitiesEvent::CityDeleted(id))
                    .await;
            }
            Err(err) => {
                warn!(user = %user, id = %id, error = %err, "city delete failed");
                self.dispatch(generation, CitiesEvent::Rejected(DELETE_ERROR_TEXT.to_string()))
                    .await;
            }
        }
    }

    /// Active user plus the generation the operation is stamped with, or
    /// `None` when nobody is signed in.
    async fn operation_context(&self) -> Option<(UserId, u64)> {
        let guard = self.inner.lock().await;
        let user = guard.active_user.clone()?;
        Some((user, guard.generation))
    }

    /// Applies `event` and broadcasts it, unless the operation that produced
    /// it started before the most recent user switch.
    async fn dispatch(&self, generation: u64, event: CitiesEvent) -> bool {
        let mut guard = self.inner.lock().await;
        if guard.generation != generation {
            debug!(?event, "dropping completion from a previous user session");
            return false;
        }
        let state = std::mem::take(&mut guard.state);
        guard.state = state.apply(event.clone());
        drop(guard);

        let _ = self.events.send(event);
        true
    }
}

#[async_trait]
impl CitiesHandle for Arc<CitiesController> {
    async fn set_active_user(&self, user: Option<UserId>) {
        CitiesController::set_active_user(self, user).await
    }

    async fn load_cities(&self) {
        CitiesController::load_cities(self).await
    }

    async fn get_city(&self, id: CityId) {
        CitiesController::get_city(self, id).await
    }

    async fn create_city(&self, draft: CityDraft) {
        CitiesController::create_city(self, draft).await
    }

    async fn delete_city(&self, id: CityId) {
        CitiesController::delete_city(self, id).await
    }

    async fn state(&self) -> CitiesState {
        CitiesController::state(self).await
    }

    fn subscribe_events(&self) -> broadcast::Receiver<CitiesEvent> {
        CitiesController::subscribe_events(self)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
