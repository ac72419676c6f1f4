use shared::domain::{City, CityId};

/// Snapshot of the cities feature: the loaded list, the selected record,
/// the in-flight flag, and the last rejection message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitiesState {
    pub cities: Vec<City>,
    pub is_loading: bool,
    pub current_city: Option<City>,
    /// Text of the most recent rejection; empty until an operation fails.
    /// Later successes leave it in place, so consumers gate on `is_loading`
    /// and fresh events rather than on this field being empty.
    pub error: String,
}

/// One step of the cities state machine. `Loading` opens an operation and
/// every other variant closes one.
#[derive(Debug, Clone, PartialEq)]
pub enum CitiesEvent {
    Loading,
    CitiesLoaded(Vec<City>),
    CityLoaded(City),
    CityCreated(City),
    CityDeleted(CityId),
    Rejected(String),
}

impl CitiesState {
    /// Applies one event and returns the next state. Pure: no I/O, no
    /// clocks, nothing but the old state and the event.
    pub fn apply(mut self, event: CitiesEvent) -> CitiesState {
        match event {
            CitiesEvent::Loading => {
                self.is_loading = true;
            }
            CitiesEvent::CitiesLoaded(cities) => {
                self.is_loading = false;
                self.cities = cities;
            }
            CitiesEvent::CityLoaded(city) => {
                self.is_loading = false;
                self.current_city = Some(city);
            }
            CitiesEvent::CityCreated(city) => {
                self.is_loading = false;
                self.cities.push(city.clone());
                self.current_city = Some(city);
            }
            CitiesEvent::CityDeleted(id) => {
                self.is_loading = false;
                self.cities.retain(|city| city.id != id);
                // Deletion always drops the selection, even when the removed
                // record was not the selected one.
                self.current_city = None;
            }
            CitiesEvent::Rejected(message) => {
                self.is_loading = false;
                self.error = message;
            }
        }
        self
    }
}
