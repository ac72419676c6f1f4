use serde::{Deserialize, Serialize};

use crate::domain::City;

/// Storage schema of one user's city log: a single document holding the
/// whole list under a `cities` field, keyed by the user id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitiesDocument {
    #[serde(default)]
    pub cities: Vec<City>,
}
