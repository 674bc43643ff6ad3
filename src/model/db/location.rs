use mongodb::{bson::doc, options::FindOptions};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Coll;

/// Reference data: a state and the cities in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub state: String,
    #[serde(default)]
    pub cities: Vec<String>,
}

impl Coll<Location> {
    /// Every known state, in alphabetical order.
    pub async fn list_states(&self) -> Result<Vec<String>> {
        let options = FindOptions::builder().sort(doc! {"state": 1}).build();
        let states = self
            .find(None, options)
            .await?
            .map_ok(|location| location.state)
            .try_collect::<Vec<_>>()
            .await?;
        if states.is_empty() {
            return Err(Error::not_found("Nenhum estado cadastrado."));
        }
        Ok(states)
    }

    /// The cities of `state`, in alphabetical order.
    pub async fn list_cities(&self, state: &str) -> Result<Vec<String>> {
        let state = state.trim().to_uppercase();
        let mut location = self
            .find_one(doc! {"state": state.as_str()}, None)
            .await?
            .ok_or_else(|| Error::not_found(format!("Nenhuma cidade cadastrada para {state}.")))?;
        location.cities.sort();
        Ok(location.cities)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[backend_test]
    async fn states_are_sorted(locations: Coll<Location>) {
        locations
            .insert_many([Location::example2(), Location::example()], None)
            .await
            .unwrap();
        let states = locations.list_states().await.unwrap();
        assert_eq!(states, vec!["AL", "PE"]);
    }

    #[backend_test]
    async fn no_states(locations: Coll<Location>) {
        let result = locations.list_states().await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[backend_test]
    async fn cities_are_sorted(locations: Coll<Location>) {
        locations
            .insert_one(Location::example(), None)
            .await
            .unwrap();
        let cities = locations.list_cities("al").await.unwrap();
        assert_eq!(cities, vec!["ARAPIRACA", "MACEIÓ", "PENEDO"]);

        let missing = locations.list_cities("SP").await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }
}
