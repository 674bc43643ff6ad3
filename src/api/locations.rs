use rocket::{serde::json::Json, Route};

use crate::error::Result;
use crate::model::{db::location::Location, mongodb::Coll};

pub fn routes() -> Vec<Route> {
    routes![states, cities]
}

#[get("/estados")]
async fn states(locations: Coll<Location>) -> Result<Json<Vec<String>>> {
    Ok(Json(locations.list_states().await?))
}

#[get("/estados/<state>/cidades")]
async fn cities(state: &str, locations: Coll<Location>) -> Result<Json<Vec<String>>> {
    Ok(Json(locations.list_cities(state).await?))
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::asynchronous::Client};

    use super::*;

    #[backend_test(seed_locations)]
    async fn list_states(client: Client) {
        let response = client.get(uri!(states)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let states = response.into_json::<Vec<String>>().await.unwrap();
        assert_eq!(states, vec!["AL", "PE"]);
    }

    #[backend_test(seed_locations)]
    async fn list_cities(client: Client) {
        let response = client.get(uri!(cities("pe"))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let cities = response.into_json::<Vec<String>>().await.unwrap();
        assert_eq!(cities, vec!["OLINDA", "RECIFE"]);

        let response = client.get(uri!(cities("SP"))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn no_locations(client: Client) {
        let response = client.get(uri!(states)).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }
}
