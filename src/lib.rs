#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use config::{ConfigFairing, DatabaseFairing, MailerFairing};
use logging::LoggerFairing;
use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod mail;
pub mod model;

pub use config::Config;

/// Assemble the server: every fairing and every route.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(MailerFairing)
        .mount("/", api::routes())
}

/// Connect to the database configured for tests.
#[cfg(test)]
async fn db_client() -> mongodb::Client {
    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .expect("Could not connect to the test database")
}

/// A fresh database name, so tests can run in parallel.
#[cfg(test)]
fn database() -> String {
    format!("test{}", rand::random::<u32>())
}

/// A server using the given database and mailer in place of the configured ones.
#[cfg(test)]
async fn rocket_for_db_and_mailer(
    client: mongodb::Client,
    db_name: &str,
    mailer: mail::Mailer,
) -> Rocket<Build> {
    let db = client.database(db_name);
    model::mongodb::ensure_indexes_exist(&db)
        .await
        .expect("Could not create test indexes");
    rocket::build()
        .attach(ConfigFairing)
        .mount("/", api::routes())
        .manage(client)
        .manage(db)
        .manage(mailer)
}
