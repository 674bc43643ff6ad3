use std::fs;

use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_sdk_sesv2::{
    config::{Credentials, Region},
    Client as SesClient,
};
use chrono::Duration;
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::mail::Mailer;
use crate::model::mongodb::ensure_indexes_exist;

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // non-secrets
    site_url: String,
    election_year: i32,
    access_ttl: u32,
    page_size: u32,
    max_page_size: u32,
    max_proposals: usize,
    max_description_len: usize,
    max_biography_len: usize,
    max_contact_len: usize,
    proposals_required: bool,
    biography_required: bool,
    contact_email: String,
    tags_file: String,
    // secrets
    jwt_secret: String,
    // loaded from `tags_file` once the rest is extracted
    #[serde(skip)]
    tags: Vec<String>,
}

impl Config {
    /// Public URL of the site, used to build magic links.
    pub fn site_url(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }

    /// The election year candidates log in for.
    pub fn election_year(&self) -> i32 {
        self.election_year
    }

    /// Valid lifetime of access tokens, configured in hours.
    pub fn access_ttl(&self) -> Duration {
        Duration::hours(self.access_ttl.into())
    }

    /// Number of candidates per search page unless the caller asks otherwise.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Upper bound for a caller-supplied page size.
    pub fn max_page_size(&self) -> u32 {
        self.max_page_size
    }

    pub fn max_proposals(&self) -> usize {
        self.max_proposals
    }

    pub fn max_description_len(&self) -> usize {
        self.max_description_len
    }

    pub fn max_biography_len(&self) -> usize {
        self.max_biography_len
    }

    pub fn max_contact_len(&self) -> usize {
        self.max_contact_len
    }

    /// Whether a profile update must carry at least one proposal.
    pub fn proposals_required(&self) -> bool {
        self.proposals_required
    }

    /// Whether a profile update must carry a biography.
    pub fn biography_required(&self) -> bool {
        self.biography_required
    }

    /// Address that receives "contact us" messages.
    pub fn contact_email(&self) -> &str {
        &self.contact_email
    }

    /// Issue topics a proposal can be filed under.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Read the newline-delimited tags file, skipping blank lines.
    pub fn load_tags(&mut self) -> std::io::Result<()> {
        let content = fs::read_to_string(&self.tags_file)?;
        self.tags = parse_tags(&content);
        Ok(())
    }
}

fn parse_tags(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// A fairing that loads the application config and the tags list, and puts
/// the result in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let mut config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Load the tags.
        if let Err(e) = config.load_tags() {
            error!("Failed to read tags file `{}`: {e}", config.tags_file);
            return Err(rocket);
        }
        info!("Loaded {} tags", config.tags().len());

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    db_name: String,
    // secrets
    db_uri: String,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// ensures indexes exist, and places both a `Client` and a `Database`
/// into managed state.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&config.db_name);

        // Ensure the required indexes exist.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to create database indexes: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        // Manage the state.
        rocket = rocket.manage(client).manage(db);
        Ok(rocket)
    }
}

/// Configuration for the AWS connection used to send email.
#[derive(Deserialize)]
struct AwsConfig {
    // non-secrets
    aws_region: String,
    aws_access_key_id: String,
    mail_sender: String,
    // secrets
    aws_secret_access_key: String,
}

/// A fairing that loads the AWS config and places a [`Mailer`] into managed
/// state.
pub struct MailerFairing;

#[rocket::async_trait]
impl Fairing for MailerFairing {
    fn info(&self) -> Info {
        Info {
            name: "AWS SES",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<AwsConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load AWS config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        // Construct the connection.
        let aws_config = SdkConfig::builder()
            .region(Region::new(config.aws_region))
            .credentials_provider(SharedCredentialsProvider::new(Credentials::new(
                config.aws_access_key_id,
                config.aws_secret_access_key,
                None,
                None,
                "rocket config",
            )))
            .behavior_version(BehaviorVersion::latest())
            .build();
        let client = SesClient::new(&aws_config);
        info!("Loaded Amazon SES config, sending as {}", config.mail_sender);

        // Manage the state.
        rocket = rocket.manage(Mailer::new(client, config.mail_sender));
        Ok(rocket)
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Config {
        pub fn example() -> Self {
            Self {
                site_url: "https://candidatos.example/".to_string(),
                election_year: 2020,
                access_ttl: 25,
                page_size: 20,
                max_page_size: 100,
                max_proposals: 5,
                max_description_len: 500,
                max_biography_len: 500,
                max_contact_len: 100,
                proposals_required: true,
                biography_required: true,
                contact_email: "contato@candidatos.example".to_string(),
                tags_file: "tags.txt".to_string(),
                jwt_secret: "hgde34jnbvcdewscvbhytrewq5678kncxcnbvcxswqw34fvbkuytr".to_string(),
                tags: parse_tags("educação\nsaúde\nsegurança\nmeio ambiente\n\n"),
            }
        }
    }
}
