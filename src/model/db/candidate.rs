use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::{
    bson::{self, doc, to_bson, Bson},
    options::FindOptions,
};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    api::{auth::Subject, pagination::Paginated, search::SearchFilter},
    common::social_network::SocialNetwork,
    mongodb::{is_duplicate_key_error, optional_bson_datetime, Coll, Id},
    transparency,
};

/// One policy position of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub topic: String,
    pub description: String,
}

/// A way of reaching a candidate. `value` is always a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub social_network: SocialNetwork,
    pub value: String,
}

impl Contact {
    /// Create a contact, turning the raw value into a link for the network.
    pub fn new(social_network: SocialNetwork, raw: &str) -> Self {
        Self {
            social_network,
            value: social_network.to_address(raw),
        }
    }
}

/// Core candidature data, as stored in the database.
///
/// Everything but the self-service profile (biography, proposals, contacts,
/// transparency and terms acceptance) comes from the electoral registry
/// import and is never written by this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCore {
    /// Registry identifier, unique per election year.
    #[serde(rename = "sequencial_candidate")]
    pub sequential_id: String,
    /// Lower-cased contact email, unique per election year.
    pub email: String,
    pub year: i32,
    pub name: String,
    pub ballot_name: String,
    pub ballot_number: i64,
    pub party: String,
    /// Registry role code, see [`crate::model::common::role`].
    pub role: String,
    pub gender: String,
    pub city: String,
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub photo_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub biography: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub proposals: Vec<Proposal>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contacts: Vec<Contact>,
    /// Profile completeness in `[0, 1]`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub transparency: f64,
    /// When the candidate accepted the terms of use, if ever.
    #[serde(default, with = "optional_bson_datetime")]
    pub accepted_terms: Option<DateTime<Utc>>,
}

impl CandidateCore {
    /// Whether the candidate may edit their profile.
    pub fn has_accepted_terms(&self) -> bool {
        self.accepted_terms.is_some()
    }

    /// Record that the terms of use were accepted at `now`. Accepting again
    /// keeps the original timestamp. Returns whether anything changed.
    pub fn accept_terms(&mut self, now: DateTime<Utc>) -> bool {
        if self.has_accepted_terms() {
            return false;
        }
        self.accepted_terms = Some(now);
        true
    }

    /// Topics the candidate has proposals for, in order.
    pub fn topics(&self) -> Vec<String> {
        self.proposals
            .iter()
            .map(|proposal| proposal.topic.clone())
            .collect()
    }
}

/// A candidature without an ID.
pub type NewCandidate = CandidateCore;

/// A candidature from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}

/// Older records store empty lists and missing scores as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Emails are stored and compared lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Coll<Candidate> {
    /// Find the candidature registered under `email` for `year`.
    pub async fn find_by_email(&self, email: &str, year: i32) -> Result<Candidate> {
        let email = normalize_email(email);
        let filter = doc! {
            "email": email.as_str(),
            "year": year,
        };
        self.find_one(filter, None).await?.ok_or_else(|| {
            Error::not_found(format!(
                "Não encontramos um cadastro de candidatura através do email {email}. Por favor verifique se o email está correto."
            ))
        })
    }

    /// Find the candidature with the given registry ID for `year`.
    pub async fn find_by_sequential_id(&self, year: i32, sequential_id: &str) -> Result<Candidate> {
        let filter = doc! {
            "sequencial_candidate": sequential_id,
            "year": year,
        };
        self.find_one(filter, None).await?.ok_or_else(|| {
            Error::not_found(format!(
                "Candidatura {sequential_id} não encontrada em {year}."
            ))
        })
    }

    /// Find the candidature an access token was issued for.
    pub async fn find_by_subject(&self, subject: &Subject, year: i32) -> Result<Candidate> {
        match subject {
            Subject::SequentialId(id) => self.find_by_sequential_id(year, id).await,
            Subject::Email(email) => self.find_by_email(email, year).await,
        }
    }

    /// Find one page of candidatures matching every populated field of the
    /// filter, most transparent first.
    pub async fn search(&self, filter: &SearchFilter) -> Result<Paginated<Candidate>> {
        let query = filter.to_document();
        let pagination = filter.pagination();
        let options = FindOptions::builder()
            .sort(doc! {"transparency": -1, "ballot_name": 1})
            .skip(pagination.skip())
            .limit(i64::from(pagination.page_size()))
            .build();

        let items = self
            .find(query.clone(), options)
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        let total = self.count_documents(query, None).await?;

        Ok(pagination.to_paginated(total, items))
    }

    /// Up to `limit` other candidatures running for the same position in the
    /// same city, sharing at least one topic with `candidate`.
    pub async fn related(&self, candidate: &Candidate, limit: u32) -> Result<Vec<Candidate>> {
        if candidate.proposals.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        // Fetch one extra in case the candidate themself is in the page.
        let filter = SearchFilter::related_to(candidate, limit + 1);
        let related = self
            .search(&filter)
            .await?
            .items
            .into_iter()
            .filter(|other| other.sequential_id != candidate.sequential_id)
            .take(limit as usize)
            .collect();
        Ok(related)
    }

    /// Persist the self-service part of a profile. Transparency is always
    /// recomputed here rather than trusted. Concurrent updates to the same
    /// candidature are last-writer-wins.
    pub async fn update_profile(&self, mut candidate: Candidate) -> Result<Candidate> {
        candidate.transparency = transparency::score(&candidate);

        let filter = doc! {
            "email": normalize_email(&candidate.email),
            "year": candidate.year,
        };
        let update = doc! {
            "$set": {
                "biography": candidate.biography.as_str(),
                "proposals": to_bson_or_internal(&candidate.proposals)?,
                "contacts": to_bson_or_internal(&candidate.contacts)?,
                "transparency": candidate.transparency,
                "accepted_terms": candidate.accepted_terms.map(bson::DateTime::from_chrono),
            }
        };

        let result = self.update_one(filter, update, None).await?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!(
                "Não encontramos um cadastro de candidatura através do email {}.",
                candidate.email
            )));
        }
        Ok(candidate)
    }
}

impl Coll<NewCandidate> {
    /// Insert a new candidature, normalizing its email.
    pub async fn insert(&self, mut candidate: NewCandidate) -> Result<Id> {
        candidate.email = normalize_email(&candidate.email);
        candidate.transparency = transparency::score(&candidate);
        let result = self.insert_one(&candidate, None).await.map_err(|err| {
            if is_duplicate_key_error(&err) {
                Error::Conflict(format!(
                    "Candidatura {} ou email {} já cadastrado em {}.",
                    candidate.sequential_id, candidate.email, candidate.year
                ))
            } else {
                err.into()
            }
        })?;
        result
            .inserted_id
            .as_object_id()
            .map(Id::from)
            .ok_or_else(|| Error::internal("Inserted candidature has no object ID"))
    }
}

fn to_bson_or_internal<T: Serialize>(value: &T) -> Result<Bson> {
    to_bson(value).map_err(|err| Error::internal(format!("Failed to serialise profile: {err}")))
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl CandidateCore {
        pub fn example() -> Self {
            Self {
                sequential_id: "270001084455".to_string(),
                email: "fulana@example.com".to_string(),
                year: 2020,
                name: "FULANA DE TAL".to_string(),
                ballot_name: "FULANA".to_string(),
                ballot_number: 55123,
                party: "PSOL".to_string(),
                role: "LM".to_string(),
                gender: "FEMININO".to_string(),
                city: "MACEIÓ".to_string(),
                state: "AL".to_string(),
                photo_url: "https://example.com/fulana.jpg".to_string(),
                biography: String::new(),
                proposals: Vec::new(),
                contacts: Vec::new(),
                transparency: 0.0,
                accepted_terms: None,
            }
        }

        /// A second candidate for the same council seat, with a full profile.
        pub fn example2() -> Self {
            Self {
                sequential_id: "270001084456".to_string(),
                email: "beltrano@example.com".to_string(),
                name: "BELTRANO DA SILVA".to_string(),
                ballot_name: "BELTRANO".to_string(),
                ballot_number: 13456,
                party: "PT".to_string(),
                gender: "MASCULINO".to_string(),
                biography: "Professor da rede pública.".to_string(),
                proposals: vec![Proposal {
                    topic: "educação".to_string(),
                    description: "Mais creches.".to_string(),
                }],
                contacts: vec![Contact::new(SocialNetwork::Instagram, "beltrano")],
                accepted_terms: Some(Utc::now()),
                ..Self::example()
            }
        }

        /// A mayoral candidate.
        pub fn mayor_example() -> Self {
            Self {
                sequential_id: "270001084457".to_string(),
                email: "prefeita@example.com".to_string(),
                name: "CICRANA PREFEITA".to_string(),
                ballot_name: "CICRANA".to_string(),
                ballot_number: 50,
                role: "EM".to_string(),
                proposals: vec![Proposal {
                    topic: "saúde".to_string(),
                    description: "Mais postos de saúde.".to_string(),
                }],
                ..Self::example()
            }
        }

        /// The running mate of [`Self::mayor_example`].
        pub fn vice_mayor_example() -> Self {
            Self {
                sequential_id: "270001084458".to_string(),
                email: "vice@example.com".to_string(),
                name: "JOÃO VICE".to_string(),
                ballot_name: "JOÃO".to_string(),
                ballot_number: 50,
                role: "VEM".to_string(),
                ..Self::example()
            }
        }
    }
}
