use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    candidate::{Candidate, NewCandidate},
    location::Location,
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// Candidature collections
const CANDIDATURES: &str = "candidatures";
impl MongoCollection for Candidate {
    const NAME: &'static str = CANDIDATURES;
}
impl MongoCollection for NewCandidate {
    const NAME: &'static str = CANDIDATURES;
}

// Location collection
const LOCATIONS: &str = "locations";
impl MongoCollection for Location {
    const NAME: &'static str = LOCATIONS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Candidature collection: one lookup key for edits, one for public pages.
    let email_index = IndexModel::builder()
        .keys(doc! {"email": 1, "year": 1})
        .options(unique.clone())
        .build();
    let sequential_index = IndexModel::builder()
        .keys(doc! {"sequencial_candidate": 1, "year": 1})
        .options(unique.clone())
        .build();
    // Default search order.
    let search_index = IndexModel::builder()
        .keys(doc! {"year": 1, "state": 1, "city": 1, "transparency": -1})
        .build();
    Coll::<Candidate>::from_db(db)
        .create_indexes([email_index, sequential_index, search_index], None)
        .await?;

    // Location collection.
    let state_index = IndexModel::builder()
        .keys(doc! {"state": 1})
        .options(unique)
        .build();
    Coll::<Location>::from_db(db)
        .create_index(state_index, None)
        .await?;

    Ok(())
}
