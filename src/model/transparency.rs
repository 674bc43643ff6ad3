//! How complete a candidate's self-service profile is.
//!
//! A profile has three sections: a biography, at least one proposal and at
//! least one contact. The score is the fraction of them that are filled in.

use crate::model::db::candidate::CandidateCore;

const SECTIONS: f64 = 3.0;

/// Score a profile, in `[0, 1]`.
pub fn score(candidate: &CandidateCore) -> f64 {
    let filled = [
        !candidate.biography.trim().is_empty(),
        !candidate.proposals.is_empty(),
        !candidate.contacts.is_empty(),
    ]
    .into_iter()
    .filter(|filled| *filled)
    .count();
    filled as f64 / SECTIONS
}
