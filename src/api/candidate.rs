use rocket::{serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::candidate::{
        CandidateCard, CandidateDescription, CandidateProfile, ProposalRequestEmail, MAX_RELATED,
    },
    db::candidate::Candidate,
    mongodb::Coll,
};
use crate::Config;

pub fn routes() -> Vec<Route> {
    routes![candidate]
}

#[get("/c/<year>/<id>")]
async fn candidate(
    year: &str,
    id: &str,
    candidates: Coll<Candidate>,
    config: &State<Config>,
) -> Result<Json<CandidateProfile>> {
    let year = year
        .parse::<i32>()
        .map_err(|_| Error::invalid("invalid year"))?;
    let candidate = candidates.find_by_sequential_id(year, id).await?;

    let related = candidates
        .related(&candidate, MAX_RELATED)
        .await?
        .into_iter()
        .map(CandidateCard::from)
        .collect();

    Ok(Json(CandidateProfile {
        candidate: CandidateDescription::from(&candidate.candidate),
        related,
        proposal_request: ProposalRequestEmail::for_candidate(&candidate, config),
    }))
}
