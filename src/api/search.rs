use rocket::{http::CookieJar, serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::{
        candidate::CandidateCard,
        pagination::Paginated,
        search::{SearchCookie, SearchFilter, SearchParams},
    },
    db::candidate::Candidate,
    mongodb::Coll,
};
use crate::Config;

pub fn routes() -> Vec<Route> {
    routes![search]
}

#[get("/?<params..>")]
async fn search(
    params: SearchParams,
    cookies: &CookieJar<'_>,
    candidates: Coll<Candidate>,
    config: &State<Config>,
) -> Result<Json<Paginated<CandidateCard>>> {
    let remembered = SearchCookie::from_jar(cookies);
    let (filter, cookie) = SearchFilter::build(params, remembered.as_ref(), config)?;
    debug!("Searching candidatures with {:?}", filter.to_document());

    let page = candidates.search(&filter).await?;
    if let Some(cookie) = cookie {
        cookies.add(cookie.into_cookie());
    }
    Ok(Json(page.map(CandidateCard::from)))
}
