//! Turning the public search form into a database query.

use data_encoding::BASE64;
use mongodb::bson::{doc, Document};
use rocket::{
    http::{Cookie, CookieJar},
    time::Duration,
};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{common::role::Role, db::candidate::Candidate};

use super::pagination::PaginationRequest;

/// Name of the cookie remembering the last searched location.
pub const SEARCH_COOKIE: &str = "searchCookie";

/// How long the search cookie lives, in hours.
pub const SEARCH_COOKIE_TTL_HOURS: i64 = 360;

/// Raw search query, exactly as submitted.
#[derive(Debug, Default, FromForm)]
pub struct SearchParams {
    #[field(name = "ano")]
    pub year: Option<String>,
    #[field(name = "estado")]
    pub state: Option<String>,
    #[field(name = "cidade")]
    pub city: Option<String>,
    #[field(name = "cargo")]
    pub role: Option<String>,
    #[field(name = "genero")]
    pub gender: Option<String>,
    #[field(name = "nome")]
    pub name: Option<String>,
    pub tags: Vec<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// The last searched location, remembered between visits.
///
/// Stored as `year,state` or `year,state,base64(city)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCookie {
    pub year: i32,
    pub state: String,
    pub city: Option<String>,
}

impl SearchCookie {
    /// Parse a cookie value. Malformed cookies are ignored; a city that does
    /// not decode is dropped.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(',');
        let year = parts.next()?.trim().parse().ok()?;
        let state = parts.next()?.trim().to_uppercase();
        if state.is_empty() {
            return None;
        }
        let city = parts
            .next()
            .and_then(|city| BASE64.decode(city.trim().as_bytes()).ok())
            .and_then(|city| String::from_utf8(city).ok())
            .filter(|city| !city.is_empty());
        Some(Self { year, state, city })
    }

    /// Read the search cookie from the request, if it is there and well formed.
    pub fn from_jar(jar: &CookieJar<'_>) -> Option<Self> {
        jar.get(SEARCH_COOKIE)
            .and_then(|cookie| Self::parse(cookie.value()))
    }

    pub fn format(&self) -> String {
        match &self.city {
            Some(city) => format!(
                "{},{},{}",
                self.year,
                self.state,
                BASE64.encode(city.as_bytes())
            ),
            None => format!("{},{}", self.year, self.state),
        }
    }

    pub fn into_cookie(self) -> Cookie<'static> {
        Cookie::build(SEARCH_COOKIE, self.format())
            .path("/")
            .max_age(Duration::hours(SEARCH_COOKIE_TTL_HOURS))
            .finish()
    }
}

/// A validated search. Every populated field must match.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter {
    pub year: i32,
    pub state: Option<String>,
    pub city: Option<String>,
    /// Role codes, any of which matches.
    pub roles: Vec<String>,
    pub gender: Option<String>,
    /// Proposal topics, any of which matches.
    pub tags: Vec<String>,
    /// Case-insensitive substring of the ballot name.
    pub name: Option<String>,
    pagination: PaginationRequest,
}

impl SearchFilter {
    /// Validate a raw search, falling back to the search cookie for the year
    /// and location. Returns the filter and, when a state was resolved, the
    /// cookie to store for the next visit.
    pub fn build(
        params: SearchParams,
        cookie: Option<&SearchCookie>,
        config: &Config,
    ) -> Result<(Self, Option<SearchCookie>)> {
        let year = match non_empty(params.year) {
            Some(year) => year
                .parse::<i32>()
                .map_err(|_| Error::invalid("invalid year"))?,
            None => cookie.map_or(config.election_year(), |cookie| cookie.year),
        };

        let state = non_empty(params.state)
            .map(|state| state.to_uppercase())
            .or_else(|| cookie.map(|cookie| cookie.state.clone()));
        // A remembered city only makes sense in its own state.
        let city = non_empty(params.city)
            .map(|city| city.to_uppercase())
            .or_else(|| {
                cookie
                    .filter(|cookie| state.as_ref() == Some(&cookie.state))
                    .and_then(|cookie| cookie.city.clone())
            });

        let roles = match non_empty(params.role) {
            Some(role) => role
                .parse::<Role>()
                .map_err(|err| Error::invalid(err.to_string()))?
                .search_codes()
                .iter()
                .map(ToString::to_string)
                .collect(),
            None => Vec::new(),
        };

        let mut tags = Vec::<String>::new();
        for tag in params.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|known| known == tag) {
                tags.push(tag.to_string());
            }
        }

        let page_num = parse_positive(params.page, "page", 1)?;
        let page_size = parse_positive(params.page_size, "page_size", config.page_size())?;

        let filter = Self {
            year,
            city: city.clone(),
            roles,
            gender: non_empty(params.gender),
            tags,
            name: non_empty(params.name),
            pagination: PaginationRequest::new(page_num, page_size, config.max_page_size()),
            state: state.clone(),
        };
        let cookie = state.map(|state| SearchCookie { year, state, city });
        Ok((filter, cookie))
    }

    /// Candidates running for the same seat as `candidate` and sharing at
    /// least one of its topics, at most `limit` of them.
    pub fn related_to(candidate: &Candidate, limit: u32) -> Self {
        Self {
            year: candidate.year,
            state: Some(candidate.state.clone()),
            city: Some(candidate.city.clone()),
            roles: vec![candidate.role.clone()],
            gender: None,
            tags: candidate.topics(),
            name: None,
            pagination: PaginationRequest::new(1, limit, limit),
        }
    }

    pub fn pagination(&self) -> PaginationRequest {
        self.pagination
    }

    /// The MongoDB query for this filter.
    pub fn to_document(&self) -> Document {
        let mut query = doc! {"year": self.year};
        if let Some(state) = &self.state {
            query.insert("state", state.as_str());
        }
        if let Some(city) = &self.city {
            query.insert("city", city.as_str());
        }
        if !self.roles.is_empty() {
            query.insert("role", doc! {"$in": self.roles.clone()});
        }
        if let Some(gender) = &self.gender {
            query.insert("gender", gender.as_str());
        }
        if !self.tags.is_empty() {
            query.insert("proposals.topic", doc! {"$in": self.tags.clone()});
        }
        if let Some(name) = &self.name {
            query.insert(
                "ballot_name",
                doc! {"$regex": regex::escape(name), "$options": "i"},
            );
        }
        query
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_positive(value: Option<String>, name: &str, default: u32) -> Result<u32> {
    match non_empty(value) {
        Some(value) => value
            .parse::<u32>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| Error::invalid(format!("invalid {name}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(params: SearchParams, cookie: Option<&SearchCookie>) -> Result<(SearchFilter, Option<SearchCookie>)> {
        SearchFilter::build(params, cookie, &Config::example())
    }

    fn cookie() -> SearchCookie {
        SearchCookie {
            year: 2016,
            state: "PE".to_string(),
            city: Some("RECIFE".to_string()),
        }
    }

    #[test]
    fn defaults() {
        let (filter, cookie) = build(SearchParams::default(), None).unwrap();
        assert_eq!(filter.to_document(), doc! {"year": 2020});
        assert_eq!(filter.pagination().page_num(), 1);
        assert_eq!(filter.pagination().page_size(), 20);
        assert!(cookie.is_none());
    }

    #[test]
    fn blank_params_are_dropped() {
        let params = SearchParams {
            city: Some("  ".to_string()),
            gender: Some(String::new()),
            name: Some(" ".to_string()),
            tags: vec![" ".to_string()],
            ..Default::default()
        };
        let (filter, _) = build(params, None).unwrap();
        assert_eq!(filter.to_document(), doc! {"year": 2020});
    }

    #[test]
    fn invalid_year() {
        let params = SearchParams {
            year: Some("abc".to_string()),
            ..Default::default()
        };
        match build(params, None) {
            Err(Error::InvalidParameters(message)) => assert_eq!(message, "invalid year"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn invalid_page() {
        for page in ["0", "-1", "x"] {
            let params = SearchParams {
                page: Some(page.to_string()),
                ..Default::default()
            };
            assert!(matches!(build(params, None), Err(Error::InvalidParameters(_))));
        }
    }

    #[test]
    fn page_size_is_capped() {
        let params = SearchParams {
            page: Some("3".to_string()),
            page_size: Some("5000".to_string()),
            ..Default::default()
        };
        let (filter, _) = build(params, None).unwrap();
        assert_eq!(filter.pagination().page_size(), 100);
        assert_eq!(filter.pagination().skip(), 200);
    }

    #[test]
    fn mayor_includes_running_mate() {
        let params = SearchParams {
            role: Some("prefeito".to_string()),
            ..Default::default()
        };
        let (filter, _) = build(params, None).unwrap();
        assert_eq!(
            filter.to_document(),
            doc! {"year": 2020, "role": {"$in": ["EM", "VEM"]}}
        );
    }

    #[test]
    fn unknown_role() {
        let params = SearchParams {
            role: Some("governador".to_string()),
            ..Default::default()
        };
        assert!(matches!(build(params, None), Err(Error::InvalidParameters(_))));
    }

    #[test]
    fn tags_match_any() {
        let params = SearchParams {
            tags: vec![
                "saúde".to_string(),
                "educação".to_string(),
                "saúde".to_string(),
            ],
            ..Default::default()
        };
        let (filter, _) = build(params, None).unwrap();
        assert_eq!(
            filter.to_document(),
            doc! {"year": 2020, "proposals.topic": {"$in": ["saúde", "educação"]}}
        );
    }

    #[test]
    fn name_is_escaped() {
        let params = SearchParams {
            name: Some("Zé (do povo)".to_string()),
            ..Default::default()
        };
        let (filter, _) = build(params, None).unwrap();
        assert_eq!(
            filter.to_document(),
            doc! {"year": 2020, "ballot_name": {"$regex": r"Zé \(do povo\)", "$options": "i"}}
        );
    }

    #[test]
    fn city_is_upper_cased() {
        let params = SearchParams {
            state: Some("al".to_string()),
            city: Some("Maceió".to_string()),
            ..Default::default()
        };
        let (filter, new_cookie) = build(params, None).unwrap();
        assert_eq!(
            filter.to_document(),
            doc! {"year": 2020, "state": "AL", "city": "MACEIÓ"}
        );
        assert_eq!(new_cookie.unwrap().city.as_deref(), Some("MACEIÓ"));
    }

    #[test]
    fn cookie_fills_missing_location() {
        let (filter, new_cookie) = build(SearchParams::default(), Some(&cookie())).unwrap();
        assert_eq!(
            filter.to_document(),
            doc! {"year": 2016, "state": "PE", "city": "RECIFE"}
        );
        assert_eq!(new_cookie, Some(cookie()));
    }

    #[test]
    fn explicit_params_win_over_cookie() {
        let params = SearchParams {
            year: Some("2020".to_string()),
            state: Some("al".to_string()),
            ..Default::default()
        };
        let (filter, new_cookie) = build(params, Some(&cookie())).unwrap();
        // The remembered city belongs to another state.
        assert_eq!(filter.to_document(), doc! {"year": 2020, "state": "AL"});
        assert_eq!(
            new_cookie,
            Some(SearchCookie {
                year: 2020,
                state: "AL".to_string(),
                city: None,
            })
        );
    }

    #[test]
    fn cookie_city_kept_for_same_state() {
        let params = SearchParams {
            state: Some("PE".to_string()),
            ..Default::default()
        };
        let (filter, _) = build(params, Some(&cookie())).unwrap();
        assert_eq!(filter.city.as_deref(), Some("RECIFE"));
    }

    #[test]
    fn cookie_format() {
        let cookie = SearchCookie {
            year: 2020,
            state: "AL".to_string(),
            city: Some("MACEIÓ".to_string()),
        };
        let value = cookie.format();
        assert!(value.starts_with("2020,AL,"));
        assert_eq!(SearchCookie::parse(&value), Some(cookie));
        assert_eq!(
            SearchCookie::parse("2020,AL"),
            Some(SearchCookie {
                year: 2020,
                state: "AL".to_string(),
                city: None,
            })
        );
    }

    #[test]
    fn cookie_lifetime() {
        let cookie = cookie().into_cookie();
        assert_eq!(cookie.name(), SEARCH_COOKIE);
        assert_eq!(cookie.max_age(), Some(Duration::hours(360)));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn malformed_cookies() {
        assert_eq!(SearchCookie::parse(""), None);
        assert_eq!(SearchCookie::parse("abc,AL"), None);
        assert_eq!(SearchCookie::parse("2020"), None);
        assert_eq!(SearchCookie::parse("2020,AL,%%%").unwrap().city, None);
    }
}
