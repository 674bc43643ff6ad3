//! Public views of candidatures.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::model::{
    common::role::Role,
    db::candidate::{Candidate, CandidateCore, Contact, Proposal},
};

/// Number of related candidatures shown on a candidate page.
pub const MAX_RELATED: u32 = 15;

/// What a search result shows about a candidature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateCard {
    pub sequential_id: String,
    pub year: i32,
    pub ballot_name: String,
    pub ballot_number: i64,
    pub party: String,
    pub role: String,
    pub gender: String,
    pub city: String,
    pub state: String,
    pub photo_url: String,
    pub transparency: f64,
    pub tags: Vec<String>,
}

impl From<&CandidateCore> for CandidateCard {
    fn from(candidate: &CandidateCore) -> Self {
        Self {
            sequential_id: candidate.sequential_id.clone(),
            year: candidate.year,
            ballot_name: candidate.ballot_name.clone(),
            ballot_number: candidate.ballot_number,
            party: candidate.party.clone(),
            role: Role::label_for_code(&candidate.role),
            gender: candidate.gender.clone(),
            city: title_case(&candidate.city),
            state: candidate.state.clone(),
            photo_url: candidate.photo_url.clone(),
            transparency: candidate.transparency,
            tags: candidate.topics(),
        }
    }
}

impl From<Candidate> for CandidateCard {
    fn from(candidate: Candidate) -> Self {
        Self::from(&candidate.candidate)
    }
}

/// Everything shown on a candidate page or in the profile editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDescription {
    #[serde(flatten)]
    pub card: CandidateCard,
    pub name: String,
    pub biography: String,
    pub proposals: Vec<Proposal>,
    pub contacts: Vec<Contact>,
    pub accepted_terms: Option<DateTime<Utc>>,
}

impl From<&CandidateCore> for CandidateDescription {
    fn from(candidate: &CandidateCore) -> Self {
        Self {
            card: CandidateCard::from(candidate),
            name: candidate.name.clone(),
            biography: candidate.biography.clone(),
            proposals: candidate.proposals.clone(),
            contacts: candidate.contacts.clone(),
            accepted_terms: candidate.accepted_terms,
        }
    }
}

/// A pre-filled email a voter can send to ask a candidate for proposals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalRequestEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl ProposalRequestEmail {
    /// Only candidates without proposals get one.
    pub fn for_candidate(candidate: &CandidateCore, config: &Config) -> Option<Self> {
        if !candidate.proposals.is_empty() {
            return None;
        }
        let site = config.site_url();
        let body = format!(
            "Olá, sr(a) {name}\n\n\
             Sou eleitor(a) na cidade de {city}/{state} e percebi que seu perfil \
             {site}/c/{year}/{id} não possui propostas.\n\n\
             Para atualizá-lo, basta acessar {site}/sou-candidato, escolher as áreas \
             de atuação e preencher as propostas referentes a cada uma das áreas.\n\n\
             Acesse {site}/sobre para mais informações sobre a plataforma.\n\n\
             Atenciosamente,\n\
             Um(a) eleitor(a) tentando pautar as eleições",
            name = candidate.name,
            city = title_case(&candidate.city),
            state = candidate.state,
            year = candidate.year,
            id = candidate.sequential_id,
        );
        Some(Self {
            to: candidate.email.to_lowercase(),
            subject: "Registro na plataforma candidatos.info".to_string(),
            body,
        })
    }
}

/// A candidate page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    pub candidate: CandidateDescription,
    pub related: Vec<CandidateCard>,
    pub proposal_request: Option<ProposalRequestEmail>,
}

/// `MACEIÓ` -> `Maceió`, `SÃO JOSÉ DA LAJE` -> `São José da Laje`.
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            let word = word.to_lowercase();
            if i > 0 && matches!(word.as_str(), "de" | "da" | "do" | "das" | "dos" | "e") {
                return word;
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => word,
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
