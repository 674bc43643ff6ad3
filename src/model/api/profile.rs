//! The candidate self-service profile: terms acceptance and edit form.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::model::{
    common::social_network::SocialNetwork,
    db::candidate::{CandidateCore, Contact, Proposal},
    transparency,
};

use super::candidate::CandidateDescription;

/// A problem with one field of a submitted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// One `descriptions[i]` entry of the edit form.
#[derive(Debug, Default, FromForm)]
pub struct ProposalField {
    pub tag: Option<String>,
    pub description: Option<String>,
}

/// The profile edit form, exactly as submitted.
#[derive(Debug, Default, FromForm)]
pub struct ProfileUpdateForm {
    pub token: Option<String>,
    #[field(name = "numTags")]
    pub num_tags: Option<String>,
    pub descriptions: Vec<ProposalField>,
    pub biography: Option<String>,
    pub contact: Option<String>,
    pub provider: Option<String>,
}

/// The terms of use acceptance form.
#[derive(Debug, Default, FromForm)]
pub struct AcceptTermsForm {
    pub token: Option<String>,
}

/// A validated profile edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub biography: String,
    pub proposals: Vec<Proposal>,
    pub contact: Contact,
}

impl ProfileUpdateForm {
    /// Check every field against the configured limits, reporting every
    /// problem found. The token is not checked here.
    pub fn validate(&self, config: &Config) -> Result<ProfileUpdate, Vec<FieldError>> {
        let mut errors = Vec::new();

        let num_tags = match trimmed(&self.num_tags).parse::<usize>() {
            Ok(num_tags) => num_tags,
            Err(_) => {
                errors.push(FieldError::new("numTags", "Número de propostas inválido."));
                0
            }
        };
        if num_tags == 0 && config.proposals_required() && errors.is_empty() {
            errors.push(FieldError::new(
                "numTags",
                "Escolha pelo menos uma área de atuação.",
            ));
        }
        if num_tags > config.max_proposals() {
            errors.push(FieldError::new(
                "numTags",
                format!(
                    "Número máximo de propostas é {}. Foram enviadas {num_tags}.",
                    config.max_proposals()
                ),
            ));
        }

        let mut proposals = Vec::new();
        for i in 0..num_tags.min(config.max_proposals()) {
            let field = self.descriptions.get(i);
            let topic = field.map(|field| trimmed(&field.tag)).unwrap_or_default();
            let description = field
                .map(|field| trimmed(&field.description))
                .unwrap_or_default();

            if topic.is_empty() {
                errors.push(FieldError::new(
                    format!("descriptions[{i}][tag]"),
                    "Escolha a área de atuação da proposta.",
                ));
            } else if !config.tags().is_empty() && !config.tags().iter().any(|tag| tag == topic) {
                errors.push(FieldError::new(
                    format!("descriptions[{i}][tag]"),
                    format!("Área de atuação desconhecida: {topic}."),
                ));
            }

            let len = description.chars().count();
            if len == 0 {
                errors.push(FieldError::new(
                    format!("descriptions[{i}][description]"),
                    format!("A descrição da proposta sobre {topic} é obrigatória."),
                ));
            } else if len > config.max_description_len() {
                errors.push(FieldError::new(
                    format!("descriptions[{i}][description]"),
                    format!(
                        "Tamanho máximo de descrição é de {} caracteres. Tamanho da descrição do tópico {topic} é de {len} caracteres.",
                        config.max_description_len()
                    ),
                ));
            }

            proposals.push(Proposal {
                topic: topic.to_string(),
                description: description.to_string(),
            });
        }

        let biography = trimmed(&self.biography);
        if biography.is_empty() && config.biography_required() {
            errors.push(FieldError::new("biography", "Biografia é um campo obrigatório."));
        } else if biography.chars().count() > config.max_biography_len() {
            errors.push(FieldError::new(
                "biography",
                format!(
                    "Tamanho máximo da biografia é de {} caracteres.",
                    config.max_biography_len()
                ),
            ));
        }

        let contact = trimmed(&self.contact);
        if contact.is_empty() {
            errors.push(FieldError::new(
                "contact",
                "Contato é um campo obrigatório. Por favor, preencher.",
            ));
        } else if contact.chars().count() > config.max_contact_len() {
            errors.push(FieldError::new(
                "contact",
                format!(
                    "Tamanho máximo do contato é de {} caracteres.",
                    config.max_contact_len()
                ),
            ));
        }

        let provider = match trimmed(&self.provider).parse::<SocialNetwork>() {
            Ok(provider) => Some(provider),
            Err(err) => {
                debug!("Rejected contact provider: {err}");
                errors.push(FieldError::new("provider", "Escolha uma forma de contato válida."));
                None
            }
        };

        match provider {
            Some(provider) if errors.is_empty() => Ok(ProfileUpdate {
                biography: biography.to_string(),
                proposals,
                contact: Contact::new(provider, contact),
            }),
            _ => Err(errors),
        }
    }
}

impl ProfileUpdate {
    /// Replace the self-service fields of `candidate` and rescore it.
    pub fn apply(self, candidate: &mut CandidateCore) {
        candidate.biography = self.biography;
        candidate.proposals = self.proposals;
        candidate.contacts = vec![self.contact];
        candidate.transparency = transparency::score(candidate);
    }
}

fn trimmed(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or_default()
}

/// A selectable contact provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocialNetworkOption {
    pub name: &'static str,
    pub label: &'static str,
}

impl SocialNetworkOption {
    pub fn all() -> Vec<Self> {
        SocialNetwork::ALL
            .into_iter()
            .map(|network| Self {
                name: network.name(),
                label: network.label(),
            })
            .collect()
    }
}

/// What a candidate sees when following their magic link.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum ProfileStep {
    /// The terms of use must be accepted before editing.
    #[serde(rename_all = "camelCase")]
    AcceptTerms {
        token: String,
        candidate: CandidateDescription,
        day: u32,
        month: &'static str,
    },
    /// The profile editor.
    #[serde(rename_all = "camelCase")]
    Edit {
        token: String,
        candidate: CandidateDescription,
        tags: Vec<String>,
        max_proposals: usize,
        social_networks: Vec<SocialNetworkOption>,
    },
}

impl ProfileStep {
    /// The step `candidate` is at, as of `now`.
    pub fn for_candidate(
        token: String,
        candidate: &CandidateCore,
        config: &Config,
        now: DateTime<Utc>,
    ) -> Self {
        let description = CandidateDescription::from(candidate);
        if candidate.has_accepted_terms() {
            Self::Edit {
                token,
                candidate: description,
                tags: config.tags().to_vec(),
                max_proposals: config.max_proposals(),
                social_networks: SocialNetworkOption::all(),
            }
        } else {
            Self::AcceptTerms {
                token,
                candidate: description,
                day: now.day(),
                month: portuguese_month(now.month()),
            }
        }
    }
}

/// Answer to a successful profile update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdated {
    pub message: String,
    pub sequential_id: String,
}

/// Month name for a 1-based month number.
pub fn portuguese_month(month: u32) -> &'static str {
    match month {
        1 => "Janeiro",
        2 => "Fevereiro",
        3 => "Março",
        4 => "Abril",
        5 => "Maio",
        6 => "Junho",
        7 => "Julho",
        8 => "Agosto",
        9 => "Setembro",
        10 => "Outubro",
        11 => "Novembro",
        12 => "Dezembro",
        _ => "",
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl ProfileUpdateForm {
        pub fn example() -> Self {
            Self {
                token: None,
                num_tags: Some("2".to_string()),
                descriptions: vec![
                    ProposalField {
                        tag: Some("saúde".to_string()),
                        description: Some("Postos abertos à noite.".to_string()),
                    },
                    ProposalField {
                        tag: Some("educação".to_string()),
                        description: Some("Mais creches.".to_string()),
                    },
                ],
                biography: Some("Enfermeira há 20 anos.".to_string()),
                contact: Some("fulana".to_string()),
                provider: Some("instagram".to_string()),
            }
        }
    }
}
