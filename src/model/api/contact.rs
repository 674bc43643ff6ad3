use serde::Serialize;

use crate::mail::escape_html;
use crate::model::api::profile::FieldError;
use crate::model::db::candidate::CandidateCore;

/// Kinds of message a candidate can send us.
pub const MESSAGE_TYPES: [(&str, &str); 5] = [
    ("Sugestão", "sugestão"),
    ("Reclamação", "reclamação"),
    ("Denúncia", "denúncia"),
    ("Pergunta", "pergunta"),
    ("Requisitar nova Causa/Pauta", "nova-causa"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageTypeOption {
    pub label: &'static str,
    pub value: &'static str,
}

/// The contact form, with the token to submit it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactOptions {
    pub token: String,
    pub type_options: Vec<MessageTypeOption>,
}

impl ContactOptions {
    pub fn new(token: String) -> Self {
        Self {
            token,
            type_options: MESSAGE_TYPES
                .into_iter()
                .map(|(label, value)| MessageTypeOption { label, value })
                .collect(),
        }
    }
}

#[derive(Debug, Default, FromForm)]
pub struct ContactForm {
    pub access_token: Option<String>,
    #[field(name = "tipo")]
    pub kind: Option<String>,
    #[field(name = "assunto")]
    pub subject: Option<String>,
    #[field(name = "descricao")]
    pub description: Option<String>,
}

/// A validated contact message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub kind: String,
    pub subject: String,
    pub description: String,
}

impl ContactForm {
    /// Type, subject and description are all required.
    pub fn validate(&self) -> Result<ContactMessage, Vec<FieldError>> {
        let fields = [
            ("tipo", &self.kind),
            ("assunto", &self.subject),
            ("descricao", &self.description),
        ];
        let errors = fields
            .iter()
            .filter(|(_, value)| value.as_deref().map_or(true, |value| value.trim().is_empty()))
            .map(|(field, _)| FieldError {
                field: field.to_string(),
                message: "Tipo, assunto e descrição são campos obrigatórios.".to_string(),
            })
            .collect::<Vec<_>>();
        if !errors.is_empty() {
            return Err(errors);
        }

        let value = |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_string();
        Ok(ContactMessage {
            kind: value(&self.kind),
            subject: value(&self.subject),
            description: value(&self.description),
        })
    }
}

impl ContactMessage {
    pub fn email_subject(&self) -> String {
        format!("[Fale conosco] {}", self.kind)
    }

    /// The email to the site team, signed by `candidate`.
    pub fn email_body(&self, candidate: &CandidateCore) -> String {
        format!(
            "Saudações Equipe Técnica do Candidatos.info,<br><br>\
             <b>{}</b><br>{}<br><br>\
             Cordialmente,<br>{} ({}), {}",
            escape_html(&self.subject),
            escape_html(&self.description),
            escape_html(&candidate.ballot_name),
            escape_html(&candidate.name),
            candidate.ballot_number
        )
    }
}
