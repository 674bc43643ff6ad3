use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::model::{common::role::Role, db::candidate::CandidateCore};

use super::candidate::title_case;

#[derive(Debug, FromForm)]
pub struct LoginRequest {
    pub email: String,
}

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
        .expect("invalid email pattern")
});

/// Is this shaped like an email address?
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// The magic link that lets a candidate edit their profile.
pub fn profile_link(config: &Config, token: &str) -> String {
    format!("{}/atualizar-candidatura?access_token={token}", config.site_url())
}

/// Subject of the magic link email.
pub fn access_email_subject(candidate: &CandidateCore) -> String {
    format!(
        "Link para acesso à candidatura {} de {}/{}",
        candidate.ballot_number,
        title_case(&candidate.city),
        candidate.state
    )
}

/// HTML body of the magic link email.
pub fn access_email_body(candidate: &CandidateCore, config: &Config, link: &str) -> String {
    format!(
        "Olá, {name}!<br><br>\
         Identificamos através dos dados públicos do TSE que você está cadastrado na eleição \
         de {year} na cidade de {city} no estado de {state} como {role}.<br><br><br>\
         Recebemos sua solicitação para acessar a plataforma candidatos.info e editar seu perfil. \
         Para acessar <a href=\"{link}\">clique aqui</a>.<br><br>\
         Caso o link não esteja funcionando copie e cole no navegador o seguinte link:<br> {link}\
         <br><br><br>Caso tenha recebido este email por engano, por favor desconsidere-o.<br>\
         Atenciosamente,<br>Equipe candidatos.info",
        name = candidate.name,
        year = config.election_year(),
        city = title_case(&candidate.city),
        state = candidate.state,
        role = Role::label_for_code(&candidate.role),
    )
}
