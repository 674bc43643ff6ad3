use rocket::{form::Form, serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::mail::Mailer;
use crate::model::{
    api::{
        auth::{AccessToken, Subject},
        login::{access_email_body, access_email_subject, is_valid_email, profile_link, LoginRequest},
        Message,
    },
    db::candidate::Candidate,
    mongodb::Coll,
};
use crate::Config;

pub fn routes() -> Vec<Route> {
    routes![login]
}

/// Email a magic link to a registered candidate.
#[post("/sou-candidato", data = "<request>")]
async fn login(
    request: Form<LoginRequest>,
    candidates: Coll<Candidate>,
    config: &State<Config>,
    mailer: &State<Mailer>,
) -> Result<Json<Message>> {
    let email = request.email.trim();
    if !is_valid_email(email) {
        return Err(Error::invalid(format!("Email inválido: {email}.")));
    }

    let candidate = candidates
        .find_by_email(email, config.election_year())
        .await
        .map_err(|err| match err {
            Error::NotFound(_) => Error::not_found(format!(
                "O email {email} não foi encontrado no registro do TSE. Por favor verifique se houve algum erro na digitação."
            )),
            err => err,
        })?;

    let token = AccessToken::new(Subject::Email(candidate.email.clone())).issue(config)?;
    let link = profile_link(config, &token);
    mailer
        .send(
            &[candidate.email.clone()],
            &access_email_subject(&candidate),
            &access_email_body(&candidate, config, &link),
        )
        .await?;
    info!("Sent access link to candidature {}", candidate.sequential_id);

    Ok(Json(Message::new(format!(
        "Email com código de acesso enviado para {email}. Verifique sua caixa de spam caso não encontre."
    ))))
}
