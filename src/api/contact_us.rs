use rocket::{form::Form, serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::mail::Mailer;
use crate::model::{
    api::{
        auth::AccessToken,
        contact::{ContactForm, ContactOptions},
        Message,
    },
    db::candidate::Candidate,
    mongodb::Coll,
};
use crate::Config;

pub fn routes() -> Vec<Route> {
    routes![contact_options, contact]
}

#[get("/fale-conosco?<access_token>")]
async fn contact_options(
    access_token: Option<String>,
    config: &State<Config>,
) -> Result<Json<ContactOptions>> {
    let token = access_token.unwrap_or_default();
    AccessToken::verify(&token, config)?;
    Ok(Json(ContactOptions::new(token)))
}

/// Forward a candidate's message to the site team.
#[post("/fale-conosco", data = "<form>")]
async fn contact(
    form: Form<ContactForm>,
    candidates: Coll<Candidate>,
    config: &State<Config>,
    mailer: &State<Mailer>,
) -> Result<Json<Message>> {
    let token = form.access_token.as_deref().unwrap_or_default();
    let subject = AccessToken::verify(token, config)?.subject;
    let message = form.validate().map_err(Error::Validation)?;

    let candidate = candidates
        .find_by_subject(&subject, config.election_year())
        .await?;
    mailer
        .send(
            &[config.contact_email().to_string()],
            &message.email_subject(),
            &message.email_body(&candidate),
        )
        .await?;
    info!(
        "Forwarded {} message from candidature {}",
        message.kind, candidate.sequential_id
    );

    Ok(Json(Message::new("Mensagem enviada com sucesso!")))
}
