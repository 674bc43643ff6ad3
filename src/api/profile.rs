use chrono::Utc;
use rocket::{
    form::Form,
    response::Redirect,
    serde::json::Json,
    Route, State,
};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::AccessToken,
        profile::{AcceptTermsForm, ProfileStep, ProfileUpdateForm, ProfileUpdated},
    },
    db::candidate::Candidate,
    mongodb::Coll,
};
use crate::Config;

pub fn routes() -> Vec<Route> {
    routes![profile, accept_terms, update_profile]
}

/// Where a magic link lands: the terms of use, or the editor once accepted.
#[get("/atualizar-candidatura?<access_token>")]
async fn profile(
    access_token: Option<String>,
    candidates: Coll<Candidate>,
    config: &State<Config>,
) -> Result<Json<ProfileStep>> {
    let token = access_token.unwrap_or_default();
    let subject = AccessToken::verify(&token, config)?.subject;
    let candidate = candidates
        .find_by_subject(&subject, config.election_year())
        .await?;

    Ok(Json(ProfileStep::for_candidate(
        token,
        &candidate,
        config,
        Utc::now(),
    )))
}

#[post("/aceitar-termo", data = "<form>")]
async fn accept_terms(
    form: Form<AcceptTermsForm>,
    candidates: Coll<Candidate>,
    config: &State<Config>,
) -> Result<Redirect> {
    let token = form.into_inner().token.unwrap_or_default();
    let subject = AccessToken::verify(&token, config)?.subject;
    let mut candidate = candidates
        .find_by_subject(&subject, config.election_year())
        .await?;

    if candidate.accept_terms(Utc::now()) {
        let candidate = candidates.update_profile(candidate).await?;
        info!(
            "Candidature {} accepted the terms of use",
            candidate.sequential_id
        );
    }

    Ok(Redirect::to(uri!(profile(Some(token)))))
}

#[post("/atualizar-candidatura", data = "<form>")]
async fn update_profile(
    form: Form<ProfileUpdateForm>,
    candidates: Coll<Candidate>,
    config: &State<Config>,
) -> Result<Json<ProfileUpdated>> {
    let token = form.token.as_deref().unwrap_or_default();
    let subject = AccessToken::verify(token, config)?.subject;
    let update = form.validate(config).map_err(Error::Validation)?;

    let mut candidate = candidates
        .find_by_subject(&subject, config.election_year())
        .await?;
    if !candidate.has_accepted_terms() {
        return Err(Error::Conflict(
            "Os termos de uso precisam ser aceitos antes de editar a candidatura.".to_string(),
        ));
    }

    update.apply(&mut candidate);
    let candidate = candidates.update_profile(candidate).await?;
    info!(
        "Candidature {} updated its profile, transparency {:.2}",
        candidate.sequential_id, candidate.transparency
    );

    Ok(Json(ProfileUpdated {
        message: "Seus dados foram atualizados com sucesso!".to_string(),
        sequential_id: candidate.sequential_id.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::Value,
    };

    use super::*;
    use crate::model::{
        api::auth::Subject,
        db::candidate::{CandidateCore, NewCandidate},
    };

    fn token_for(client: &Client, candidate: &CandidateCore) -> String {
        let config = client.rocket().state::<Config>().unwrap();
        AccessToken::new(Subject::Email(candidate.email.clone()))
            .issue(config)
            .unwrap()
    }

    fn update_body(token: &str) -> String {
        format!(
            "token={token}&numTags=2\
             &descriptions[0][tag]=sa%C3%BAde&descriptions[0][description]=Postos+abertos+%C3%A0+noite.\
             &descriptions[1][tag]=educa%C3%A7%C3%A3o&descriptions[1][description]=Mais+creches.\
             &biography=Enfermeira.&contact=fulana%40example.com&provider=email"
        )
    }

    #[backend_test]
    async fn terms_step_first(
        client: Client,
        candidates: Coll<Candidate>,
        new_candidates: Coll<NewCandidate>,
    ) {
        new_candidates
            .insert(CandidateCore::example())
            .await
            .unwrap();
        let token = token_for(&client, &CandidateCore::example());

        let response = client
            .get(uri!(profile(Some(token.clone()))))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let step = response.into_json::<Value>().await.unwrap();
        assert_eq!(step["step"], "acceptTerms");
        assert_eq!(step["token"], token.as_str());

        // Accept the terms.
        let response = client
            .post(uri!(accept_terms))
            .header(ContentType::Form)
            .body(format!("token={token}"))
            .dispatch()
            .await;
        assert_eq!(Status::SeeOther, response.status());
        let location = response.headers().get_one("Location").unwrap();
        assert!(location.starts_with("/atualizar-candidatura?access_token="));

        let accepted = candidates
            .find_by_email("fulana@example.com", 2020)
            .await
            .unwrap()
            .accepted_terms
            .unwrap();

        // Now the editor is shown.
        let response = client.get(location.to_string()).dispatch().await;
        let step = response.into_json::<Value>().await.unwrap();
        assert_eq!(step["step"], "edit");
        assert_eq!(step["maxProposals"], 5);

        // Accepting again keeps the first timestamp.
        client
            .post(uri!(accept_terms))
            .header(ContentType::Form)
            .body(format!("token={token}"))
            .dispatch()
            .await;
        let candidate = candidates
            .find_by_email("fulana@example.com", 2020)
            .await
            .unwrap();
        assert_eq!(candidate.accepted_terms, Some(accepted));
    }

    #[backend_test]
    async fn invalid_tokens(client: Client, new_candidates: Coll<NewCandidate>) {
        new_candidates
            .insert(CandidateCore::example())
            .await
            .unwrap();
        let config = client.rocket().state::<Config>().unwrap();
        let expired = AccessToken::new(Subject::Email("fulana@example.com".to_string()))
            .issue_with_expiry(config, Utc::now() - Duration::hours(1))
            .unwrap();

        for token in [None, Some("garbage".to_string()), Some(expired.clone())] {
            let response = client.get(uri!(profile(token))).dispatch().await;
            assert_eq!(Status::Unauthorized, response.status());
        }

        let response = client
            .post(uri!(update_profile))
            .header(ContentType::Form)
            .body(update_body(&expired))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["message"], "Código de acesso inválido.");
    }

    #[backend_test]
    async fn update_before_terms(
        client: Client,
        candidates: Coll<Candidate>,
        new_candidates: Coll<NewCandidate>,
    ) {
        new_candidates
            .insert(CandidateCore::example())
            .await
            .unwrap();
        let token = token_for(&client, &CandidateCore::example());

        let response = client
            .post(uri!(update_profile))
            .header(ContentType::Form)
            .body(update_body(&token))
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());

        let candidate = candidates
            .find_by_email("fulana@example.com", 2020)
            .await
            .unwrap();
        assert_eq!(candidate.candidate, CandidateCore::example());
    }

    #[backend_test]
    async fn update(client: Client, candidates: Coll<Candidate>, new_candidates: Coll<NewCandidate>) {
        new_candidates
            .insert(CandidateCore {
                accepted_terms: Some(Utc::now()),
                ..CandidateCore::example()
            })
            .await
            .unwrap();
        let token = token_for(&client, &CandidateCore::example());

        let response = client
            .post(uri!(update_profile))
            .header(ContentType::Form)
            .body(update_body(&token))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["sequentialId"], "270001084455");

        let candidate = candidates
            .find_by_email("fulana@example.com", 2020)
            .await
            .unwrap();
        assert_eq!(candidate.biography, "Enfermeira.");
        assert_eq!(candidate.topics(), vec!["saúde", "educação"]);
        assert_eq!(candidate.proposals[0].description, "Postos abertos à noite.");
        assert_eq!(candidate.contacts[0].value, "mailto:fulana@example.com");
        assert_eq!(candidate.transparency, 1.0);
    }

    #[backend_test]
    async fn update_reports_every_error(
        client: Client,
        candidates: Coll<Candidate>,
        new_candidates: Coll<NewCandidate>,
    ) {
        new_candidates
            .insert(CandidateCore {
                accepted_terms: Some(Utc::now()),
                ..CandidateCore::example()
            })
            .await
            .unwrap();
        let token = token_for(&client, &CandidateCore::example());

        let response = client
            .post(uri!(update_profile))
            .header(ContentType::Form)
            .body(format!(
                "token={token}&numTags=6&biography=&contact=&provider=myspace"
            ))
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());

        let body = response.into_json::<Value>().await.unwrap();
        let fields = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|err| err["field"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert!(fields.contains(&"numTags".to_string()));
        assert!(fields.contains(&"biography".to_string()));
        assert!(fields.contains(&"contact".to_string()));
        assert!(fields.contains(&"provider".to_string()));

        // Nothing was written.
        let candidate = candidates
            .find_by_email("fulana@example.com", 2020)
            .await
            .unwrap();
        assert!(candidate.proposals.is_empty());
        assert_eq!(candidate.transparency, 0.0);
    }
}
