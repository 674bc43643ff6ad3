use jsonwebtoken::errors::Error as JwtError;
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{status, Responder},
    serde::json::Json,
    Request,
};
use serde::Serialize;
use thiserror::Error;

use crate::model::api::profile::FieldError;

pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to the user whenever something went wrong on our side.
pub const GENERIC_ERROR_MESSAGE: &str = "Erro inesperado. Por favor, tente novamente mais tarde.";

/// Message shown to the user whenever an access token is rejected, whatever the reason.
pub const INVALID_ACCESS_CODE_MESSAGE: &str = "Código de acesso inválido.";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    /// Signing failed. Rejected tokens surface as [`Error::Unauthorized`].
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Could not extract token claims: {0}")]
    ClaimsExtraction(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid form: {0:?}")]
    Validation(Vec<FieldError>),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidParameters(what.into())
    }

    pub fn internal(what: impl Into<String>) -> Self {
        Self::Status(Status::InternalServerError, what.into())
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Jwt(_) => Status::InternalServerError,
            Self::ClaimsExtraction(_) | Self::Unauthorized(_) => Status::Unauthorized,
            Self::NotFound(_) => Status::NotFound,
            Self::InvalidParameters(_) | Self::Validation(_) => Status::BadRequest,
            Self::Conflict(_) => Status::Conflict,
            Self::Status(status, _) => *status,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let body = match self {
            // Token failures all look the same from the outside.
            Self::ClaimsExtraction(ref err) => {
                debug!("Rejected access token: {err}");
                ErrorBody {
                    message: INVALID_ACCESS_CODE_MESSAGE.to_string(),
                    errors: Vec::new(),
                }
            }
            Self::Validation(errors) => ErrorBody {
                message: errors
                    .first()
                    .map(|err| err.message.clone())
                    .unwrap_or_else(|| "Formulário inválido.".to_string()),
                errors,
            },
            Self::NotFound(message)
            | Self::InvalidParameters(message)
            | Self::Unauthorized(message)
            | Self::Conflict(message) => ErrorBody {
                message,
                errors: Vec::new(),
            },
            Self::Status(status, message) if status.code < 500 => ErrorBody {
                message,
                errors: Vec::new(),
            },
            // Never leak internals.
            err => {
                error!("{} {}: {err}", req.method(), req.uri().path());
                ErrorBody {
                    message: GENERIC_ERROR_MESSAGE.to_string(),
                    errors: Vec::new(),
                }
            }
        };
        status::Custom(status, Json(body)).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::errors::ErrorKind;

    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(Error::not_found("x").status(), Status::NotFound);
        assert_eq!(Error::invalid("invalid year").status(), Status::BadRequest);
        assert_eq!(
            Error::ClaimsExtraction("garbage".into()).status(),
            Status::Unauthorized
        );
        assert_eq!(Error::Validation(vec![]).status(), Status::BadRequest);
        assert_eq!(Error::internal("boom").status(), Status::InternalServerError);
    }

    #[test]
    fn signing_failures_are_internal() {
        let err = Error::from(JwtError::from(ErrorKind::InvalidKeyFormat));
        assert_eq!(err.status(), Status::InternalServerError);
    }
}
