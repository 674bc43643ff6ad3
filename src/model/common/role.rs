use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

/// Registry code for a mayoral candidacy.
pub const MAYOR_CODE: &str = "EM";
/// Registry code for a mayoral running mate.
pub const VICE_MAYOR_CODE: &str = "VEM";
/// Registry code for a city council candidacy.
pub const COUNCILLOR_CODE: &str = "LM";

/// The positions a candidacy can run for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Mayor,
    ViceMayor,
    Councillor,
}

impl Role {
    /// The code this role is stored under.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Mayor => MAYOR_CODE,
            Self::ViceMayor => VICE_MAYOR_CODE,
            Self::Councillor => COUNCILLOR_CODE,
        }
    }

    /// Every stored code a search for this role matches. Running mates are
    /// stored under their own code but shown alongside the mayor.
    pub fn search_codes(&self) -> &'static [&'static str] {
        match self {
            Self::Mayor => &[MAYOR_CODE, VICE_MAYOR_CODE],
            Self::ViceMayor => &[VICE_MAYOR_CODE],
            Self::Councillor => &[COUNCILLOR_CODE],
        }
    }

    /// The name used in query strings.
    pub fn query_name(&self) -> &'static str {
        match self {
            Self::Mayor => "prefeito",
            Self::ViceMayor => "vice-prefeito",
            Self::Councillor => "vereador",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mayor => "Prefeito(a)",
            Self::ViceMayor => "Vice Prefeito(a)",
            Self::Councillor => "Vereador(a)",
        }
    }

    /// Label for a stored role code, falling back to the code itself.
    pub fn label_for_code(code: &str) -> String {
        code.parse::<Role>()
            .map(|role| role.label().to_string())
            .unwrap_or_else(|_| code.to_string())
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.query_name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Accepts both query names and stored codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prefeito" | "em" => Ok(Self::Mayor),
            "vice-prefeito" | "vem" => Ok(Self::ViceMayor),
            "vereador" | "lm" => Ok(Self::Councillor),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}
