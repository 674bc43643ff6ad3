use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a candidate can be contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocialNetwork {
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "telefone")]
    Phone,
    #[serde(rename = "whatsapp")]
    Whatsapp,
    #[serde(rename = "facebook")]
    Facebook,
    #[serde(rename = "instagram")]
    Instagram,
    #[serde(rename = "twitter")]
    Twitter,
    #[serde(rename = "paginaWeb")]
    Website,
}

impl SocialNetwork {
    pub const ALL: [SocialNetwork; 7] = [
        SocialNetwork::Facebook,
        SocialNetwork::Instagram,
        SocialNetwork::Twitter,
        SocialNetwork::Email,
        SocialNetwork::Whatsapp,
        SocialNetwork::Phone,
        SocialNetwork::Website,
    ];

    /// The name used in forms and storage.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "telefone",
            Self::Whatsapp => "whatsapp",
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Twitter => "twitter",
            Self::Website => "paginaWeb",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Email => "E-mail",
            Self::Phone => "Telefone",
            Self::Whatsapp => "Whatsapp",
            Self::Facebook => "Facebook",
            Self::Instagram => "Instagram",
            Self::Twitter => "Twitter",
            Self::Website => "Página Web",
        }
    }

    /// Scheme (and host, for handle-based networks) prepended to a bare value.
    pub fn address_prefix(&self) -> &'static str {
        match self {
            Self::Email => "mailto:",
            Self::Phone => "tel:",
            Self::Whatsapp => "https://wa.me/",
            Self::Facebook => "http://facebook.com/",
            Self::Instagram => "http://instagram.com/",
            Self::Twitter => "http://twitter.com/",
            Self::Website => "http://",
        }
    }

    /// Turn what the candidate typed into a link. Values that are already
    /// URLs are kept as they are.
    pub fn to_address(&self, value: &str) -> String {
        let value = value.trim();
        if value.starts_with("http") {
            value.to_string()
        } else {
            format!("{}{}", self.address_prefix(), value)
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown social network `{0}`")]
pub struct UnknownSocialNetwork(pub String);

impl FromStr for SocialNetwork {
    type Err = UnknownSocialNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|network| network.name() == s.trim())
            .ok_or_else(|| UnknownSocialNetwork(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes() {
        assert_eq!(
            SocialNetwork::Email.to_address("fulano@example.com"),
            "mailto:fulano@example.com"
        );
        assert_eq!(SocialNetwork::Phone.to_address("8299999999"), "tel:8299999999");
        assert_eq!(
            SocialNetwork::Whatsapp.to_address("5582999999999"),
            "https://wa.me/5582999999999"
        );
        assert_eq!(
            SocialNetwork::Instagram.to_address("fulano"),
            "http://instagram.com/fulano"
        );
        assert_eq!(
            SocialNetwork::Website.to_address("fulano.com.br"),
            "http://fulano.com.br"
        );
    }

    #[test]
    fn urls_are_kept() {
        assert_eq!(
            SocialNetwork::Facebook.to_address("https://facebook.com/fulano"),
            "https://facebook.com/fulano"
        );
    }

    #[test]
    fn parse() {
        assert_eq!("paginaWeb".parse(), Ok(SocialNetwork::Website));
        assert_eq!("telefone".parse(), Ok(SocialNetwork::Phone));
        assert!("myspace".parse::<SocialNetwork>().is_err());
    }
}
