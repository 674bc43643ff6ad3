mod token;

pub use token::{AccessToken, Subject};
