pub mod candidate;
pub mod location;
