pub mod auth;
pub mod organisations;
pub mod users;
