pub mod auth;
pub mod organisation_service;
pub mod token;
