pub mod user_repo;
pub use user_repo::UserRepository;
pub mod organisation_repo;
pub use organisation_repo::OrganisationRepository;
pub mod refresh_token_repo;
pub use refresh_token_repo::RefreshTokenRepository;
