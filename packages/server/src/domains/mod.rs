// Business domains
pub mod audit;
pub mod auth;
pub mod chat_state;
pub mod extraction;
pub mod intake;
pub mod media;
pub mod notifications;
pub mod reports;
pub mod users;
