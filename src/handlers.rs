pub mod admin;
pub mod auth;
pub mod catalog;
pub mod chat;
pub mod diagnosis;
pub mod expert;
pub mod orders;
