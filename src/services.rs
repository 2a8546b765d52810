pub mod ai;
pub mod auth;
pub mod gemini;
pub mod storage;

pub mod admin_service;
pub mod catalog_service;
pub mod chat_service;
pub mod diagnosis_service;
pub mod order_service;
