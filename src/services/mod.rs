// src/services/mod.rs
pub mod auth_service;
pub mod chatbot_service;
pub mod curso_service;
pub mod matricula_service;
pub mod notify_service;
pub mod reset_service;
pub mod user_service;
