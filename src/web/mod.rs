// src/web/mod.rs
pub mod admin_handlers;
pub mod auth_handlers;
pub mod chatbot_handlers;
pub mod mw_admin;
pub mod mw_auth;
pub mod mw_student;
pub mod routes;
pub mod student_handlers;
