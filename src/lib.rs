// src/lib.rs
//
// A aplicação vive na lib para os testes de integração em tests/
// poderem usar os serviços diretamente; o main.rs só faz o arranque.
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod templates;
pub mod web;
