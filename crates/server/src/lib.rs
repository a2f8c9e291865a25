pub mod access;
pub mod app;
pub mod auth;
pub mod config;
pub mod doc;
pub mod dtos;
pub mod error;
pub mod notify;
pub mod routes;
pub mod session;
pub mod state;
pub mod utils;
