pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod graphql;
pub mod logging;
pub mod server;
pub mod service;
pub mod storage;
