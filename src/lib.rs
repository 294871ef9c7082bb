//! Staff registration and login service.
//!
//! Users register with a (optionally client-encrypted) password that is
//! stored as a bcrypt hash; employees get an extra record in the same
//! transaction. Login issues a short-lived HS256 token that protects the
//! profile route.

pub mod config;
pub mod dto;
pub mod entity;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod repository;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
