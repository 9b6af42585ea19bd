//! clinic: patients, providers and treatment trees over a REST API.
//!
//! Layers, innermost first: [`domain`] (records and the treatment tree),
//! [`infrastructure`] (record store, snapshot file, DI), [`application`]
//! (services, DTOs, bulk upload), then the outer surfaces [`api`] and [`cli`].

pub mod api;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
