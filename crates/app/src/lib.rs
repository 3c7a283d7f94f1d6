//! Nomination lifecycle engine: verification credentials and resumable nominations.

pub mod auth;
pub mod clock;
pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod mail;
pub mod observability;

#[cfg(test)]
mod test;

mod uuids;
