//! Core types and rules for the Ringside roster engine.
//!
//! Entities (wrestlers, tag teams, managers, referees, stables, titles) carry
//! time-stamped period records. Everything visible about them (status,
//! booking eligibility, current champion) is derived from those periods on
//! read. Storage backends implement [`store::RosterStore`]; nothing here
//! touches a database.

// Backends implement the store trait with plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod championship;
pub mod clock;
pub mod entity;
pub mod error;
pub mod event;
pub mod history;
pub mod lifecycle;
pub mod period;
pub mod query;
pub mod service;
pub mod status;
pub mod store;

pub use error::{Error, Result};
