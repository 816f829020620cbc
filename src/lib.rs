//! Verdict: risk evaluation and decision recording for approval workflows.
//!
//! Administrators define processes; employees submit requests against them.
//! The [`engine`] scores a request's data with the [`checks`] registry, and
//! the [`decision`] recorder moves the request through its state machine,
//! whether the decision comes from a person or from the [`agent`].

pub mod agent;
pub mod checks;
pub mod config;
pub mod decision;
pub mod engine;
pub mod identity;
pub mod model;
pub mod notify;
pub mod storage;
