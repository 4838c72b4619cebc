//! orgtree: build org charts from flat employee records and compare snapshots.
//!
//! The `domain` layer holds the engine (validation, hierarchy construction,
//! comparison, statistics); `application` orchestrates it for file inputs and
//! `cli` exposes it as the `orgtree` binary.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
