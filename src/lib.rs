//! mealsnap
//!
//! Photo-based meal logging: an image is sent to an AI nutrition estimation
//! service, the returned ingredients are edited by the user, and the final
//! meal is submitted to a store.
//!
//! The crate follows a Pure Core / Impure Shell split. [`state`] holds the
//! synchronous workflow state machine; [`workflow`] drives it against the
//! async collaborators in [`gateway`] and [`source`]; [`integration`] is the
//! line-oriented shell used by the binary.

pub mod config;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod source;
pub mod state;
pub mod view;
pub mod workflow;

// Command shell driven by main
pub mod integration;
