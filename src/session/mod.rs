//! Session orchestration
//!
//! This module contains the controller that the presentation layer talks to:
//! it exposes the current pair, accepts choices and serves leaderboard reads.

pub mod controller;

pub use controller::{is_persistence_failure, SessionController, SessionStats};
