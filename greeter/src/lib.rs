//! Greeting lookup and sensor measurement logging service.
//!
//! The binary (`main.rs`) wires these modules together; integration tests
//! build the same router against an in-memory store.

pub mod config;
pub mod db;
pub mod errors;
pub mod greetings;
pub mod metrics;
pub mod model;
pub mod rest;
