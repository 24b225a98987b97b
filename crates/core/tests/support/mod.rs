//! Shared test helpers for `shelfsight-core` integration tests.
//!
//! Scripted in-memory gateways so controller and store tests can focus on
//! behaviour instead of transport.

#![allow(dead_code)]

pub mod gateways;
