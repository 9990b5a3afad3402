//! Eligibility Arbiter - Turn-Based Eligibility Arbitration
//!
//! This crate arbitrates eligibility decisions (e.g., screening eligibility)
//! by running a bounded dialog between an applicant and an administrator role,
//! then reconciling their proposals against deterministic guideline evaluation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
