//! classrank-core: ranking and analytics engines for student results.
//!
//! This crate defines the mark and percentage value types, the
//! `ClassResult` aggregate, the dense-ranking engine, and the analytics
//! engine that classifies and summarizes a class.

pub mod analytics;
pub mod config;
pub mod error;
pub mod model;
pub mod ranking;
pub mod report;
pub mod sheet;
pub mod values;
