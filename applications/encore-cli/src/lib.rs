//! Encore CLI
//!
//! Headless driver for the Encore player: a simulated audio engine, catalog
//! file ingestion and terminal rendering used by the `encore` binary.

pub mod catalog;
pub mod engine;
pub mod render;

pub use engine::SimulatedEngine;
