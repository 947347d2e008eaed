//! # Core Models Module
//!
//! Data structures representing a small molecule as an attributed graph.
//!
//! ## Key Components
//!
//! - [`atom`] - Individual atom representation (element symbol)
//! - [`bond`] - Bond attributes: order and optional chirality
//! - [`compound`] - The owning graph structure with canonical keys
//! - [`ids`] - Internal slot-map storage handles
//! - [`keys`] - The public canonical key scheme (`a1`, `b1`, ...)
//!
//! Atoms and bonds are owned exclusively by their [`compound::Compound`];
//! the canonical keys are the only identity that survives serialization
//! and mutation.

pub mod atom;
pub mod bond;
pub mod compound;
pub mod ids;
pub mod keys;
