//! # Core Module
//!
//! The foundation layer of the simulator: stateless data models for
//! compounds, canonical key management, and exchange-format I/O.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds, and the
//!   owning compound graph with its canonical key scheme
//! - **Canonicalization** ([`utils`]) - Pure key-renumbering routines shared
//!   by every structural mutation
//! - **File I/O** ([`io`]) - Reading/writing compounds with canonical
//!   ordering

pub mod io;
pub mod models;
pub mod utils;
