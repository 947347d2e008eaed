//! # Reaction Module
//!
//! The logic layer of the simulator. It defines the environment a reaction
//! runs under ([`conditions`], [`solvent`]), the shape of its outcome
//! ([`products`]), and the shared mutation primitives concrete mechanisms
//! are built from ([`mechanism`]).
//!
//! The module performs no chemistry of its own: a concrete reaction
//! implements [`mechanism::Reaction`] and composes the primitives, while
//! this layer guarantees that every compound it hands back still satisfies
//! the canonical-key and no-dangling-bond invariants.

pub mod conditions;
pub mod error;
pub mod mechanism;
pub mod products;
pub mod solvent;
