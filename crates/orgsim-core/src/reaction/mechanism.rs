use super::conditions::Conditions;
use super::error::ReactionError;
use super::products::{EquilibriumProducts, Products};
use crate::core::models::compound::{AtomTable, BondTable, Compound, StructureError};
use crate::core::models::keys::AtomKey;
use tracing::{debug, instrument};

/// What a reaction produced: a one-way outcome or a reversible step whose
/// reactant side stays retrievable.
#[derive(Debug)]
pub enum ReactionOutcome {
    Irreversible(Products),
    Equilibrium(EquilibriumProducts),
}

/// The capability every concrete reaction mechanism implements.
///
/// A mechanism receives its reactant compounds and the environment they
/// react under, and composes the shared primitives of this module into a
/// full transformation. The mechanism decides the major/minor yield split
/// and whether the step is reversible; this module only guarantees that
/// every intermediate compound keeps its structural invariants.
pub trait Reaction {
    /// Runs the mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error when the input compounds or conditions are
    /// unsuitable, or when a primitive detects a broken invariant. Errors
    /// are never recovered internally; they end the simulation step.
    fn react(
        &self,
        reactants: &[Compound],
        conditions: &Conditions,
    ) -> Result<ReactionOutcome, ReactionError>;
}

/// Removes one atom from a compound and returns fresh canonical tables.
///
/// The compound is consumed: the atom and every bond incident to it are
/// deleted, the survivors are renumbered through the canonical key
/// generator, and both tables are rebuilt from scratch. The result is a
/// clean atom/bond mapping satisfying every compound invariant (dense
/// numbering, no dangling endpoints) regardless of which atom was removed
/// or how the survivors were numbered before. Callers install the tables
/// as the new canonical state, typically via [`Compound::from_tables`].
///
/// Removing an atom that splits the molecular graph into several fragments
/// is not an error here; whether a multi-fragment result is meaningful is
/// decided by the mechanism built on top. Callers that must branch into
/// several pathways clone the compound first.
///
/// # Errors
///
/// Fails if `target` is not an atom of the compound. That is a programming
/// error in the calling mechanism and is never silently ignored.
#[instrument(skip(compound), level = "debug")]
pub fn remove_atom(
    mut compound: Compound,
    target: AtomKey,
) -> Result<(AtomTable, BondTable), StructureError> {
    let removed = compound.detach_atom(target)?;
    debug!(
        symbol = %removed.symbol,
        atoms = compound.atom_count(),
        bonds = compound.bond_count(),
        "detached atom, renumbering survivors"
    );
    Ok(compound.canonical_tables())
}

/// Clone-and-remove convenience over [`remove_atom`].
///
/// Produces a fresh compound with the target atom gone and the original's
/// passthrough metadata carried over; the original is left untouched.
///
/// # Errors
///
/// Fails if `target` is not an atom of the compound.
pub fn without_atom(compound: &Compound, target: AtomKey) -> Result<Compound, StructureError> {
    let metadata = compound.metadata().clone();
    let (atoms, bonds) = remove_atom(compound.clone(), target)?;
    let product = Compound::from_tables(atoms, bonds, metadata)?;
    if !product.is_connected() {
        debug!(compound = %product, "removal split the compound into fragments");
    }
    Ok(product)
}
