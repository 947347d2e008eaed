use super::atom::Atom;
use super::bond::{Bond, BondOrder, Chirality};
use super::ids::{AtomId, BondId};
use super::keys::{AtomKey, BondKey};
use crate::core::utils::canon;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("atom {0} does not exist in the compound")]
    AtomNotFound(AtomKey),

    #[error("bond {0} does not exist in the compound")]
    BondNotFound(BondKey),

    #[error("bond {bond} references atom {atom}, which is not in the compound")]
    DanglingBond { bond: BondKey, atom: AtomKey },

    #[error("a bond may not connect atom {0} to itself")]
    SelfBond(AtomKey),

    #[error("atom keys are not canonical: expected {expected}, found {found}")]
    NonCanonicalAtomKey { expected: AtomKey, found: AtomKey },

    #[error("bond keys are not canonical: expected {expected}, found {found}")]
    NonCanonicalBondKey { expected: BondKey, found: BondKey },
}

/// A bond as seen from outside the compound: canonical endpoint keys plus
/// the chemical attributes, with the endpoints stored as a sorted pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BondLink {
    pub endpoints: (AtomKey, AtomKey),
    pub order: BondOrder,
    pub chirality: Option<Chirality>,
}

impl BondLink {
    pub fn new(first: AtomKey, second: AtomKey, order: BondOrder) -> Self {
        let endpoints = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        Self {
            endpoints,
            order,
            chirality: None,
        }
    }

    pub fn with_chirality(mut self, chirality: Option<Chirality>) -> Self {
        self.chirality = chirality;
        self
    }
}

/// Canonical atom mapping: `a<N>` key to atom, sorted by key.
pub type AtomTable = BTreeMap<AtomKey, Atom>;

/// Canonical bond mapping: `b<N>` key to endpoints and attributes, sorted by key.
pub type BondTable = BTreeMap<BondKey, BondLink>;

/// The exchange-format shape of a compound: both canonical tables plus any
/// passthrough metadata (molecule name, intrinsic pKa, ...). Iterating the
/// tables yields the canonical serialization order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundRecord {
    pub atoms: AtomTable,
    pub bonds: BondTable,
    pub metadata: BTreeMap<String, String>,
}

/// A small molecule as a labeled, undirected multigraph.
///
/// The compound owns every atom and bond. Atoms are addressed by canonical
/// keys `a1..aN` and bonds by `b1..bM`; both key sets are densely numbered
/// at every externally observable point, and every mutation that changes the
/// atom set re-derives them. Internally, atoms and bonds live in slot maps
/// and an adjacency cache keeps neighbor queries cheap.
#[derive(Debug, Clone, Default)]
pub struct Compound {
    /// Primary storage for atoms.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for bonds.
    bonds: SlotMap<BondId, Bond>,
    /// Canonical atom key to storage id.
    atom_keys: BTreeMap<AtomKey, AtomId>,
    /// Canonical bond key to storage id.
    bond_keys: BTreeMap<BondKey, BondId>,
    /// Reverse map from storage id to canonical atom key.
    key_of: SecondaryMap<AtomId, AtomKey>,
    /// Reverse map from storage id to canonical bond key.
    bond_key_of: SecondaryMap<BondId, BondKey>,
    /// Incident bonds per atom.
    adjacency: SecondaryMap<AtomId, Vec<BondId>>,
    /// Exchange-format passthrough metadata.
    metadata: BTreeMap<String, String>,
}

impl Compound {
    /// Creates a new, empty compound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a compound from an exchange record, validating every invariant.
    ///
    /// # Errors
    ///
    /// Returns an error if either key set is not densely numbered from 1 in
    /// order, if a bond references an absent atom, or if a bond connects an
    /// atom to itself. No partially-built compound is ever returned.
    pub fn from_record(record: CompoundRecord) -> Result<Self, StructureError> {
        let mut compound = Compound {
            metadata: record.metadata,
            ..Compound::default()
        };

        for (i, (key, atom)) in record.atoms.into_iter().enumerate() {
            let expected = AtomKey::new(i as u32 + 1);
            if key != expected {
                return Err(StructureError::NonCanonicalAtomKey {
                    expected,
                    found: key,
                });
            }
            compound.insert_atom(key, atom);
        }

        for (i, (key, link)) in record.bonds.into_iter().enumerate() {
            let expected = BondKey::new(i as u32 + 1);
            if key != expected {
                return Err(StructureError::NonCanonicalBondKey {
                    expected,
                    found: key,
                });
            }
            compound.insert_bond(key, link)?;
        }

        Ok(compound)
    }

    /// Builds a compound from canonical tables plus passthrough metadata.
    ///
    /// This is the installation step after a mutation primitive has produced
    /// fresh tables; validation is identical to [`Compound::from_record`].
    pub fn from_tables(
        atoms: AtomTable,
        bonds: BondTable,
        metadata: BTreeMap<String, String>,
    ) -> Result<Self, StructureError> {
        Self::from_record(CompoundRecord {
            atoms,
            bonds,
            metadata,
        })
    }

    /// Converts the compound back into its exchange record.
    ///
    /// The record's tables iterate in canonical order (atoms by atom key,
    /// bonds by bond key) without any further sorting by the caller.
    pub fn to_record(&self) -> CompoundRecord {
        let atoms = self
            .atom_keys
            .iter()
            .map(|(&key, &id)| (key, self.atoms[id].clone()))
            .collect();
        let bonds = self
            .bond_keys
            .iter()
            .map(|(&key, &id)| (key, self.link_of(id)))
            .collect();
        CompoundRecord {
            atoms,
            bonds,
            metadata: self.metadata.clone(),
        }
    }

    /// Appends a new atom under the next canonical key and returns that key.
    pub fn add_atom(&mut self, atom: Atom) -> AtomKey {
        let key = AtomKey::new(self.atom_keys.len() as u32 + 1);
        self.insert_atom(key, atom);
        key
    }

    /// Appends a bond between two existing atoms under the next canonical key.
    ///
    /// Parallel bonds between the same pair are permitted (the compound is a
    /// multigraph); a bond from an atom to itself is not.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is absent or both endpoints are
    /// the same atom.
    pub fn add_bond(
        &mut self,
        first: AtomKey,
        second: AtomKey,
        order: BondOrder,
    ) -> Result<BondKey, StructureError> {
        let key = BondKey::new(self.bond_keys.len() as u32 + 1);
        self.insert_bond(key, BondLink::new(first, second, order))?;
        Ok(key)
    }

    /// Retrieves an atom by its canonical key.
    pub fn atom(&self, key: AtomKey) -> Option<&Atom> {
        self.atom_keys.get(&key).map(|&id| &self.atoms[id])
    }

    /// Retrieves a mutable atom by its canonical key.
    pub fn atom_mut(&mut self, key: AtomKey) -> Option<&mut Atom> {
        let id = *self.atom_keys.get(&key)?;
        self.atoms.get_mut(id)
    }

    /// Retrieves a bond by its canonical key.
    pub fn bond(&self, key: BondKey) -> Option<&Bond> {
        self.bond_keys.get(&key).map(|&id| &self.bonds[id])
    }

    /// Retrieves a mutable bond by its canonical key.
    pub fn bond_mut(&mut self, key: BondKey) -> Option<&mut Bond> {
        let id = *self.bond_keys.get(&key)?;
        self.bonds.get_mut(id)
    }

    /// Iterates atoms in canonical key order.
    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomKey, &Atom)> {
        self.atom_keys.iter().map(|(&key, &id)| (key, &self.atoms[id]))
    }

    /// Iterates bonds in canonical key order.
    pub fn bonds_iter(&self) -> impl Iterator<Item = (BondKey, &Bond)> {
        self.bond_keys.iter().map(|(&key, &id)| (key, &self.bonds[id]))
    }

    /// The canonical endpoint keys of a bond, as a sorted pair.
    pub fn bond_endpoints(&self, key: BondKey) -> Option<(AtomKey, AtomKey)> {
        let &id = self.bond_keys.get(&key)?;
        let bond = &self.bonds[id];
        let (k1, k2) = (self.key_of[bond.atom1], self.key_of[bond.atom2]);
        Some(if k1 <= k2 { (k1, k2) } else { (k2, k1) })
    }

    /// The atoms directly bonded to `key`, sorted by canonical key.
    ///
    /// Returns `None` if the atom does not exist. An atom that appears at
    /// the far end of several parallel bonds is listed once per bond.
    pub fn neighbors(&self, key: AtomKey) -> Option<Vec<AtomKey>> {
        let &id = self.atom_keys.get(&key)?;
        let mut neighbors: Vec<AtomKey> = self.adjacency[id]
            .iter()
            .filter_map(|&bond_id| self.bonds[bond_id].other(id))
            .map(|other| self.key_of[other])
            .collect();
        neighbors.sort_unstable();
        Some(neighbors)
    }

    /// The bonds incident to `key`, sorted by canonical bond key.
    ///
    /// This is the atom's incident-bond list; it always equals the set of
    /// bonds in the compound whose endpoints include the atom.
    pub fn bonds_of(&self, key: AtomKey) -> Option<Vec<BondKey>> {
        let &id = self.atom_keys.get(&key)?;
        let mut bonds: Vec<BondKey> = self.adjacency[id]
            .iter()
            .map(|&bond_id| self.bond_key_of[bond_id])
            .collect();
        bonds.sort_unstable();
        Some(bonds)
    }

    pub fn contains_atom(&self, key: AtomKey) -> bool {
        self.atom_keys.contains_key(&key)
    }

    pub fn contains_bond(&self, key: BondKey) -> bool {
        self.bond_keys.contains_key(&key)
    }

    pub fn atom_count(&self) -> usize {
        self.atom_keys.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bond_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atom_keys.is_empty()
    }

    /// Exchange-format passthrough metadata.
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.metadata
    }

    /// The compound's intrinsic pKa, when its metadata carries one.
    pub fn pka(&self) -> Option<f64> {
        self.metadata.get("pka")?.parse().ok()
    }

    /// Whether every atom is reachable from every other through bonds.
    ///
    /// The empty compound counts as connected. Reaction mechanisms use this
    /// to decide what a fragmenting removal means; the mutation primitive
    /// itself accepts multi-component results.
    pub fn is_connected(&self) -> bool {
        let Some(&start) = self.atom_keys.values().next() else {
            return true;
        };
        let mut seen: SecondaryMap<AtomId, ()> = SecondaryMap::new();
        let mut queue = VecDeque::from([start]);
        seen.insert(start, ());
        while let Some(id) = queue.pop_front() {
            for &bond_id in &self.adjacency[id] {
                if let Some(other) = self.bonds[bond_id].other(id) {
                    if seen.insert(other, ()).is_none() {
                        queue.push_back(other);
                    }
                }
            }
        }
        seen.len() == self.atoms.len()
    }

    /// Re-derives the canonical atom and bond tables from the current graph.
    ///
    /// Atoms are renumbered `a1..aN` in the numeric order of their current
    /// keys. Bonds are then renumbered `b1..bM` ordered by the sorted pair
    /// of new endpoint keys, ties broken by the original bond key, so the
    /// result never depends on any internal iteration order. Applied to an
    /// already-canonical compound this reproduces [`Compound::to_record`]'s
    /// tables exactly.
    pub fn canonical_tables(&self) -> (AtomTable, BondTable) {
        let remap = canon::renumber(self.atom_keys.keys().copied());

        let atoms = self
            .atom_keys
            .iter()
            .map(|(&key, &id)| (remap[&key], self.atoms[id].clone()))
            .collect();

        let links = self.bond_keys.iter().map(|(&key, &id)| {
            let bond = &self.bonds[id];
            let link = BondLink::new(
                remap[&self.key_of[bond.atom1]],
                remap[&self.key_of[bond.atom2]],
                bond.order,
            )
            .with_chirality(bond.chirality);
            (key, link)
        });
        let bonds = canon::number_bonds(links);

        (atoms, bonds)
    }

    /// Removes one atom and every bond incident to it.
    ///
    /// This is the destructive half of the mutation primitive. It leaves the
    /// surviving canonical keys untouched (and therefore possibly sparse),
    /// so callers must immediately rebuild via [`Compound::canonical_tables`].
    pub(crate) fn detach_atom(&mut self, key: AtomKey) -> Result<Atom, StructureError> {
        let id = self
            .atom_keys
            .remove(&key)
            .ok_or(StructureError::AtomNotFound(key))?;
        self.key_of.remove(id);

        for bond_id in self.adjacency.remove(id).unwrap_or_default() {
            let Some(bond) = self.bonds.remove(bond_id) else {
                continue;
            };
            if let Some(other) = bond.other(id) {
                if let Some(incident) = self.adjacency.get_mut(other) {
                    incident.retain(|&b| b != bond_id);
                }
            }
            if let Some(bond_key) = self.bond_key_of.remove(bond_id) {
                self.bond_keys.remove(&bond_key);
            }
        }

        Ok(self.atoms.remove(id).expect("atom storage out of sync"))
    }

    fn insert_atom(&mut self, key: AtomKey, atom: Atom) {
        let id = self.atoms.insert(atom);
        self.atom_keys.insert(key, id);
        self.key_of.insert(id, key);
        self.adjacency.insert(id, Vec::new());
    }

    fn insert_bond(&mut self, key: BondKey, link: BondLink) -> Result<(), StructureError> {
        let (first, second) = link.endpoints;
        if first == second {
            return Err(StructureError::SelfBond(first));
        }
        let lookup = |atom: AtomKey| {
            self.atom_keys
                .get(&atom)
                .copied()
                .ok_or(StructureError::DanglingBond { bond: key, atom })
        };
        let id1 = lookup(first)?;
        let id2 = lookup(second)?;

        let mut bond = Bond::new(id1, id2, link.order);
        bond.chirality = link.chirality;
        let bond_id = self.bonds.insert(bond);
        self.bond_keys.insert(key, bond_id);
        self.bond_key_of.insert(bond_id, key);
        self.adjacency[id1].push(bond_id);
        self.adjacency[id2].push(bond_id);
        Ok(())
    }

    fn link_of(&self, id: BondId) -> BondLink {
        let bond = &self.bonds[id];
        BondLink::new(self.key_of[bond.atom1], self.key_of[bond.atom2], bond.order)
            .with_chirality(bond.chirality)
    }
}

impl PartialEq for Compound {
    /// Structural equality: atom table, bond table, and metadata all equal.
    fn eq(&self, other: &Self) -> bool {
        self.to_record() == other.to_record()
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.metadata.get("id").map_or("compound", String::as_str);
        write!(
            f,
            "{} ({} atoms, {} bonds)",
            name,
            self.atom_count(),
            self.bond_count()
        )
    }
}
