use super::ids::AtomId;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BondOrder {
    Single = 1,
    Double = 2,
    Triple = 3,
}

impl BondOrder {
    /// The integer bond order used by the exchange format.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl Default for BondOrder {
    fn default() -> Self {
        BondOrder::Single
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Flat stereochemical marker on a double bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chirality {
    E,
    Z,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid chirality string")]
pub struct ParseChiralityError;

impl FromStr for Chirality {
    type Err = ParseChiralityError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "e" => Ok(Self::E),
            "z" => Ok(Self::Z),
            _ => Err(ParseChiralityError),
        }
    }
}

impl fmt::Display for Chirality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::E => "E",
                Self::Z => "Z",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: AtomId, // ID of the first endpoint
    pub atom2: AtomId, // ID of the second endpoint
    pub order: BondOrder,
    pub chirality: Option<Chirality>,
}

impl Bond {
    pub fn new(atom1: AtomId, atom2: AtomId, order: BondOrder) -> Self {
        Self {
            atom1,
            atom2,
            order,
            chirality: None,
        }
    }

    pub fn contains(&self, atom_id: AtomId) -> bool {
        self.atom1 == atom_id || self.atom2 == atom_id
    }

    /// The endpoint opposite to `atom_id`, if `atom_id` is an endpoint at all.
    pub fn other(&self, atom_id: AtomId) -> Option<AtomId> {
        if self.atom1 == atom_id {
            Some(self.atom2)
        } else if self.atom2 == atom_id {
            Some(self.atom1)
        } else {
            None
        }
    }
}
