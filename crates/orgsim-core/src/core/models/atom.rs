use std::fmt;

/// Represents a single atom within a compound.
///
/// An atom carries only its element symbol at this layer. Its incidence
/// (which bonds touch it) is owned by the compound's adjacency structure,
/// so atom and bond bookkeeping can never drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    /// The element symbol (e.g. "H", "O", "Cl").
    pub symbol: String,
}

impl Atom {
    /// Creates a new atom with the given element symbol.
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
