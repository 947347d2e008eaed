use crate::core::models::compound::Compound;
use std::fmt;

/// One compound produced by a reaction, with its relative yield.
///
/// [`Product::new`] takes the compound as an `Option`: a branch that
/// produced nothing stable (for example a leaving group with no stable
/// form) passes `None` and gets no product back, which is how such
/// branches disappear when a [`Products`] value is assembled.
#[derive(Debug, Clone)]
pub struct Product {
    compound: Compound,
    percentage: f64,
}

impl Product {
    pub fn new(compound: Option<Compound>, percentage: f64) -> Option<Self> {
        compound.map(|compound| Self {
            compound,
            percentage,
        })
    }

    pub fn compound(&self) -> &Compound {
        &self.compound
    }

    /// The relative yield of this product, as a fraction of its bucket.
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn into_compound(self) -> Compound {
        self.compound
    }
}

/// Equality is the wrapped compound's; the yield does not participate.
impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.compound == other.compound
    }
}

impl PartialEq<Compound> for Product {
    fn eq(&self, other: &Compound) -> bool {
        self.compound == *other
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.compound, f)
    }
}

/// The outcome of an irreversible reaction, split into major and minor
/// products.
///
/// Construction filters out absent candidates, so both buckets only ever
/// hold real products. `Products` deliberately implements no equality: two
/// distinct outcome values never compare equal, and callers inspect
/// [`Products::major`] and [`Products::minor`] directly instead.
#[derive(Debug, Clone, Default)]
pub struct Products {
    major: Vec<Product>,
    minor: Vec<Product>,
}

impl Products {
    pub fn new(
        major: impl IntoIterator<Item = Option<Product>>,
        minor: impl IntoIterator<Item = Option<Product>>,
    ) -> Self {
        Self {
            major: major.into_iter().flatten().collect(),
            minor: minor.into_iter().flatten().collect(),
        }
    }

    pub fn major(&self) -> &[Product] {
        &self.major
    }

    pub fn minor(&self) -> &[Product] {
        &self.minor
    }
}

/// The outcome of a reversible reaction step.
///
/// Both sides of the equilibrium stay retrievable: the reactant compounds
/// are kept verbatim next to the product split, so either side can be
/// inspected without recomputation.
#[derive(Debug, Clone)]
pub struct EquilibriumProducts {
    reactants: Vec<Compound>,
    products: Products,
}

impl EquilibriumProducts {
    pub fn new(reactants: Vec<Compound>, products: Products) -> Self {
        Self {
            reactants,
            products,
        }
    }

    pub fn reactants(&self) -> &[Compound] {
        &self.reactants
    }

    pub fn products(&self) -> &Products {
        &self.products
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::bond::BondOrder;

    fn methane() -> Compound {
        let mut compound = Compound::new();
        let c = compound.add_atom(Atom::new("C"));
        for _ in 0..4 {
            let h = compound.add_atom(Atom::new("H"));
            compound.add_bond(c, h, BondOrder::Single).unwrap();
        }
        compound
    }

    fn hydroxide() -> Compound {
        let mut compound = Compound::new();
        let o = compound.add_atom(Atom::new("O"));
        let h = compound.add_atom(Atom::new("H"));
        compound.add_bond(o, h, BondOrder::Single).unwrap();
        compound
    }

    #[test]
    fn product_of_nothing_is_no_product() {
        assert!(Product::new(None, 0.2).is_none());
        assert!(Product::new(Some(methane()), 0.8).is_some());
    }

    #[test]
    fn product_equality_ignores_percentage_and_unwraps() {
        let first = Product::new(Some(methane()), 0.8).unwrap();
        let second = Product::new(Some(methane()), 0.2).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, methane());

        let other = Product::new(Some(hydroxide()), 0.8).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn absent_candidates_are_dropped_from_both_buckets() {
        let products = Products::new(
            [
                Product::new(Some(methane()), 0.8),
                None,
                Product::new(None, 0.2),
            ],
            [Product::new(None, 1.0)],
        );

        assert_eq!(products.major().len(), 1);
        assert_eq!(products.major()[0], methane());
        assert_eq!(products.major()[0].percentage(), 0.8);
        assert!(products.minor().is_empty());
    }

    #[test]
    fn buckets_preserve_candidate_order() {
        let products = Products::new(
            [
                Product::new(Some(methane()), 0.6),
                Product::new(Some(hydroxide()), 0.4),
            ],
            [],
        );
        assert_eq!(products.major()[0], methane());
        assert_eq!(products.major()[1], hydroxide());
    }

    #[test]
    fn equilibrium_keeps_reactants_verbatim() {
        let reactant = methane();
        let equilibrium = EquilibriumProducts::new(
            vec![reactant.clone()],
            Products::new([Product::new(Some(hydroxide()), 1.0)], []),
        );

        assert_eq!(equilibrium.reactants(), &[reactant]);
        assert_eq!(equilibrium.products().major().len(), 1);
        assert!(equilibrium.products().minor().is_empty());
    }
}
