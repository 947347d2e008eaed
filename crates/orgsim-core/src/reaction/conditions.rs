use crate::core::io::cml::{CmlError, CmlFile};
use crate::core::io::traits::ChemicalFile;
use crate::core::models::compound::Compound;
use crate::core::models::keys::{AtomKey, ParseKeyError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// The pKa an environment is assumed to have when none is specified, i.e.
/// effectively neutral and inert.
pub const NEUTRAL_PKA: f64 = 16.0;

#[derive(Debug, Error)]
pub enum ConditionsError {
    #[error("conditions are either acidic or basic, not both")]
    MutuallyExclusive,

    #[error("non-neutral conditions must specify {0}")]
    MissingParameter(&'static str),

    #[error("pKa location {0} is not an atom of the pKa molecule")]
    PkaLocationMissing(AtomKey),

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },

    #[error("failed to load pKa molecule from '{path}': {source}")]
    PkaMolecule { path: String, source: CmlError },

    #[error("invalid pKa location '{value}': {source}")]
    PkaLocation {
        value: String,
        source: ParseKeyError,
    },
}

/// The chemical environment a reaction executes under.
///
/// A `Conditions` value is validated once at construction and is immutable
/// afterwards; in particular `neutral` is derived from the polarity flags
/// and can never disagree with them. Values are built either through
/// [`Conditions::builder`] or loaded from a TOML file via
/// [`Conditions::load`].
#[derive(Debug, Clone)]
pub struct Conditions {
    acidic: bool,
    basic: bool,
    neutral: bool,
    pka: f64,
    pka_molecule: Option<Compound>,
    pka_location: Option<AtomKey>,
    extra: BTreeMap<String, toml::Value>,
}

impl Conditions {
    pub fn builder() -> ConditionsBuilder {
        ConditionsBuilder::default()
    }

    /// Whether the environment is acidic.
    pub fn acidic(&self) -> bool {
        self.acidic
    }

    /// Whether the environment is basic.
    pub fn basic(&self) -> bool {
        self.basic
    }

    /// Whether the environment is neither acidic nor basic.
    pub fn neutral(&self) -> bool {
        self.neutral
    }

    /// The pKa of the environment; [`NEUTRAL_PKA`] when unspecified.
    pub fn pka(&self) -> f64 {
        self.pka
    }

    /// The compound responsible for the pKa value.
    pub fn pka_molecule(&self) -> Option<&Compound> {
        self.pka_molecule.as_ref()
    }

    /// The atom of the pKa molecule bearing the acidic or basic site.
    pub fn pka_location(&self) -> Option<AtomKey> {
        self.pka_location
    }

    /// Any additional keys supplied alongside the recognized ones.
    pub fn extra(&self) -> &BTreeMap<String, toml::Value> {
        &self.extra
    }

    /// Loads conditions from a TOML file.
    ///
    /// The file holds a [`ConditionsSpec`]; a `pka_molecule` entry names a
    /// CML file resolved relative to the conditions file itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if a
    /// referenced CML file fails to load, or if validation rejects the
    /// resulting configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConditionsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConditionsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let spec: ConditionsSpec =
            toml::from_str(&content).map_err(|source| ConditionsError::Toml {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_spec(spec, path.parent().unwrap_or_else(|| Path::new(".")))
    }

    /// Builds conditions from a deserialized spec, resolving file references
    /// against `base_dir`.
    pub fn from_spec(spec: ConditionsSpec, base_dir: &Path) -> Result<Self, ConditionsError> {
        let mut builder = Conditions::builder();
        if let Some(acidic) = spec.acidic {
            builder = builder.acidic(acidic);
        }
        if let Some(basic) = spec.basic {
            builder = builder.basic(basic);
        }
        if let Some(pka) = spec.pka {
            builder = builder.pka(pka);
        }
        if let Some(relative) = &spec.pka_molecule {
            let molecule_path = base_dir.join(relative);
            let compound = CmlFile::read_from_path(&molecule_path).map_err(|source| {
                ConditionsError::PkaMolecule {
                    path: molecule_path.display().to_string(),
                    source,
                }
            })?;
            builder = builder.pka_molecule(compound);
        }
        if let Some(location) = &spec.pka_location {
            let key = location
                .parse::<AtomKey>()
                .map_err(|source| ConditionsError::PkaLocation {
                    value: location.clone(),
                    source,
                })?;
            builder = builder.pka_location(key);
        }
        for (name, value) in spec.extra {
            builder = builder.extra(name, value);
        }
        builder.build()
    }
}

impl Default for Conditions {
    /// Neutral conditions with the default pKa.
    fn default() -> Self {
        Self {
            acidic: false,
            basic: false,
            neutral: true,
            pka: NEUTRAL_PKA,
            pka_molecule: None,
            pka_location: None,
            extra: BTreeMap::new(),
        }
    }
}

impl fmt::Display for Conditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let polarity = if self.acidic {
            "acidic"
        } else if self.basic {
            "basic"
        } else {
            "neutral"
        };
        write!(f, "{} reaction conditions (pKa {})", polarity, self.pka)
    }
}

/// The on-disk schema of a conditions file.
///
/// `pka_molecule` is the path of a CML file, relative to the conditions
/// file. Unrecognized keys are collected into `extra` and passed through.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConditionsSpec {
    pub acidic: Option<bool>,
    pub basic: Option<bool>,
    pub pka: Option<f64>,
    pub pka_molecule: Option<String>,
    pub pka_location: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

/// Builds and validates a [`Conditions`] value.
///
/// Validation happens in [`ConditionsBuilder::build`], in order: supplying
/// both polarity flags is rejected; supplying either requires `pka`,
/// `pka_molecule`, and `pka_location`; the unspecified polarity flag becomes
/// the negation of the specified one; remaining keys pass through; `neutral`
/// is derived last.
#[derive(Debug, Default)]
pub struct ConditionsBuilder {
    acidic: Option<bool>,
    basic: Option<bool>,
    pka: Option<f64>,
    pka_molecule: Option<Compound>,
    pka_location: Option<AtomKey>,
    extra: BTreeMap<String, toml::Value>,
}

impl ConditionsBuilder {
    pub fn acidic(mut self, acidic: bool) -> Self {
        self.acidic = Some(acidic);
        self
    }

    pub fn basic(mut self, basic: bool) -> Self {
        self.basic = Some(basic);
        self
    }

    pub fn pka(mut self, pka: f64) -> Self {
        self.pka = Some(pka);
        self
    }

    pub fn pka_molecule(mut self, compound: Compound) -> Self {
        self.pka_molecule = Some(compound);
        self
    }

    pub fn pka_location(mut self, key: AtomKey) -> Self {
        self.pka_location = Some(key);
        self
    }

    pub fn extra(mut self, name: impl Into<String>, value: toml::Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// # Errors
    ///
    /// Returns a configuration error as described on the type; no partial
    /// `Conditions` value is ever exposed.
    pub fn build(self) -> Result<Conditions, ConditionsError> {
        if self.acidic.is_some() && self.basic.is_some() {
            return Err(ConditionsError::MutuallyExclusive);
        }

        let polarized = self.acidic.is_some() || self.basic.is_some();
        if polarized {
            if self.pka.is_none() {
                return Err(ConditionsError::MissingParameter("pka"));
            }
            if self.pka_molecule.is_none() {
                return Err(ConditionsError::MissingParameter("pka_molecule"));
            }
            if self.pka_location.is_none() {
                return Err(ConditionsError::MissingParameter("pka_location"));
            }
        }

        let (acidic, basic) = match (self.acidic, self.basic) {
            (Some(acidic), None) => (acidic, !acidic),
            (None, Some(basic)) => (!basic, basic),
            (None, None) => (false, false),
            (Some(_), Some(_)) => unreachable!("rejected above"),
        };

        if let (Some(molecule), Some(location)) = (&self.pka_molecule, self.pka_location) {
            if !molecule.contains_atom(location) {
                return Err(ConditionsError::PkaLocationMissing(location));
            }
        }

        Ok(Conditions {
            acidic,
            basic,
            neutral: !(acidic || basic),
            pka: self.pka.unwrap_or(NEUTRAL_PKA),
            pka_molecule: self.pka_molecule,
            pka_location: self.pka_location,
            extra: self.extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::bond::BondOrder;
    use std::io::Write;

    fn acetic_acid() -> Compound {
        let mut compound = Compound::new();
        let c = compound.add_atom(Atom::new("C"));
        let o = compound.add_atom(Atom::new("O"));
        let h = compound.add_atom(Atom::new("H"));
        compound.add_bond(c, o, BondOrder::Single).unwrap();
        compound.add_bond(o, h, BondOrder::Single).unwrap();
        compound
            .metadata_mut()
            .insert("id".to_string(), "AceticAcid".to_string());
        compound
    }

    #[test]
    fn empty_builder_yields_neutral_defaults() {
        let conditions = Conditions::builder().build().unwrap();
        assert!(conditions.neutral());
        assert!(!conditions.acidic());
        assert!(!conditions.basic());
        assert_eq!(conditions.pka(), NEUTRAL_PKA);
        assert!(conditions.pka_molecule().is_none());
        assert!(conditions.pka_location().is_none());
    }

    #[test]
    fn acidic_and_basic_together_are_rejected() {
        let err = Conditions::builder()
            .acidic(true)
            .basic(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConditionsError::MutuallyExclusive));
    }

    #[test]
    fn acidic_without_pka_triple_is_rejected() {
        let err = Conditions::builder().acidic(true).build().unwrap_err();
        assert!(matches!(err, ConditionsError::MissingParameter("pka")));

        let err = Conditions::builder()
            .acidic(true)
            .pka(4.76)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConditionsError::MissingParameter("pka_molecule")
        ));

        let err = Conditions::builder()
            .acidic(true)
            .pka(4.76)
            .pka_molecule(acetic_acid())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConditionsError::MissingParameter("pka_location")
        ));
    }

    #[test]
    fn full_acidic_conditions_validate() {
        let conditions = Conditions::builder()
            .acidic(true)
            .pka(4.76)
            .pka_molecule(acetic_acid())
            .pka_location(AtomKey::new(3))
            .build()
            .unwrap();
        assert!(conditions.acidic());
        assert!(!conditions.basic());
        assert!(!conditions.neutral());
        assert_eq!(conditions.pka(), 4.76);
        assert_eq!(conditions.pka_location(), Some(AtomKey::new(3)));
        assert_eq!(
            conditions.pka_molecule().unwrap().metadata().get("id").unwrap(),
            "AceticAcid"
        );
    }

    #[test]
    fn unspecified_polarity_is_negation_of_the_specified_one() {
        let conditions = Conditions::builder()
            .acidic(false)
            .pka(38.0)
            .pka_molecule(acetic_acid())
            .pka_location(AtomKey::new(1))
            .build()
            .unwrap();
        assert!(!conditions.acidic());
        assert!(conditions.basic());
        assert!(!conditions.neutral());
    }

    #[test]
    fn pka_location_must_exist_in_the_molecule() {
        let err = Conditions::builder()
            .basic(true)
            .pka(38.0)
            .pka_molecule(acetic_acid())
            .pka_location(AtomKey::new(9))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConditionsError::PkaLocationMissing(key) if key == AtomKey::new(9)
        ));
    }

    #[test]
    fn neutral_conditions_may_still_carry_a_pka() {
        let conditions = Conditions::builder().pka(20.0).build().unwrap();
        assert!(conditions.neutral());
        assert_eq!(conditions.pka(), 20.0);
    }

    #[test]
    fn extra_keys_pass_through() {
        let conditions = Conditions::builder()
            .extra("temperature", toml::Value::Float(298.15))
            .build()
            .unwrap();
        assert_eq!(
            conditions.extra().get("temperature"),
            Some(&toml::Value::Float(298.15))
        );
    }

    #[test]
    fn display_names_the_polarity() {
        let conditions = Conditions::builder().build().unwrap();
        assert_eq!(
            conditions.to_string(),
            "neutral reaction conditions (pKa 16)"
        );
    }

    #[test]
    fn load_reads_spec_and_referenced_molecule() {
        let dir = tempfile::tempdir().unwrap();

        let cml_path = dir.path().join("acetic_acid.cml");
        CmlFile::write_to_path(&acetic_acid(), &cml_path).unwrap();

        let conditions_path = dir.path().join("conditions.toml");
        let mut file = std::fs::File::create(&conditions_path).unwrap();
        writeln!(
            file,
            "acidic = true\npka = 4.76\npka_molecule = \"acetic_acid.cml\"\n\
             pka_location = \"a3\"\ntemperature = 298.15"
        )
        .unwrap();

        let conditions = Conditions::load(&conditions_path).unwrap();
        assert!(conditions.acidic());
        assert_eq!(conditions.pka(), 4.76);
        assert_eq!(conditions.pka_location(), Some(AtomKey::new(3)));
        assert_eq!(
            conditions.pka_molecule().unwrap().metadata().get("id").unwrap(),
            "AceticAcid"
        );
        assert_eq!(
            conditions.extra().get("temperature"),
            Some(&toml::Value::Float(298.15))
        );
    }

    #[test]
    fn load_surfaces_missing_files_and_bad_toml() {
        let dir = tempfile::tempdir().unwrap();

        let err = Conditions::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConditionsError::Io { .. }));

        let bad_path = dir.path().join("bad.toml");
        std::fs::write(&bad_path, "acidic = = true").unwrap();
        let err = Conditions::load(&bad_path).unwrap_err();
        assert!(matches!(err, ConditionsError::Toml { .. }));
    }
}
