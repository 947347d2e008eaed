use crate::core::models::compound::Compound;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContradictionError {
    #[error("the pKa of a compound does not change (known {known}, proposed {proposed})")]
    PkaMismatch { known: f64, proposed: f64 },
}

/// A compound playing the solvent role in a reaction, with its pKa.
///
/// When the wrapped compound's own pKa is already known (through its
/// metadata), the solvent cannot contradict it: constructing or re-setting
/// with a different value fails, while an equal value is accepted. As long
/// as the compound's pKa is unknown the solvent pKa may be set freely.
#[derive(Debug, Clone)]
pub struct Solvent {
    compound: Compound,
    pka: f64,
}

impl Solvent {
    /// # Errors
    ///
    /// Returns a contradiction error if the compound's intrinsic pKa is
    /// known and differs from `pka`.
    pub fn new(compound: Compound, pka: f64) -> Result<Self, ContradictionError> {
        let pka = Self::reconcile(&compound, pka)?;
        Ok(Self { compound, pka })
    }

    /// Re-sets the solvent pKa under the same one-way rule as construction.
    ///
    /// # Errors
    ///
    /// Returns a contradiction error if the compound's intrinsic pKa is
    /// known and differs from `pka`.
    pub fn set_pka(&mut self, pka: f64) -> Result<(), ContradictionError> {
        self.pka = Self::reconcile(&self.compound, pka)?;
        Ok(())
    }

    pub fn compound(&self) -> &Compound {
        &self.compound
    }

    pub fn pka(&self) -> f64 {
        self.pka
    }

    pub fn into_compound(self) -> Compound {
        self.compound
    }

    fn reconcile(compound: &Compound, proposed: f64) -> Result<f64, ContradictionError> {
        match compound.pka() {
            Some(known) if known != proposed => {
                Err(ContradictionError::PkaMismatch { known, proposed })
            }
            Some(known) => Ok(known),
            None => Ok(proposed),
        }
    }
}
