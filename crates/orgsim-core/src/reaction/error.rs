use thiserror::Error;

use super::conditions::ConditionsError;
use super::solvent::ContradictionError;
use crate::core::models::compound::StructureError;

#[derive(Debug, Error)]
pub enum ReactionError {
    #[error("structural error: {source}")]
    Structure {
        #[from]
        source: StructureError,
    },

    #[error("invalid reaction conditions: {source}")]
    Conditions {
        #[from]
        source: ConditionsError,
    },

    #[error("contradictory model setup: {source}")]
    Contradiction {
        #[from]
        source: ContradictionError,
    },

    #[error("mechanism failure: {0}")]
    Mechanism(String),
}
