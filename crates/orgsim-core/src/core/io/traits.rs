use crate::core::models::compound::Compound;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing compound exchange formats.
///
/// Implementors handle format-specific parsing and serialization; passthrough
/// metadata travels inside the [`Compound`] itself, so a round trip through
/// any implementor preserves it.
pub trait ChemicalFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a compound from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Compound, Self::Error>;

    /// Writes a compound to a writer in canonical order.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(compound: &Compound, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a compound from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Compound, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a compound to a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(compound: &Compound, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(compound, &mut writer)
    }
}
