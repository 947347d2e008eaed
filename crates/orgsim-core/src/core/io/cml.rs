use crate::core::io::traits::ChemicalFile;
use crate::core::models::atom::Atom;
use crate::core::models::bond::{BondOrder, Chirality};
use crate::core::models::compound::{AtomTable, BondLink, BondTable, Compound, CompoundRecord};
use crate::core::models::keys::{AtomKey, BondKey, ParseKeyError};
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CmlError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: CmlParseErrorKind,
    },
    #[error("Inconsistent molecule: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum CmlParseErrorKind {
    #[error("malformed tag")]
    MalformedTag,
    #[error("unexpected end of document")]
    UnexpectedEof,
    #[error("unexpected <{found}> inside <{context}>")]
    UnexpectedTag {
        context: &'static str,
        found: String,
    },
    #[error("unexpected closing tag </{0}>")]
    UnexpectedClose(String),
    #[error("<{tag}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        tag: &'static str,
        attribute: &'static str,
    },
    #[error("invalid canonical key '{value}': {source}")]
    InvalidKey {
        value: String,
        source: ParseKeyError,
    },
    #[error("invalid bond order '{0}'")]
    InvalidBondOrder(String),
    #[error("invalid chirality '{0}'")]
    InvalidChirality(String),
    #[error("unknown builtin '{0}' in <string>")]
    UnknownBuiltin(String),
    #[error("<bond> must reference exactly two atoms")]
    WrongAtomRefCount,
    #[error("<{tag}> is missing a '{builtin}' entry")]
    MissingString {
        tag: &'static str,
        builtin: &'static str,
    },
}

/// Reader/writer for the CML dialect used as the exchange format.
///
/// A molecule element carries passthrough metadata as attributes and two
/// child arrays, one entry per atom and per bond:
///
/// ```text
/// <molecule id="Water">
///   <atomArray>
///     <atom id="a1"><string builtin="elementType">H</string></atom>
///   </atomArray>
///   <bondArray>
///     <bond id="b1">
///       <string builtin="atomRef">a1</string>
///       <string builtin="atomRef">a3</string>
///       <string builtin="order">1</string>
///     </bond>
///   </bondArray>
/// </molecule>
/// ```
///
/// Output is always in canonical order (atoms sorted by atom id, bonds by
/// bond id), so decoding and re-encoding a canonicalized compound reproduces
/// the document exactly.
pub struct CmlFile;

impl ChemicalFile for CmlFile {
    type Error = CmlError;

    fn read_from(reader: &mut impl BufRead) -> Result<Compound, Self::Error> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        let record = parse_document(&source)?;
        Compound::from_record(record).map_err(|e| CmlError::Inconsistency(e.to_string()))
    }

    fn write_to(compound: &Compound, writer: &mut impl Write) -> Result<(), Self::Error> {
        let record = compound.to_record();

        let mut attrs = String::new();
        for (name, value) in &record.metadata {
            attrs.push_str(&format!(" {}=\"{}\"", name, escape(value)));
        }
        writeln!(writer, "<molecule{attrs}>")?;

        writeln!(writer, "  <atomArray>")?;
        for (key, atom) in &record.atoms {
            writeln!(writer, "    <atom id=\"{key}\">")?;
            writeln!(
                writer,
                "      <string builtin=\"elementType\">{}</string>",
                escape(&atom.symbol)
            )?;
            writeln!(writer, "    </atom>")?;
        }
        writeln!(writer, "  </atomArray>")?;

        writeln!(writer, "  <bondArray>")?;
        for (key, link) in &record.bonds {
            writeln!(writer, "    <bond id=\"{key}\">")?;
            writeln!(
                writer,
                "      <string builtin=\"atomRef\">{}</string>",
                link.endpoints.0
            )?;
            writeln!(
                writer,
                "      <string builtin=\"atomRef\">{}</string>",
                link.endpoints.1
            )?;
            writeln!(
                writer,
                "      <string builtin=\"order\">{}</string>",
                link.order
            )?;
            if let Some(chirality) = link.chirality {
                writeln!(
                    writer,
                    "      <string builtin=\"chirality\">{chirality}</string>"
                )?;
            }
            writeln!(writer, "    </bond>")?;
        }
        writeln!(writer, "  </bondArray>")?;

        writeln!(writer, "</molecule>")?;
        Ok(())
    }
}

enum Tag<'a> {
    Open {
        name: &'a str,
        attrs: Vec<(&'a str, String)>,
        self_closing: bool,
    },
    Close {
        name: &'a str,
    },
}

struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn bump(&mut self, n: usize) {
        self.pos += n;
    }

    fn line(&self) -> usize {
        self.src[..self.pos].bytes().filter(|&b| b == b'\n').count() + 1
    }

    fn error(&self, kind: CmlParseErrorKind) -> CmlError {
        CmlError::Parse {
            line: self.line(),
            kind,
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn next_tag(&mut self) -> Result<Option<Tag<'a>>, CmlError> {
        loop {
            self.skip_whitespace();
            if self.rest().is_empty() {
                return Ok(None);
            }
            if self.rest().starts_with("<?") {
                match self.rest().find("?>") {
                    Some(end) => self.bump(end + 2),
                    None => return Err(self.error(CmlParseErrorKind::UnexpectedEof)),
                }
                continue;
            }
            if self.rest().starts_with("<!--") {
                match self.rest().find("-->") {
                    Some(end) => self.bump(end + 3),
                    None => return Err(self.error(CmlParseErrorKind::UnexpectedEof)),
                }
                continue;
            }
            if !self.rest().starts_with('<') {
                return Err(self.error(CmlParseErrorKind::MalformedTag));
            }
            break;
        }

        self.bump(1);
        if self.rest().starts_with('/') {
            self.bump(1);
            let name = self.read_name()?;
            self.skip_whitespace();
            if !self.rest().starts_with('>') {
                return Err(self.error(CmlParseErrorKind::MalformedTag));
            }
            self.bump(1);
            return Ok(Some(Tag::Close { name }));
        }

        let name = self.read_name()?;
        let mut attrs = Vec::new();
        loop {
            self.skip_whitespace();
            if self.rest().starts_with("/>") {
                self.bump(2);
                return Ok(Some(Tag::Open {
                    name,
                    attrs,
                    self_closing: true,
                }));
            }
            if self.rest().starts_with('>') {
                self.bump(1);
                return Ok(Some(Tag::Open {
                    name,
                    attrs,
                    self_closing: false,
                }));
            }
            if self.rest().is_empty() {
                return Err(self.error(CmlParseErrorKind::UnexpectedEof));
            }

            let attr_name = self.read_name()?;
            self.skip_whitespace();
            if !self.rest().starts_with('=') {
                return Err(self.error(CmlParseErrorKind::MalformedTag));
            }
            self.bump(1);
            self.skip_whitespace();
            if !self.rest().starts_with('"') {
                return Err(self.error(CmlParseErrorKind::MalformedTag));
            }
            self.bump(1);
            let Some(end) = self.rest().find('"') else {
                return Err(self.error(CmlParseErrorKind::UnexpectedEof));
            };
            let raw = &self.rest()[..end];
            self.bump(end + 1);
            attrs.push((attr_name, unescape(raw)));
        }
    }

    fn read_name(&mut self) -> Result<&'a str, CmlError> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ':'))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.error(CmlParseErrorKind::MalformedTag));
        }
        self.bump(end);
        Ok(&rest[..end])
    }

    fn read_text(&mut self) -> Result<String, CmlError> {
        let Some(end) = self.rest().find('<') else {
            return Err(self.error(CmlParseErrorKind::UnexpectedEof));
        };
        let raw = &self.rest()[..end];
        self.bump(end);
        Ok(unescape(raw.trim()))
    }
}

fn parse_document(source: &str) -> Result<CompoundRecord, CmlError> {
    let mut tz = Tokenizer::new(source);

    let (attrs, molecule_closed) = match tz.next_tag()? {
        Some(Tag::Open {
            name: "molecule",
            attrs,
            self_closing,
        }) => (attrs, self_closing),
        Some(Tag::Open { name, .. }) => {
            return Err(tz.error(CmlParseErrorKind::UnexpectedTag {
                context: "document",
                found: name.to_string(),
            }));
        }
        Some(Tag::Close { name }) => {
            return Err(tz.error(CmlParseErrorKind::UnexpectedClose(name.to_string())));
        }
        None => return Err(CmlError::MissingRecord("molecule".to_string())),
    };

    let metadata: BTreeMap<String, String> = attrs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

    let mut atoms: Option<AtomTable> = None;
    let mut bonds: Option<BondTable> = None;

    if !molecule_closed {
        loop {
            match tz.next_tag()? {
                Some(Tag::Open {
                    name: "atomArray",
                    self_closing,
                    ..
                }) => {
                    atoms = Some(parse_atom_array(&mut tz, self_closing)?);
                }
                Some(Tag::Open {
                    name: "bondArray",
                    self_closing,
                    ..
                }) => {
                    bonds = Some(parse_bond_array(&mut tz, self_closing)?);
                }
                Some(Tag::Close { name: "molecule" }) => break,
                Some(Tag::Open { name, .. }) => {
                    return Err(tz.error(CmlParseErrorKind::UnexpectedTag {
                        context: "molecule",
                        found: name.to_string(),
                    }));
                }
                Some(Tag::Close { name }) => {
                    return Err(tz.error(CmlParseErrorKind::UnexpectedClose(name.to_string())));
                }
                None => return Err(tz.error(CmlParseErrorKind::UnexpectedEof)),
            }
        }
    }

    Ok(CompoundRecord {
        atoms: atoms.ok_or_else(|| CmlError::MissingRecord("atomArray".to_string()))?,
        bonds: bonds.ok_or_else(|| CmlError::MissingRecord("bondArray".to_string()))?,
        metadata,
    })
}

fn parse_atom_array(tz: &mut Tokenizer<'_>, self_closing: bool) -> Result<AtomTable, CmlError> {
    let mut atoms = AtomTable::new();
    if self_closing {
        return Ok(atoms);
    }
    loop {
        match tz.next_tag()? {
            Some(Tag::Open {
                name: "atom",
                attrs,
                self_closing,
            }) => {
                let (key, atom) = parse_atom(tz, attrs, self_closing)?;
                if atoms.insert(key, atom).is_some() {
                    return Err(CmlError::Inconsistency(format!("duplicate atom id {key}")));
                }
            }
            Some(Tag::Close { name: "atomArray" }) => return Ok(atoms),
            Some(Tag::Open { name, .. }) => {
                return Err(tz.error(CmlParseErrorKind::UnexpectedTag {
                    context: "atomArray",
                    found: name.to_string(),
                }));
            }
            Some(Tag::Close { name }) => {
                return Err(tz.error(CmlParseErrorKind::UnexpectedClose(name.to_string())));
            }
            None => return Err(tz.error(CmlParseErrorKind::UnexpectedEof)),
        }
    }
}

fn parse_atom(
    tz: &mut Tokenizer<'_>,
    attrs: Vec<(&str, String)>,
    self_closing: bool,
) -> Result<(AtomKey, Atom), CmlError> {
    let key = required_key::<AtomKey>(tz, "atom", attrs)?;

    let mut symbol: Option<String> = None;
    if !self_closing {
        loop {
            match tz.next_tag()? {
                Some(Tag::Open {
                    name: "string",
                    attrs,
                    self_closing,
                }) => {
                    let (builtin, text) = parse_string(tz, attrs, self_closing)?;
                    match builtin.as_str() {
                        "elementType" => symbol = Some(text),
                        other => {
                            return Err(
                                tz.error(CmlParseErrorKind::UnknownBuiltin(other.to_string()))
                            );
                        }
                    }
                }
                Some(Tag::Close { name: "atom" }) => break,
                Some(Tag::Open { name, .. }) => {
                    return Err(tz.error(CmlParseErrorKind::UnexpectedTag {
                        context: "atom",
                        found: name.to_string(),
                    }));
                }
                Some(Tag::Close { name }) => {
                    return Err(tz.error(CmlParseErrorKind::UnexpectedClose(name.to_string())));
                }
                None => return Err(tz.error(CmlParseErrorKind::UnexpectedEof)),
            }
        }
    }

    let symbol = symbol.ok_or_else(|| {
        tz.error(CmlParseErrorKind::MissingString {
            tag: "atom",
            builtin: "elementType",
        })
    })?;
    Ok((key, Atom::new(&symbol)))
}

fn parse_bond_array(tz: &mut Tokenizer<'_>, self_closing: bool) -> Result<BondTable, CmlError> {
    let mut bonds = BondTable::new();
    if self_closing {
        return Ok(bonds);
    }
    loop {
        match tz.next_tag()? {
            Some(Tag::Open {
                name: "bond",
                attrs,
                self_closing,
            }) => {
                let (key, link) = parse_bond(tz, attrs, self_closing)?;
                if bonds.insert(key, link).is_some() {
                    return Err(CmlError::Inconsistency(format!("duplicate bond id {key}")));
                }
            }
            Some(Tag::Close { name: "bondArray" }) => return Ok(bonds),
            Some(Tag::Open { name, .. }) => {
                return Err(tz.error(CmlParseErrorKind::UnexpectedTag {
                    context: "bondArray",
                    found: name.to_string(),
                }));
            }
            Some(Tag::Close { name }) => {
                return Err(tz.error(CmlParseErrorKind::UnexpectedClose(name.to_string())));
            }
            None => return Err(tz.error(CmlParseErrorKind::UnexpectedEof)),
        }
    }
}

fn parse_bond(
    tz: &mut Tokenizer<'_>,
    attrs: Vec<(&str, String)>,
    self_closing: bool,
) -> Result<(BondKey, BondLink), CmlError> {
    let key = required_key::<BondKey>(tz, "bond", attrs)?;

    let mut atom_refs: Vec<AtomKey> = Vec::new();
    let mut order: Option<BondOrder> = None;
    let mut chirality: Option<Chirality> = None;

    if !self_closing {
        loop {
            match tz.next_tag()? {
                Some(Tag::Open {
                    name: "string",
                    attrs,
                    self_closing,
                }) => {
                    let (builtin, text) = parse_string(tz, attrs, self_closing)?;
                    match builtin.as_str() {
                        "atomRef" => {
                            let atom = text.parse::<AtomKey>().map_err(|source| {
                                tz.error(CmlParseErrorKind::InvalidKey {
                                    value: text.clone(),
                                    source,
                                })
                            })?;
                            atom_refs.push(atom);
                        }
                        "order" => {
                            order = Some(text.parse::<BondOrder>().map_err(|_| {
                                tz.error(CmlParseErrorKind::InvalidBondOrder(text.clone()))
                            })?);
                        }
                        "chirality" => {
                            chirality = Some(text.parse::<Chirality>().map_err(|_| {
                                tz.error(CmlParseErrorKind::InvalidChirality(text.clone()))
                            })?);
                        }
                        other => {
                            return Err(
                                tz.error(CmlParseErrorKind::UnknownBuiltin(other.to_string()))
                            );
                        }
                    }
                }
                Some(Tag::Close { name: "bond" }) => break,
                Some(Tag::Open { name, .. }) => {
                    return Err(tz.error(CmlParseErrorKind::UnexpectedTag {
                        context: "bond",
                        found: name.to_string(),
                    }));
                }
                Some(Tag::Close { name }) => {
                    return Err(tz.error(CmlParseErrorKind::UnexpectedClose(name.to_string())));
                }
                None => return Err(tz.error(CmlParseErrorKind::UnexpectedEof)),
            }
        }
    }

    let &[first, second] = atom_refs.as_slice() else {
        return Err(tz.error(CmlParseErrorKind::WrongAtomRefCount));
    };
    let order = order.ok_or_else(|| {
        tz.error(CmlParseErrorKind::MissingString {
            tag: "bond",
            builtin: "order",
        })
    })?;

    Ok((key, BondLink::new(first, second, order).with_chirality(chirality)))
}

fn parse_string(
    tz: &mut Tokenizer<'_>,
    attrs: Vec<(&str, String)>,
    self_closing: bool,
) -> Result<(String, String), CmlError> {
    let builtin = attrs
        .into_iter()
        .find(|(name, _)| *name == "builtin")
        .map(|(_, value)| value)
        .ok_or_else(|| {
            tz.error(CmlParseErrorKind::MissingAttribute {
                tag: "string",
                attribute: "builtin",
            })
        })?;

    if self_closing {
        return Ok((builtin, String::new()));
    }

    let text = tz.read_text()?;
    match tz.next_tag()? {
        Some(Tag::Close { name: "string" }) => Ok((builtin, text)),
        Some(_) => Err(tz.error(CmlParseErrorKind::UnexpectedTag {
            context: "string",
            found: "nested element".to_string(),
        })),
        None => Err(tz.error(CmlParseErrorKind::UnexpectedEof)),
    }
}

fn required_key<K: std::str::FromStr<Err = ParseKeyError>>(
    tz: &Tokenizer<'_>,
    tag: &'static str,
    attrs: Vec<(&str, String)>,
) -> Result<K, CmlError> {
    let value = attrs
        .into_iter()
        .find(|(name, _)| *name == "id")
        .map(|(_, value)| value)
        .ok_or_else(|| {
            tz.error(CmlParseErrorKind::MissingAttribute {
                tag,
                attribute: "id",
            })
        })?;
    value.parse::<K>().map_err(|source| {
        tz.error(CmlParseErrorKind::InvalidKey {
            value: value.clone(),
            source,
        })
    })
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        let entity = [
            ("&amp;", '&'),
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&quot;", '"'),
            ("&apos;", '\''),
        ]
        .into_iter()
        .find(|(name, _)| rest.starts_with(name));
        match entity {
            Some((name, replacement)) => {
                out.push(replacement);
                rest = &rest[name.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    const WATER_CML: &str = "\
<molecule id=\"Water\">
  <atomArray>
    <atom id=\"a1\">
      <string builtin=\"elementType\">H</string>
    </atom>
    <atom id=\"a2\">
      <string builtin=\"elementType\">H</string>
    </atom>
    <atom id=\"a3\">
      <string builtin=\"elementType\">O</string>
    </atom>
  </atomArray>
  <bondArray>
    <bond id=\"b1\">
      <string builtin=\"atomRef\">a1</string>
      <string builtin=\"atomRef\">a3</string>
      <string builtin=\"order\">1</string>
    </bond>
    <bond id=\"b2\">
      <string builtin=\"atomRef\">a2</string>
      <string builtin=\"atomRef\">a3</string>
      <string builtin=\"order\">1</string>
    </bond>
  </bondArray>
</molecule>
";

    fn read(source: &str) -> Result<Compound, CmlError> {
        CmlFile::read_from(&mut BufReader::new(source.as_bytes()))
    }

    fn water() -> Compound {
        read(WATER_CML).unwrap()
    }

    #[test]
    fn parses_water_molecule() {
        let compound = water();
        assert_eq!(compound.atom_count(), 3);
        assert_eq!(compound.bond_count(), 2);
        assert_eq!(compound.atom(AtomKey::new(1)).unwrap().symbol, "H");
        assert_eq!(compound.atom(AtomKey::new(3)).unwrap().symbol, "O");
        assert_eq!(compound.metadata().get("id").unwrap(), "Water");
        assert_eq!(
            compound.bond_endpoints(BondKey::new(1)).unwrap(),
            (AtomKey::new(1), AtomKey::new(3))
        );
        assert_eq!(
            compound.bond(BondKey::new(1)).unwrap().order,
            BondOrder::Single
        );
    }

    #[test]
    fn writes_water_molecule_in_canonical_order() {
        let compound = water();
        let mut output = Vec::new();
        CmlFile::write_to(&compound, &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), WATER_CML);
    }

    #[test]
    fn round_trip_preserves_everything() {
        let compound = water();
        let mut output = Vec::new();
        CmlFile::write_to(&compound, &mut output).unwrap();
        let reparsed = read(std::str::from_utf8(&output).unwrap()).unwrap();
        assert_eq!(compound, reparsed);
    }

    #[test]
    fn chirality_and_extra_metadata_survive_a_round_trip() {
        let source = "\
<molecule id=\"but-2-ene\" pka=\"44\">
  <atomArray>
    <atom id=\"a1\"><string builtin=\"elementType\">C</string></atom>
    <atom id=\"a2\"><string builtin=\"elementType\">C</string></atom>
  </atomArray>
  <bondArray>
    <bond id=\"b1\">
      <string builtin=\"atomRef\">a1</string>
      <string builtin=\"atomRef\">a2</string>
      <string builtin=\"order\">2</string>
      <string builtin=\"chirality\">Z</string>
    </bond>
  </bondArray>
</molecule>
";
        let compound = read(source).unwrap();
        assert_eq!(
            compound.bond(BondKey::new(1)).unwrap().chirality,
            Some(Chirality::Z)
        );
        assert_eq!(compound.pka(), Some(44.0));

        let mut output = Vec::new();
        CmlFile::write_to(&compound, &mut output).unwrap();
        let reparsed = read(std::str::from_utf8(&output).unwrap()).unwrap();
        assert_eq!(compound, reparsed);
    }

    #[test]
    fn tolerates_prolog_comments_and_compact_layout() {
        let source = "<?xml version=\"1.0\"?><!-- fixture -->\
<molecule><atomArray><atom id=\"a1\">\
<string builtin=\"elementType\">H</string></atom></atomArray>\
<bondArray/></molecule>";
        let compound = read(source).unwrap();
        assert_eq!(compound.atom_count(), 1);
        assert_eq!(compound.bond_count(), 0);
    }

    #[test]
    fn escaped_characters_round_trip() {
        let mut compound = Compound::new();
        compound.add_atom(Atom::new("H"));
        compound
            .metadata_mut()
            .insert("id".to_string(), "salt <\"Na&Cl\">".to_string());

        let mut output = Vec::new();
        CmlFile::write_to(&compound, &mut output).unwrap();
        let reparsed = read(std::str::from_utf8(&output).unwrap()).unwrap();
        assert_eq!(
            reparsed.metadata().get("id").unwrap(),
            "salt <\"Na&Cl\">"
        );
    }

    #[test]
    fn missing_molecule_is_a_missing_record() {
        assert!(matches!(
            read("   ").unwrap_err(),
            CmlError::MissingRecord(record) if record == "molecule"
        ));
    }

    #[test]
    fn missing_arrays_are_missing_records() {
        assert!(matches!(
            read("<molecule></molecule>").unwrap_err(),
            CmlError::MissingRecord(record) if record == "atomArray"
        ));
        assert!(matches!(
            read("<molecule><atomArray/></molecule>").unwrap_err(),
            CmlError::MissingRecord(record) if record == "bondArray"
        ));
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let source = "<molecule>\n  <atomArray>\n    <atom>\n";
        let err = read(source).unwrap_err();
        match err {
            CmlError::Parse { line, kind } => {
                assert_eq!(line, 3);
                assert!(matches!(
                    kind,
                    CmlParseErrorKind::MissingAttribute {
                        tag: "atom",
                        attribute: "id",
                    }
                ));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_keys_and_orders_are_rejected() {
        let bad_key = "<molecule><atomArray><atom id=\"x1\">\
<string builtin=\"elementType\">H</string></atom></atomArray>\
<bondArray/></molecule>";
        assert!(matches!(
            read(bad_key).unwrap_err(),
            CmlError::Parse {
                kind: CmlParseErrorKind::InvalidKey { .. },
                ..
            }
        ));

        let bad_order = "<molecule><atomArray>\
<atom id=\"a1\"><string builtin=\"elementType\">H</string></atom>\
<atom id=\"a2\"><string builtin=\"elementType\">H</string></atom>\
</atomArray><bondArray><bond id=\"b1\">\
<string builtin=\"atomRef\">a1</string>\
<string builtin=\"atomRef\">a2</string>\
<string builtin=\"order\">7</string>\
</bond></bondArray></molecule>";
        assert!(matches!(
            read(bad_order).unwrap_err(),
            CmlError::Parse {
                kind: CmlParseErrorKind::InvalidBondOrder(order),
                ..
            } if order == "7"
        ));
    }

    #[test]
    fn bond_referencing_unknown_atom_is_inconsistent() {
        let source = "<molecule><atomArray>\
<atom id=\"a1\"><string builtin=\"elementType\">H</string></atom>\
</atomArray><bondArray><bond id=\"b1\">\
<string builtin=\"atomRef\">a1</string>\
<string builtin=\"atomRef\">a9</string>\
<string builtin=\"order\">1</string>\
</bond></bondArray></molecule>";
        assert!(matches!(read(source).unwrap_err(), CmlError::Inconsistency(_)));
    }

    #[test]
    fn path_helpers_round_trip_through_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("water.cml");

        let compound = water();
        CmlFile::write_to_path(&compound, &path).unwrap();
        let reparsed = CmlFile::read_from_path(&path).unwrap();
        assert_eq!(compound, reparsed);
    }
}
