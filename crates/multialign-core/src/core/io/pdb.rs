use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::{Atom, infer_element};
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::warn;

/// One line of the source file, kept in order.
#[derive(Debug, Clone, PartialEq)]
pub enum PdbRecord {
    /// A record the structure model does not represent, stored with its line terminator.
    Raw(String),
    /// The atom at this index in file order; its text lives in [`PdbMetadata::atom_lines`].
    Atom(usize),
}

/// The original text of an ATOM/HETATM record and the position parsed from it.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomLine {
    pub text: String,
    pub position: Point3<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbMetadata {
    pub records: Vec<PdbRecord>,
    pub atom_lines: Vec<AtomLine>,
    /// Non-blank lines after the first ENDMDL that were not read.
    pub skipped_lines: usize,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must reach column 54)")]
    LineTooShort,
}

const MIN_ATOM_LINE_LEN: usize = 54;
const COORDS_START: usize = 30;
const COORDS_END: usize = 54;

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    line.get(start..end).unwrap_or("").trim()
}

fn record_name(line: &str) -> &str {
    line.get(0..6).unwrap_or(line).trim()
}

fn strip_terminator(text: &str) -> &str {
    text.trim_end_matches(['\r', '\n'])
}

fn optional_char(line: &str, column: usize) -> Option<char> {
    line.get(column..column + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| !c.is_whitespace())
}

fn parse_float(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    columns: &str,
) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: columns.into(),
            value: value.into(),
        },
    })
}

fn parse_optional_float(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    columns: &str,
) -> Result<Option<f64>, PdbError> {
    if slice_and_trim(line, start, end).is_empty() {
        return Ok(None);
    }
    parse_float(line, line_num, start, end, columns).map(Some)
}

fn parse_int<T: std::str::FromStr>(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    columns: &str,
) -> Result<T, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: columns.into(),
            value: value.into(),
        },
    })
}

/// Parses one ATOM/HETATM record into `structure`.
fn parse_atom_record(
    line: &str,
    line_num: usize,
    structure: &mut Structure,
) -> Result<Point3<f64>, PdbError> {
    if line.len() < MIN_ATOM_LINE_LEN {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::LineTooShort,
        });
    }

    let serial: usize = parse_int(line, line_num, 6, 11, "7-11")?;
    let name = slice_and_trim(line, 12, 16);
    if name.is_empty() {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::MissingRequiredField {
                columns: "13-16".into(),
            },
        });
    }
    let alt_loc = optional_char(line, 16);
    let res_name = slice_and_trim(line, 17, 20);
    let chain_id = optional_char(line, 21).unwrap_or(' ');
    let res_seq: isize = parse_int(line, line_num, 22, 26, "23-26")?;
    let insertion_code = optional_char(line, 26);

    let x = parse_float(line, line_num, 30, 38, "31-38")?;
    let y = parse_float(line, line_num, 38, 46, "39-46")?;
    let z = parse_float(line, line_num, 46, 54, "47-54")?;
    let occupancy = parse_optional_float(line, line_num, 54, 60, "55-60")?;
    let b_factor = parse_optional_float(line, line_num, 60, 66, "61-66")?;
    let element = slice_and_trim(line, 76, 78);

    let chain = structure.add_chain(chain_id);
    let residue_id = structure
        .add_residue(chain, res_seq, insertion_code, res_name)
        .ok_or_else(|| PdbError::Inconsistency(format!("Chain '{}' vanished", chain_id)))?;

    let position = Point3::new(x, y, z);
    let mut atom = Atom::new(serial, name, residue_id, position);
    atom.alt_loc = alt_loc;
    atom.occupancy = occupancy.unwrap_or(1.0);
    atom.b_factor = b_factor.unwrap_or(0.0);
    atom.is_hetero = record_name(line) == "HETATM";
    atom.element = if element.is_empty() {
        infer_element(name)
    } else {
        element.to_ascii_uppercase()
    };

    structure
        .add_atom_to_residue(residue_id, atom)
        .ok_or_else(|| PdbError::Inconsistency(format!("Residue {} vanished", res_seq)))?;
    Ok(position)
}

/// Replaces columns 31-54 of an atom record, keeping the rest of the text intact.
fn rewrite_coordinates(text: &str, position: &Point3<f64>) -> Option<String> {
    let body = strip_terminator(text);
    let ending = &text[body.len()..];
    let head = body.get(..COORDS_START)?;
    let tail = body.get(COORDS_END..).unwrap_or("");
    Some(format!(
        "{}{:>8.3}{:>8.3}{:>8.3}{}{}",
        head, position.x, position.y, position.z, tail, ending
    ))
}

fn format_atom_name(name: &str, element: &str) -> String {
    if name.len() >= 4 || element.len() == 2 {
        format!("{:<4}", name)
    } else {
        format!(" {:<3}", name)
    }
}

fn format_atom_line(
    atom: &Atom,
    res_name: &str,
    chain_id: char,
    res_seq: isize,
    icode: Option<char>,
) -> String {
    format!(
        "{:<6}{:>5} {}{}{:>3} {}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}  ",
        if atom.is_hetero { "HETATM" } else { "ATOM" },
        atom.serial,
        format_atom_name(&atom.name, &atom.element),
        atom.alt_loc.unwrap_or(' '),
        res_name,
        chain_id,
        res_seq,
        icode.unwrap_or(' '),
        atom.position.x,
        atom.position.y,
        atom.position.z,
        atom.occupancy,
        atom.b_factor,
        atom.element
    )
}

pub struct PdbFile;

impl MolecularFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let mut structure = Structure::new();
        let mut metadata = PdbMetadata::default();
        let mut first_model_done = false;
        let mut line_num = 0;

        loop {
            let mut text = String::new();
            if reader.read_line(&mut text)? == 0 {
                break;
            }
            line_num += 1;
            let body = strip_terminator(&text);
            let record = record_name(body);

            if first_model_done {
                if record == "END" {
                    metadata.records.push(PdbRecord::Raw(text));
                    break;
                }
                if !body.trim().is_empty() {
                    metadata.skipped_lines += 1;
                }
                continue;
            }

            match record {
                "ATOM" | "HETATM" => {
                    let position = parse_atom_record(body, line_num, &mut structure)?;
                    metadata
                        .records
                        .push(PdbRecord::Atom(metadata.atom_lines.len()));
                    metadata.atom_lines.push(AtomLine { text, position });
                }
                "ENDMDL" => {
                    metadata.records.push(PdbRecord::Raw(text));
                    first_model_done = true;
                }
                "END" => {
                    metadata.records.push(PdbRecord::Raw(text));
                    break;
                }
                _ => metadata.records.push(PdbRecord::Raw(text)),
            }
        }

        if metadata.skipped_lines > 0 {
            warn!(
                skipped = metadata.skipped_lines,
                "Only the first MODEL is read; later models are dropped."
            );
        }
        if structure.is_empty() {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }
        Ok((structure, metadata))
    }

    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let atoms: Vec<&Atom> = structure.atoms_iter().map(|(_, atom)| atom).collect();
        if atoms.len() != metadata.atom_lines.len() {
            return Err(PdbError::Inconsistency(format!(
                "Structure has {} atoms but the source file had {}",
                atoms.len(),
                metadata.atom_lines.len()
            )));
        }

        for record in &metadata.records {
            match record {
                PdbRecord::Raw(text) => writer.write_all(text.as_bytes())?,
                PdbRecord::Atom(index) => {
                    let (atom, line) = match (atoms.get(*index), metadata.atom_lines.get(*index)) {
                        (Some(atom), Some(line)) => (*atom, line),
                        _ => {
                            return Err(PdbError::Inconsistency(format!(
                                "Atom record {} has no matching atom",
                                index
                            )));
                        }
                    };
                    if atom.position == line.position {
                        writer.write_all(line.text.as_bytes())?;
                    } else if let Some(rewritten) = rewrite_coordinates(&line.text, &atom.position) {
                        writer.write_all(rewritten.as_bytes())?;
                    } else {
                        let (res_name, chain_id, res_seq, icode) = residue_columns(structure, atom)?;
                        writeln!(
                            writer,
                            "{}",
                            format_atom_line(atom, &res_name, chain_id, res_seq, icode)
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    fn write_structure_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        writeln!(writer, "REMARK   1 GENERATED BY MULTIALIGN")?;
        let mut previous_chain: Option<char> = None;
        for (_, atom) in structure.atoms_iter() {
            let (res_name, chain_id, res_seq, icode) = residue_columns(structure, atom)?;
            if previous_chain.is_some_and(|c| c != chain_id) {
                writeln!(writer, "TER")?;
            }
            previous_chain = Some(chain_id);
            writeln!(
                writer,
                "{}",
                format_atom_line(atom, &res_name, chain_id, res_seq, icode)
            )?;
        }
        if previous_chain.is_some() {
            writeln!(writer, "TER")?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}

fn residue_columns(
    structure: &Structure,
    atom: &Atom,
) -> Result<(String, char, isize, Option<char>), PdbError> {
    let residue = structure.residue(atom.residue_id).ok_or_else(|| {
        PdbError::Inconsistency(format!("Atom {} has no parent residue", atom.serial))
    })?;
    let chain = structure.chain(residue.chain_id).ok_or_else(|| {
        PdbError::Inconsistency(format!("Residue {} has no parent chain", residue.number))
    })?;
    Ok((
        residue.name.clone(),
        chain.id,
        residue.number,
        residue.insertion_code,
    ))
}
