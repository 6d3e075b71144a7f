use super::ids::ResidueId;
use nalgebra::Point3;
use phf::phf_set;

/// Two-letter element symbols recognised when inferring an element from an atom name.
static TWO_LETTER_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "CL", "BR", "NA", "MG", "ZN", "FE", "MN", "CU", "CO", "NI", "SE", "LI", "CD", "HG",
};

/// Represents a single atom as read from a structure file.
///
/// Besides identity and coordinates, the struct carries the per-atom columns of
/// a PDB record (occupancy, B-factor, alternate location) so that a structure
/// can be written back without losing information.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Atom serial number from the source file.
    pub serial: usize,
    /// The name of the atom (e.g., "CA", "N", "OG1").
    pub name: String,
    /// Alternate location indicator, if any.
    pub alt_loc: Option<char>,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// Element symbol in upper case (e.g., "C", "FE").
    pub element: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Crystallographic occupancy.
    pub occupancy: f64,
    /// Temperature factor.
    pub b_factor: f64,
    /// Whether the atom came from a HETATM record.
    pub is_hetero: bool,
}

impl Atom {
    /// Creates a new `Atom` with default values for the bookkeeping columns.
    ///
    /// The element is inferred from the atom name; occupancy defaults to 1.0
    /// and the B-factor to 0.0.
    ///
    /// # Arguments
    ///
    /// * `serial` - The serial number of the atom.
    /// * `name` - The name of the atom.
    /// * `residue_id` - The ID of the residue this atom belongs to.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(serial: usize, name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            serial,
            name: name.to_string(),
            alt_loc: None,
            residue_id,
            element: infer_element(name),
            position,
            occupancy: 1.0,
            b_factor: 0.0,
            is_hetero: false,
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element == "H" || self.element == "D"
    }
}

/// Guesses an element symbol from a PDB atom name.
///
/// Leading digits are skipped (e.g. "1HB" is a hydrogen). Two-letter symbols
/// are only chosen for names that are exactly a known two-letter element.
/// "CA" always resolves to carbon; calcium ions must carry an element column.
pub fn infer_element(name: &str) -> String {
    let letters: String = name
        .trim()
        .chars()
        .skip_while(|c| c.is_ascii_digit())
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase();

    if letters.is_empty() {
        return String::new();
    }
    if letters.len() == 2 && TWO_LETTER_ELEMENTS.contains(letters.as_str()) {
        return letters;
    }
    letters[..1].to_string()
}
