use crate::core::models::atom::Atom;
use phf::phf_set;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static BACKBONE_ATOM_NAMES: phf::Set<&'static str> = phf_set! { "N", "CA", "C", "O" };

const ALPHA_CARBON_NAME: &str = "CA";

/// Chooses which atoms of a structure take part in a fit or an RMSD measurement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AtomSelection {
    /// Every atom in the structure.
    #[default]
    All,
    /// Protein backbone atoms: N, CA, C, O.
    Backbone,
    /// Alpha carbons only.
    AlphaCarbon,
    /// Every atom that is not a hydrogen.
    HeavyAtoms,
    /// Atoms whose name is in the given list.
    Names(Vec<String>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseSelectionError {
    #[error("Unknown atom selection '{0}'. Expected 'all', 'backbone', 'ca', 'heavy' or 'name:A,B,...'.")]
    Unknown(String),
    #[error("Atom selection 'name:' requires at least one atom name")]
    EmptyNameList,
}

impl AtomSelection {
    pub fn matches(&self, atom: &Atom) -> bool {
        match self {
            AtomSelection::All => true,
            AtomSelection::Backbone => BACKBONE_ATOM_NAMES.contains(atom.name.as_str()),
            AtomSelection::AlphaCarbon => atom.name == ALPHA_CARBON_NAME,
            AtomSelection::HeavyAtoms => !atom.is_hydrogen(),
            AtomSelection::Names(names) => names.iter().any(|n| *n == atom.name),
        }
    }
}

impl FromStr for AtomSelection {
    type Err = ParseSelectionError;

    /// Parses `all`, `backbone`, `ca`, `heavy`, or `name:A,B,...` (case-insensitive keywords).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(list) = trimmed.strip_prefix("name:") {
            let names: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect();
            if names.is_empty() {
                return Err(ParseSelectionError::EmptyNameList);
            }
            return Ok(AtomSelection::Names(names));
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "all" => Ok(AtomSelection::All),
            "backbone" => Ok(AtomSelection::Backbone),
            "ca" | "alpha-carbon" => Ok(AtomSelection::AlphaCarbon),
            "heavy" | "heavy-atoms" => Ok(AtomSelection::HeavyAtoms),
            _ => Err(ParseSelectionError::Unknown(trimmed.to_string())),
        }
    }
}

impl fmt::Display for AtomSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomSelection::All => write!(f, "all"),
            AtomSelection::Backbone => write!(f, "backbone"),
            AtomSelection::AlphaCarbon => write!(f, "ca"),
            AtomSelection::HeavyAtoms => write!(f, "heavy"),
            AtomSelection::Names(names) => write!(f, "name:{}", names.join(",")),
        }
    }
}

impl TryFrom<String> for AtomSelection {
    type Error = ParseSelectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AtomSelection> for String {
    fn from(value: AtomSelection) -> Self {
        value.to_string()
    }
}
