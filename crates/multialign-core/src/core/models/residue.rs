use super::ids::ChainId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub number: isize,                // Residue sequence number from source file
    pub insertion_code: Option<char>, // PDB insertion code, if any
    pub name: String,                 // Name of the residue (e.g., "ALA", "HOH")
    pub chain_id: ChainId,            // ID of the parent chain
}

impl Residue {
    pub(crate) fn new(
        number: isize,
        insertion_code: Option<char>,
        name: &str,
        chain_id: ChainId,
    ) -> Self {
        Self {
            number,
            insertion_code,
            name: name.to_string(),
            chain_id,
        }
    }
}
