#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub id: char, // Chain identifier (e.g., 'A', 'B'); ' ' when blank
}

impl Chain {
    pub(crate) fn new(id: char) -> Self {
        Self { id }
    }
}
