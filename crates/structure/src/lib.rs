mod decomposition;
mod dotbracket;
mod error;
mod pair_table;
mod sequence;

pub use decomposition::*;
pub use dotbracket::*;
pub use error::*;
pub use pair_table::*;
pub use sequence::*;

/// Validate a `(sequence, structure)` pair and build the decomposed loop
/// tree in one call: length/character checks, pair-table construction, then
/// [`decompose`].
pub fn build(sequence: &str, structure: &str) -> Result<(NucleotideVec, PairTable, SecondaryStructure), StructureError> {
    if sequence.len() != structure.len() {
        return Err(StructureError::LengthMismatch {
            sequence_len: sequence.len(),
            structure_len: structure.len(),
        });
    }
    if sequence.is_empty() {
        return Err(StructureError::EmptyInput);
    }
    let seq = NucleotideVec::try_from(sequence)?;
    let pt = PairTable::try_from(structure)?;
    let ss = decompose(&pt)?;
    Ok((seq, pt, ss))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_rejects_length_mismatch() {
        let err = build("GGGAAACCCC", "(((...)))").unwrap_err();
        assert!(matches!(err, StructureError::LengthMismatch { .. }));
    }

    #[test]
    fn build_succeeds_on_simple_hairpin() {
        let (seq, pt, ss) = build("GGGAAACCC", "(((...)))").unwrap();
        assert_eq!(seq.0.len(), 9);
        assert_eq!(pt.0[0], Some(8));
        assert_eq!(ss.external.len(), 1);
    }
}
