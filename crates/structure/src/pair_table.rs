use std::ops::{Deref, DerefMut};

use crate::dotbracket::{DotBracket, DotBracketVec};
use crate::error::StructureError;

/// `pt[i] = Some(j)` iff positions `i` and `j` are paired; `None` otherwise.
/// Invariant: `pt[i] == Some(j) <=> pt[j] == Some(i)`, and pairs never cross.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairTable(pub Vec<Option<usize>>);

impl Deref for PairTable {
    type Target = Vec<Option<usize>>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PairTable {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// The implementation limit on structure length (see SPEC_FULL.md §6).
/// `i32::MAX` comfortably exceeds any practical nucleic-acid length while
/// keeping `i32`-sized position/energy accumulators valid.
pub const MAX_STRUCTURE_LEN: usize = i32::MAX as usize;

impl PairTable {
    /// True iff `(i,j)` is a legal closing pair: `i < j` and at least one
    /// unpaired base can sit between them (no zero-size "hairpin").
    pub fn is_well_formed(&self, i: usize, j: usize) -> bool {
        i < j && j < self.0.len()
    }
}

fn check_len(len: usize) -> Result<(), StructureError> {
    if len == 0 {
        return Err(StructureError::EmptyInput);
    }
    if len > MAX_STRUCTURE_LEN {
        return Err(StructureError::StructureTooLong {
            len,
            limit: MAX_STRUCTURE_LEN,
        });
    }
    Ok(())
}

impl TryFrom<&str> for PairTable {
    type Error = StructureError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        check_len(s.len())?;
        let mut pt = vec![None; s.len()];
        let mut stack = Vec::new();
        for (pos, c) in s.chars().enumerate() {
            match c {
                '(' => stack.push(pos),
                ')' => {
                    let open = stack.pop().ok_or(StructureError::UnbalancedBrackets)?;
                    pt[open] = Some(pos);
                    pt[pos] = Some(open);
                }
                '.' => {}
                ch => return Err(StructureError::InvalidStructureCharacter { ch, pos }),
            }
        }
        if !stack.is_empty() {
            return Err(StructureError::UnbalancedBrackets);
        }
        Ok(PairTable(pt))
    }
}

impl TryFrom<&DotBracketVec> for PairTable {
    type Error = StructureError;

    fn try_from(db: &DotBracketVec) -> Result<Self, Self::Error> {
        check_len(db.0.len())?;
        let mut pt = vec![None; db.0.len()];
        let mut stack = Vec::new();
        for (pos, sym) in db.0.iter().enumerate() {
            match sym {
                DotBracket::Open => stack.push(pos),
                DotBracket::Close => {
                    let open = stack.pop().ok_or(StructureError::UnbalancedBrackets)?;
                    pt[open] = Some(pos);
                    pt[pos] = Some(open);
                }
                DotBracket::Unpaired => {}
            }
        }
        if !stack.is_empty() {
            return Err(StructureError::UnbalancedBrackets);
        }
        Ok(PairTable(pt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_structure() {
        let pt = PairTable::try_from("((..))").unwrap();
        assert_eq!(pt.0, vec![Some(5), Some(4), None, None, Some(1), Some(0)]);
    }

    #[test]
    fn unmatched_close_is_unbalanced() {
        let err = PairTable::try_from("(.)).").unwrap_err();
        assert_eq!(err, StructureError::UnbalancedBrackets);
    }

    #[test]
    fn unmatched_open_is_unbalanced() {
        let err = PairTable::try_from("((.)").unwrap_err();
        assert_eq!(err, StructureError::UnbalancedBrackets);
    }

    #[test]
    fn empty_input_rejected() {
        let err = PairTable::try_from("").unwrap_err();
        assert_eq!(err, StructureError::EmptyInput);
    }

    #[test]
    fn fully_unpaired_has_no_pairs() {
        let pt = PairTable::try_from("......").unwrap();
        assert!(pt.0.iter().all(Option::is_none));
    }

    #[test]
    fn symmetry_invariant_holds() {
        let pt = PairTable::try_from("(((...)))").unwrap();
        for (i, slot) in pt.0.iter().enumerate() {
            if let Some(j) = slot {
                assert_eq!(pt.0[*j], Some(i));
            }
        }
    }

    #[test]
    fn from_dotbracket_vec_matches_str() {
        let s = "(((.(...)..)))";
        let from_str = PairTable::try_from(s).unwrap();
        let db = DotBracketVec::try_from(s).unwrap();
        let from_db = PairTable::try_from(&db).unwrap();
        assert_eq!(from_str, from_db);
    }
}
