use std::fmt;

use crate::error::StructureError;

/// One symbol of dot-bracket notation. Only single-strand, pseudoknot-free
/// structures are represented — there is no "strand break" variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotBracket {
    Unpaired,
    Open,
    Close,
}

impl TryFrom<char> for DotBracket {
    type Error = char;

    fn try_from(c: char) -> Result<Self, char> {
        match c {
            '.' => Ok(DotBracket::Unpaired),
            '(' => Ok(DotBracket::Open),
            ')' => Ok(DotBracket::Close),
            other => Err(other),
        }
    }
}

impl fmt::Display for DotBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            DotBracket::Unpaired => '.',
            DotBracket::Open => '(',
            DotBracket::Close => ')',
        };
        write!(f, "{c}")
    }
}

/// A parsed dot-bracket string, one [`DotBracket`] symbol per position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotBracketVec(pub Vec<DotBracket>);

impl std::ops::Deref for DotBracketVec {
    type Target = Vec<DotBracket>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<&str> for DotBracketVec {
    type Error = StructureError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let mut out = Vec::with_capacity(s.len());
        for (pos, c) in s.chars().enumerate() {
            match DotBracket::try_from(c) {
                Ok(db) => out.push(db),
                Err(ch) => return Err(StructureError::InvalidStructureCharacter { ch, pos }),
            }
        }
        Ok(DotBracketVec(out))
    }
}

impl fmt::Display for DotBracketVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for db in &self.0 {
            write!(f, "{db}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_structure() {
        let db = DotBracketVec::try_from("((..))").unwrap();
        assert_eq!(
            db.0,
            vec![
                DotBracket::Open,
                DotBracket::Open,
                DotBracket::Unpaired,
                DotBracket::Unpaired,
                DotBracket::Close,
                DotBracket::Close,
            ]
        );
    }

    #[test]
    fn rejects_invalid_character() {
        let err = DotBracketVec::try_from("(.x)").unwrap_err();
        assert_eq!(
            err,
            StructureError::InvalidStructureCharacter { ch: 'x', pos: 2 }
        );
    }

    #[test]
    fn display_round_trips() {
        let s = "(((...)))";
        let db = DotBracketVec::try_from(s).unwrap();
        assert_eq!(db.to_string(), s);
    }
}
