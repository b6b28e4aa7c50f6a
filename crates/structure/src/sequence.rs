use std::fmt;

use crate::error::StructureError;

/// A single nucleobase, encoded for direct use as a parameter-table index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    A,
    C,
    G,
    U,
    /// Table-index sentinel for "no flanking base available" (sequence boundary).
    /// Never produced by parsing a validated input sequence.
    N,
}

pub const BCOUNT: usize = 5;

impl TryFrom<char> for Base {
    type Error = char;

    fn try_from(c: char) -> Result<Self, char> {
        match c.to_ascii_uppercase() {
            'A' => Ok(Base::A),
            'C' => Ok(Base::C),
            'G' => Ok(Base::G),
            'U' | 'T' => Ok(Base::U),
            other => Err(other),
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Base::A => 'A',
            Base::C => 'C',
            Base::G => 'G',
            Base::U => 'U',
            Base::N => 'N',
        };
        write!(f, "{c}")
    }
}

/// An ordered sequence of [`Base`], parsed and validated from a raw string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NucleotideVec(pub Vec<Base>);

impl std::ops::Deref for NucleotideVec {
    type Target = Vec<Base>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<&str> for NucleotideVec {
    type Error = StructureError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let mut out = Vec::with_capacity(s.len());
        for (pos, c) in s.chars().enumerate() {
            match Base::try_from(c) {
                Ok(b) => out.push(b),
                Err(ch) => return Err(StructureError::InvalidSequenceCharacter { ch, pos }),
            }
        }
        Ok(NucleotideVec(out))
    }
}

impl fmt::Display for NucleotideVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b}")?;
        }
        Ok(())
    }
}

/// The six canonical Watson-Crick/wobble pair types plus the non-canonical
/// catch-all `NN`. The variant order matches the row/column order used by the
/// Turner parameter file format (`CG, GC, GU, UG, AU, UA, NN`), so `as usize`
/// indexes directly into a parameter table without a translation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairType {
    CG,
    GC,
    GU,
    UG,
    AU,
    UA,
    NN,
}

pub const PCOUNT: usize = 7;

impl PairType {
    /// Whether this pair type is CG/GC-terminal (false) or requires the
    /// terminal-AU/GU end penalty (true).
    pub fn is_terminal_ru(self) -> bool {
        !matches!(self, PairType::CG | PairType::GC)
    }

    pub fn is_canonical(self) -> bool {
        self != PairType::NN
    }

    /// The pair type read in the opposite orientation: `(x,y) -> (y,x)`.
    pub fn invert(self) -> PairType {
        match self {
            PairType::CG => PairType::GC,
            PairType::GC => PairType::CG,
            PairType::GU => PairType::UG,
            PairType::UG => PairType::GU,
            PairType::AU => PairType::UA,
            PairType::UA => PairType::AU,
            PairType::NN => PairType::NN,
        }
    }
}

impl fmt::Display for PairType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PairType::CG => "CG",
            PairType::GC => "GC",
            PairType::GU => "GU",
            PairType::UG => "UG",
            PairType::AU => "AU",
            PairType::UA => "UA",
            PairType::NN => "NN",
        };
        write!(f, "{s}")
    }
}

/// Error raised for a structurally-imposed pair that is not one of the six
/// canonical Watson-Crick/wobble pairs. Unlike a "loose" sequence tool that
/// would downgrade this to `NN` and keep going, this core treats it as a
/// hard failure: a forbidden parameter-table lookup cannot be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalPairError {
    pub i: usize,
    pub j: usize,
    pub bases: (Base, Base),
}

impl fmt::Display for IllegalPairError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "illegal pair ({},{}) at positions {} and {}",
            self.bases.0, self.bases.1, self.i, self.j
        )
    }
}

impl std::error::Error for IllegalPairError {}

/// Classify an ordered pair of bases into a [`PairType`], failing if the
/// pair is not one of the six canonical Watson-Crick/wobble pairs.
pub fn pair_type(i: usize, j: usize, b5: Base, b3: Base) -> Result<PairType, IllegalPairError> {
    use Base::*;
    let pt = match (b5, b3) {
        (C, G) => PairType::CG,
        (G, C) => PairType::GC,
        (G, U) => PairType::GU,
        (U, G) => PairType::UG,
        (A, U) => PairType::AU,
        (U, A) => PairType::UA,
        _ => {
            return Err(IllegalPairError {
                i,
                j,
                bases: (b5, b3),
            });
        }
    };
    Ok(pt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitive_and_t_as_u() {
        let seq = NucleotideVec::try_from("acguT").unwrap();
        assert_eq!(seq.0, vec![Base::A, Base::C, Base::G, Base::U, Base::U]);
    }

    #[test]
    fn rejects_invalid_character() {
        let err = NucleotideVec::try_from("ACGX").unwrap_err();
        assert_eq!(
            err,
            StructureError::InvalidSequenceCharacter { ch: 'X', pos: 3 }
        );
    }

    #[test]
    fn canonical_pair_types_classify() {
        assert_eq!(pair_type(0, 1, Base::C, Base::G).unwrap(), PairType::CG);
        assert_eq!(pair_type(0, 1, Base::G, Base::U).unwrap(), PairType::GU);
        assert_eq!(pair_type(0, 1, Base::A, Base::U).unwrap(), PairType::AU);
    }

    #[test]
    fn noncanonical_pair_is_illegal() {
        let err = pair_type(2, 5, Base::A, Base::A).unwrap_err();
        assert_eq!(err.i, 2);
        assert_eq!(err.j, 5);
    }

    #[test]
    fn terminal_ru_flag() {
        assert!(!PairType::CG.is_terminal_ru());
        assert!(!PairType::GC.is_terminal_ru());
        assert!(PairType::AU.is_terminal_ru());
        assert!(PairType::GU.is_terminal_ru());
    }

    #[test]
    fn invert_round_trips() {
        for pt in [
            PairType::CG,
            PairType::GC,
            PairType::GU,
            PairType::UG,
            PairType::AU,
            PairType::UA,
        ] {
            assert_eq!(pt.invert().invert(), pt);
        }
        assert_eq!(PairType::NN.invert(), PairType::NN);
    }
}
