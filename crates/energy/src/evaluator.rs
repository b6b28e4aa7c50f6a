use std::fmt;
use std::sync::OnceLock;

use colored::Colorize;
use log::debug;

use structure::{
    pair_type, Base, HairpinLoop, MultiLoop, PairType, SecondaryStructure, SecondaryStructureNode,
    StemStructure, StemStructureKind,
};

use crate::error::CoreError;
use crate::tables::{ParameterPack, ScaledTables};

static BASE_PARAMS: OnceLock<ParameterPack> = OnceLock::new();

fn base_params() -> &'static ParameterPack {
    BASE_PARAMS.get_or_init(|| {
        ParameterPack::turner2004().expect("embedded Turner 2004 parameter file must parse")
    })
}

/// One loop's energy contribution, in the order emitted by the left-to-right
/// recursive walk over the decomposed structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub kind: ContributionKind,
    pub closing: (usize, usize),
    pub enclosed: Option<(usize, usize)>,
    pub energy_dkcal: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionKind {
    External,
    Stem(StemStructureKind),
    Hairpin,
    Multi,
}

impl fmt::Display for Contribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (i, j) = self.closing;
        match self.kind {
            ContributionKind::External => {
                write!(f, "{:<12} {:>8}", "ExternalLoop".blue().bold(), self.energy_dkcal)
            }
            ContributionKind::Stem(_) => match self.enclosed {
                Some((k, l)) => write!(
                    f,
                    "{:<12} ({},{}); ({},{})   {:>8}",
                    "InteriorLoop".green().bold(),
                    i + 1,
                    j + 1,
                    k + 1,
                    l + 1,
                    self.energy_dkcal
                ),
                None => write!(f, "{:<12} ({},{})   {:>8}", "InteriorLoop".green().bold(), i + 1, j + 1, self.energy_dkcal),
            },
            ContributionKind::Hairpin => {
                write!(
                    f,
                    "{:<12} ({},{})   {:>8}",
                    "HairpinLoop".yellow().bold(),
                    i + 1,
                    j + 1,
                    self.energy_dkcal
                )
            }
            ContributionKind::Multi => {
                write!(
                    f,
                    "{:<12} ({},{})   {:>8}",
                    "MultiLoop".magenta().bold(),
                    i + 1,
                    j + 1,
                    self.energy_dkcal
                )
            }
        }
    }
}

fn flank(seq: &[Base], idx: usize, len: usize) -> Option<Base> {
    if idx < len {
        Some(seq[idx])
    } else {
        None
    }
}

fn pt_of(seq: &[Base], i: usize, j: usize) -> Result<PairType, CoreError> {
    Ok(pair_type(i, j, seq[i], seq[j])?)
}

fn stem_structure_energy(
    seq: &[Base],
    tables: &ScaledTables,
    ss: &StemStructure,
) -> Result<Contribution, CoreError> {
    let (c5, a, b, c3) = (ss.closing5, ss.enclosed5, ss.enclosed3, ss.closing3);
    let pt_c = pt_of(seq, c5, c3)?;
    let pt_e = pt_of(seq, a, b)?.invert();
    let nl = ss.unpaired_left();
    let nr = ss.unpaired_right();

    let energy = match ss.kind {
        StemStructureKind::Stack => tables.stack[pt_c as usize][pt_e as usize],
        StemStructureKind::Bulge => {
            let n = nl.max(nr);
            let mut e = tables.bulge_at(n);
            if n == 1 {
                e += tables.stack[pt_c as usize][pt_e as usize];
            } else {
                if pt_c.is_terminal_ru() {
                    e += tables.terminal_au;
                }
                if pt_e.is_terminal_ru() {
                    e += tables.terminal_au;
                }
            }
            e
        }
        StemStructureKind::Interior1x1 => {
            let m5c = seq[c5 + 1] as usize;
            let m3c = seq[c3 - 1] as usize;
            tables.interior_1x1[pt_c as usize][pt_e as usize][m5c][m3c]
        }
        StemStructureKind::Interior2x1 => {
            if nl == 1 {
                let b1 = seq[c5 + 1] as usize;
                let b2 = seq[b + 1] as usize;
                let b3 = seq[c3 - 1] as usize;
                tables.interior_2x1[pt_c as usize][pt_e as usize][b1][b2][b3]
            } else {
                let b1 = seq[c3 - 1] as usize;
                let b2 = seq[a - 1] as usize;
                let b3 = seq[c5 + 1] as usize;
                tables.interior_2x1[pt_e as usize][pt_c as usize][b1][b2][b3]
            }
        }
        StemStructureKind::Interior1xN => {
            let small_large_total = nl + nr;
            let base = tables.interior_at(small_large_total);
            let asymmetry = (nl as i32 - nr as i32).unsigned_abs() as i32;
            let ninio = (tables.ninio.abs() * asymmetry).min(tables.max_ninio);
            let mm = tables.mismatch_1xn_interior[pt_c as usize][seq[c5 + 1] as usize][seq[c3 - 1] as usize]
                + tables.mismatch_1xn_interior[pt_e as usize][seq[b + 1] as usize][seq[a - 1] as usize];
            base + ninio + mm
        }
        StemStructureKind::Interior2x2 => {
            let b1 = seq[c5 + 1] as usize;
            let b2 = seq[a - 1] as usize;
            let b3 = seq[b + 1] as usize;
            let b4 = seq[c3 - 1] as usize;
            tables.interior_2x2[pt_c as usize][pt_e as usize][b1][b2][b3][b4]
        }
        StemStructureKind::Interior2x3 => {
            let base = tables.interior_at(5);
            let ninio = tables.ninio.abs().min(tables.max_ninio);
            let mm = tables.mismatch_2x3_interior[pt_c as usize][seq[c5 + 1] as usize][seq[c3 - 1] as usize]
                + tables.mismatch_2x3_interior[pt_e as usize][seq[b + 1] as usize][seq[a - 1] as usize];
            base + ninio + mm
        }
        StemStructureKind::GenericInterior => {
            let total = nl + nr;
            let base = tables.interior_at(total);
            let asymmetry = (nl as i32 - nr as i32).unsigned_abs() as i32;
            let ninio = (tables.ninio.abs() * asymmetry).min(tables.max_ninio);
            let mm = tables.mismatch_interior[pt_c as usize][seq[c5 + 1] as usize][seq[c3 - 1] as usize]
                + tables.mismatch_interior[pt_e as usize][seq[b + 1] as usize][seq[a - 1] as usize];
            base + ninio + mm
        }
    };

    Ok(Contribution {
        kind: ContributionKind::Stem(ss.kind),
        closing: (c5, c3),
        enclosed: Some((a, b)),
        energy_dkcal: energy,
    })
}

fn hairpin_loop_energy(
    seq: &[Base],
    tables: &ScaledTables,
    c5: usize,
    c3: usize,
    unpaired: Option<(usize, usize)>,
) -> Result<Contribution, CoreError> {
    let n = match unpaired {
        Some((a, b)) => b - a + 1,
        None => 0,
    };
    let pt = pt_of(seq, c5, c3)?;

    // A loop this tight cannot physically close (helix geometry needs at
    // least 3 unpaired bases), but a nested dot-bracket string such as
    // "(.)" can still describe one. No mismatch/terminal-AU term applies.
    if n < 3 {
        return Ok(Contribution {
            kind: ContributionKind::Hairpin,
            closing: (c5, c3),
            enclosed: None,
            energy_dkcal: tables.hairpin_at(n),
        });
    }

    if matches!(n, 3 | 4 | 6) {
        let loop_seq: String = (c5..=c3).map(|i| seq[i].to_string()).collect();
        if let Some(&e) = tables.hairpin_sequences.get(&loop_seq) {
            return Ok(Contribution {
                kind: ContributionKind::Hairpin,
                closing: (c5, c3),
                enclosed: None,
                energy_dkcal: e,
            });
        }
    }

    let mut e = tables.hairpin_at(n);
    if n == 3 {
        if pt.is_terminal_ru() {
            e += tables.terminal_au;
        }
    } else {
        let m5 = seq[c5 + 1] as usize;
        let m3 = seq[c3 - 1] as usize;
        e += tables.mismatch_hairpin[pt as usize][m5][m3];
    }

    Ok(Contribution {
        kind: ContributionKind::Hairpin,
        closing: (c5, c3),
        enclosed: None,
        energy_dkcal: e,
    })
}

/// Per-branch (or enclosing-pair) contribution to a multi-loop's own energy:
/// mismatch/dangle + per-branch intern penalty + terminal-AU/GU end penalty.
fn branch_penalty(tables: &ScaledTables, pt: PairType, flank5: Option<usize>, flank3: Option<usize>) -> i32 {
    let mut e = match (flank5, flank3) {
        (Some(a), Some(b)) => tables.mismatch_multi[pt as usize][a][b],
        (Some(a), None) => tables.dangle5[pt as usize][a],
        (None, Some(b)) => tables.dangle3[pt as usize][b],
        (None, None) => 0,
    };
    e += tables.ml_intern[pt as usize];
    if pt.is_terminal_ru() {
        e += tables.terminal_au;
    }
    e
}

fn multiloop_energy(
    seq: &[Base],
    tables: &ScaledTables,
    c5: usize,
    c3: usize,
    branches: &[SecondaryStructureNode],
) -> Result<Contribution, CoreError> {
    let len = seq.len();
    let pt_closing = pt_of(seq, c5, c3)?;
    let pt_inward = pt_closing.invert();

    let mut e = tables.ml_closing + tables.ml_base * unpaired_count(branches) as i32;

    // enclosing pair, read inward: loop-side flanks are the bases just
    // inside the closing pair (same convention hairpin/interior loops use).
    e += branch_penalty(tables, pt_inward, Some(seq[c5 + 1] as usize), Some(seq[c3 - 1] as usize));

    for branch in branches {
        if let Some((b5, bp)) = branch_outer_pair(branch) {
            let pt_b = pt_of(seq, b5, bp)?;
            let flank5 = if b5 > 0 { Some(seq[b5 - 1] as usize) } else { None };
            let flank3 = flank(seq, bp + 1, len).map(|b| b as usize);
            e += branch_penalty(tables, pt_b, flank5, flank3);
        }
    }

    Ok(Contribution {
        kind: ContributionKind::Multi,
        closing: (c5, c3),
        enclosed: None,
        energy_dkcal: e,
    })
}

fn unpaired_count(branches: &[SecondaryStructureNode]) -> usize {
    branches
        .iter()
        .map(|b| match b {
            SecondaryStructureNode::SingleStranded(r) => r.end - r.start + 1,
            _ => 0,
        })
        .sum()
}

fn branch_outer_pair(node: &SecondaryStructureNode) -> Option<(usize, usize)> {
    match node {
        SecondaryStructureNode::Hairpin(HairpinLoop { stem, .. }) => Some(stem.outer()),
        SecondaryStructureNode::Multi(MultiLoop { stem, .. }) => Some(stem.outer()),
        SecondaryStructureNode::SingleStranded(_) => None,
    }
}

fn node_internal_energy(
    seq: &[Base],
    tables: &ScaledTables,
    node: &SecondaryStructureNode,
) -> Result<(i32, Vec<Contribution>), CoreError> {
    match node {
        SecondaryStructureNode::SingleStranded(_) => Ok((0, Vec::new())),
        SecondaryStructureNode::Hairpin(h) => {
            let mut total = 0;
            let mut contribs = Vec::new();
            for ss in &h.stem.substructures {
                let c = stem_structure_energy(seq, tables, ss)?;
                total += c.energy_dkcal;
                contribs.push(c);
            }
            let (c5, c3) = h.stem.inner();
            let c = hairpin_loop_energy(seq, tables, c5, c3, h.unpaired)?;
            total += c.energy_dkcal;
            contribs.push(c);
            Ok((total, contribs))
        }
        SecondaryStructureNode::Multi(m) => {
            let mut total = 0;
            let mut contribs = Vec::new();
            for ss in &m.stem.substructures {
                let c = stem_structure_energy(seq, tables, ss)?;
                total += c.energy_dkcal;
                contribs.push(c);
            }
            let (c5, c3) = m.stem.inner();
            let c = multiloop_energy(seq, tables, c5, c3, &m.branches)?;
            total += c.energy_dkcal;
            contribs.push(c);
            for branch in &m.branches {
                let (e, mut cs) = node_internal_energy(seq, tables, branch)?;
                total += e;
                contribs.append(&mut cs);
            }
            Ok((total, contribs))
        }
    }
}

fn external_loop_energy(
    seq: &[Base],
    tables: &ScaledTables,
    ss: &SecondaryStructure,
) -> Result<(i32, Vec<Contribution>), CoreError> {
    let len = seq.len();
    let mut total = 0;
    let mut contribs = Vec::new();
    for node in &ss.external {
        if let Some((c5, c3)) = branch_outer_pair(node) {
            let pt = pt_of(seq, c5, c3)?;
            let flank5 = if c5 > 0 { Some(seq[c5 - 1] as usize) } else { None };
            let flank3 = flank(seq, c3 + 1, len).map(|b| b as usize);
            let mut e = match (flank5, flank3) {
                (Some(a), Some(b)) => tables.mismatch_exterior[pt as usize][a][b],
                (Some(a), None) => tables.dangle5[pt as usize][a],
                (None, Some(b)) => tables.dangle3[pt as usize][b],
                (None, None) => 0,
            };
            if pt.is_terminal_ru() {
                e += tables.terminal_au;
            }
            total += e;
            contribs.push(Contribution {
                kind: ContributionKind::External,
                closing: (c5, c3),
                enclosed: None,
                energy_dkcal: e,
            });
        }
        let (e, mut cs) = node_internal_energy(seq, tables, node)?;
        total += e;
        contribs.append(&mut cs);
    }
    Ok((total, contribs))
}

/// Evaluate the free energy of `structure` folded onto `sequence` at
/// `temperature_c` degrees Celsius. Returns the total in kcal/mol alongside
/// an ordered per-loop contribution list (native unit dkcal/mol).
pub fn evaluate(
    sequence: &str,
    structure: &str,
    temperature_c: f64,
) -> Result<(f64, Vec<Contribution>), CoreError> {
    let (seq, _pt, decomposed) = structure::build(sequence, structure)?;
    debug!("evaluating {} nt at {:.2} C", seq.0.len(), temperature_c);
    let tables = base_params().rescale(temperature_c);
    let (total_dkcal, contributions) = external_loop_energy(&seq.0, &tables, &decomposed)?;
    Ok((total_dkcal as f64 / 100.0, contributions))
}

/// Convenience wrapper fixing `temperature_c = 37.0`.
pub fn evaluate_37(sequence: &str, structure: &str) -> Result<(f64, Vec<Contribution>), CoreError> {
    evaluate(sequence, structure, 37.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_unpaired_is_zero() {
        let (e, contribs) = evaluate_37("AAAAAAAA", "........").unwrap();
        assert_eq!(e, 0.0);
        assert!(contribs.is_empty());
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = evaluate_37("GCGCGCGCGC", "(((...)))").unwrap_err();
        assert!(matches!(err, CoreError::Structure(_)));
    }

    #[test]
    fn illegal_pair_is_rejected() {
        let err = evaluate_37("AAAA", "(..)").unwrap_err();
        assert!(matches!(err, CoreError::IllegalPair { .. }));
    }

    #[test]
    fn simple_hairpin_matches_catalog_triloop() {
        let (e, contribs) = evaluate_37("GGGAAACCC", "(((...)))").unwrap();
        // 1 external-loop term + 2 stacks + a catalog triloop (GAAAC, see params file)
        assert_eq!(contribs.len(), 4);
        assert!(e < 0.0 || e >= 0.0); // deterministic, sanity only
        let hairpin = contribs.iter().find(|c| matches!(c.kind, ContributionKind::Hairpin)).unwrap();
        assert_eq!(hairpin.energy_dkcal, 540);
    }

    #[test]
    fn sum_of_contributions_matches_total() {
        let (e, contribs) = evaluate_37("GGGAACCCAAGGGAAACCC", "(((..(((...)))..)))").unwrap();
        let sum: i32 = contribs.iter().map(|c| c.energy_dkcal).sum();
        assert!((e - sum as f64 / 100.0).abs() < 1e-9);
    }

    #[test]
    fn deterministic_across_repeated_calls() {
        let a = evaluate_37("GGGAAACCC", "(((...)))").unwrap();
        let b = evaluate_37("GGGAAACCC", "(((...)))").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn short_hairpin_returns_base_energy_only() {
        // "(())" nests a hairpin closed by (1,2) with zero unpaired bases;
        // too tight to form physically, but per spec this still evaluates
        // to the bare table lookup with no mismatch/terminal-AU term.
        let (_, contribs) = evaluate_37("GCGC", "(())").unwrap();
        let hairpin = contribs.iter().find(|c| matches!(c.kind, ContributionKind::Hairpin)).unwrap();
        assert_eq!(hairpin.energy_dkcal, 990);
    }

    #[test]
    fn multiloop_with_two_branches_evaluates() {
        let (e, contribs) = evaluate_37("GGAAACGAAACC", "((...)(...))").unwrap();
        assert!(contribs.iter().any(|c| matches!(c.kind, ContributionKind::Multi)));
        assert!(e.is_finite());
    }
}
