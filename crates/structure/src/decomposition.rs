use crate::error::StructureError;
use crate::pair_table::PairTable;

/// Classification of the two-pair transition between a closing pair and the
/// next pair inward, driven purely by the unpaired-base counts on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StemStructureKind {
    Stack,
    Bulge,
    Interior1x1,
    Interior2x1,
    Interior1xN,
    Interior2x2,
    Interior2x3,
    GenericInterior,
}

impl StemStructureKind {
    /// Classify from the counts of unpaired bases to the left (`nl`) and
    /// right (`nr`) of the transition. See SPEC_FULL.md §3.
    pub fn classify(nl: usize, nr: usize) -> StemStructureKind {
        let small = nl.min(nr);
        let large = nl.max(nr);
        match (small, large) {
            (_, 0) => StemStructureKind::Stack,
            (0, _) => StemStructureKind::Bulge,
            (1, 1) => StemStructureKind::Interior1x1,
            (1, 2) => StemStructureKind::Interior2x1,
            (1, _) => StemStructureKind::Interior1xN,
            (2, 2) => StemStructureKind::Interior2x2,
            (2, 3) => StemStructureKind::Interior2x3,
            _ => StemStructureKind::GenericInterior,
        }
    }
}

/// A single transition from one stacked pair to the next, innermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StemStructure {
    pub closing5: usize,
    pub enclosed5: usize,
    pub enclosed3: usize,
    pub closing3: usize,
    pub kind: StemStructureKind,
}

impl StemStructure {
    pub fn unpaired_left(&self) -> usize {
        self.enclosed5 - self.closing5 - 1
    }

    pub fn unpaired_right(&self) -> usize {
        self.closing3 - self.enclosed3 - 1
    }
}

/// A run of stacked base pairs, outermost first, together with the
/// classified transition between each adjacent pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stem {
    /// Closing pairs of the stem, outermost to innermost, `(i, j)` with `i < j`.
    pub pairs: Vec<(usize, usize)>,
    /// One entry per adjacent pair of `pairs`: `substructures[k]` is the
    /// transition from `pairs[k]` to `pairs[k+1]`.
    pub substructures: Vec<StemStructure>,
}

impl Stem {
    pub fn outer(&self) -> (usize, usize) {
        self.pairs[0]
    }

    pub fn inner(&self) -> (usize, usize) {
        *self.pairs.last().expect("a stem always has at least one pair")
    }
}

/// An unpaired run `[start, end]` inclusive, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleStrandedRegion {
    pub start: usize,
    pub end: usize,
}

/// A hairpin: a stem whose innermost pair closes a loop with no further pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HairpinLoop {
    pub stem: Stem,
    /// Inclusive unpaired range inside the innermost pair, or `None` if the
    /// innermost pair has no unpaired interior (loop of size 0).
    pub unpaired: Option<(usize, usize)>,
}

impl HairpinLoop {
    pub fn loop_size(&self) -> usize {
        match self.unpaired {
            Some((a, b)) => b - a + 1,
            None => 0,
        }
    }
}

/// A multi-branch loop: a stem whose innermost pair encloses two or more
/// branching stems, interleaved with single-stranded regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiLoop {
    pub stem: Stem,
    pub branches: Vec<SecondaryStructureNode>,
}

/// One node of the decomposed structure tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecondaryStructureNode {
    SingleStranded(SingleStrandedRegion),
    Hairpin(HairpinLoop),
    Multi(MultiLoop),
}

/// The full decomposition: an ordered list of nodes covering the external
/// (top-level) loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryStructure {
    pub external: Vec<SecondaryStructureNode>,
}

enum TopLevelItem {
    Unpaired(usize),
    Branch(usize, usize),
}

/// Single left-to-right scan of `[lo, hi)`, collecting unpaired positions and
/// top-level branching pairs. Assumes `pt` is well-formed (built by
/// [`PairTable::try_from`]), so a closing bracket is never encountered
/// without its matching opening bracket inside the range.
fn scan_top_level(pt: &PairTable, lo: usize, hi: usize) -> Vec<TopLevelItem> {
    let mut items = Vec::new();
    let mut p = lo;
    while p < hi {
        match pt[p] {
            None => {
                items.push(TopLevelItem::Unpaired(p));
                p += 1;
            }
            Some(y) if y > p => {
                items.push(TopLevelItem::Branch(p, y));
                p = y + 1;
            }
            Some(_) => {
                // closing bracket of a pair whose opening lies outside
                // [lo, hi); unreachable for a region bounded by a stem walk
                // or the full sequence.
                p += 1;
            }
        }
    }
    items
}

fn coalesce(pt: &PairTable, lo: usize, hi: usize) -> Result<Vec<SecondaryStructureNode>, StructureError> {
    let items = scan_top_level(pt, lo, hi);
    let mut nodes = Vec::new();
    let mut run_start: Option<usize> = None;
    for item in items {
        match item {
            TopLevelItem::Unpaired(p) => {
                run_start.get_or_insert(p);
            }
            TopLevelItem::Branch(a, b) => {
                if let Some(start) = run_start.take() {
                    nodes.push(SecondaryStructureNode::SingleStranded(SingleStrandedRegion {
                        start,
                        end: a - 1,
                    }));
                }
                nodes.push(stem_walk(pt, a, b)?);
            }
        }
    }
    if let Some(start) = run_start {
        nodes.push(SecondaryStructureNode::SingleStranded(SingleStrandedRegion {
            start,
            end: hi - 1,
        }));
    }
    Ok(nodes)
}

fn branch_count(pt: &PairTable, lo: usize, hi: usize) -> Vec<(usize, usize)> {
    scan_top_level(pt, lo, hi)
        .into_iter()
        .filter_map(|item| match item {
            TopLevelItem::Branch(a, b) => Some((a, b)),
            TopLevelItem::Unpaired(_) => None,
        })
        .collect()
}

fn stem_walk(pt: &PairTable, c5: usize, c3: usize) -> Result<SecondaryStructureNode, StructureError> {
    let mut pairs = vec![(c5, c3)];
    let mut substructures = Vec::new();

    loop {
        let (cur5, cur3) = *pairs.last().unwrap();
        let branches = branch_count(pt, cur5 + 1, cur3);
        match branches.len() {
            0 => {
                let unpaired = if cur3 > cur5 + 1 {
                    Some((cur5 + 1, cur3 - 1))
                } else {
                    None
                };
                return Ok(SecondaryStructureNode::Hairpin(HairpinLoop {
                    stem: Stem { pairs, substructures },
                    unpaired,
                }));
            }
            1 => {
                let (a, b) = branches[0];
                let kind = StemStructureKind::classify(a - cur5 - 1, cur3 - b - 1);
                substructures.push(StemStructure {
                    closing5: cur5,
                    enclosed5: a,
                    enclosed3: b,
                    closing3: cur3,
                    kind,
                });
                pairs.push((a, b));
            }
            _ => {
                let branches = coalesce(pt, cur5 + 1, cur3)?;
                return Ok(SecondaryStructureNode::Multi(MultiLoop {
                    stem: Stem { pairs, substructures },
                    branches,
                }));
            }
        }
    }
}

/// Decompose a pair table into the full loop tree.
pub fn decompose(pt: &PairTable) -> Result<SecondaryStructure, StructureError> {
    let external = coalesce(pt, 0, pt.len())?;
    Ok(SecondaryStructure { external })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_unpaired_is_one_region() {
        let pt = PairTable::try_from("......").unwrap();
        let ss = decompose(&pt).unwrap();
        assert_eq!(ss.external.len(), 1);
        match &ss.external[0] {
            SecondaryStructureNode::SingleStranded(r) => {
                assert_eq!((r.start, r.end), (0, 5));
            }
            _ => panic!("expected single-stranded region"),
        }
    }

    #[test]
    fn single_hairpin_with_stack() {
        let pt = PairTable::try_from("((...))").unwrap();
        let ss = decompose(&pt).unwrap();
        assert_eq!(ss.external.len(), 1);
        match &ss.external[0] {
            SecondaryStructureNode::Hairpin(h) => {
                assert_eq!(h.stem.pairs, vec![(0, 6), (1, 5)]);
                assert_eq!(h.stem.substructures.len(), 1);
                assert_eq!(h.stem.substructures[0].kind, StemStructureKind::Stack);
                assert_eq!(h.unpaired, Some((2, 4)));
                assert_eq!(h.loop_size(), 3);
            }
            _ => panic!("expected hairpin"),
        }
    }

    #[test]
    fn bulge_is_classified() {
        // (0,9) closes, with an extra unpaired base between it and the next
        // pair in (2,8); (2,8) stacks directly on (3,7).
        let pt = PairTable::try_from("(.((...)))").unwrap();
        let ss = decompose(&pt).unwrap();
        match &ss.external[0] {
            SecondaryStructureNode::Hairpin(h) => {
                let kinds: Vec<_> = h.stem.substructures.iter().map(|s| s.kind).collect();
                assert_eq!(kinds, vec![StemStructureKind::Bulge, StemStructureKind::Stack]);
            }
            _ => panic!("expected hairpin"),
        }
    }

    #[test]
    fn nested_hairpin_with_interior_loop_is_not_a_multiloop() {
        // A single branch at every level (even where that branch is
        // preceded/followed by unpaired bases on both sides) is an interior
        // loop continuing the same stem, not a bifurcation.
        let pt = PairTable::try_from("(((..(((...)))..)))").unwrap();
        let ss = decompose(&pt).unwrap();
        assert_eq!(ss.external.len(), 1);
        match &ss.external[0] {
            SecondaryStructureNode::Hairpin(h) => {
                let kinds: Vec<_> = h.stem.substructures.iter().map(|s| s.kind).collect();
                assert_eq!(
                    kinds,
                    vec![
                        StemStructureKind::Stack,
                        StemStructureKind::Stack,
                        StemStructureKind::Interior2x2,
                        StemStructureKind::Stack,
                        StemStructureKind::Stack,
                    ]
                );
                assert_eq!(h.loop_size(), 3);
            }
            other => panic!("expected hairpin, got {other:?}"),
        }
    }

    #[test]
    fn two_branches_under_one_closing_pair_is_a_multiloop() {
        let pt = PairTable::try_from("((...)(...))").unwrap();
        let ss = decompose(&pt).unwrap();
        assert_eq!(ss.external.len(), 1);
        match &ss.external[0] {
            SecondaryStructureNode::Multi(m) => {
                assert_eq!(m.stem.pairs, vec![(0, 11)]);
                assert_eq!(m.branches.len(), 2);
                assert!(m
                    .branches
                    .iter()
                    .all(|b| matches!(b, SecondaryStructureNode::Hairpin(_))));
            }
            other => panic!("expected multiloop, got {other:?}"),
        }
    }

    #[test]
    fn exterior_loop_with_two_branches_and_gap() {
        let pt = PairTable::try_from("(..).(..)").unwrap();
        let ss = decompose(&pt).unwrap();
        // branch, gap, branch
        assert_eq!(ss.external.len(), 3);
    }

    #[test]
    fn covers_every_position_exactly_once() {
        let s = "(((..(((...)))..)))..((...))";
        let pt = PairTable::try_from(s).unwrap();
        let ss = decompose(&pt).unwrap();

        fn cover(node: &SecondaryStructureNode, positions: &mut Vec<usize>) {
            match node {
                SecondaryStructureNode::SingleStranded(r) => {
                    positions.extend(r.start..=r.end);
                }
                SecondaryStructureNode::Hairpin(h) => {
                    for &(a, b) in &h.stem.pairs {
                        positions.push(a);
                        positions.push(b);
                    }
                    if let Some((a, b)) = h.unpaired {
                        positions.extend(a..=b);
                    }
                }
                SecondaryStructureNode::Multi(m) => {
                    for &(a, b) in &m.stem.pairs {
                        positions.push(a);
                        positions.push(b);
                    }
                    for branch in &m.branches {
                        cover(branch, positions);
                    }
                }
            }
        }

        let mut positions = Vec::new();
        for node in &ss.external {
            cover(node, &mut positions);
        }
        positions.sort_unstable();
        positions.dedup();
        assert_eq!(positions, (0..s.len()).collect::<Vec<_>>());
    }
}
