use rustc_hash::FxHashMap;

use structure::{Base, PairType, BCOUNT, PCOUNT};

use crate::error::ParamError;

/// A stored `(dG37, dH)` pair, both in dkcal/mol, as it appears in the
/// parameter file before rescaling to a target temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub g37: i32,
    pub dh: i32,
}

impl Entry {
    fn new(g37: i32, dh: i32) -> Self {
        Entry { g37, dh }
    }
}

/// Rescale a value (or a table of values) from 37 deg C to `temp_k` kelvin,
/// recursing through arbitrary nesting depth of `Vec`. This mirrors the
/// structure of the tables themselves: the same formula applies whether the
/// value is a scalar or buried six levels deep in `interior_2x2`.
pub trait Rescale {
    type Output;
    fn rescale(&self, temp_k: f64) -> Self::Output;
}

impl Rescale for Entry {
    type Output = i32;
    fn rescale(&self, temp_k: f64) -> i32 {
        rescale_energy(self.g37, self.dh, temp_k)
    }
}

impl<T: Rescale> Rescale for Option<T> {
    type Output = Option<T::Output>;
    fn rescale(&self, temp_k: f64) -> Self::Output {
        self.as_ref().map(|v| v.rescale(temp_k))
    }
}

impl<T: Rescale> Rescale for Vec<T> {
    type Output = Vec<T::Output>;
    fn rescale(&self, temp_k: f64) -> Self::Output {
        self.iter().map(|v| v.rescale(temp_k)).collect()
    }
}

/// `dG(T) = dH - (dH - dG37) * T / 310.15`
pub fn rescale_energy(g37: i32, dh: i32, temp_k: f64) -> i32 {
    (dh as f64 - (dh - g37) as f64 * temp_k / 310.15).round() as i32
}

const MAXLOOP: usize = 30;

/// Terminal-AU/GU and multi-loop closing/base/branch penalties.
#[derive(Debug, Clone)]
pub struct MLParams {
    pub base: Entry,
    pub closing: Entry,
    pub intern: Vec<Entry>, // indexed by PairType as usize
}

#[derive(Debug, Clone)]
pub struct Misc {
    pub terminal_au: Entry,
    pub max_ninio: i32, // flat cap, not temperature-scaled
    pub lxc: f64,       // Jacobson-Stockmayer coefficient, not temperature-scaled
}

/// The full Turner-2004-style parameter set at 37 deg C, as loaded from the
/// embedded `.par`-format text resource. Every table is fully populated (no
/// missing cells) by the loader's per-section `DEFAULT` fallback.
#[derive(Debug, Clone)]
pub struct ParameterPack {
    pub stack: Vec<Vec<Entry>>, // [PCOUNT][PCOUNT]
    pub hairpin: Vec<Entry>,    // [MAXLOOP+1]
    pub bulge: Vec<Entry>,
    pub interior: Vec<Entry>,
    pub mismatch_hairpin: Vec<Vec<Vec<Entry>>>,    // [PCOUNT][BCOUNT][BCOUNT]
    pub mismatch_interior: Vec<Vec<Vec<Entry>>>,
    pub mismatch_1xn_interior: Vec<Vec<Vec<Entry>>>,
    pub mismatch_2x3_interior: Vec<Vec<Vec<Entry>>>,
    pub mismatch_exterior: Vec<Vec<Vec<Entry>>>,
    pub mismatch_multi: Vec<Vec<Vec<Entry>>>,
    pub dangle5: Vec<Vec<Entry>>, // [PCOUNT][BCOUNT]
    pub dangle3: Vec<Vec<Entry>>,
    pub interior_1x1: Vec<Vec<Vec<Vec<Entry>>>>, // [PCOUNT][PCOUNT][BCOUNT][BCOUNT]
    pub interior_2x1: Vec<Vec<Vec<Vec<Vec<Entry>>>>>, // [PCOUNT][PCOUNT][BCOUNT][BCOUNT][BCOUNT]
    pub interior_2x2: Vec<Vec<Vec<Vec<Vec<Vec<Entry>>>>>>, // [PCOUNT][PCOUNT][BCOUNT][BCOUNT][BCOUNT][BCOUNT]
    pub ninio: Entry,
    pub ml_params: MLParams,
    pub misc: Misc,
    /// Catalog of special hairpin loops (Triloops, Tetraloops, Hexaloops),
    /// keyed by the full loop sequence including both closing bases.
    pub hairpin_sequences: FxHashMap<String, Entry>,
}

const FORBIDDEN: Entry = Entry { g37: 10_000, dh: 10_000 };
const UNSET: Entry = Entry { g37: i32::MIN, dh: i32::MIN };

fn grid2(n: usize, m: usize) -> Vec<Vec<Entry>> {
    vec![vec![UNSET; m]; n]
}
fn grid3(n: usize, m: usize, k: usize) -> Vec<Vec<Vec<Entry>>> {
    vec![vec![vec![UNSET; k]; m]; n]
}
fn grid4(n: usize, m: usize, k: usize, l: usize) -> Vec<Vec<Vec<Vec<Entry>>>> {
    vec![vec![vec![vec![UNSET; l]; k]; m]; n]
}
fn grid5(n: usize, m: usize, k: usize, l: usize, o: usize) -> Vec<Vec<Vec<Vec<Vec<Entry>>>>> {
    vec![vec![vec![vec![vec![UNSET; o]; l]; k]; m]; n]
}
fn grid6(
    n: usize,
    m: usize,
    k: usize,
    l: usize,
    o: usize,
    p: usize,
) -> Vec<Vec<Vec<Vec<Vec<Vec<Entry>>>>>> {
    vec![vec![vec![vec![vec![vec![UNSET; p]; o]; l]; k]; m]; n]
}

fn fill_unset(cell: &mut Entry, default: Entry) {
    if *cell == UNSET {
        *cell = default;
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Section {
    Stack,
    Hairpin,
    Bulge,
    Interior,
    MismatchHairpin,
    MismatchInterior,
    Mismatch1xnInterior,
    Mismatch2x3Interior,
    MismatchExterior,
    MismatchMulti,
    Dangle5,
    Dangle3,
    Interior1x1,
    Interior2x1,
    Interior2x2,
    Ninio,
    Misc,
    MlParams,
    Triloops,
    Tetraloops,
    Hexaloops,
}

impl Section {
    fn from_header(s: &str) -> Option<Section> {
        Some(match s {
            "stack" => Section::Stack,
            "hairpin" => Section::Hairpin,
            "bulge" => Section::Bulge,
            "interior" => Section::Interior,
            "mismatch_hairpin" => Section::MismatchHairpin,
            "mismatch_interior" => Section::MismatchInterior,
            "mismatch_1xn_interior" => Section::Mismatch1xnInterior,
            "mismatch_2x3_interior" => Section::Mismatch2x3Interior,
            "mismatch_exterior" => Section::MismatchExterior,
            "mismatch_multi" => Section::MismatchMulti,
            "dangle5" => Section::Dangle5,
            "dangle3" => Section::Dangle3,
            "interior_1x1" => Section::Interior1x1,
            "interior_2x1" => Section::Interior2x1,
            "interior_2x2" => Section::Interior2x2,
            "ninio" => Section::Ninio,
            "misc" => Section::Misc,
            "ml_params" => Section::MlParams,
            "Triloops" => Section::Triloops,
            "Tetraloops" => Section::Tetraloops,
            "Hexaloops" => Section::Hexaloops,
            _ => return None,
        })
    }
}

fn pair_type_from_str(s: &str) -> Result<PairType, ParamError> {
    Ok(match s {
        "CG" => PairType::CG,
        "GC" => PairType::GC,
        "GU" => PairType::GU,
        "UG" => PairType::UG,
        "AU" => PairType::AU,
        "UA" => PairType::UA,
        "NN" => PairType::NN,
        other => return Err(ParamError(format!("unknown pair type '{other}'"))),
    })
}

fn base_from_str(s: &str) -> Result<Base, ParamError> {
    Base::try_from(s.chars().next().ok_or_else(|| ParamError("empty base".into()))?)
        .map_err(|c| ParamError(format!("unknown base '{c}'")))
}

fn parse_entry(tokens: &[&str]) -> Result<Entry, ParamError> {
    if tokens.len() != 2 {
        return Err(ParamError(format!("expected 'g37 dh', got {tokens:?}")));
    }
    let g37: i32 = tokens[0]
        .parse()
        .map_err(|_| ParamError(format!("bad integer '{}'", tokens[0])))?;
    let dh: i32 = tokens[1]
        .parse()
        .map_err(|_| ParamError(format!("bad integer '{}'", tokens[1])))?;
    Ok(Entry::new(g37, dh))
}

impl ParameterPack {
    pub fn from_str(text: &str) -> Result<ParameterPack, ParamError> {
        let mut stack = grid2(PCOUNT, PCOUNT);
        let mut hairpin = vec![UNSET; MAXLOOP + 1];
        let mut bulge = vec![UNSET; MAXLOOP + 1];
        let mut interior = vec![UNSET; MAXLOOP + 1];
        let mut mismatch_hairpin = grid3(PCOUNT, BCOUNT, BCOUNT);
        let mut mismatch_interior = grid3(PCOUNT, BCOUNT, BCOUNT);
        let mut mismatch_1xn_interior = grid3(PCOUNT, BCOUNT, BCOUNT);
        let mut mismatch_2x3_interior = grid3(PCOUNT, BCOUNT, BCOUNT);
        let mut mismatch_exterior = grid3(PCOUNT, BCOUNT, BCOUNT);
        let mut mismatch_multi = grid3(PCOUNT, BCOUNT, BCOUNT);
        let mut dangle5 = grid2(PCOUNT, BCOUNT);
        let mut dangle3 = grid2(PCOUNT, BCOUNT);
        let mut interior_1x1 = grid4(PCOUNT, PCOUNT, BCOUNT, BCOUNT);
        let mut interior_2x1 = grid5(PCOUNT, PCOUNT, BCOUNT, BCOUNT, BCOUNT);
        let mut interior_2x2 = grid6(PCOUNT, PCOUNT, BCOUNT, BCOUNT, BCOUNT, BCOUNT);
        let mut ninio = UNSET;
        let mut ml_base = UNSET;
        let mut ml_closing = UNSET;
        let mut ml_intern = vec![UNSET; PCOUNT];
        let mut terminal_au = UNSET;
        let mut max_ninio: Option<i32> = None;
        let mut lxc: Option<f64> = None;
        let mut hairpin_sequences = FxHashMap::default();

        // DEFAULT fallback accumulated per section.
        let mut defaults: FxHashMap<&'static str, Entry> = FxHashMap::default();
        let mut section: Option<Section> = None;

        for raw_line in text.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                if let Some(stripped) = raw_line.trim().strip_prefix("# ") {
                    if let Some(s) = Section::from_header(stripped.trim()) {
                        section = Some(s);
                    }
                }
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let Some(sec) = section else { continue };

            match sec {
                Section::Stack => {
                    if tokens[0] == "DEFAULT" {
                        defaults.insert("stack", parse_entry(&tokens[1..])?);
                        continue;
                    }
                    let p1 = pair_type_from_str(tokens[0])? as usize;
                    let p2 = pair_type_from_str(tokens[1])? as usize;
                    stack[p1][p2] = parse_entry(&tokens[2..])?;
                }
                Section::Hairpin | Section::Bulge | Section::Interior => {
                    let key = match sec {
                        Section::Hairpin => "hairpin",
                        Section::Bulge => "bulge",
                        Section::Interior => "interior",
                        _ => unreachable!(),
                    };
                    if tokens[0] == "DEFAULT" {
                        defaults.insert(key, parse_entry(&tokens[1..])?);
                        continue;
                    }
                    let n: usize = tokens[0]
                        .parse()
                        .map_err(|_| ParamError(format!("bad loop size '{}'", tokens[0])))?;
                    let e = parse_entry(&tokens[1..])?;
                    let table = match sec {
                        Section::Hairpin => &mut hairpin,
                        Section::Bulge => &mut bulge,
                        Section::Interior => &mut interior,
                        _ => unreachable!(),
                    };
                    if n <= MAXLOOP {
                        table[n] = e;
                    }
                }
                Section::MismatchHairpin
                | Section::MismatchInterior
                | Section::Mismatch1xnInterior
                | Section::Mismatch2x3Interior
                | Section::MismatchExterior
                | Section::MismatchMulti => {
                    let key = match sec {
                        Section::MismatchHairpin => "mismatch_hairpin",
                        Section::MismatchInterior => "mismatch_interior",
                        Section::Mismatch1xnInterior => "mismatch_1xn_interior",
                        Section::Mismatch2x3Interior => "mismatch_2x3_interior",
                        Section::MismatchExterior => "mismatch_exterior",
                        Section::MismatchMulti => "mismatch_multi",
                        _ => unreachable!(),
                    };
                    if tokens[0] == "DEFAULT" {
                        defaults.insert(key, parse_entry(&tokens[1..])?);
                        continue;
                    }
                    let p = pair_type_from_str(tokens[0])? as usize;
                    let b5 = base_from_str(tokens[1])? as usize;
                    let b3 = base_from_str(tokens[2])? as usize;
                    let e = parse_entry(&tokens[3..])?;
                    let table = match sec {
                        Section::MismatchHairpin => &mut mismatch_hairpin,
                        Section::MismatchInterior => &mut mismatch_interior,
                        Section::Mismatch1xnInterior => &mut mismatch_1xn_interior,
                        Section::Mismatch2x3Interior => &mut mismatch_2x3_interior,
                        Section::MismatchExterior => &mut mismatch_exterior,
                        Section::MismatchMulti => &mut mismatch_multi,
                        _ => unreachable!(),
                    };
                    table[p][b5][b3] = e;
                }
                Section::Dangle5 | Section::Dangle3 => {
                    let key = if sec == Section::Dangle5 { "dangle5" } else { "dangle3" };
                    if tokens[0] == "DEFAULT" {
                        defaults.insert(key, parse_entry(&tokens[1..])?);
                        continue;
                    }
                    let p = pair_type_from_str(tokens[0])? as usize;
                    let b = base_from_str(tokens[1])? as usize;
                    let e = parse_entry(&tokens[2..])?;
                    let table = if sec == Section::Dangle5 { &mut dangle5 } else { &mut dangle3 };
                    table[p][b] = e;
                }
                Section::Interior1x1 => {
                    if tokens[0] == "DEFAULT" {
                        defaults.insert("interior_1x1", parse_entry(&tokens[1..])?);
                        continue;
                    }
                    let tc = pair_type_from_str(tokens[0])? as usize;
                    let te = pair_type_from_str(tokens[1])? as usize;
                    let b1 = base_from_str(tokens[2])? as usize;
                    let b2 = base_from_str(tokens[3])? as usize;
                    interior_1x1[tc][te][b1][b2] = parse_entry(&tokens[4..])?;
                }
                Section::Interior2x1 => {
                    if tokens[0] == "DEFAULT" {
                        defaults.insert("interior_2x1", parse_entry(&tokens[1..])?);
                        continue;
                    }
                    let tc = pair_type_from_str(tokens[0])? as usize;
                    let te = pair_type_from_str(tokens[1])? as usize;
                    let b1 = base_from_str(tokens[2])? as usize;
                    let b2 = base_from_str(tokens[3])? as usize;
                    let b3 = base_from_str(tokens[4])? as usize;
                    interior_2x1[tc][te][b1][b2][b3] = parse_entry(&tokens[5..])?;
                }
                Section::Interior2x2 => {
                    if tokens[0] == "DEFAULT" {
                        defaults.insert("interior_2x2", parse_entry(&tokens[1..])?);
                        continue;
                    }
                    let tc = pair_type_from_str(tokens[0])? as usize;
                    let te = pair_type_from_str(tokens[1])? as usize;
                    let b1 = base_from_str(tokens[2])? as usize;
                    let b2 = base_from_str(tokens[3])? as usize;
                    let b3 = base_from_str(tokens[4])? as usize;
                    let b4 = base_from_str(tokens[5])? as usize;
                    interior_2x2[tc][te][b1][b2][b3][b4] = parse_entry(&tokens[6..])?;
                }
                Section::Ninio => {
                    ninio = parse_entry(&tokens)?;
                }
                Section::Misc => match tokens[0] {
                    "TERMINAL_AU" => terminal_au = parse_entry(&tokens[1..])?,
                    "MAX_NINIO" => {
                        max_ninio = Some(
                            tokens[1]
                                .parse()
                                .map_err(|_| ParamError("bad MAX_NINIO".into()))?,
                        )
                    }
                    "LXC" => {
                        lxc = Some(tokens[1].parse().map_err(|_| ParamError("bad LXC".into()))?)
                    }
                    other => return Err(ParamError(format!("unknown misc key '{other}'"))),
                },
                Section::MlParams => match tokens[0] {
                    "BASE" => ml_base = parse_entry(&tokens[1..])?,
                    "CLOSING" => ml_closing = parse_entry(&tokens[1..])?,
                    "DEFAULT" => {
                        defaults.insert("ml_intern", parse_entry(&tokens[1..])?);
                    }
                    "INTERN" => {
                        let p = pair_type_from_str(tokens[1])? as usize;
                        ml_intern[p] = parse_entry(&tokens[2..])?;
                    }
                    other => return Err(ParamError(format!("unknown ml_params key '{other}'"))),
                },
                Section::Triloops | Section::Tetraloops | Section::Hexaloops => {
                    let seq = tokens[0].to_string();
                    let e = parse_entry(&tokens[1..])?;
                    hairpin_sequences.insert(seq, e);
                }
            }
        }

        // fill every UNSET cell from its section's DEFAULT.
        let def = |key: &str| *defaults.get(key).unwrap_or(&FORBIDDEN);
        for row in stack.iter_mut() {
            for cell in row.iter_mut() {
                fill_unset(cell, def("stack"));
            }
        }
        for (table, key) in [
            (&mut mismatch_hairpin, "mismatch_hairpin"),
            (&mut mismatch_interior, "mismatch_interior"),
            (&mut mismatch_1xn_interior, "mismatch_1xn_interior"),
            (&mut mismatch_2x3_interior, "mismatch_2x3_interior"),
            (&mut mismatch_exterior, "mismatch_exterior"),
            (&mut mismatch_multi, "mismatch_multi"),
        ] {
            let d = def(key);
            for a in table.iter_mut() {
                for b in a.iter_mut() {
                    for cell in b.iter_mut() {
                        fill_unset(cell, d);
                    }
                }
            }
        }
        for (table, key) in [(&mut dangle5, "dangle5"), (&mut dangle3, "dangle3")] {
            let d = def(key);
            for a in table.iter_mut() {
                for cell in a.iter_mut() {
                    fill_unset(cell, d);
                }
            }
        }
        {
            let d = def("interior_1x1");
            for a in interior_1x1.iter_mut() {
                for b in a.iter_mut() {
                    for c in b.iter_mut() {
                        for cell in c.iter_mut() {
                            fill_unset(cell, d);
                        }
                    }
                }
            }
        }
        {
            let d = def("interior_2x1");
            for a in interior_2x1.iter_mut() {
                for b in a.iter_mut() {
                    for c in b.iter_mut() {
                        for e in c.iter_mut() {
                            for cell in e.iter_mut() {
                                fill_unset(cell, d);
                            }
                        }
                    }
                }
            }
        }
        {
            let d = def("interior_2x2");
            for a in interior_2x2.iter_mut() {
                for b in a.iter_mut() {
                    for c in b.iter_mut() {
                        for e in c.iter_mut() {
                            for f in e.iter_mut() {
                                for cell in f.iter_mut() {
                                    fill_unset(cell, d);
                                }
                            }
                        }
                    }
                }
            }
        }
        for n in 0..=MAXLOOP {
            fill_unset(&mut hairpin[n], def("hairpin"));
            fill_unset(&mut bulge[n], def("bulge"));
            fill_unset(&mut interior[n], def("interior"));
        }
        let ml_default = *defaults.get("ml_intern").unwrap_or(&FORBIDDEN);
        for cell in ml_intern.iter_mut() {
            fill_unset(cell, ml_default);
        }

        Ok(ParameterPack {
            stack,
            hairpin,
            bulge,
            interior,
            mismatch_hairpin,
            mismatch_interior,
            mismatch_1xn_interior,
            mismatch_2x3_interior,
            mismatch_exterior,
            mismatch_multi,
            dangle5,
            dangle3,
            interior_1x1,
            interior_2x1,
            interior_2x2,
            ninio,
            ml_params: MLParams {
                base: ml_base,
                closing: ml_closing,
                intern: ml_intern,
            },
            misc: Misc {
                terminal_au,
                max_ninio: max_ninio.ok_or_else(|| ParamError("missing MAX_NINIO".into()))?,
                lxc: lxc.ok_or_else(|| ParamError("missing LXC".into()))?,
            },
            hairpin_sequences,
        })
    }

    /// Load the embedded Turner-2004-style parameter set. Parsed once per
    /// process via `std::sync::OnceLock` at the call site; this function
    /// itself is a pure, allocation-only parse with no global state.
    pub fn turner2004() -> Result<ParameterPack, ParamError> {
        ParameterPack::from_str(include_str!("params/rna_turner2004.par"))
    }

    /// Rescale every temperature-dependent table to `temp_c` degrees Celsius,
    /// clamping `mismatch_exterior`/`mismatch_multi` to `<= 0` to match the
    /// reference evaluator (see DESIGN.md).
    pub fn rescale(&self, temp_c: f64) -> ScaledTables {
        let temp_k = temp_c + 273.15;
        let clamp = |t: Vec<Vec<Vec<i32>>>| -> Vec<Vec<Vec<i32>>> {
            t.into_iter()
                .map(|a| a.into_iter().map(|b| b.into_iter().map(|v| v.min(0)).collect()).collect())
                .collect()
        };
        ScaledTables {
            stack: self.stack.rescale(temp_k),
            hairpin: self.hairpin.rescale(temp_k),
            bulge: self.bulge.rescale(temp_k),
            interior: self.interior.rescale(temp_k),
            mismatch_hairpin: self.mismatch_hairpin.rescale(temp_k),
            mismatch_interior: self.mismatch_interior.rescale(temp_k),
            mismatch_1xn_interior: self.mismatch_1xn_interior.rescale(temp_k),
            mismatch_2x3_interior: self.mismatch_2x3_interior.rescale(temp_k),
            mismatch_exterior: clamp(self.mismatch_exterior.rescale(temp_k)),
            mismatch_multi: clamp(self.mismatch_multi.rescale(temp_k)),
            dangle5: self.dangle5.rescale(temp_k),
            dangle3: self.dangle3.rescale(temp_k),
            interior_1x1: self.interior_1x1.rescale(temp_k),
            interior_2x1: self.interior_2x1.rescale(temp_k),
            interior_2x2: self.interior_2x2.rescale(temp_k),
            ninio: self.ninio.rescale(temp_k),
            ml_base: self.ml_params.base.rescale(temp_k),
            ml_closing: self.ml_params.closing.rescale(temp_k),
            ml_intern: self.ml_params.intern.rescale(temp_k),
            terminal_au: self.misc.terminal_au.rescale(temp_k),
            max_ninio: self.misc.max_ninio,
            lxc: self.misc.lxc,
            hairpin_sequences: self
                .hairpin_sequences
                .iter()
                .map(|(k, v)| (k.clone(), v.rescale(temp_k)))
                .collect(),
        }
    }
}

/// A [`ParameterPack`] rescaled to a specific temperature: every table is
/// now a plain integer (dkcal/mol) or `None` where forbidden, ready for the
/// evaluator to index directly.
#[derive(Debug, Clone)]
pub struct ScaledTables {
    pub stack: Vec<Vec<i32>>,
    pub hairpin: Vec<i32>,
    pub bulge: Vec<i32>,
    pub interior: Vec<i32>,
    pub mismatch_hairpin: Vec<Vec<Vec<i32>>>,
    pub mismatch_interior: Vec<Vec<Vec<i32>>>,
    pub mismatch_1xn_interior: Vec<Vec<Vec<i32>>>,
    pub mismatch_2x3_interior: Vec<Vec<Vec<i32>>>,
    pub mismatch_exterior: Vec<Vec<Vec<i32>>>,
    pub mismatch_multi: Vec<Vec<Vec<i32>>>,
    pub dangle5: Vec<Vec<i32>>,
    pub dangle3: Vec<Vec<i32>>,
    pub interior_1x1: Vec<Vec<Vec<Vec<i32>>>>,
    pub interior_2x1: Vec<Vec<Vec<Vec<Vec<i32>>>>>,
    pub interior_2x2: Vec<Vec<Vec<Vec<Vec<Vec<i32>>>>>>,
    pub ninio: i32,
    pub ml_base: i32,
    pub ml_closing: i32,
    pub ml_intern: Vec<i32>,
    pub terminal_au: i32,
    pub max_ninio: i32,
    pub lxc: f64,
    pub hairpin_sequences: FxHashMap<String, i32>,
}

impl ScaledTables {
    /// Jacobson-Stockmayer extrapolation for a loop-size table past `MAXLOOP`.
    pub fn extrapolate(base_at_max: i32, lxc: f64, n: usize) -> i32 {
        base_at_max + (lxc * (n as f64 / MAXLOOP as f64).ln()).round() as i32
    }

    pub fn hairpin_at(&self, n: usize) -> i32 {
        if n <= MAXLOOP {
            self.hairpin[n]
        } else {
            Self::extrapolate(self.hairpin[MAXLOOP], self.lxc, n)
        }
    }

    pub fn bulge_at(&self, n: usize) -> i32 {
        if n <= MAXLOOP {
            self.bulge[n]
        } else {
            Self::extrapolate(self.bulge[MAXLOOP], self.lxc, n)
        }
    }

    pub fn interior_at(&self, n: usize) -> i32 {
        if n <= MAXLOOP {
            self.interior[n]
        } else {
            Self::extrapolate(self.interior[MAXLOOP], self.lxc, n)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PAR: &str = r#"
# stack
DEFAULT 10000 10000
CG CG -340 -1460
CG GC -250 -1460
GC CG -360 -1460

# hairpin
DEFAULT 600 0
0 990 0
3 570 0
4 560 0

# bulge
DEFAULT 380 0

# interior
DEFAULT 370 0

# mismatch_hairpin
DEFAULT -50 -200

# mismatch_interior
DEFAULT 0 0

# mismatch_1xn_interior
DEFAULT 0 0

# mismatch_2x3_interior
DEFAULT 0 0

# mismatch_exterior
DEFAULT -50 -200

# mismatch_multi
DEFAULT -50 -200

# dangle5
DEFAULT -20 -100

# dangle3
DEFAULT -20 -100

# interior_1x1
DEFAULT 400 0

# interior_2x1
DEFAULT 400 0

# interior_2x2
DEFAULT 280 0

# ninio
-40 0

# misc
TERMINAL_AU 50 0
MAX_NINIO 300
LXC 107.9

# ml_params
BASE 0 0
CLOSING 340 0
DEFAULT -40 0

# Triloops
CAAAG 540 0

# Tetraloops
CGAAAG 540 0
"#;

    #[test]
    fn parses_and_fills_defaults() {
        let pp = ParameterPack::from_str(TEST_PAR).unwrap();
        assert_eq!(pp.stack[PairType::CG as usize][PairType::CG as usize].g37, -340);
        assert_eq!(pp.stack[PairType::GC as usize][PairType::CG as usize].g37, -360);
        // untouched combination falls back to DEFAULT
        assert_eq!(pp.stack[PairType::UA as usize][PairType::AU as usize].g37, 10_000);
        assert_eq!(pp.hairpin[3].g37, 570);
        assert_eq!(pp.hairpin[10].g37, 600); // filled from DEFAULT
        assert_eq!(pp.misc.max_ninio, 300);
        assert!((pp.misc.lxc - 107.9).abs() < 1e-9);
        assert!(pp.hairpin_sequences.contains_key("CAAAG"));
    }

    #[test]
    fn rescale_at_37c_reproduces_g37() {
        let pp = ParameterPack::from_str(TEST_PAR).unwrap();
        let scaled = pp.rescale(37.0);
        assert_eq!(scaled.stack[0][0], pp.stack[0][0].g37);
        assert_eq!(scaled.hairpin[3], pp.hairpin[3].g37);
    }

    #[test]
    fn mismatch_exterior_and_multi_are_clamped() {
        let mut src = TEST_PAR.replace(
            "# mismatch_exterior\nDEFAULT -50 -200",
            "# mismatch_exterior\nDEFAULT 50 200",
        );
        src = src.replace(
            "# mismatch_multi\nDEFAULT -50 -200",
            "# mismatch_multi\nDEFAULT 50 200",
        );
        let pp = ParameterPack::from_str(&src).unwrap();
        let scaled = pp.rescale(37.0);
        assert!(scaled.mismatch_exterior[0][0][0] <= 0);
        assert!(scaled.mismatch_multi[0][0][0] <= 0);
        // mismatch_hairpin is not clamped and keeps its (negative, here) value
        assert_eq!(scaled.mismatch_hairpin[0][0][0], -50);
    }

    #[test]
    fn extrapolation_grows_with_loop_size() {
        let pp = ParameterPack::from_str(TEST_PAR).unwrap();
        let scaled = pp.rescale(37.0);
        let e30 = scaled.hairpin_at(30);
        let e60 = scaled.hairpin_at(60);
        let e120 = scaled.hairpin_at(120);
        assert!(e60 > e30);
        assert!(e120 > e60);
    }
}
