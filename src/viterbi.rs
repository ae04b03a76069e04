//! Full-lattice Viterbi decoding over a composed automaton.
//!
//! The lattice has one row per enumerated state and `T + 2` slices: slice 0
//! holds the head alone, slice `T + 1` is where the path has to reach the
//! tail. Moving from slice `t` to `t + 1` into an emitting state consumes
//! observation frame `t`.
//!
//! Cells carry an explicit visited bit. A score of exactly `0.0` is a
//! legitimate value (the head starts there), so it cannot double as "not yet
//! reached".

use bitvec::prelude::*;

use crate::compose::Automaton;
use crate::error::{Error, Result};
use crate::graph::{Hmm, StateId};
use crate::traits::EmissionLookup;
use crate::utils::DEFAULT_MAX_LATTICE_CELLS;

/// Predecessor cell of a lattice entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackPointer {
    pub state: StateId,
    pub slice: usize,
}

/// Scores, visited marks and back-pointers for one decode.
#[derive(Clone, Debug)]
pub struct Lattice {
    states: usize,
    slices: usize,
    scores: Vec<f64>,
    visited: BitVec,
    back: Vec<Option<BackPointer>>,
}

impl Lattice {
    /// Allocate `states × slices` cells, all unvisited at −∞, refusing
    /// anything above `max_cells` or that the allocator cannot provide.
    fn allocate(states: usize, slices: usize, max_cells: usize) -> Result<Self> {
        let too_large = || Error::LatticeTooLarge { states, slices };
        let cells = states.checked_mul(slices).ok_or_else(too_large)?;
        if cells > max_cells {
            return Err(too_large());
        }

        let mut scores = Vec::new();
        scores.try_reserve_exact(cells).map_err(|_| too_large())?;
        scores.resize(cells, f64::NEG_INFINITY);
        let mut back = Vec::new();
        back.try_reserve_exact(cells).map_err(|_| too_large())?;
        back.resize(cells, None);
        let word_count = cells.div_ceil(usize::BITS as usize);
        let mut words: Vec<usize> = Vec::new();
        words.try_reserve_exact(word_count).map_err(|_| too_large())?;
        words.resize(word_count, 0);
        let mut visited = BitVec::from_vec(words);
        visited.truncate(cells);

        Ok(Self {
            states,
            slices,
            scores,
            visited,
            back,
        })
    }

    #[inline]
    fn cell(&self, state: StateId, slice: usize) -> usize {
        debug_assert!(state.index() < self.states && slice < self.slices);
        slice * self.states + state.index()
    }

    pub fn num_states(&self) -> usize {
        self.states
    }

    /// `T + 2`.
    pub fn num_slices(&self) -> usize {
        self.slices
    }

    pub fn is_visited(&self, state: StateId, slice: usize) -> bool {
        self.visited[self.cell(state, slice)]
    }

    /// Best score of a visited cell; `None` if the cell was never reached.
    pub fn score(&self, state: StateId, slice: usize) -> Option<f64> {
        let i = self.cell(state, slice);
        self.visited[i].then(|| self.scores[i])
    }

    pub fn back_pointer(&self, state: StateId, slice: usize) -> Option<BackPointer> {
        self.back[self.cell(state, slice)]
    }

    fn seed(&mut self, state: StateId) {
        let i = self.cell(state, 0);
        self.scores[i] = 0.0;
        self.visited.set(i, true);
    }

    /// Offer `candidate` for `(to, slice)`. Only an unvisited cell or a
    /// strictly better score is overwritten.
    #[inline]
    fn relax(&mut self, to: StateId, slice: usize, candidate: f64, from: BackPointer) {
        let i = self.cell(to, slice);
        if !self.visited[i] || candidate > self.scores[i] {
            self.scores[i] = candidate;
            self.back[i] = Some(from);
            self.visited.set(i, true);
        }
    }
}

/// Most likely state sequence from `(head, 0)` to `(tail, T + 1)`.
#[derive(Clone, Debug, PartialEq)]
pub struct BestPath {
    /// One state per slice, forward order.
    pub states: Vec<StateId>,
    /// Score of the terminal cell.
    pub log_score: f64,
}

/// Runs the lattice recurrence and traceback.
#[derive(Clone, Copy, Debug)]
pub struct ViterbiDecoder {
    max_cells: usize,
}

impl Default for ViterbiDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LATTICE_CELLS)
    }
}

impl ViterbiDecoder {
    pub fn new(max_cells: usize) -> Self {
        Self { max_cells }
    }

    pub fn max_cells(&self) -> usize {
        self.max_cells
    }

    /// Fill the lattice for `emissions` over `automaton`.
    pub fn forward<E: EmissionLookup>(&self, automaton: &Automaton, emissions: &E) -> Result<Lattice> {
        let hmm = automaton.hmm();
        if automaton.head_log_prob().is_none() {
            return Err(Error::malformed(hmm.name(), "head transitions not normalised"));
        }
        if automaton.order().len() != hmm.len() {
            return Err(Error::malformed(hmm.name(), "states not enumerated"));
        }
        if let Some(edge) = hmm.open_edges().first() {
            return Err(Error::malformed(
                hmm.name(),
                format!("state {} has an unresolved transition", edge.state.index()),
            ));
        }

        let t_len = emissions.num_slices();
        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!("viterbi_forward", states = hmm.len(), slices = t_len);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let mut lattice = Lattice::allocate(hmm.len(), t_len + 2, self.max_cells)?;
        lattice.seed(automaton.head());
        for t in 0..=t_len {
            self.forward_step(automaton, emissions, &mut lattice, t);
        }
        Ok(lattice)
    }

    /// Relax every transition out of the cells visited at slice `t` into
    /// slice `t + 1`.
    fn forward_step<E: EmissionLookup>(
        &self,
        automaton: &Automaton,
        emissions: &E,
        lattice: &mut Lattice,
        t: usize,
    ) {
        let hmm = automaton.hmm();
        let mut reached = 0usize;
        for &s in automaton.order() {
            let Some(score) = lattice.score(s, t) else {
                continue;
            };
            reached += 1;
            let from = BackPointer { state: s, slice: t };
            for transition in hmm.state(s).transitions() {
                let Some(to) = transition.target() else {
                    continue;
                };
                let emission = hmm
                    .state(to)
                    .emitter()
                    .and_then(|e| emissions.log_likelihood(e.id, t))
                    .unwrap_or(0.0);
                lattice.relax(to, t + 1, score + transition.log_prob() + emission, from);
            }
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(slice = t, reached, "forward step");
        #[cfg(not(feature = "tracing"))]
        let _ = reached;
    }

    /// Follow back-pointers from `(tail, T + 1)` to `(head, 0)`.
    ///
    /// `Ok(None)` means the tail was never reached on a zero-slice
    /// observation; an unreachable tail with `T > 0` is a
    /// [`Error::DecodeFailure`].
    pub fn traceback(&self, automaton: &Automaton, lattice: &Lattice) -> Result<Option<BestPath>> {
        let last = lattice.num_slices() - 1;
        let tail = automaton.tail();
        let Some(log_score) = lattice.score(tail, last) else {
            let slices = last - 1;
            return if slices == 0 {
                Ok(None)
            } else {
                Err(Error::DecodeFailure { slices })
            };
        };

        let mut states = Vec::with_capacity(lattice.num_slices());
        let mut cursor = BackPointer {
            state: tail,
            slice: last,
        };
        states.push(tail);
        while cursor.slice > 0 {
            cursor = lattice
                .back_pointer(cursor.state, cursor.slice)
                .ok_or_else(|| {
                    Error::malformed(automaton.hmm().name(), "broken back-pointer chain")
                })?;
            states.push(cursor.state);
        }
        if cursor.state != automaton.head() {
            return Err(Error::malformed(
                automaton.hmm().name(),
                "best path does not start at the head",
            ));
        }
        states.reverse();
        Ok(Some(BestPath { states, log_score }))
    }

    /// Forward pass followed by traceback.
    pub fn decode<E: EmissionLookup>(
        &self,
        automaton: &Automaton,
        emissions: &E,
    ) -> Result<Option<BestPath>> {
        let lattice = self.forward(automaton, emissions)?;
        self.traceback(automaton, &lattice)
    }
}

/// Phoneme labels along `path`: one entry per run of equally labelled
/// states, silence and boundary states dropped.
pub fn transcribe(hmm: &Hmm, path: &[StateId], silence: &str) -> Vec<String> {
    let mut out = Vec::new();
    for (i, &s) in path.iter().enumerate() {
        let Some(label) = hmm.state(s).label() else {
            continue;
        };
        if label == silence {
            continue;
        }
        let next = path.get(i + 1).and_then(|&n| hmm.state(n).label());
        if next != Some(label) {
            out.push(label.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::HeadPrior;
    use crate::emission::EmissionTable;
    use crate::lexicon::Lexicon;
    use crate::phoneme::{EmittingStateRecord, PhonemeRecord, PhonemeSet};

    fn record(name: &str, base: f64) -> PhonemeRecord {
        PhonemeRecord {
            name: name.into(),
            states: (0..3)
                .map(|i| EmittingStateRecord {
                    mean: vec![base + i as f64],
                    variance: vec![1.0],
                    gconst: None,
                })
                .collect(),
            transitions: vec![
                vec![0.0, 1.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.5, 0.5, 0.0, 0.0],
                vec![0.0, 0.0, 0.5, 0.5, 0.0],
                vec![0.0, 0.0, 0.0, 0.5, 0.5],
                vec![0.0; 5],
            ],
        }
    }

    fn automaton() -> (PhonemeSet, Automaton) {
        let set =
            PhonemeSet::from_records([record("sil", 0.0), record("a", 10.0), record("b", 20.0)])
                .unwrap();
        let mut lex = Lexicon::new();
        lex.push("a", vec!["a".into()]);
        lex.push("b", vec!["b".into()]);
        lex.compose_models(&set, "sil").unwrap();
        let mut automaton = Automaton::compose(&lex).unwrap();
        automaton.normalize_head(HeadPrior::StateCount);
        (set, automaton)
    }

    #[test]
    fn slice_zero_holds_only_the_head() {
        let (set, automaton) = automaton();
        let table = EmissionTable::from_rows(4, vec![vec![-1.0; 4]; set.emitters().len()]).unwrap();
        let lattice = ViterbiDecoder::default().forward(&automaton, &table).unwrap();
        assert_eq!(lattice.num_slices(), 6);
        assert_eq!(lattice.score(automaton.head(), 0), Some(0.0));
        for &s in automaton.order() {
            if s != automaton.head() {
                assert!(!lattice.is_visited(s, 0));
                assert_eq!(lattice.score(s, 0), None);
            }
        }
        assert!(lattice.back_pointer(automaton.head(), 0).is_none());
    }

    #[test]
    fn ties_keep_the_first_writer() {
        // Two words with identical emissions: equal scores everywhere, so the
        // path must stay in the first word.
        let (set, automaton) = automaton();
        let table = EmissionTable::from_rows(9, vec![vec![0.0; 9]; set.emitters().len()]).unwrap();
        let path = ViterbiDecoder::default()
            .decode(&automaton, &table)
            .unwrap()
            .unwrap();
        let span = automaton.word_span(0).unwrap();
        assert!(path.states[1..path.states.len() - 1]
            .iter()
            .all(|s| span.contains(&s.index())));
    }

    #[test]
    fn path_spans_every_slice() {
        let (set, automaton) = automaton();
        let t = 12;
        let table = EmissionTable::from_rows(t, vec![vec![-0.5; t]; set.emitters().len()]).unwrap();
        let path = ViterbiDecoder::default()
            .decode(&automaton, &table)
            .unwrap()
            .unwrap();
        assert_eq!(path.states.len(), t + 2);
        assert_eq!(path.states.first(), Some(&automaton.head()));
        assert_eq!(path.states.last(), Some(&automaton.tail()));
        assert!(path.log_score.is_finite());
    }

    #[test]
    fn zero_slices_yield_no_path() {
        let (set, automaton) = automaton();
        let table = EmissionTable::from_rows(0, vec![Vec::new(); set.emitters().len()]).unwrap();
        let out = ViterbiDecoder::default().decode(&automaton, &table).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn too_few_slices_is_a_decode_failure() {
        // Every word needs at least 9 frames to cross sil, phone and sil.
        let (set, automaton) = automaton();
        let table = EmissionTable::from_rows(3, vec![vec![0.0; 3]; set.emitters().len()]).unwrap();
        let err = ViterbiDecoder::default().decode(&automaton, &table).unwrap_err();
        assert!(matches!(err, Error::DecodeFailure { slices: 3 }));
    }

    #[test]
    fn oversized_lattice_is_refused() {
        let (set, automaton) = automaton();
        let table = EmissionTable::from_rows(100, vec![vec![0.0; 100]; set.emitters().len()]).unwrap();
        let err = ViterbiDecoder::new(1000).forward(&automaton, &table).unwrap_err();
        assert!(matches!(err, Error::LatticeTooLarge { slices: 102, .. }));
    }

    #[test]
    fn fresh_lattice_is_unvisited_everywhere() {
        // 7 x 11 cells do not fill a whole number of bitmap words.
        let lattice = Lattice::allocate(7, 11, 77).unwrap();
        assert_eq!(lattice.visited.len(), 77);
        assert!(lattice.visited.not_any());
        assert!((0..11).all(|t| lattice.score(StateId(6), t).is_none()));
        assert!(matches!(
            Lattice::allocate(7, 11, 76),
            Err(Error::LatticeTooLarge { states: 7, slices: 11 })
        ));
        assert!(matches!(
            Lattice::allocate(usize::MAX, 2, usize::MAX),
            Err(Error::LatticeTooLarge { .. })
        ));
    }

    #[test]
    fn unnormalised_head_is_rejected() {
        let set = PhonemeSet::from_records([record("sil", 0.0), record("a", 1.0)]).unwrap();
        let mut lex = Lexicon::new();
        lex.push("a", vec!["a".into()]);
        lex.compose_models(&set, "sil").unwrap();
        let automaton = Automaton::compose(&lex).unwrap();
        let table = EmissionTable::from_rows(1, vec![vec![0.0]; 6]).unwrap();
        assert!(ViterbiDecoder::default().forward(&automaton, &table).is_err());
    }

    #[test]
    fn transcription_collapses_runs_and_drops_silence() {
        let (_, automaton) = automaton();
        let hmm = automaton.hmm();
        // head, sil x2, a x3 (two states), sil, tail
        let path: Vec<StateId> = [0, 1, 2, 4, 4, 5, 6, 7, 19]
            .into_iter()
            .map(StateId)
            .collect();
        assert_eq!(transcribe(hmm, &path, "sil"), vec!["a".to_string()]);
        assert!(transcribe(hmm, &path[..3], "sil").is_empty());
    }
}
