//! Graph composition: templates into word models, word models into the
//! decoding automaton.
//!
//! Everything is built on [`splice_interior`], which copies the states
//! between a source graph's two boundary states onto the tail of a target
//! and re-creates their transitions from relative steps. Edges that lead
//! past the copied block come back as open exits for the caller to patch.

use std::ops::Range;

use crate::error::{Error, Result};
use crate::graph::{EdgeRef, Hmm, State, StateId};
use crate::lexicon::Lexicon;
use crate::phoneme::PhonemeSet;
use crate::utils::uniform_log_prior;

/// Result of one splice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Splice {
    /// First newly appended state; previously open edges attach here.
    pub first: StateId,
    /// Arena range of the appended block.
    pub block: Range<usize>,
    /// Open transitions leaving the block.
    pub exits: Vec<EdgeRef>,
}

/// Copy the interior of `source` (everything except its first and last
/// state) onto the tail of `target`.
///
/// Each copied transition keeps its log-probability and is resolved from its
/// step against the new positions. Past the block it becomes an open exit.
/// Anywhere else in the arena it becomes a concrete edge, so a backward step
/// that overshoots the block start lands in the preceding block. Only a step
/// before the arena start is rejected.
pub fn splice_interior(source: &Hmm, target: &mut Hmm) -> Result<Splice> {
    if source.len() < 3 {
        return Err(Error::malformed(
            source.name(),
            "needs at least one state between its boundary states",
        ));
    }
    let interior = &source.states()[1..source.len() - 1];
    let block = target.append_sequence(interior.iter().map(State::detached_copy));
    let end = block.end as isize;

    let mut exits = Vec::new();
    for (offset, original) in interior.iter().enumerate() {
        let from = StateId(block.start + offset);
        for t in original.transitions() {
            let dest = from.index() as isize + t.step();
            if dest < 0 {
                return Err(Error::malformed(
                    source.name(),
                    format!(
                        "transition from state {} steps {} before the graph start",
                        offset + 1,
                        -dest
                    ),
                ));
            }
            if dest >= end {
                exits.push(target.add_transition(from, None, t.log_prob()));
            } else {
                target.add_transition(from, Some(StateId(dest as usize)), t.log_prob());
            }
        }
    }

    if exits.is_empty() {
        return Err(Error::malformed(
            source.name(),
            "no transition leaves the emitting states",
        ));
    }
    Ok(Splice {
        first: StateId(block.start),
        block,
        exits,
    })
}

/// Compose the word model for `word` pronounced as `pronunciation`.
///
/// Layout: entry boundary, silence, each pronunciation phoneme, silence,
/// exit boundary. The exit boundary carries one open edge, returned later by
/// [`Hmm::tail_connect_transition`].
pub fn compose_word(
    word: &str,
    pronunciation: &[String],
    phonemes: &PhonemeSet,
    silence: &str,
) -> Result<Hmm> {
    let sil = phonemes.require(silence, word)?;
    let mut templates = Vec::with_capacity(pronunciation.len() + 2);
    templates.push(sil);
    for p in pronunciation {
        templates.push(phonemes.require(p, word)?);
    }
    templates.push(sil);

    let mut hmm = Hmm::new(word);
    let entry = hmm.append(State::boundary());
    let mut open = vec![hmm.add_transition(entry, None, 0.0)];
    for template in templates {
        let splice = splice_interior(template, &mut hmm)?;
        for edge in open.drain(..) {
            hmm.connect(edge, splice.first);
        }
        open = splice.exits;
    }
    let exit = hmm.append(State::boundary());
    for edge in open {
        hmm.connect(edge, exit);
    }
    hmm.add_transition(exit, None, 0.0);
    hmm.enumerate_states();

    #[cfg(feature = "tracing")]
    tracing::trace!(
        word,
        states = hmm.len(),
        emitting = hmm.emitting_count(),
        "word model composed"
    );
    Ok(hmm)
}

/// How the head's outgoing transitions are weighted before decoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeadPrior {
    /// `−ln(numberOfStates − 2)` on every head transition.
    #[default]
    StateCount,
    /// `−ln(fan-out)`: a proper uniform distribution over the words.
    FanOut,
}

/// The single graph every word model is fused into.
#[derive(Clone, Debug)]
pub struct Automaton {
    hmm: Hmm,
    head: StateId,
    tail: StateId,
    spans: Vec<Range<usize>>,
    order: Vec<StateId>,
    head_log_prob: Option<f64>,
}

impl Automaton {
    /// Fuse the composed word models of `lexicon` behind one shared head and
    /// in front of one shared tail, in lexicon order.
    pub fn compose(lexicon: &Lexicon) -> Result<Self> {
        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!("compose_automaton", words = lexicon.len());
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        if lexicon.is_empty() {
            return Err(Error::EmptyLexicon);
        }

        let mut hmm = Hmm::new("automaton");
        let head = hmm.append(State::boundary());
        let mut pending = Vec::new();
        let mut spans = Vec::with_capacity(lexicon.len());
        let mut appended = 0usize;

        for word in lexicon.words() {
            let model = word
                .model()
                .ok_or_else(|| Error::malformed(word.text(), "word model not composed"))?;
            let splice = splice_interior(model, &mut hmm)?;
            hmm.add_transition(head, Some(splice.first), 0.0);
            pending.extend(splice.exits);
            appended += splice.block.len();
            spans.push(splice.block);
        }

        let tail = hmm.append(State::boundary());
        for edge in pending {
            hmm.connect(edge, tail);
        }
        let size = appended + 2;
        debug_assert_eq!(size, hmm.len());
        let order = hmm.enumerate_states();

        #[cfg(feature = "tracing")]
        tracing::debug!(states = size, "automaton composed");
        Ok(Self {
            hmm,
            head,
            tail,
            spans,
            order,
            head_log_prob: None,
        })
    }

    /// Weight every head transition according to `prior` and return the
    /// value used. Call once, after composition and before decoding.
    pub fn normalize_head(&mut self, prior: HeadPrior) -> f64 {
        let fan_out = self.hmm.state(self.head).transitions().len();
        let value = match prior {
            HeadPrior::StateCount => uniform_log_prior(self.hmm.len().saturating_sub(2)),
            HeadPrior::FanOut => uniform_log_prior(fan_out),
        };
        for index in 0..fan_out {
            self.hmm.set_log_prob(
                EdgeRef {
                    state: self.head,
                    index,
                },
                value,
            );
        }
        self.head_log_prob = Some(value);
        value
    }

    /// Log-probability given to head transitions, once normalised.
    pub fn head_log_prob(&self) -> Option<f64> {
        self.head_log_prob
    }

    pub fn hmm(&self) -> &Hmm {
        &self.hmm
    }

    pub fn head(&self) -> StateId {
        self.head
    }

    pub fn tail(&self) -> StateId {
        self.tail
    }

    /// Total states: head, every word's states, tail.
    pub fn len(&self) -> usize {
        self.hmm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hmm.is_empty()
    }

    /// States in enumeration order; position equals lattice row.
    pub fn order(&self) -> &[StateId] {
        &self.order
    }

    /// Arena range holding the states of the word at lexicon `index`.
    pub fn word_span(&self, index: usize) -> Option<Range<usize>> {
        self.spans.get(index).cloned()
    }

    /// Lexicon index of the word whose block contains `state`.
    pub fn word_at(&self, state: StateId) -> Option<usize> {
        self.spans.iter().position(|r| r.contains(&state.index()))
    }
}
