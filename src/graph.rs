//! HMM graph representation.
//!
//! An [`Hmm`] is an arena of [`State`]s. The arena order is the linear
//! enumeration order (what the Viterbi lattice uses as row coordinate), and
//! each state's [`Transition`]s form the weighted directed graph that the
//! decoder walks.
//!
//! Transitions carry a signed relative `step` besides their target. The step
//! is what survives when a phoneme template is instantiated somewhere else:
//! see [`crate::compose::splice_interior`].

use std::ops::Range;
use std::sync::Arc;

use crate::emission::Gaussian;

/// Position of a state inside its graph's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub usize);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identity of a trained (template) emitting state.
///
/// Composed copies keep the id of the template state they came from, which
/// is how they find their emission scores in an
/// [`EmissionTable`](crate::emission::EmissionTable).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmitterId(pub usize);

/// Static emission parameters of an emitting state.
#[derive(Clone, Debug)]
pub struct Emitter {
    pub id: EmitterId,
    pub gaussian: Arc<Gaussian>,
}

/// Directed, weighted edge out of a state.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    target: Option<StateId>,
    log_prob: f64,
    step: isize,
}

impl Transition {
    /// Target state, or `None` while the edge is still open.
    pub fn target(&self) -> Option<StateId> {
        self.target
    }

    pub fn log_prob(&self) -> f64 {
        self.log_prob
    }

    /// Signed distance from source to target in enumeration order.
    pub fn step(&self) -> isize {
        self.step
    }

    pub fn is_open(&self) -> bool {
        self.target.is_none()
    }
}

/// Handle to one transition: the owning state and its index in that state's
/// transition list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeRef {
    pub state: StateId,
    pub index: usize,
}

#[derive(Clone, Debug)]
pub struct State {
    label: Option<Arc<str>>,
    emitter: Option<Emitter>,
    transitions: Vec<Transition>,
    number: Option<usize>,
}

impl State {
    /// Non-emitting structural state (head, tail, word entry/exit).
    pub fn boundary() -> Self {
        Self {
            label: None,
            emitter: None,
            transitions: Vec::new(),
            number: None,
        }
    }

    pub fn emitting(label: Arc<str>, emitter: Emitter) -> Self {
        Self {
            label: Some(label),
            emitter: Some(emitter),
            transitions: Vec::new(),
            number: None,
        }
    }

    /// Phoneme this state was copied from; `None` for boundary states.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn emitter(&self) -> Option<&Emitter> {
        self.emitter.as_ref()
    }

    pub fn is_emitting(&self) -> bool {
        self.emitter.is_some()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Enumeration index, set by [`Hmm::enumerate_states`].
    pub fn number(&self) -> Option<usize> {
        self.number
    }

    /// Fresh node carrying this state's label and emission parameters, with
    /// no transitions and no number. The Gaussian is shared, not cloned.
    pub fn detached_copy(&self) -> Self {
        Self {
            label: self.label.clone(),
            emitter: self.emitter.clone(),
            transitions: Vec::new(),
            number: None,
        }
    }
}

/// Named HMM graph: template, word model or decoding automaton.
#[derive(Clone, Debug)]
pub struct Hmm {
    name: String,
    states: Vec<State>,
}

impl Hmm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn first(&self) -> Option<StateId> {
        (!self.states.is_empty()).then_some(StateId(0))
    }

    pub fn last(&self) -> Option<StateId> {
        self.states.len().checked_sub(1).map(StateId)
    }

    pub fn next(&self, id: StateId) -> Option<StateId> {
        let n = id.0 + 1;
        (n < self.states.len()).then_some(StateId(n))
    }

    pub fn previous(&self, id: StateId) -> Option<StateId> {
        id.0.checked_sub(1).map(StateId)
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn emitting_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_emitting()).count()
    }

    pub fn transition(&self, edge: EdgeRef) -> &Transition {
        &self.states[edge.state.0].transitions[edge.index]
    }

    /// Append a state at the tail. Does not add transitions.
    pub fn append(&mut self, state: State) -> StateId {
        let id = StateId(self.states.len());
        self.states.push(state);
        id
    }

    /// Append an ordered chain of states at the tail and return the arena
    /// range it now occupies.
    pub fn append_sequence<I>(&mut self, chain: I) -> Range<usize>
    where
        I: IntoIterator<Item = State>,
    {
        let start = self.states.len();
        self.states.extend(chain);
        start..self.states.len()
    }

    /// Add a transition from `from`. With a target the step is the distance
    /// between the two states; an open edge gets step +1 ("whatever comes
    /// next").
    pub fn add_transition(&mut self, from: StateId, to: Option<StateId>, log_prob: f64) -> EdgeRef {
        let step = match to {
            Some(t) => t.0 as isize - from.0 as isize,
            None => 1,
        };
        let transitions = &mut self.states[from.0].transitions;
        transitions.push(Transition {
            target: to,
            log_prob,
            step,
        });
        EdgeRef {
            state: from,
            index: transitions.len() - 1,
        }
    }

    /// Point `edge` at `target` and recompute its step.
    pub fn connect(&mut self, edge: EdgeRef, target: StateId) {
        let t = &mut self.states[edge.state.0].transitions[edge.index];
        t.target = Some(target);
        t.step = target.0 as isize - edge.state.0 as isize;
    }

    pub fn set_log_prob(&mut self, edge: EdgeRef, log_prob: f64) {
        self.states[edge.state.0].transitions[edge.index].log_prob = log_prob;
    }

    /// The open transition leaving the current last state, i.e. where the
    /// next appended block attaches.
    pub fn tail_connect_transition(&self) -> Option<EdgeRef> {
        let last = self.last()?;
        self.states[last.0]
            .transitions
            .iter()
            .rposition(Transition::is_open)
            .map(|index| EdgeRef { state: last, index })
    }

    /// Every transition whose target is still unset.
    pub fn open_edges(&self) -> Vec<EdgeRef> {
        self.states
            .iter()
            .enumerate()
            .flat_map(|(s, state)| {
                state
                    .transitions
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.is_open())
                    .map(move |(index, _)| EdgeRef {
                        state: StateId(s),
                        index,
                    })
            })
            .collect()
    }

    /// Walk the linear order from first to last, numbering each state with
    /// its zero-based position.
    pub fn enumerate_states(&mut self) -> Vec<StateId> {
        self.states
            .iter_mut()
            .enumerate()
            .map(|(i, state)| {
                state.number = Some(i);
                StateId(i)
            })
            .collect()
    }
}
