//! HTK master macro file (MMF) reader.
//!
//! Only single-Gaussian, single-stream `~h` macros are understood:
//!
//! ```text
//! ~h "sil"
//! <BEGINHMM>
//! <NUMSTATES> 5
//! <STATE> 2
//! <MEAN> 39
//!  -1.2 0.4 ...
//! <VARIANCE> 39
//!  0.8 1.1 ...
//! <GCONST> 1.6e+01
//! ...
//! <TRANSP> 5
//!  0.0 1.0 0.0 0.0 0.0
//!  ...
//! <ENDHMM>
//! ```
//!
//! Vectors and matrices are read as `n` numbers regardless of how they wrap
//! across lines. Keywords are case-insensitive. Anything else (global `~o`
//! options, `<VECSIZE>` and friends) is skipped token by token.

use std::io::BufRead;
use std::path::Path;

use crate::error::{Error, Result};
use crate::phoneme::{EmittingStateRecord, PhonemeRecord, PhonemeSet};

struct Token {
    line: usize,
    text: String,
}

struct Tokens<'a> {
    source: &'a str,
    items: std::vec::IntoIter<Token>,
    line: usize,
}

impl<'a> Tokens<'a> {
    fn read<R: BufRead>(reader: R, source: &'a str) -> Result<Self> {
        let mut items = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            items.extend(line.split_whitespace().map(|t| Token {
                line: i + 1,
                text: t.to_string(),
            }));
        }
        Ok(Self {
            source,
            items: items.into_iter(),
            line: 0,
        })
    }

    fn next(&mut self) -> Option<String> {
        let token = self.items.next()?;
        self.line = token.line;
        Some(token.text)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(self.source, self.line, message)
    }

    fn expect(&mut self, what: &str) -> Result<String> {
        self.next()
            .ok_or_else(|| self.error(format!("unexpected end of file, expected {what}")))
    }

    fn number<T: std::str::FromStr>(&mut self, what: &str) -> Result<T> {
        let text = self.expect(what)?;
        text.parse()
            .map_err(|_| self.error(format!("expected {what}, found '{text}'")))
    }

    /// Fail unless at least `count` tokens are left.
    fn ensure_remaining(&self, count: Option<usize>, what: &str) -> Result<()> {
        match count {
            Some(c) if c <= self.items.len() => Ok(()),
            _ => Err(self.error(format!("{what} declares more values than the file holds"))),
        }
    }

    fn vector(&mut self, n: usize, what: &str) -> Result<Vec<f64>> {
        self.ensure_remaining(Some(n), what)?;
        (0..n).map(|_| self.number::<f64>(what)).collect()
    }
}

#[derive(Default)]
struct StateDraft {
    index: usize,
    mean: Option<Vec<f64>>,
    variance: Option<Vec<f64>>,
    gconst: Option<f64>,
}

struct HmmDraft {
    name: String,
    num_states: Option<usize>,
    states: Vec<StateDraft>,
    transitions: Option<Vec<Vec<f64>>>,
}

impl HmmDraft {
    fn state(&mut self, tokens: &Tokens<'_>, keyword: &str) -> Result<&mut StateDraft> {
        self.states
            .last_mut()
            .ok_or_else(|| tokens.error(format!("{keyword} outside a <STATE> block")))
    }

    fn finish(self, tokens: &Tokens<'_>) -> Result<PhonemeRecord> {
        let transitions = self
            .transitions
            .ok_or_else(|| tokens.error(format!("'{}' has no <TRANSP>", self.name)))?;
        let n = transitions.len();
        if let Some(declared) = self.num_states {
            if declared != n {
                return Err(tokens.error(format!(
                    "'{}' declares {declared} states but <TRANSP> is {n}x{n}",
                    self.name
                )));
            }
        }

        let mut states = Vec::with_capacity(self.states.len());
        for (k, draft) in self.states.into_iter().enumerate() {
            if draft.index != k + 2 {
                return Err(tokens.error(format!(
                    "'{}': expected <STATE> {}, found {}",
                    self.name,
                    k + 2,
                    draft.index
                )));
            }
            let (Some(mean), Some(variance)) = (draft.mean, draft.variance) else {
                return Err(tokens.error(format!(
                    "'{}': state {} lacks <MEAN> or <VARIANCE>",
                    self.name, draft.index
                )));
            };
            states.push(EmittingStateRecord {
                mean,
                variance,
                gconst: draft.gconst,
            });
        }
        if states.len() + 2 != n {
            return Err(tokens.error(format!(
                "'{}' has {} emitting states for a {n}-state <TRANSP>",
                self.name,
                states.len()
            )));
        }

        Ok(PhonemeRecord {
            name: self.name,
            states,
            transitions,
        })
    }
}

/// Parse every `~h` macro in model-file order.
pub fn parse_mmf<R: BufRead>(reader: R, source_name: &str) -> Result<Vec<PhonemeRecord>> {
    let mut tokens = Tokens::read(reader, source_name)?;
    let mut records = Vec::new();
    let mut current: Option<HmmDraft> = None;

    while let Some(token) = tokens.next() {
        if token == "~h" {
            if let Some(open) = &current {
                return Err(tokens.error(format!("'{}' is missing <ENDHMM>", open.name)));
            }
            let quoted = tokens.expect("a model name")?;
            current = Some(HmmDraft {
                name: quoted.trim_matches('"').to_string(),
                num_states: None,
                states: Vec::new(),
                transitions: None,
            });
            continue;
        }
        if !token.starts_with('<') {
            continue;
        }

        let keyword = token.to_ascii_uppercase();
        let Some(draft) = current.as_mut() else {
            // Global options ahead of the first ~h.
            continue;
        };
        match keyword.as_str() {
            "<BEGINHMM>" => {}
            "<NUMSTATES>" => draft.num_states = Some(tokens.number("a state count")?),
            "<STATE>" => draft.states.push(StateDraft {
                index: tokens.number("a state index")?,
                ..StateDraft::default()
            }),
            "<MEAN>" => {
                let n = tokens.number("a vector size")?;
                let values = tokens.vector(n, "a mean value")?;
                draft.state(&tokens, &keyword)?.mean = Some(values);
            }
            "<VARIANCE>" => {
                let n = tokens.number("a vector size")?;
                let values = tokens.vector(n, "a variance value")?;
                draft.state(&tokens, &keyword)?.variance = Some(values);
            }
            "<GCONST>" => {
                let g = tokens.number("a GCONST value")?;
                draft.state(&tokens, &keyword)?.gconst = Some(g);
            }
            "<TRANSP>" => {
                let n: usize = tokens.number("a matrix size")?;
                tokens.ensure_remaining(n.checked_mul(n), "<TRANSP>")?;
                let mut rows = Vec::with_capacity(n);
                for _ in 0..n {
                    rows.push(tokens.vector(n, "a transition probability")?);
                }
                draft.transitions = Some(rows);
            }
            "<ENDHMM>" => {
                if let Some(done) = current.take() {
                    records.push(done.finish(&tokens)?);
                }
            }
            _ => {}
        }
    }

    if let Some(open) = current {
        return Err(tokens.error(format!("'{}' is missing <ENDHMM>", open.name)));
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(source = source_name, models = records.len(), "model file parsed");
    Ok(records)
}

/// Read an MMF file and build its phoneme templates.
pub fn read_mmf(path: impl AsRef<Path>) -> Result<PhonemeSet> {
    let path = path.as_ref();
    let records = parse_mmf(super::open(path)?, &super::source_name(path))?;
    PhonemeSet::from_records(records)
}
