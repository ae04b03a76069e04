//! Test-set evaluation.
//!
//! Every utterance is decoded independently against one shared
//! [`Recognizer`]; with the `parallel` feature the utterances are spread over
//! rayon's pool. Report order always follows the test-set order.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::engine::{Decoding, Recognition, Recognizer};
use crate::error::Error;
use crate::io::htk::read_features;
use crate::io::testset::{read_label, TestLayout};

#[derive(Clone, Debug, Default)]
pub struct BatchOptions {
    pub layout: TestLayout,
    /// Look up each utterance's reference label and grade the result.
    pub verify: bool,
}

/// How one utterance fared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    NoMatch,
    /// Features could not be read or decoding failed.
    Failed,
    /// Decoded, but no reference label to compare with.
    Unverified,
}

#[derive(Debug)]
pub struct UtteranceReport {
    pub id: String,
    pub expected: Option<String>,
    pub result: Result<Decoding, Error>,
}

impl UtteranceReport {
    pub fn verdict(&self) -> Verdict {
        let decoding = match &self.result {
            Ok(d) => d,
            Err(_) => return Verdict::Failed,
        };
        let Some(expected) = &self.expected else {
            return Verdict::Unverified;
        };
        match &decoding.outcome {
            Recognition::Match { word, .. } if word == expected => Verdict::Correct,
            Recognition::Match { .. } => Verdict::Incorrect,
            Recognition::NoMatch => Verdict::NoMatch,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub utterances: Vec<UtteranceReport>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.utterances.len()
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        self.utterances
            .iter()
            .filter(|u| u.verdict() == verdict)
            .count()
    }

    pub fn correct(&self) -> usize {
        self.count(Verdict::Correct)
    }

    /// Graded utterances that did not yield the reference word.
    pub fn incorrect(&self) -> usize {
        self.count(Verdict::Incorrect) + self.count(Verdict::NoMatch)
    }

    pub fn failed(&self) -> usize {
        self.count(Verdict::Failed)
    }

    /// Correct over graded utterances; `None` if nothing was graded.
    pub fn accuracy(&self) -> Option<f64> {
        let graded = self.correct() + self.incorrect();
        (graded > 0).then(|| self.correct() as f64 / graded as f64)
    }
}

fn evaluate_one(recognizer: &Recognizer, id: &str, options: &BatchOptions) -> UtteranceReport {
    #[cfg(feature = "tracing")]
    let span = tracing::debug_span!("utterance", id);
    #[cfg(feature = "tracing")]
    let _enter = span.enter();

    let result = read_features(options.layout.features_path(id))
        .and_then(|observation| recognizer.recognise(&observation));

    let expected = if options.verify {
        match read_label(options.layout.label_path(id)) {
            Ok(label) => label,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(id, error = %_e, "reference label unavailable");
                None
            }
        }
    } else {
        None
    };

    UtteranceReport {
        id: id.to_string(),
        expected,
        result,
    }
}

/// Decode every utterance in `ids`.
pub fn evaluate(recognizer: &Recognizer, ids: &[String], options: &BatchOptions) -> BatchReport {
    #[cfg(feature = "tracing")]
    let span = tracing::info_span!("batch", utterances = ids.len(), verify = options.verify);
    #[cfg(feature = "tracing")]
    let _enter = span.enter();

    #[cfg(feature = "parallel")]
    let utterances = ids
        .par_iter()
        .map(|id| evaluate_one(recognizer, id, options))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let utterances = ids
        .iter()
        .map(|id| evaluate_one(recognizer, id, options))
        .collect();

    let report = BatchReport { utterances };
    #[cfg(feature = "tracing")]
    tracing::info!(
        total = report.total(),
        correct = report.correct(),
        failed = report.failed(),
        "batch finished"
    );
    report
}
