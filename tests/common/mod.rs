#![allow(dead_code)]

use hmm_wordrec::{EmittingStateRecord, Lexicon, Observation, PhonemeRecord, PhonemeSet};

pub const DIM: usize = 2;

/// Three-state left-to-right phoneme with well separated means.
pub fn linear_record(name: &str, base: f64) -> PhonemeRecord {
    PhonemeRecord {
        name: name.to_string(),
        states: (0..3)
            .map(|i| EmittingStateRecord {
                mean: vec![base + i as f64, -base],
                variance: vec![0.25; DIM],
                gconst: None,
            })
            .collect(),
        transitions: vec![
            vec![0.0, 1.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.6, 0.4, 0.0, 0.0],
            vec![0.0, 0.0, 0.6, 0.4, 0.0],
            vec![0.0, 0.0, 0.0, 0.7, 0.3],
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
        ],
    }
}

/// Silence with a forward skip (2 -> 4) and a backward skip (4 -> 2).
pub fn silence_record() -> PhonemeRecord {
    let mut sil = linear_record("sil", 0.0);
    sil.transitions = vec![
        vec![0.0, 1.0, 0.0, 0.0, 0.0],
        vec![0.0, 0.6, 0.3, 0.1, 0.0],
        vec![0.0, 0.0, 0.7, 0.3, 0.0],
        vec![0.0, 0.2, 0.0, 0.5, 0.3],
        vec![0.0, 0.0, 0.0, 0.0, 0.0],
    ];
    sil
}

pub const PHONES: &[(&str, f64)] = &[
    ("y", 10.0),
    ("eh", 20.0),
    ("s", 30.0),
    ("n", 40.0),
    ("ow", 50.0),
    ("k", 60.0),
    ("ae", 70.0),
    ("t", 80.0),
];

pub fn phoneme_set() -> PhonemeSet {
    let mut records = vec![silence_record()];
    records.extend(PHONES.iter().map(|&(p, base)| linear_record(p, base)));
    PhonemeSet::from_records(records).unwrap()
}

pub fn phones(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

pub fn lexicon(entries: &[(&str, &str)]) -> Lexicon {
    let mut lex = Lexicon::new();
    for &(word, pron) in entries {
        lex.push(word, phones(pron));
    }
    lex
}

pub fn yes_no() -> Lexicon {
    lexicon(&[("yes", "y eh s"), ("no", "n ow")])
}

/// Feature frames sitting exactly on the state means of `sequence`, each
/// emitting state repeated `repeats[i]` times (cycled).
pub fn mean_frames(set: &PhonemeSet, sequence: &[&str], repeats: &[usize]) -> Observation {
    let mut frames = Vec::new();
    let mut k = 0;
    for name in sequence {
        for state in set.get(name).unwrap().states() {
            if let Some(emitter) = state.emitter() {
                let n = repeats[k % repeats.len()].max(1);
                k += 1;
                for _ in 0..n {
                    frames.push(emitter.gaussian.mean().to_vec());
                }
            }
        }
    }
    Observation::new(frames).unwrap()
}

/// `sil`, the pronunciation, `sil`.
pub fn word_sequence(pronunciation: &[String]) -> Vec<&str> {
    let mut seq = vec!["sil"];
    seq.extend(pronunciation.iter().map(String::as_str));
    seq.push("sil");
    seq
}
