//! Two words built from the same phonemes in a different order.

mod common;

use common::*;
use hmm_wordrec::{MatchRule, Recognition, Recognizer};

fn decode_tack(rule: MatchRule) -> (Recognizer, hmm_wordrec::Decoding) {
    let rec = Recognizer::builder(phoneme_set(), lexicon(&[("cat", "k ae t"), ("tack", "t ae k")]))
        .with_match_rule(rule)
        .build()
        .unwrap();
    let obs = mean_frames(rec.phonemes(), &word_sequence(&phones("t ae k")), &[2]);
    let out = rec.recognise(&obs).unwrap();
    (rec, out)
}

#[test]
fn phoneme_set_rule_returns_the_first_word_in_lexicon_order() {
    let (rec, out) = decode_tack(MatchRule::PhonemeSet);
    assert_eq!(out.transcription, phones("t ae k"));
    assert_eq!(rec.path_word(&out), Some(1));
    assert_eq!(
        out.outcome,
        Recognition::Match {
            word: "cat".into(),
            index: 0
        }
    );
}

#[test]
fn exact_sequence_rule_respects_order() {
    let (_, out) = decode_tack(MatchRule::ExactSequence);
    assert_eq!(
        out.outcome,
        Recognition::Match {
            word: "tack".into(),
            index: 1
        }
    );
}

#[test]
fn default_rule_is_the_phoneme_set_rule() {
    assert_eq!(MatchRule::default(), MatchRule::PhonemeSet);
}

#[test]
fn collapsed_transcription_matches_nothing() {
    // The path runs through "know", but its repeated phoneme collapses and
    // the two-label transcription fits neither rule.
    for rule in [MatchRule::PhonemeSet, MatchRule::ExactSequence] {
        let rec = Recognizer::builder(phoneme_set(), lexicon(&[("know", "n ow ow")]))
            .with_match_rule(rule)
            .build()
            .unwrap();
        let obs = mean_frames(rec.phonemes(), &word_sequence(&phones("n ow ow")), &[1, 2]);
        let out = rec.recognise(&obs).unwrap();
        assert_eq!(out.transcription, phones("n ow"));
        assert_eq!(out.outcome, Recognition::NoMatch);
        assert_eq!(rec.path_word(&out), Some(0));
    }
}
