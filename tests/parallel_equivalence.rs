#![cfg(feature = "parallel")]

mod common;

use common::*;
use hmm_wordrec::batch::{evaluate, BatchOptions};
use hmm_wordrec::graph::EmitterId;
use hmm_wordrec::io::htk::{write_features, KIND_MFCC};
use hmm_wordrec::io::testset::TestLayout;
use hmm_wordrec::{EmissionLookup, EmissionTable, Observation, Recognizer};
use proptest::prelude::*;
use std::fs::{self, File};

proptest! {
    #[test]
    fn parallel_rows_match_direct_scoring(
        frames in prop::collection::vec(prop::collection::vec(-60.0f64..60.0, DIM), 0..30)
    ) {
        let set = phoneme_set();
        let obs = Observation::new(frames).unwrap();
        let table = EmissionTable::compute(&set, &obs).unwrap();
        for (e, info) in set.emitters().iter().enumerate() {
            for (t, x) in obs.frames().iter().enumerate() {
                prop_assert_eq!(
                    table.log_likelihood(EmitterId(e), t),
                    Some(info.gaussian.log_likelihood(x))
                );
            }
        }
    }
}

#[test]
fn batch_keeps_test_set_order() {
    let dir = tempfile::tempdir().unwrap();
    let layout = TestLayout::new(dir.path().join("mfc"), dir.path().join("label"));
    fs::create_dir_all(&layout.mfc_dir).unwrap();
    let set = phoneme_set();
    let words = [("yes", "y eh s"), ("no", "n ow"), ("cat", "k ae t")];
    let mut ids = Vec::new();
    for i in 0..24 {
        let (_, pron) = words[i % words.len()];
        let id = format!("utt{i:02}");
        let obs = mean_frames(&set, &word_sequence(&phones(pron)), &[1 + i % 3]);
        write_features(File::create(layout.features_path(&id)).unwrap(), &obs, 100_000, KIND_MFCC)
            .unwrap();
        ids.push(id);
    }

    let rec = Recognizer::new(set, lexicon(&words)).unwrap();
    let report = evaluate(&rec, &ids, &BatchOptions { layout, verify: false });
    for (i, u) in report.utterances.iter().enumerate() {
        assert_eq!(u.id, ids[i]);
        let decoding = u.result.as_ref().unwrap();
        assert_eq!(decoding.outcome.word(), Some(words[i % words.len()].0));
    }
}
