#![cfg(feature = "heavy")]

use hmm_wordrec::{
    EmittingStateRecord, Lexicon, Observation, PhonemeRecord, PhonemeSet, Recognizer,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

const DIM: usize = 39;

fn random_phoneme(rng: &mut StdRng, name: String) -> PhonemeRecord {
    PhonemeRecord {
        name,
        states: (0..3)
            .map(|_| EmittingStateRecord {
                mean: (0..DIM).map(|_| rng.gen_range(-20.0..20.0)).collect(),
                variance: (0..DIM).map(|_| rng.gen_range(0.5..4.0)).collect(),
                gconst: None,
            })
            .collect(),
        transitions: vec![
            vec![0.0, 1.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.6, 0.4, 0.0, 0.0],
            vec![0.0, 0.0, 0.6, 0.4, 0.0],
            vec![0.0, 0.0, 0.0, 0.6, 0.4],
            vec![0.0; 5],
        ],
    }
}

#[test]
fn heavy_stress_large_lexicon_long_utterance() {
    let mut rng = StdRng::seed_from_u64(123);
    let names: Vec<String> = std::iter::once("sil".to_string())
        .chain((0..40).map(|i| format!("p{i}")))
        .collect();
    let records: Vec<_> = names
        .iter()
        .map(|n| random_phoneme(&mut rng, n.clone()))
        .collect();
    let set = PhonemeSet::from_records(records).unwrap();

    let mut lexicon = Lexicon::new();
    let mut prons = Vec::new();
    for w in 0..300 {
        let len = rng.gen_range(2..7);
        let pron: Vec<String> = (0..len)
            .map(|_| names[rng.gen_range(1..names.len())].clone())
            .collect();
        prons.push(pron.clone());
        lexicon.push(format!("w{w}"), pron);
    }

    let target = 137;
    let mut frames = Vec::new();
    let mut seq = vec!["sil".to_string()];
    seq.extend(prons[target].iter().cloned());
    seq.push("sil".to_string());
    for p in &seq {
        for s in set.get(p).unwrap().states() {
            if let Some(e) = s.emitter() {
                for _ in 0..40 {
                    frames.push(e.gaussian.mean().to_vec());
                }
            }
        }
    }

    let rec = Recognizer::new(set, lexicon).unwrap();
    let out = rec.recognise(&Observation::new(frames).unwrap()).unwrap();
    // Random pronunciations may repeat; the first identical word wins.
    let found = rec.path_word(&out).unwrap();
    assert_eq!(prons[found], prons[target]);
    assert!(out.log_score.unwrap().is_finite());
}
