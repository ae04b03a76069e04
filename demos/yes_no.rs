//! Example: recognising "yes" and "no" with hand-made phoneme models.
//!
//! Run with:
//! `cargo run --example yes_no`

use hmm_wordrec::{
    EmittingStateRecord, Lexicon, Observation, PhonemeRecord, PhonemeSet, Recognizer,
};

fn phoneme(name: &str, base: f64) -> PhonemeRecord {
    PhonemeRecord {
        name: name.to_string(),
        states: (0..3)
            .map(|i| EmittingStateRecord {
                mean: vec![base + i as f64, -base],
                variance: vec![0.5, 0.5],
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

fn main() -> hmm_wordrec::Result<()> {
    let phonemes = PhonemeSet::from_records([
        phoneme("sil", 0.0),
        phoneme("y", 10.0),
        phoneme("eh", 20.0),
        phoneme("s", 30.0),
        phoneme("n", 40.0),
        phoneme("ow", 50.0),
    ])?;

    let mut lexicon = Lexicon::new();
    lexicon.push("yes", vec!["y".into(), "eh".into(), "s".into()]);
    lexicon.push("no", vec!["n".into(), "ow".into()]);

    // Two frames on each state mean of sil n ow sil, slightly perturbed.
    let mut frames: Vec<Vec<f64>> = Vec::new();
    for p in ["sil", "n", "ow", "sil"] {
        for s in phonemes.get(p).into_iter().flat_map(|t| t.states()) {
            if let Some(e) = s.emitter() {
                for k in 0..2 {
                    frames.push(e.gaussian.mean().iter().map(|m| m + 0.1 * k as f64).collect());
                }
            }
        }
    }

    let recognizer = Recognizer::new(phonemes, lexicon)?;
    println!(
        "Automaton: {} states for {} words",
        recognizer.automaton().len(),
        recognizer.lexicon().len()
    );

    let decoding = recognizer.recognise(&Observation::new(frames)?)?;
    println!("Transcription: {}", decoding.transcription.join(" "));
    if let Some(score) = decoding.log_score {
        println!("Best path log-probability: {score:.3}");
    }
    println!("Recognised: {}", decoding.outcome);
    Ok(())
}
