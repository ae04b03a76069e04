//! Command-line front end.
//!
//! Usage:
//!   recognise --models hmms.mmf --lexicon lexicon.txt decode f01
//!   recognise --models hmms.mmf --lexicon lexicon.txt runtest testset.txt --verify

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hmm_wordrec::batch::{evaluate, BatchOptions};
use hmm_wordrec::io::htk::read_features;
use hmm_wordrec::io::lexicon::read_lexicon;
use hmm_wordrec::io::mmf::read_mmf;
use hmm_wordrec::io::testset::{read_label, read_test_set, TestLayout};
use hmm_wordrec::{HeadPrior, MatchRule, Recognizer};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "recognise", version, about = "Isolated-word recogniser over HTK phoneme models")]
struct Cli {
    /// Trained phoneme models (HTK MMF)
    #[arg(long)]
    models: PathBuf,

    /// Pronunciation lexicon
    #[arg(long)]
    lexicon: PathBuf,

    /// Directory holding <id>.mfc feature files
    #[arg(long, default_value = "mfc")]
    mfc_dir: PathBuf,

    /// Directory holding <id>.lab reference labels
    #[arg(long, default_value = "label")]
    label_dir: PathBuf,

    /// Phoneme that brackets every word
    #[arg(long, default_value = "sil")]
    silence: String,

    #[arg(long, value_enum, default_value_t = Rule::PhonemeSet)]
    match_rule: Rule,

    #[arg(long, value_enum, default_value_t = Prior::StateCount)]
    head_prior: Prior,

    /// Refuse decodes whose lattice would exceed this many cells
    #[arg(long, default_value_t = hmm_wordrec::utils::DEFAULT_MAX_LATTICE_CELLS)]
    max_cells: usize,

    /// Verbose diagnostics on stderr
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode one utterance (an id under --mfc-dir, or a path to a .mfc file)
    Decode { utterance: String },
    /// Decode every utterance listed in a test-set file
    Runtest {
        testset: PathBuf,
        /// Compare against reference labels and print a summary
        #[arg(long)]
        verify: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Rule {
    PhonemeSet,
    Exact,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Prior {
    StateCount,
    FanOut,
}

fn init_tracing(debug: bool) {
    let default = if debug { "hmm_wordrec=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_recognizer(cli: &Cli) -> Result<Recognizer> {
    let phonemes = read_mmf(&cli.models)
        .with_context(|| format!("reading models from {}", cli.models.display()))?;
    let lexicon = read_lexicon(&cli.lexicon)
        .with_context(|| format!("reading lexicon from {}", cli.lexicon.display()))?;
    let recognizer = Recognizer::builder(phonemes, lexicon)
        .with_silence_label(cli.silence.clone())
        .with_match_rule(match cli.match_rule {
            Rule::PhonemeSet => MatchRule::PhonemeSet,
            Rule::Exact => MatchRule::ExactSequence,
        })
        .with_head_prior(match cli.head_prior {
            Prior::StateCount => HeadPrior::StateCount,
            Prior::FanOut => HeadPrior::FanOut,
        })
        .with_max_lattice_cells(cli.max_cells)
        .build()
        .context("composing the decoding automaton")?;
    Ok(recognizer)
}

fn decode(cli: &Cli, recognizer: &Recognizer, layout: &TestLayout, utterance: &str) -> Result<()> {
    let direct = Path::new(utterance);
    let path = if direct.is_file() {
        direct.to_path_buf()
    } else {
        layout.features_path(utterance)
    };
    let observation =
        read_features(&path).with_context(|| format!("reading features from {}", path.display()))?;
    let decoding = recognizer
        .recognise(&observation)
        .with_context(|| format!("decoding {}", path.display()))?;

    println!("{}", decoding.outcome);
    if cli.debug {
        eprintln!("transcription: {}", decoding.transcription.join(" "));
        if let Some(score) = decoding.log_score {
            eprintln!("log score: {score:.4}");
        }
        match read_label(layout.label_path(utterance)) {
            Ok(Some(word)) => eprintln!("Verification of spoken word: {word}"),
            Ok(None) | Err(_) => eprintln!("output verification is not available"),
        }
    }
    Ok(())
}

fn runtest(recognizer: &Recognizer, layout: TestLayout, testset: &Path, verify: bool) -> Result<()> {
    let ids = read_test_set(testset)
        .with_context(|| format!("reading test set {}", testset.display()))?;
    let report = evaluate(recognizer, &ids, &BatchOptions { layout, verify });

    for utterance in &report.utterances {
        match &utterance.result {
            Ok(decoding) => println!("{}", decoding.outcome),
            Err(err) => eprintln!("{}: {err}", utterance.id),
        }
    }
    if verify {
        let graded = report.correct() + report.incorrect();
        eprintln!("Summary of {graded} words:");
        eprintln!("\t{} word correctly recognised.", report.correct());
        eprintln!("\t{} word incorrectly recognised.", report.incorrect());
        if report.failed() > 0 {
            eprintln!("\t{} utterances could not be decoded.", report.failed());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let recognizer = build_recognizer(&cli)?;
    let layout = TestLayout::new(cli.mfc_dir.clone(), cli.label_dir.clone());
    match &cli.command {
        Command::Decode { utterance } => decode(&cli, &recognizer, &layout, utterance),
        Command::Runtest { testset, verify } => runtest(&recognizer, layout, testset, *verify),
    }
}
