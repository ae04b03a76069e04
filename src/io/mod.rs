//! Readers for the files a recognition run is assembled from.
//!
//! - [`mmf`]: HTK master macro files holding the trained phoneme HMMs.
//! - [`lexicon`]: one word per line followed by its phonemes.
//! - [`htk`]: binary HTK parameter files (one observation each).
//! - [`testset`]: utterance lists and their reference labels.
//!
//! Each reader has a `parse_*` function over any reader plus a `read_*`
//! convenience taking a path. The source name threaded through the parsers
//! only ends up in error messages.

pub mod htk;
pub mod lexicon;
pub mod mmf;
pub mod testset;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::Result;

pub(crate) fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

pub(crate) fn source_name(path: &Path) -> String {
    path.display().to_string()
}
