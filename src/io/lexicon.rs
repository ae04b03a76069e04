//! Pronunciation lexicon reader: `word phoneme phoneme ...` per line.

use std::io::BufRead;
use std::path::Path;

use crate::error::Result;
use crate::lexicon::{Lexicon, Word};

/// Parse a lexicon, keeping file order. Blank lines are skipped; a word
/// with no phonemes is kept and pronounced as silence alone.
pub fn parse_lexicon<R: BufRead>(reader: R, source_name: &str) -> Result<Lexicon> {
    let mut words = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let Some(text) = fields.next() else {
            continue;
        };
        words.push(Word::new(text, fields.map(str::to_string).collect()));
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(source = source_name, words = words.len(), "lexicon parsed");
    #[cfg(not(feature = "tracing"))]
    let _ = source_name;
    Ok(words.into_iter().collect())
}

pub fn read_lexicon(path: impl AsRef<Path>) -> Result<Lexicon> {
    let path = path.as_ref();
    parse_lexicon(super::open(path)?, &super::source_name(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_token_is_the_word() {
        let text = "yes  y eh s\n\n  no n ow  \nmm\n";
        let lex = parse_lexicon(text.as_bytes(), "lexicon").unwrap();
        assert_eq!(lex.len(), 3);
        assert_eq!(lex.get(0).unwrap().text(), "yes");
        assert_eq!(lex.get(0).unwrap().pronunciation(), ["y", "eh", "s"]);
        assert_eq!(lex.get(1).unwrap().pronunciation(), ["n", "ow"]);
        assert!(lex.get(2).unwrap().pronunciation().is_empty());
    }
}
