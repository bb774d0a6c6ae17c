//! Line, word and character tokens
//!
//! The three granularities the LCS engine works at. A line is its content
//! hash, a word is a hashed run of same-class bytes, a char is a single
//! byte. Word and char positions are byte offsets into the raw
//! (pre-normalization) line so change ranges land on the host's text
//! unmodified.

use crate::config::{CompareOptions, ViewId};
use crate::error::HostError;
use crate::extract::DocCmpInfo;
use crate::hash::{hash_byte, HASH_SEED};
use crate::host::TextProvider;

/// A document line reduced to its original index and normalized content
/// hash. Equality is hash equality.
#[derive(Debug, Clone, Copy)]
pub struct LineKey {
    /// 0-based index in the original document (not compressed).
    pub line: usize,
    pub hash: u64,
}

impl PartialEq for LineKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for LineKey {}

/// A run of same-class bytes within a line. Equality is hash equality.
#[derive(Debug, Clone, Copy)]
pub struct Word {
    /// Byte offset within the raw line.
    pub pos: usize,
    /// Byte length.
    pub len: usize,
    pub hash: u64,
}

impl PartialEq for Word {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Word {}

/// One byte of a line section. Equality is byte equality; the position is
/// kept only to translate matches back to change ranges.
#[derive(Debug, Clone, Copy)]
pub struct Ch {
    pub byte: u8,
    /// Byte offset relative to the fetched section start.
    pub pos: usize,
}

impl PartialEq for Ch {
    fn eq(&self, other: &Self) -> bool {
        self.byte == other.byte
    }
}

impl Eq for Ch {}

/// Word-boundary classification. A word ends wherever the class changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Space,
    AlphaNum,
    Other,
}

pub fn char_class(byte: u8) -> CharClass {
    if byte == b' ' || byte == b'\t' {
        CharClass::Space
    } else if byte.is_ascii_alphanumeric() || byte == b'_' {
        CharClass::AlphaNum
    } else {
        CharClass::Other
    }
}

fn fold_case(line: &mut [u8], options: &CompareOptions) {
    if options.ignore_case {
        line.make_ascii_lowercase();
    }
}

/// Char sequence of the byte range `[start, end)`, honoring the configured
/// normalization. Positions are relative to `start`.
pub fn section_chars(
    provider: &dyn TextProvider,
    view: ViewId,
    start: usize,
    end: usize,
    options: &CompareOptions,
) -> Result<Vec<Ch>, HostError> {
    if end <= start {
        return Ok(Vec::new());
    }

    let mut line = provider.text(view, start, end)?;
    fold_case(&mut line, options);

    let mut chars = Vec::with_capacity(line.len());

    for (i, &byte) in line.iter().enumerate() {
        if !options.ignore_spaces || char_class(byte) != CharClass::Space {
            chars.push(Ch { byte, pos: i });
        }
    }

    Ok(chars)
}

/// Char sequences for `count` consecutive normalized lines of a block,
/// starting at `line_offset` into the document's normalized array.
pub fn block_chars(
    provider: &dyn TextProvider,
    doc: &DocCmpInfo,
    line_offset: usize,
    count: usize,
    options: &CompareOptions,
) -> Result<Vec<Vec<Ch>>, HostError> {
    let mut chars = vec![Vec::new(); count];

    for (line_num, slot) in chars.iter_mut().enumerate() {
        let doc_line = doc.lines[line_num + line_offset].line;
        let start = provider.line_start(doc.view, doc_line)?;
        let end = provider.line_end(doc.view, doc_line)?;

        if end > start {
            *slot = section_chars(provider, doc.view, start, end, options)?;
        }
    }

    Ok(chars)
}

/// Split one document line into words by character-class transitions.
pub fn line_words(
    provider: &dyn TextProvider,
    view: ViewId,
    doc_line: usize,
    options: &CompareOptions,
) -> Result<Vec<Word>, HostError> {
    let start = provider.line_start(view, doc_line)?;
    let end = provider.line_end(view, doc_line)?;

    if end <= start {
        return Ok(Vec::new());
    }

    let mut line = provider.text(view, start, end)?;
    fold_case(&mut line, options);

    let mut words = Vec::new();
    let mut current_class = char_class(line[0]);
    let mut word = Word {
        pos: 0,
        len: 1,
        hash: hash_byte(HASH_SEED, line[0]),
    };

    for (i, &byte) in line.iter().enumerate().skip(1) {
        let class = char_class(byte);

        if class == current_class {
            word.len += 1;
            word.hash = hash_byte(word.hash, byte);
        } else {
            if !options.ignore_spaces || current_class != CharClass::Space {
                words.push(word);
            }

            current_class = class;
            word = Word {
                pos: i,
                len: 1,
                hash: hash_byte(HASH_SEED, byte),
            };
        }
    }

    if !options.ignore_spaces || current_class != CharClass::Space {
        words.push(word);
    }

    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocs;

    fn words_of(line: &str, options: &CompareOptions) -> Vec<Word> {
        let docs = MemoryDocs::from_lines(&[line], &[]);
        line_words(&docs, ViewId::Main, 0, options).unwrap()
    }

    #[test]
    fn words_split_on_class_transitions() {
        let words = words_of("foo_1 = bar(2);", &CompareOptions::default());

        let spans: Vec<(usize, usize)> = words.iter().map(|w| (w.pos, w.len)).collect();
        // foo_1 | space | = | space | bar | ( | 2 | ) | ;
        assert_eq!(
            spans,
            vec![
                (0, 5),
                (5, 1),
                (6, 1),
                (7, 1),
                (8, 3),
                (11, 1),
                (12, 1),
                (13, 1),
                (14, 1)
            ]
        );
    }

    #[test]
    fn consecutive_punctuation_is_one_word() {
        let words = words_of("a+=b", &CompareOptions::default());
        let spans: Vec<(usize, usize)> = words.iter().map(|w| (w.pos, w.len)).collect();
        assert_eq!(spans, vec![(0, 1), (1, 2), (3, 1)]);
    }

    #[test]
    fn ignore_spaces_drops_space_words() {
        let options = CompareOptions::new().with_ignore_spaces(true);
        let words = words_of("a  b\tc", &options);

        let spans: Vec<(usize, usize)> = words.iter().map(|w| (w.pos, w.len)).collect();
        assert_eq!(spans, vec![(0, 1), (3, 1), (5, 1)]);
    }

    #[test]
    fn ignore_case_equates_word_hashes() {
        let plain = CompareOptions::default();
        let folded = CompareOptions::new().with_ignore_case(true);

        assert_ne!(words_of("Foo", &plain)[0].hash, words_of("foo", &plain)[0].hash);
        assert_eq!(
            words_of("Foo", &folded)[0].hash,
            words_of("foo", &folded)[0].hash
        );
    }

    #[test]
    fn empty_line_yields_no_words() {
        assert!(words_of("", &CompareOptions::default()).is_empty());
    }

    #[test]
    fn section_chars_keep_raw_positions_under_space_ignore() {
        let docs = MemoryDocs::from_lines(&["a b\tc"], &[]);
        let options = CompareOptions::new().with_ignore_spaces(true);

        let chars = section_chars(&docs, ViewId::Main, 0, 5, &options).unwrap();

        let got: Vec<(u8, usize)> = chars.iter().map(|c| (c.byte, c.pos)).collect();
        assert_eq!(got, vec![(b'a', 0), (b'b', 2), (b'c', 4)]);
    }

    #[test]
    fn char_equality_ignores_position() {
        let a = Ch { byte: b'x', pos: 0 };
        let b = Ch { byte: b'x', pos: 9 };
        let c = Ch { byte: b'y', pos: 0 };

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
