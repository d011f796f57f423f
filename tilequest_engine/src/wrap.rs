//! Line wrapping for popup text.
//!
//! Popups are sized in characters, so wrapping works in columns. Words that
//! do not fit on a line of their own are broken across lines without adding
//! hyphens, which keeps every original character in order.

use textwrap::{Options, WordSplitter, WrapAlgorithm};

/// Wrap `text` into lines of at most `limit` columns.
///
/// Lines are filled greedily. A `limit` of zero is treated as one.
pub fn word_wrap(text: &str, limit: usize) -> Vec<String> {
    let options = Options::new(limit.max(1))
        .break_words(true)
        .word_splitter(WordSplitter::NoHyphenation)
        .wrap_algorithm(WrapAlgorithm::FirstFit);
    textwrap::wrap(text, options)
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

/// Split lines into pages of at most `page_height` lines each.
pub fn paginate(lines: &[String], page_height: usize) -> Vec<Vec<String>> {
    lines
        .chunks(page_height.max(1))
        .map(<[String]>::to_vec)
        .collect()
}
