// ============================================================
// Layer 4 — Sentence Preprocessor
// ============================================================
// Normalises one raw corpus line before tokenisation.
//
// Corpus files scraped from the web carry invisible junk that
// would otherwise become vocabulary entries of its own:
//   - Non-breaking / zero-width spaces, byte order marks
//   - Tabs and stray control characters
//   - Runs of spaces, leading/trailing whitespace
//
// Every sentence is a single line, so all whitespace collapses to
// one ASCII space. Case and punctuation are left untouched: the
// vocabulary keeps them as distinct tokens.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    pub fn clean(&self, text: &str) -> String {
        let mapped: String = text
            .chars()
            .map(|c| match c {
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_control() => ' ',
                c => c,
            })
            .collect();

        mapped.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
