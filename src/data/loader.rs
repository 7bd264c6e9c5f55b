// ============================================================
// Layer 4 — Parallel Corpus Loader
// ============================================================
// Reads a line-aligned parallel corpus in the Multi30k layout:
//
//   data/multi30k/
//     train.de   ← one German sentence per line
//     train.en   ← its English translation on the same line number
//     val.de
//     val.en
//
// Line i of the source file pairs with line i of the target file,
// so the two files MUST have the same number of lines; anything
// else means the corpus is misaligned and loading fails.
//
// Each line is normalised by the Preprocessor. Pairs where either
// side ends up empty are skipped.

use anyhow::{bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::data::preprocessor::Preprocessor;
use crate::domain::{sentence_pair::SentencePair, traits::PairSource};

pub struct ParallelCorpusLoader {
    dir:          PathBuf,
    split:        String,
    src_lang:     String,
    tgt_lang:     String,
    preprocessor: Preprocessor,
}

impl ParallelCorpusLoader {
    pub fn new(
        dir:      impl Into<PathBuf>,
        split:    impl Into<String>,
        src_lang: impl Into<String>,
        tgt_lang: impl Into<String>,
    ) -> Self {
        Self {
            dir:          dir.into(),
            split:        split.into(),
            src_lang:     src_lang.into(),
            tgt_lang:     tgt_lang.into(),
            preprocessor: Preprocessor::new(),
        }
    }

    fn side_path(&self, lang: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.split, lang))
    }
}

impl PairSource for ParallelCorpusLoader {
    fn load_all(&self) -> Result<Vec<SentencePair>> {
        if !self.dir.exists() {
            tracing::warn!(
                "Corpus directory '{}' does not exist — returning empty corpus",
                self.dir.display()
            );
            return Ok(Vec::new());
        }

        let src_lines = read_lines(&self.side_path(&self.src_lang))?;
        let tgt_lines = read_lines(&self.side_path(&self.tgt_lang))?;

        if src_lines.len() != tgt_lines.len() {
            bail!(
                "Misaligned corpus: {} has {} lines but {} has {}",
                self.side_path(&self.src_lang).display(),
                src_lines.len(),
                self.side_path(&self.tgt_lang).display(),
                tgt_lines.len(),
            );
        }

        let total = src_lines.len();
        let pairs: Vec<SentencePair> = src_lines
            .iter()
            .zip(&tgt_lines)
            .map(|(s, t)| SentencePair::new(self.preprocessor.clean(s), self.preprocessor.clean(t)))
            .filter(|p| !p.is_blank())
            .collect();

        if pairs.len() < total {
            tracing::debug!("Skipped {} blank pairs", total - pairs.len());
        }
        tracing::info!(
            "Loaded {} '{}' pairs ({} → {})",
            pairs.len(),
            self.split,
            self.src_lang,
            self.tgt_lang
        );
        Ok(pairs)
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read corpus file '{}'", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus_dir(name: &str, de: &str, en: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("seq2seq_corpus_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("train.de"), de).unwrap();
        fs::write(dir.join("train.en"), en).unwrap();
        dir
    }

    #[test]
    fn test_lines_pair_up_in_order() {
        let dir = corpus_dir("order", "Ein Hund.\nZwei  Katzen.\n", "A dog.\nTwo cats.\n");
        let pairs = ParallelCorpusLoader::new(&dir, "train", "de", "en").load_all().unwrap();
        assert_eq!(
            pairs,
            vec![
                SentencePair::new("Ein Hund.", "A dog."),
                SentencePair::new("Zwei Katzen.", "Two cats."),
            ]
        );
    }

    #[test]
    fn test_blank_pairs_are_skipped() {
        let dir = corpus_dir("blank", "Ein Hund.\n \nHallo\n", "A dog.\nNothing\n\n");
        let pairs = ParallelCorpusLoader::new(&dir, "train", "de", "en").load_all().unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_misaligned_files_fail() {
        let dir = corpus_dir("misaligned", "a\nb\nc\n", "a\nb\n");
        let err = ParallelCorpusLoader::new(&dir, "train", "de", "en").load_all();
        assert!(err.is_err());
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let pairs = ParallelCorpusLoader::new("/nonexistent/seq2seq", "train", "de", "en")
            .load_all()
            .unwrap();
        assert!(pairs.is_empty());
    }
}
