// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Two subcommands: `train` and `evaluate`.
//
// clap's derive macros generate --help text, error messages for
// missing args, and string → number conversion.

use clap::{Args, Subcommand, ValueEnum};
use crate::application::train_use_case::TrainConfig;
use crate::infra::checkpoint::RetentionPolicy;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train (or resume training) the translation model
    Train(TrainArgs),

    /// Score the saved snapshot on a corpus split
    Evaluate(EvaluateArgs),
}

/// How many snapshots survive a run
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Retention {
    /// Overwrite the single snapshot every epoch
    Latest,
    /// Also keep a numbered snapshot per epoch
    EveryEpoch,
}

impl From<Retention> for RetentionPolicy {
    fn from(r: Retention) -> Self {
        match r {
            Retention::Latest     => RetentionPolicy::Latest,
            Retention::EveryEpoch => RetentionPolicy::EveryEpoch,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory with line-aligned <split>.<lang> files
    #[arg(long, default_value = "data/multi30k")]
    pub corpus_dir: String,

    /// Corpus split to train on (file stem)
    #[arg(long, default_value = "train")]
    pub split: String,

    /// Source language suffix (encoder side)
    #[arg(long, default_value = "de")]
    pub src_lang: String,

    /// Target language suffix (decoder side)
    #[arg(long, default_value = "en")]
    pub tgt_lang: String,

    /// Where snapshots, vocabularies and metrics are written
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Words seen fewer times become <unk>
    #[arg(long, default_value_t = 1)]
    pub min_freq: usize,

    /// Longest allowed id sequence (with <bos>/<eos>); longer pairs are dropped
    #[arg(long, default_value_t = 5000)]
    pub max_seq_len: usize,

    #[arg(long, default_value_t = 200)]
    pub batch_size: usize,

    /// Epochs to run now; a resumed run continues the numbering
    #[arg(long, default_value_t = 300)]
    pub epochs: usize,

    /// SGD learning rate
    #[arg(long, default_value_t = 0.1)]
    pub lr: f64,

    /// SGD momentum
    #[arg(long, default_value_t = 0.99)]
    pub momentum: f64,

    /// Embedding width (d_model in the paper)
    #[arg(long, default_value_t = 512)]
    pub d_model: usize,

    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    /// Per-head query/key width
    #[arg(long, default_value_t = 64)]
    pub d_k: usize,

    /// Per-head value width
    #[arg(long, default_value_t = 64)]
    pub d_v: usize,

    /// Feed-forward inner width
    #[arg(long, default_value_t = 2048)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 6)]
    pub encoder_layers: usize,

    #[arg(long, default_value_t = 6)]
    pub decoder_layers: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Fraction of pairs held out for per-epoch validation
    #[arg(long, default_value_t = 0.0)]
    pub val_fraction: f64,

    /// Seeds dropout, shuffling and the validation split
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Background workers assembling batches
    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    #[arg(long, value_enum, default_value_t = Retention::Latest)]
    pub retention: Retention,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            corpus_dir:     a.corpus_dir,
            split:          a.split,
            src_lang:       a.src_lang,
            tgt_lang:       a.tgt_lang,
            checkpoint_dir: a.checkpoint_dir,
            min_freq:       a.min_freq,
            max_seq_len:    a.max_seq_len,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            momentum:       a.momentum,
            d_model:        a.d_model,
            num_heads:      a.num_heads,
            d_k:            a.d_k,
            d_v:            a.d_v,
            d_ff:           a.d_ff,
            encoder_layers: a.encoder_layers,
            decoder_layers: a.decoder_layers,
            dropout:        a.dropout,
            val_fraction:   a.val_fraction,
            seed:           a.seed,
            num_workers:    a.num_workers,
            retention:      a.retention.into(),
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory the `train` run wrote to
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Corpus split to score (same corpus dir and languages as training)
    #[arg(long, default_value = "val")]
    pub split: String,
}
