// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
//
//   1. `train`    — build vocabularies, train, snapshot each epoch
//   2. `evaluate` — score the snapshot on a corpus split

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "seq2seq-trainer",
    version = "0.1.0",
    about = "Train an encoder-decoder transformer on a parallel corpus."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on corpus in: {}", args.corpus_dir);
    TrainUseCase::new(args.into()).execute()?;

    println!("Training complete. Checkpoint saved.");
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let summary = EvaluateUseCase::new(args.checkpoint_dir, args.split.clone()).execute()?;
    println!(
        "Split '{}': loss={:.4} | token_acc={:.1}% | {} tokens in {} batches",
        args.split,
        summary.loss,
        summary.token_accuracy * 100.0,
        summary.tokens,
        summary.batches,
    );
    Ok(())
}
