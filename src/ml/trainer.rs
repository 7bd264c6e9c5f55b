// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop with Burn's DataLoader and SGD + momentum.
//
// Per batch (teacher forcing):
//   decoder input = target[:, :-1]
//   labels        = target[:, 1:]
//   loss          = CE(logits, labels), pad labels ignored
//   backward → SGD step
//
// Per epoch:
//   optional validation on model.valid() (inner backend, Mode::Eval)
//   → metrics.csv row → snapshot overwrite
//
// Backends:
//   training   Autodiff<Wgpu>
//   validation Wgpu (the autodiff backend's InnerBackend)
//
// Reference: Burn Book §5, Vaswani et al. (2017) §5

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{momentum::MomentumConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::TranslationBatcher, dataset::TranslationDataset};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    evaluator::evaluate,
    mode::Mode,
    model::TranslationTransformerConfig,
};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

pub fn run_training(
    cfg:           &TrainConfig,
    model_cfg:     &TranslationTransformerConfig,
    train_dataset: TranslationDataset,
    val_dataset:   Option<TranslationDataset>,
    ckpt_manager:  &CheckpointManager,
) -> Result<Vec<EpochMetrics>> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<MyBackend>(cfg, model_cfg, train_dataset, val_dataset, ckpt_manager, device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    model_cfg:     &TranslationTransformerConfig,
    train_dataset: TranslationDataset,
    val_dataset:   Option<TranslationDataset>,
    ckpt_manager:  &CheckpointManager,
    device:        B::Device,
) -> Result<Vec<EpochMetrics>> {
    B::seed(&device, cfg.seed);

    // ── Model: resume from the fixed snapshot or start fresh ──────────────────
    let (mut model, start_epoch) = ckpt_manager.load_or_create::<B>(model_cfg, &device);
    let last_epoch = start_epoch + cfg.epochs - 1;
    tracing::info!(
        "Model ready: {}+{} blocks, d_model={}, heads={}",
        model_cfg.encoder_layers,
        model_cfg.decoder_layers,
        model_cfg.d_model,
        model_cfg.num_heads,
    );

    // ── SGD with momentum (no dampening, as in torch.optim.SGD) ──────────────
    let optim_cfg = SgdConfig::new().with_momentum(Some(
        MomentumConfig::new()
            .with_momentum(cfg.momentum)
            .with_dampening(0.0),
    ));
    let mut optim = optim_cfg.init();

    let batcher = TranslationBatcher::new(model_cfg.pad_id);

    let train_loader = DataLoaderBuilder::<B, _, _>::new(batcher.clone())
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.num_workers.max(1))
        .set_device(device.clone())
        .build(train_dataset);

    let val_loader = val_dataset.map(|ds| {
        DataLoaderBuilder::<B::InnerBackend, _, _>::new(batcher.clone())
            .batch_size(cfg.batch_size)
            .num_workers(cfg.num_workers.max(1))
            .set_device(device.clone())
            .build(ds)
    });

    let metrics = MetricsLogger::new(cfg.checkpoint_dir.clone())?;
    tracing::info!("Logging epoch metrics to '{}'", metrics.csv_path().display());
    let mut history  = Vec::with_capacity(cfg.epochs);
    let mut best_val = f64::INFINITY;

    for epoch in start_epoch..=last_epoch {
        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in train_loader.iter() {
            let out = model.forward_loss(batch.source, batch.target, Mode::Train);

            let loss_val: f64 = out.loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                tracing::warn!("Non-finite loss at epoch {} batch {}", epoch, batches + 1);
            }
            loss_sum += loss_val;
            batches  += 1;
            tracing::debug!("epoch:{} batch:{} loss:{:.4}", epoch, batches, loss_val);

            let grads = out.loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let train_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let (val_loss, val_acc) = match &val_loader {
            Some(loader) => {
                let summary = evaluate(&model.valid(), loader.iter());
                (summary.loss, summary.token_accuracy)
            }
            None => (f64::NAN, f64::NAN),
        };

        let row = EpochMetrics::new(epoch, train_loss, val_loss, val_acc);
        if row.is_improvement(best_val) {
            best_val = val_loss;
            tracing::info!("New best validation loss {:.4}", val_loss);
        }

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_token_acc={:.1}%",
            epoch, last_epoch, train_loss, val_loss, val_acc * 100.0,
        );

        metrics.log(&row)?;
        ckpt_manager.save_model(&model, model_cfg, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
        history.push(row);
    }

    tracing::info!("Training complete!");
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::TranslationItem;
    use crate::infra::checkpoint::{LoadOutcome, RetentionPolicy};

    type TestBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    fn items() -> Vec<TranslationItem> {
        vec![
            TranslationItem { source_ids: vec![2, 4, 5, 3],    target_ids: vec![2, 6, 7, 3] },
            TranslationItem { source_ids: vec![2, 5, 3],       target_ids: vec![2, 7, 3] },
            TranslationItem { source_ids: vec![2, 4, 4, 5, 3], target_ids: vec![2, 6, 6, 7, 8, 3] },
            TranslationItem { source_ids: vec![2, 3],          target_ids: vec![2, 8, 3] },
        ]
    }

    #[test]
    fn test_training_runs_and_snapshots() {
        let dir = std::env::temp_dir().join(format!("seq2seq_train_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let cfg = TrainConfig {
            checkpoint_dir: dir.to_string_lossy().into_owned(),
            batch_size:     2,
            epochs:         2,
            lr:             0.01,
            momentum:       0.9,
            ..TrainConfig::default()
        };
        let model_cfg = TranslationTransformerConfig::new(10, 10)
            .with_d_model(8).with_num_heads(2).with_d_k(4).with_d_v(4).with_d_ff(16)
            .with_encoder_layers(1).with_decoder_layers(1).with_max_seq_len(16);

        let ckpt = CheckpointManager::new(cfg.checkpoint_dir.clone(), RetentionPolicy::Latest);
        let history = train_loop::<TestBackend>(
            &cfg,
            &model_cfg,
            TranslationDataset::from_items(items()),
            Some(TranslationDataset::from_items(items()[..2].to_vec())),
            &ckpt,
            Default::default(),
        )
        .unwrap();

        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|m| m.train_loss.is_finite() && m.val_loss.is_finite()));

        let restored = ckpt.load_model::<burn::backend::NdArray>(&model_cfg, &Default::default());
        assert!(matches!(restored, LoadOutcome::Found(_)));
    }

    #[test]
    fn test_second_run_resumes_epoch_numbering() {
        let dir = std::env::temp_dir().join(format!("seq2seq_resume_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let cfg = TrainConfig {
            checkpoint_dir: dir.to_string_lossy().into_owned(),
            batch_size:     2,
            epochs:         2,
            lr:             0.01,
            momentum:       0.9,
            ..TrainConfig::default()
        };
        let model_cfg = TranslationTransformerConfig::new(10, 10)
            .with_d_model(8).with_num_heads(2).with_d_k(4).with_d_v(4).with_d_ff(16)
            .with_encoder_layers(1).with_decoder_layers(1).with_max_seq_len(16);
        let ckpt = CheckpointManager::new(cfg.checkpoint_dir.clone(), RetentionPolicy::EveryEpoch);

        let run = || {
            train_loop::<TestBackend>(
                &cfg,
                &model_cfg,
                TranslationDataset::from_items(items()),
                None,
                &ckpt,
                Default::default(),
            )
            .unwrap()
        };

        let ext = <burn::record::CompactRecorder as burn::record::FileRecorder<TestBackend>>::file_extension();
        let snapshot = |epoch: usize| dir.join(format!("model_epoch_{epoch}.{ext}"));

        let first = run();
        let first_epoch_1 = std::fs::read(snapshot(1)).unwrap();
        let second = run();

        let epochs: Vec<usize> = first.iter().chain(&second).map(|m| m.epoch).collect();
        assert_eq!(epochs, vec![1, 2, 3, 4]);
        assert_eq!(ckpt.latest_epoch(), Some(4));

        // earlier numbered snapshots are left alone
        assert_eq!(std::fs::read(snapshot(1)).unwrap(), first_epoch_1);
        assert!(snapshot(4).exists());

        let csv = std::fs::read_to_string(dir.join("metrics.csv")).unwrap();
        let logged: Vec<&str> = csv.lines().skip(1).map(|l| l.split(',').next().unwrap()).collect();
        assert_eq!(logged, vec!["1", "2", "3", "4"]);
    }
}
