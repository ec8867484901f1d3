//! Fit `y = 2x - 1` with a single affine unit.
//!
//! ```text
//! RUST_LOG=gradcore=info cargo run --example linear_fit [config.yaml]
//! ```

use gradcore::{Affine, Module, RawTensor, Result, TensorDataset, TensorOps, TrainConfig, Trainer};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => TrainConfig::from_yaml_file(path)?,
        None => TrainConfig::from_yaml_str(include_str!("linear_fit.yaml"))?,
    };

    let mut rng = StdRng::seed_from_u64(config.seed);
    let (inputs, targets): (Vec<_>, Vec<_>) = (0..32)
        .map(|i| {
            let x = i as f64 / 16.0 - 1.0;
            (RawTensor::scalar(x, false), RawTensor::scalar(2.0 * x - 1.0, false))
        })
        .unzip();
    let dataset = TensorDataset::new(inputs, targets)?;

    let model = Affine::new(1, &mut rng);
    tracing::info!(weight = model.weight.item(), bias = model.bias.item(), "initial parameters");

    let mut trainer = Trainer::from_config(model, config)?;
    let history = trainer.fit(dataset)?;

    let model = trainer.into_model();
    let x = RawTensor::scalar(0.5, false);
    tracing::info!(
        final_loss = history.last().copied().unwrap_or(f64::NAN),
        weight = model.weight.item(),
        bias = model.bias.item(),
        prediction_at_half = model.forward(&x)?.item(),
        "training finished"
    );
    Ok(())
}
