use approx::assert_abs_diff_eq;
use gradcore::io::{load_module, save_module};
use gradcore::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn line_dataset() -> TensorDataset {
    // y = 3x + 1
    let xs = [-1.0, -0.5, 0.0, 0.5, 1.0];
    let inputs = xs.iter().map(|&x| RawTensor::scalar(x, false)).collect();
    let targets = xs
        .iter()
        .map(|&x| RawTensor::scalar(3.0 * x + 1.0, false))
        .collect();
    TensorDataset::new(inputs, targets).unwrap()
}

fn line_config(seed: u64) -> TrainConfig {
    TrainConfig::from_yaml_str(&format!(
        "epochs: 200\nbatch_size: 2\nlearning_rate: 0.1\nmomentum: 0.5\nshuffle: true\nseed: {seed}\n"
    ))
    .unwrap()
}

#[test]
fn test_affine_fits_line() {
    let model = Affine::from_values(&[0.0], &[0.0]).unwrap();
    let mut trainer = Trainer::from_config(model, line_config(3)).unwrap();
    let history = trainer.fit(line_dataset()).unwrap();

    assert_eq!(history.len(), 200);
    assert!(history[199] < history[0]);
    assert!(history[199] < 1e-8);

    let model = trainer.into_model();
    assert_abs_diff_eq!(model.weight.item(), 3.0, epsilon = 1e-4);
    assert_abs_diff_eq!(model.bias.item(), 1.0, epsilon = 1e-4);
}

#[test]
fn test_same_seed_same_history() {
    let run = |seed| {
        let model = Affine::from_values(&[0.0], &[0.0]).unwrap();
        let mut trainer = Trainer::from_config(model, line_config(seed)).unwrap();
        trainer.fit(line_dataset()).unwrap()
    };
    assert_eq!(run(9), run(9));
}

#[test]
fn test_manual_loop_matches_trainer_step() {
    // one explicit zero_grad -> forward -> loss -> backward -> step cycle
    let model = Affine::from_values(&[0.5], &[0.0]).unwrap();
    let mut optimizer = SGD::new(model.parameters(), 0.1, 0.0, 0.0);
    let x = RawTensor::scalar(1.0, false);
    let y = RawTensor::scalar(2.0, false);

    optimizer.zero_grad();
    let loss = mean_squared_error(&model.forward(&x).unwrap(), &y).unwrap();
    assert_eq!(loss.item(), 2.25);
    run_backward(&loss).unwrap();
    assert_eq!(model.weight.grad(), Some(vec![-3.0]));
    assert_eq!(model.bias.grad(), Some(vec![-3.0]));
    optimizer.step();

    assert_abs_diff_eq!(model.weight.item(), 0.8, epsilon = 1e-12);
    assert_abs_diff_eq!(model.bias.item(), 0.3, epsilon = 1e-12);
}

/// Returns a learnable probability table regardless of the input.
struct ProbabilityTable {
    probs: Tensor,
}

impl Module for ProbabilityTable {
    fn forward(&self, _x: &Tensor) -> Result<Tensor> {
        Ok(self.probs.clone())
    }

    fn parameters(&self) -> Vec<Tensor> {
        vec![self.probs.clone()]
    }
}

#[test]
fn test_cross_entropy_training_raises_selected_probability() {
    let model = ProbabilityTable {
        probs: from_flat(vec![0.5, 0.5], &[1, 2], true).unwrap(),
    };
    let config = TrainConfig {
        epochs: 10,
        loss: LossKind::CrossEntropy,
        ..TrainConfig::default()
    };
    let dataset = TensorDataset::new(
        vec![RawTensor::scalar(0.0, false)],
        vec![RawTensor::scalar(0.0, false)],
    )
    .unwrap();

    let mut trainer = Trainer::from_config(model, config).unwrap();
    let history = trainer.fit(dataset).unwrap();
    assert!(history.windows(2).all(|w| w[1] < w[0]));

    let probs = trainer.model().probs.values();
    assert!(probs[0] > 0.5);
    assert_eq!(probs[1], 0.5);
}

#[test]
fn test_trained_model_survives_save_and_load() {
    let mut rng = StdRng::seed_from_u64(42);
    let model = Sequential::new(vec![
        Box::new(Affine::new(1, &mut rng)),
        Box::new(ReLU),
        Box::new(Affine::new(1, &mut rng)),
    ]);
    let config = TrainConfig {
        epochs: 5,
        ..TrainConfig::default()
    };
    let mut trainer = Trainer::from_config(model, config).unwrap();
    trainer.fit(line_dataset()).unwrap();
    let trained = trainer.into_model();

    let path = std::env::temp_dir().join("gradcore_training_test.bin");
    save_module(&trained, &path).unwrap();

    let mut other_rng = StdRng::seed_from_u64(7);
    let restored = Sequential::new(vec![
        Box::new(Affine::new(1, &mut other_rng)),
        Box::new(ReLU),
        Box::new(Affine::new(1, &mut other_rng)),
    ]);
    load_module(&restored, &path).unwrap();
    let _ = std::fs::remove_file(&path);

    let x = RawTensor::scalar(0.25, false);
    assert_eq!(
        trained.forward(&x).unwrap().values(),
        restored.forward(&x).unwrap().values()
    );
}
