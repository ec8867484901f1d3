use crate::data::{DataLoader, Dataset};
use crate::error::{GradError, Result};
use crate::io::config::{LossKind, TrainConfig};
use crate::nn::Module;
use crate::nn::optim::{Optimizer, SGD};
use crate::tensor::{RawTensor, Tensor, TensorOps};
use crate::utils::ProgressBar;

/// Drives the zero-grad → forward → loss → backward → step cycle.
///
/// A fresh graph is built for every batch and dropped once the step is done;
/// only the parameters' values and gradient buffers outlive it.
pub struct Trainer<M: Module, O: Optimizer> {
    model: M,
    optimizer: O,
    config: TrainConfig,
}

impl<M: Module> Trainer<M, SGD> {
    /// Build an SGD trainer over all of the model's parameters.
    pub fn from_config(model: M, config: TrainConfig) -> Result<Self> {
        let optimizer = SGD::new(
            model.parameters(),
            config.learning_rate,
            config.momentum,
            config.weight_decay,
        );
        Self::new(model, optimizer, config)
    }
}

impl<M: Module, O: Optimizer> Trainer<M, O> {
    pub fn new(model: M, optimizer: O, config: TrainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Trainer {
            model,
            optimizer,
            config,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    fn loss(&self, prediction: &Tensor, target: &Tensor) -> Result<Tensor> {
        match self.config.loss {
            LossKind::Mse => RawTensor::mse_loss(prediction, target),
            LossKind::CrossEntropy => RawTensor::cross_entropy_loss(prediction, target),
        }
    }

    /// Mean of the per-sample losses of one batch, as a graph node.
    fn batch_loss(&self, inputs: &[Tensor], targets: &[Tensor]) -> Result<Tensor> {
        if inputs.is_empty() || inputs.len() != targets.len() {
            return Err(GradError::Data(format!(
                "batch has {} inputs and {} targets",
                inputs.len(),
                targets.len()
            )));
        }

        let mut total: Option<Tensor> = None;
        for (input, target) in inputs.iter().zip(targets) {
            let prediction = self.model.forward(input)?;
            let loss = self.loss(&prediction, target)?;
            total = Some(match total {
                None => loss,
                Some(acc) => acc.add(&loss)?,
            });
        }
        let total = total.ok_or_else(|| GradError::Data("empty batch".to_string()))?;
        total.div(&RawTensor::scalar(inputs.len() as f64, false))
    }

    /// Run one optimization step on a batch and return its mean loss.
    pub fn train_batch(&mut self, inputs: &[Tensor], targets: &[Tensor]) -> Result<f64> {
        self.optimizer.zero_grad();
        let loss = self.batch_loss(inputs, targets)?;
        loss.backward()?;
        self.optimizer.step();

        let value = loss.item();
        tracing::debug!(samples = inputs.len(), loss = value, "batch step");
        Ok(value)
    }

    /// One pass over the loader; returns the sample-weighted mean loss.
    pub fn train_epoch<D: Dataset>(&mut self, loader: &mut DataLoader<D>) -> Result<f64> {
        loader.reset();
        let mut weighted = 0.0;
        let mut seen = 0;
        while let Some((inputs, targets)) = loader.next_batch()? {
            weighted += self.train_batch(&inputs, &targets)? * inputs.len() as f64;
            seen += inputs.len();
        }
        if seen == 0 {
            return Err(GradError::Data("cannot train on an empty dataset".to_string()));
        }
        Ok(weighted / seen as f64)
    }

    /// Train for `config.epochs` epochs and return the loss of each epoch.
    pub fn fit<D: Dataset>(&mut self, dataset: D) -> Result<Vec<f64>> {
        let mut loader = DataLoader::with_seed(
            dataset,
            self.config.batch_size,
            self.config.shuffle,
            self.config.seed,
        )?;
        let mut progress = self
            .config
            .progress
            .then(|| ProgressBar::new(self.config.epochs, "Training"));

        let mut history = Vec::with_capacity(self.config.epochs);
        for epoch in 0..self.config.epochs {
            let loss = self.train_epoch(&mut loader)?;
            history.push(loss);

            if let Some(bar) = progress.as_mut() {
                bar.set_message(format!("loss={loss:.6}"));
                bar.update(epoch + 1);
            }
            if self.config.log_every > 0 && (epoch + 1) % self.config.log_every == 0 {
                tracing::info!(
                    epoch = epoch + 1,
                    loss,
                    lr = self.optimizer.learning_rate(),
                    "epoch complete"
                );
            }
        }
        Ok(history)
    }

    /// Mean per-sample loss over `dataset` without touching gradients.
    pub fn evaluate<D: Dataset>(&self, dataset: &D) -> Result<f64> {
        if dataset.is_empty() {
            return Err(GradError::Data("cannot evaluate an empty dataset".to_string()));
        }
        let mut total = 0.0;
        for index in 0..dataset.len() {
            let (input, target) = dataset.get_item(index)?;
            let prediction = self.model.forward(&input)?;
            total += self.loss(&prediction, &target)?.item();
        }
        Ok(total / dataset.len() as f64)
    }
}
