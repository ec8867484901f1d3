use crate::error::Result;
use crate::nn::Module;
use crate::tensor::Tensor;

pub struct Sequential {
    layers: Vec<Box<dyn Module>>,
}

impl Module for Sequential {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let mut current = x.clone();
        for layer in &self.layers {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }

    fn parameters(&self) -> Vec<Tensor> {
        self.layers.iter().flat_map(|l| l.parameters()).collect()
    }

    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        self.layers
            .iter()
            .enumerate()
            .flat_map(|(i, layer)| {
                layer
                    .named_parameters()
                    .into_iter()
                    .map(move |(name, p)| (format!("{i}.{name}"), p))
            })
            .collect()
    }
}

impl Sequential {
    pub fn new(layers: Vec<Box<dyn Module>>) -> Self {
        Sequential { layers }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{Affine, ReLU};
    use crate::{RawTensor, TensorOps};

    #[test]
    fn chains_layers_and_names_parameters() {
        let model = Sequential::new(vec![
            Box::new(Affine::from_values(&[1.0, 1.0], &[-3.0, 1.0]).unwrap()),
            Box::new(ReLU),
            Box::new(Affine::from_values(&[2.0, 2.0], &[0.0, 0.0]).unwrap()),
        ]);
        assert_eq!(model.len(), 3);
        assert_eq!(model.parameters().len(), 4);

        let names: Vec<String> = model.named_parameters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["0.weight", "0.bias", "2.weight", "2.bias"]);

        let x = RawTensor::from_flat(vec![1.0, 1.0], &[2], false).unwrap();
        let y = model.forward(&x).unwrap();
        assert_eq!(y.values(), vec![0.0, 4.0]);

        y.sum().unwrap().backward().unwrap();
        let params = model.parameters();
        // first unit is clamped by the ReLU, so nothing reaches layer 0 there
        assert_eq!(params[0].grad(), Some(vec![0.0, 2.0]));
        assert_eq!(params[2].grad(), Some(vec![0.0, 2.0]));
    }
}
