use crate::error::Result;
use crate::nn::Module;
use crate::tensor::{RawTensor, Tensor};
use bincode::{Decode, Encode};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub mod config;

pub type StateDict = BTreeMap<String, TensorData>;

// Serializable representation of tensor data
#[derive(Debug, Encode, Decode, Clone, PartialEq)]
pub struct TensorData {
    pub data: Vec<f64>,
    pub shape: Vec<usize>,
}

/// Summary of differences between two state dicts.
///
/// `expected` is usually taken from `model.state_dict()`, and `loaded` is
/// what was deserialized or passed in.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StateDictDiff {
    /// Keys that exist in `expected` but are missing from `loaded`.
    pub missing_keys: Vec<String>,
    /// Keys that exist in `loaded` but not in `expected`.
    pub unexpected_keys: Vec<String>,
    /// Keys present in both with differing shapes:
    /// `(key, expected_shape, loaded_shape)`.
    pub shape_mismatches: Vec<(String, Vec<usize>, Vec<usize>)>,
    /// Loaded entries whose data length disagrees with their own shape:
    /// `(key, shape, data_len)`.
    pub corrupt_entries: Vec<(String, Vec<usize>, usize)>,
}

impl StateDictDiff {
    pub fn is_empty(&self) -> bool {
        self.missing_keys.is_empty()
            && self.unexpected_keys.is_empty()
            && self.shape_mismatches.is_empty()
            && self.corrupt_entries.is_empty()
    }
}

impl TensorData {
    pub fn from_tensor(t: &Tensor) -> Self {
        let borrowed = t.borrow();
        TensorData {
            data: borrowed.data.clone(),
            shape: borrowed.shape().to_vec(),
        }
    }

    pub fn to_tensor(&self, requires_grad: bool) -> Result<Tensor> {
        RawTensor::from_flat(self.data.clone(), &self.shape, requires_grad)
    }
}

/// Compute a diff between an "expected" and a "loaded" state dict.
///
/// Purely informational: no tensor is touched.
pub fn diff_state_dict(expected: &StateDict, loaded: &StateDict) -> StateDictDiff {
    let mut diff = StateDictDiff::default();

    for (key, expected_td) in expected {
        match loaded.get(key) {
            None => diff.missing_keys.push(key.clone()),
            Some(actual_td) if expected_td.shape != actual_td.shape => {
                diff.shape_mismatches.push((
                    key.clone(),
                    expected_td.shape.clone(),
                    actual_td.shape.clone(),
                ));
            }
            Some(_) => {}
        }
    }

    for (key, loaded_td) in loaded {
        if !expected.contains_key(key) {
            diff.unexpected_keys.push(key.clone());
        }
        if RawTensor::checked_size(&loaded_td.shape) != Some(loaded_td.data.len()) {
            diff.corrupt_entries.push((
                key.clone(),
                loaded_td.shape.clone(),
                loaded_td.data.len(),
            ));
        }
    }

    diff
}

pub fn save_state_dict<P: AsRef<Path>>(state: &StateDict, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    let written = bincode::encode_into_std_write(state, &mut writer, bincode::config::standard())?;
    tracing::debug!(
        path = %path.display(),
        tensors = state.len(),
        bytes = written,
        "saved state dict"
    );
    Ok(())
}

pub fn load_state_dict<P: AsRef<Path>>(path: P) -> Result<StateDict> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let state: StateDict =
        bincode::decode_from_std_read(&mut reader, bincode::config::standard())?;
    tracing::debug!(path = %path.display(), tensors = state.len(), "loaded state dict");
    Ok(state)
}

/// Save the parameters of `module` to `path`.
pub fn save_module<M: Module + ?Sized, P: AsRef<Path>>(module: &M, path: P) -> Result<()> {
    save_state_dict(&module.state_dict(), path)
}

/// Load parameters saved by [`save_module`] into `module`.
pub fn load_module<M: Module + ?Sized, P: AsRef<Path>>(module: &M, path: P) -> Result<()> {
    let state = load_state_dict(path)?;
    module.load_state_dict(&state)
}
