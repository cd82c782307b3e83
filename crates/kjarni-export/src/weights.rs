//! Memory-mapped SafeTensors checkpoint index.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use memmap2::Mmap;
use ndarray::{ArrayD, IxDyn};
use safetensors::{Dtype, SafeTensors};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    pub shape: Vec<usize>,
    pub dtype: Dtype,
    shard: usize,
}

#[derive(Debug)]
struct Shard {
    path: PathBuf,
    mmap: Mmap,
}

/// Tensor names, shapes and dtypes of a checkpoint, backed by mmap'd shards.
///
/// Accepts a `.safetensors` file, or a directory containing
/// `model.safetensors` or `model.safetensors.index.json` plus its shards.
#[derive(Debug)]
pub struct ModelWeights {
    shards: Vec<Shard>,
    tensors: HashMap<String, TensorInfo>,
}

impl ModelWeights {
    pub fn new(path: &Path) -> Result<Self> {
        if path.is_file() {
            return Self::from_files(&[path.to_path_buf()]);
        }
        if !path.is_dir() {
            return Err(anyhow!("path {:?} is neither a file nor a directory", path));
        }

        let index_file = path.join("model.safetensors.index.json");
        if index_file.exists() {
            let files = Self::shard_files(path, &index_file)?;
            log::info!("loading sharded checkpoint: {} shards", files.len());
            Self::from_files(&files)
        } else {
            Self::from_files(&[path.join("model.safetensors")])
        }
    }

    fn shard_files(dir: &Path, index_file: &Path) -> Result<Vec<PathBuf>> {
        let content = fs::read_to_string(index_file)
            .with_context(|| format!("failed to read index file: {:?}", index_file))?;
        let index: serde_json::Value =
            serde_json::from_str(&content).context("failed to parse index.json")?;

        let weight_map = index["weight_map"]
            .as_object()
            .ok_or_else(|| anyhow!("invalid index.json: missing 'weight_map' object"))?;

        let mut files: Vec<&str> = weight_map.values().filter_map(|v| v.as_str()).collect();
        files.sort_unstable();
        files.dedup();

        Ok(files.into_iter().map(|f| dir.join(f)).collect())
    }

    fn from_files(files: &[PathBuf]) -> Result<Self> {
        let mut shards = Vec::with_capacity(files.len());
        let mut tensors = HashMap::new();

        for (idx, path) in files.iter().enumerate() {
            let file = File::open(path).with_context(|| format!("failed to open {:?}", path))?;
            // SAFETY: the checkpoint is treated as read-only for the lifetime of the map.
            let mmap = unsafe { Mmap::map(&file) }
                .with_context(|| format!("failed to mmap {:?}", path))?;

            let parsed = SafeTensors::deserialize(&mmap)
                .with_context(|| format!("failed to parse safetensors: {:?}", path))?;
            for (name, view) in parsed.tensors() {
                tensors.insert(
                    name,
                    TensorInfo {
                        shape: view.shape().to_vec(),
                        dtype: view.dtype(),
                        shard: idx,
                    },
                );
            }

            log::debug!("indexed shard {}/{}: {:?}", idx + 1, files.len(), path);
            shards.push(Shard {
                path: path.clone(),
                mmap,
            });
        }

        log::info!("indexed {} tensors in {} shard(s)", tensors.len(), shards.len());
        Ok(Self { shards, tensors })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    pub fn info(&self, name: &str) -> Option<&TensorInfo> {
        self.tensors.get(name)
    }

    pub fn tensor_count(&self) -> usize {
        self.tensors.len()
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Copies an F32 tensor out of its shard.
    pub fn get_f32(&self, name: &str) -> Result<ArrayD<f32>> {
        let info = self
            .info(name)
            .ok_or_else(|| anyhow!("tensor '{}' not found in model", name))?;
        if info.dtype != Dtype::F32 {
            return Err(anyhow!("tensor '{}' is {:?}, expected F32", name, info.dtype));
        }

        let shard = &self.shards[info.shard];
        let parsed = SafeTensors::deserialize(&shard.mmap)
            .with_context(|| format!("failed to parse safetensors: {:?}", shard.path))?;
        let view = parsed
            .tensor(name)
            .with_context(|| format!("failed to read tensor '{}'", name))?;

        let values: Vec<f32> = view
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(ArrayD::from_shape_vec(IxDyn(&info.shape), values)?)
    }
}
