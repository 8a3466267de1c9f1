//! Single-file weight checkpoint holding the copied encoder and the decoder.
//!
//! The file is a bincode snapshot of named layers. Encoder layers are stored
//! under their backbone name plus `_encode`; decoder layers under their own
//! names. The topology is stored alongside so mismatched widths are rejected
//! before any layer is rebuilt.
//!
//! Obtaining pretrained weights (download, cache) is delegated to a
//! [`WeightSource`]; the engine only asks it to turn a name into a path.
use crate::decoder::Decoder;
use crate::encoder::BackboneWeights;
use crate::error::{Result, TransferError};
use crate::image::io::ensure_parent_dir;
use crate::nn::{Activation, Conv2d};
use crate::topology::{Topology, ENCODE_SUFFIX};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Sentinel accepted by `load_weights` to request the published weights.
pub const PRETRAINED: &str = "pretrained";

/// Default checkpoint location, relative to the working directory.
pub const DEFAULT_CHECKPOINT: &str = "checkpoints/wct2.bin";

const FORMAT_VERSION: u32 = 1;

/// Resolves a weight name (e.g. [`PRETRAINED`]) to a local checkpoint file.
pub trait WeightSource: Send + Sync {
    fn resolve(&self, name: &str) -> Result<PathBuf>;
}

/// Looks weights up in a local cache directory as `<dir>/<name>.bin`.
#[derive(Clone, Debug)]
pub struct CacheDirSource {
    pub dir: PathBuf,
}

impl CacheDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl WeightSource for CacheDirSource {
    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let path = self.dir.join(format!("{name}.bin"));
        if path.is_file() {
            Ok(path)
        } else {
            Err(TransferError::checkpoint(format!(
                "weights '{name}' not found in cache {}",
                self.dir.display()
            )))
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredLayer {
    name: String,
    in_channels: usize,
    out_channels: usize,
    activation: Activation,
    kernel: Vec<f32>,
    bias: Vec<f32>,
}

impl StoredLayer {
    fn capture(layer: &Conv2d, name: String) -> Self {
        Self {
            name,
            in_channels: layer.in_channels(),
            out_channels: layer.out_channels(),
            activation: layer.activation(),
            kernel: layer.kernel().to_vec(),
            bias: layer.bias().to_vec(),
        }
    }

    fn into_layer(self, name: &str) -> Result<Conv2d> {
        Conv2d::from_parts(
            name,
            self.in_channels,
            self.out_channels,
            self.activation,
            self.kernel,
            self.bias,
        )
    }
}

/// In-memory form of a checkpoint file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    version: u32,
    topology: Topology,
    encoder: Vec<StoredLayer>,
    decoder: Vec<StoredLayer>,
}

impl Checkpoint {
    pub fn capture(encoder: &BackboneWeights, decoder: &Decoder) -> Self {
        Self {
            version: FORMAT_VERSION,
            topology: encoder.topology(),
            encoder: encoder
                .layers()
                .iter()
                .map(|l| StoredLayer::capture(l, format!("{}{ENCODE_SUFFIX}", l.name())))
                .collect(),
            decoder: decoder
                .layers()
                .iter()
                .map(|l| StoredLayer::capture(l, l.name().to_string()))
                .collect(),
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Names of all stored layers, encoder first.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.encoder
            .iter()
            .chain(&self.decoder)
            .map(|l| l.name.as_str())
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)
            .map_err(|e| TransferError::checkpoint(format!("{}: {e}", path.display())))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let checkpoint: Checkpoint = bincode::deserialize_from(reader)
            .map_err(|e| TransferError::checkpoint(format!("{}: {e}", path.display())))?;
        if checkpoint.version != FORMAT_VERSION {
            return Err(TransferError::checkpoint(format!(
                "{}: unsupported format version {}",
                path.display(),
                checkpoint.version
            )));
        }
        Ok(checkpoint)
    }

    /// Rebuild and validate both weight groups.
    pub fn into_weights(self) -> Result<(BackboneWeights, Decoder)> {
        let topology = self.topology;
        let encoder = self
            .encoder
            .into_iter()
            .map(|stored| {
                let name = stored
                    .name
                    .strip_suffix(ENCODE_SUFFIX)
                    .ok_or_else(|| {
                        TransferError::checkpoint(format!(
                            "encoder layer {} lacks the {ENCODE_SUFFIX} suffix",
                            stored.name
                        ))
                    })?
                    .to_string();
                stored.into_layer(&name)
            })
            .collect::<Result<Vec<_>>>()?;
        let decoder = self
            .decoder
            .into_iter()
            .map(|stored| {
                let name = stored.name.clone();
                stored.into_layer(&name)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((
            BackboneWeights::from_layers(topology, encoder)?,
            Decoder::from_layers(topology, decoder)?,
        ))
    }
}
