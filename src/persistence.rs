//! JSON snapshots of network parameters.
//!
//! Only weights and biases are stored; per-pass buffers are rebuilt on load.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::layers::DenseLayer;
use crate::network::Network;

/// Serialised form of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub input_count: usize,
    /// One row of `input_count` weights per neuron.
    pub weights: Vec<Vec<f32>>,
    pub biases: Vec<f32>,
}

/// Serialised form of a whole network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub layers: Vec<LayerSnapshot>,
}

impl From<&DenseLayer> for LayerSnapshot {
    fn from(layer: &DenseLayer) -> Self {
        Self {
            input_count: layer.input_count(),
            weights: layer.weights().to_rows(),
            biases: layer.biases().to_vec(),
        }
    }
}

impl Network {
    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            layers: self.layers().iter().map(LayerSnapshot::from).collect(),
        }
    }

    /// Rebuild a network from a snapshot, validating every layer and the chain.
    pub fn from_snapshot(snapshot: &NetworkSnapshot) -> Result<Self> {
        let layers = snapshot
            .layers
            .iter()
            .map(|l| DenseLayer::with_parameters(l.input_count, &l.weights, &l.biases))
            .collect::<Result<Vec<_>>>()?;
        Network::from_layers(layers)
    }

    /// Write the parameters to `path` as pretty-printed JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        fs::write(path.as_ref(), json)?;
        info!(path = %path.as_ref().display(), "model saved");
        Ok(())
    }

    /// Load parameters written by [`Network::save_json`].
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let snapshot: NetworkSnapshot = serde_json::from_str(&contents)?;
        Self::from_snapshot(&snapshot)
    }
}
