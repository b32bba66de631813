// Graph - flattened, topologically ordered neuron graph
//
// Neuron `n` owns `internal_links[n] + external_links[n]` consecutive entries
// of `links`: first the indices of the neurons it reads (all smaller than
// `n`), then indices into the network input vector. Its weights are
// `[bias, internal..., external...]`, stored consecutively in neuron order.

use super::precision::Precision;
use crate::error::SetupError;
use crate::input::mask_bit;
use serde::{Deserialize, Serialize};

/// Read-only network topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronGraph {
    /// Links from other neurons, per neuron
    pub internal_links: Vec<u16>,
    /// Links from the network input, per neuron
    pub external_links: Vec<u16>,
    /// Flattened link sources
    pub links: Vec<u16>,
    /// Bit `n` set: neuron `n` uses the sigmoid activation, linear otherwise
    pub activation_mask: Vec<u8>,
    /// Neurons whose values are the model outputs
    pub outputs: Vec<u16>,
}

/// Precomputed offsets of one neuron
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeuronLayout {
    pub links_start: usize,
    pub internal: usize,
    pub external: usize,
    pub weights_start: usize,
    pub sigmoid: bool,
}

impl NeuronLayout {
    /// Weights of this neuron, bias included
    pub fn weights_len(&self) -> usize {
        1 + self.internal + self.external
    }
}

impl NeuronGraph {
    pub fn neurons_num(&self) -> usize {
        self.internal_links.len()
    }

    pub fn outputs_num(&self) -> usize {
        self.outputs.len()
    }

    /// Weights needed by the whole graph, one bias per neuron included
    pub fn weights_num(&self) -> usize {
        self.internal_links
            .iter()
            .zip(&self.external_links)
            .map(|(&i, &e)| 1 + i as usize + e as usize)
            .sum()
    }

    pub fn is_sigmoid(&self, neuron: usize) -> bool {
        mask_bit(&self.activation_mask, neuron)
    }

    /// Check the graph against the network input length
    ///
    /// # Errors
    /// * `TableLength` for inconsistent per-neuron tables
    /// * `LinkOrder` when a neuron reads itself or a later neuron
    /// * `IndexOutOfRange` for an external link or output outside its range
    pub fn validate(&self, inputs_num: usize) -> Result<(), SetupError> {
        let neurons = self.neurons_num();
        if neurons == 0 {
            return Err(SetupError::TableLength {
                table: "internal_links",
                expected: 1,
                actual: 0,
            });
        }
        if self.external_links.len() != neurons {
            return Err(SetupError::TableLength {
                table: "external_links",
                expected: neurons,
                actual: self.external_links.len(),
            });
        }
        if self.activation_mask.len() < neurons.div_ceil(8) {
            return Err(SetupError::TableLength {
                table: "activation_mask",
                expected: neurons.div_ceil(8),
                actual: self.activation_mask.len(),
            });
        }
        let links_num: usize = self
            .internal_links
            .iter()
            .zip(&self.external_links)
            .map(|(&i, &e)| i as usize + e as usize)
            .sum();
        if self.links.len() != links_num {
            return Err(SetupError::TableLength {
                table: "links",
                expected: links_num,
                actual: self.links.len(),
            });
        }

        for (neuron, layout) in self.layout().iter().enumerate() {
            let end = layout.links_start + layout.internal + layout.external;
            let links = &self.links[layout.links_start..end];
            let (internal, external) = links.split_at(layout.internal);
            if let Some(&source) = internal.iter().find(|&&s| s as usize >= neuron) {
                return Err(SetupError::LinkOrder {
                    neuron,
                    source: source as usize,
                });
            }
            if let Some(&index) = external.iter().find(|&&s| s as usize >= inputs_num) {
                return Err(SetupError::IndexOutOfRange {
                    table: "links",
                    index: index as usize,
                    limit: inputs_num,
                });
            }
        }

        if self.outputs.is_empty() {
            return Err(SetupError::TableLength {
                table: "outputs",
                expected: 1,
                actual: 0,
            });
        }
        if let Some(&index) = self.outputs.iter().find(|&&o| o as usize >= neurons) {
            return Err(SetupError::IndexOutOfRange {
                table: "outputs",
                index: index as usize,
                limit: neurons,
            });
        }
        Ok(())
    }

    /// Link and weight offsets of every neuron
    pub fn layout(&self) -> Vec<NeuronLayout> {
        let mut links_start = 0;
        let mut weights_start = 0;
        self.internal_links
            .iter()
            .zip(&self.external_links)
            .enumerate()
            .map(|(neuron, (&internal, &external))| {
                let layout = NeuronLayout {
                    links_start,
                    internal: internal as usize,
                    external: external as usize,
                    weights_start,
                    sigmoid: self.is_sigmoid(neuron),
                };
                links_start += layout.internal + layout.external;
                weights_start += layout.weights_len();
                layout
            })
            .collect()
    }

    /// Memory held by the neuron value buffer of one precision
    pub fn neuron_buffer_bytes(&self, precision: Precision) -> usize {
        let size = match precision {
            Precision::Q8 => 1,
            Precision::Q16 => 2,
            Precision::F32 => 4,
        };
        self.neurons_num() * size
    }
}
