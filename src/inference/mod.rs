// Inference module - sparse feed-forward network evaluation
//
// The graph is walked neuron by neuron in stored (topological) order. Each
// neuron accumulates its bias, the values of the internal predecessors it
// links to and the external network inputs it links to, then applies its
// activation. One walk implementation is shared by all precisions; the
// arithmetic differs through `NeuronArith`.
//
// All buffers (network input, neuron values) are sized at setup; `run()`
// does not allocate.

pub mod activation;
pub mod arith;

pub use arith::NeuronArith;

use crate::error::{PipelineError, SetupError};
use crate::features::FeatureExtractor;
use crate::input::InputContext;
use crate::model::{ModelDescriptor, ModelParams, NeuronLayout, Precision, Quantum, UsesAsInput};

/// Typed network state: parameters plus value buffers of one precision
#[derive(Debug, Clone)]
enum NetworkState {
    Q8(Buffers<u8>),
    Q16(Buffers<u16>),
    F32(Buffers<f32>),
}

#[derive(Debug, Clone)]
struct Buffers<Q: NeuronArith> {
    weights: Vec<Q::Weight>,
    steepness: Vec<Q::Steepness>,
    input: Vec<Q>,
    neurons: Vec<Q>,
}

impl<Q: NeuronArith> Buffers<Q> {
    fn new(weights: Vec<Q::Weight>, steepness: Vec<Q::Steepness>, inputs: usize, neurons: usize) -> Self {
        Self {
            weights,
            steepness,
            input: vec![Q::default(); inputs],
            neurons: vec![Q::default(); neurons],
        }
    }

    fn load(&mut self, uses: UsesAsInput, input: &InputContext, features: Option<&FeatureExtractor>) {
        let mut offset = 0;
        if uses.raw {
            let len = input.scaled_len();
            input.scale_window(&mut self.input[..len]);
            offset = len;
        }
        if let (true, Some(features)) = (uses.extracted, features) {
            let len = features.overall_num();
            features.scale_into(&mut self.input[offset..offset + len]);
        }
    }

    fn run(&mut self, layout: &[NeuronLayout], links: &[u16]) {
        walk(
            layout,
            links,
            &self.weights,
            &self.steepness,
            &self.input,
            &mut self.neurons,
        );
    }
}

/// Evaluate every neuron in stored order
///
/// # Arguments
/// * `layout` - Per-neuron offsets from `NeuronGraph::layout`
/// * `links` - Flattened link sources
/// * `weights` - `[bias, internal..., external...]` per neuron
/// * `steepness` - Activation steepness per neuron
/// * `input` - Network input vector
/// * `neurons` - Neuron value buffer, overwritten
///
/// The graph must have been validated against `input.len()`.
pub fn walk<Q: NeuronArith>(
    layout: &[NeuronLayout],
    links: &[u16],
    weights: &[Q::Weight],
    steepness: &[Q::Steepness],
    input: &[Q],
    neurons: &mut [Q],
) {
    for (n, neuron) in layout.iter().enumerate() {
        let w = &weights[neuron.weights_start..neuron.weights_start + neuron.weights_len()];
        let sources = &links[neuron.links_start..neuron.links_start + neuron.internal + neuron.external];
        let (internal, external) = sources.split_at(neuron.internal);
        let (internal_w, external_w) = w[1..].split_at(neuron.internal);

        let mut acc = Q::bias(Q::ZERO, w[0]);
        for (&source, &weight) in internal.iter().zip(internal_w) {
            acc = Q::mac(acc, weight, neurons[source as usize]);
        }
        for (&source, &weight) in external.iter().zip(external_w) {
            acc = Q::mac(acc, weight, input[source as usize]);
        }
        neurons[n] = Q::activate(acc, steepness[n], neuron.sigmoid);
    }
}

/// Network evaluator bound to one validated model
#[derive(Debug, Clone)]
pub struct Network {
    layout: Vec<NeuronLayout>,
    links: Vec<u16>,
    outputs: Vec<u16>,
    uses: UsesAsInput,
    state: NetworkState,
}

impl Network {
    /// Build the evaluator and its buffers
    ///
    /// # Errors
    /// Any error of `NeuronGraph::validate` or `ModelParams::validate`
    pub fn new(model: &ModelDescriptor) -> Result<Self, SetupError> {
        let graph = &model.network;
        let inputs = model.network_inputs_num();
        graph.validate(inputs)?;
        model.params.validate(graph.weights_num(), graph.neurons_num())?;

        let neurons = graph.neurons_num();
        let state = match model.params.clone() {
            ModelParams::Q8 { weights, act_weights } => {
                NetworkState::Q8(Buffers::new(weights, act_weights, inputs, neurons))
            }
            ModelParams::Q16 { weights, act_weights } => {
                NetworkState::Q16(Buffers::new(weights, act_weights, inputs, neurons))
            }
            ModelParams::F32 { weights, act_weights } => {
                NetworkState::F32(Buffers::new(weights, act_weights, inputs, neurons))
            }
        };

        log::debug!(
            "Network ready: {:?}, {} inputs, {} neurons ({} bytes), {} outputs",
            model.precision(),
            inputs,
            neurons,
            graph.neuron_buffer_bytes(model.precision()),
            graph.outputs_num()
        );

        Ok(Self {
            layout: graph.layout(),
            links: graph.links.clone(),
            outputs: graph.outputs.clone(),
            uses: model.uses_as_input,
            state,
        })
    }

    pub fn precision(&self) -> Precision {
        match &self.state {
            NetworkState::Q8(_) => Precision::Q8,
            NetworkState::Q16(_) => Precision::Q16,
            NetworkState::F32(_) => Precision::F32,
        }
    }

    pub fn inputs_num(&self) -> usize {
        match &self.state {
            NetworkState::Q8(b) => b.input.len(),
            NetworkState::Q16(b) => b.input.len(),
            NetworkState::F32(b) => b.input.len(),
        }
    }

    pub fn neurons_num(&self) -> usize {
        self.layout.len()
    }

    pub fn outputs_num(&self) -> usize {
        self.outputs.len()
    }

    /// Assemble the network input from the scaled window and features
    ///
    /// # Errors
    /// `Unavailable` if the window is not ready, `NullArgument` if the model
    /// uses extracted features and none were supplied
    pub fn load_input(
        &mut self,
        input: &InputContext,
        features: Option<&FeatureExtractor>,
    ) -> Result<(), PipelineError> {
        if !input.is_ready() {
            return Err(PipelineError::Unavailable {
                what: "input window",
            });
        }
        if self.uses.extracted && features.is_none() {
            return Err(PipelineError::NullArgument {
                argument: "features",
            });
        }
        match &mut self.state {
            NetworkState::Q8(b) => b.load(self.uses, input, features),
            NetworkState::Q16(b) => b.load(self.uses, input, features),
            NetworkState::F32(b) => b.load(self.uses, input, features),
        }
        Ok(())
    }

    /// Set the network input directly from unit-interval values
    ///
    /// # Errors
    /// `InvalidArgument` if `values` does not match the input length
    pub fn set_input_units(&mut self, values: &[f32]) -> Result<(), PipelineError> {
        if values.len() != self.inputs_num() {
            return Err(PipelineError::InvalidArgument {
                reason: format!(
                    "network takes {} inputs, got {}",
                    self.inputs_num(),
                    values.len()
                ),
            });
        }
        match &mut self.state {
            NetworkState::Q8(b) => quantize_into(values, &mut b.input),
            NetworkState::Q16(b) => quantize_into(values, &mut b.input),
            NetworkState::F32(b) => quantize_into(values, &mut b.input),
        }
        Ok(())
    }

    /// Walk the graph over the current input
    pub fn run(&mut self) {
        match &mut self.state {
            NetworkState::Q8(b) => b.run(&self.layout, &self.links),
            NetworkState::Q16(b) => b.run(&self.layout, &self.links),
            NetworkState::F32(b) => b.run(&self.layout, &self.links),
        }
    }

    /// Dequantised value of output `index` in `[0, 1]`
    pub fn output_unit(&self, index: usize) -> Option<f32> {
        let neuron = *self.outputs.get(index)? as usize;
        Some(match &self.state {
            NetworkState::Q8(b) => b.neurons[neuron].to_unit(),
            NetworkState::Q16(b) => b.neurons[neuron].to_unit(),
            NetworkState::F32(b) => b.neurons[neuron].to_unit(),
        })
    }

    /// Dequantise every output into `out`
    ///
    /// Writes `min(out.len(), outputs_num())` values.
    pub fn outputs_into(&self, out: &mut [f32]) {
        for (index, dst) in out.iter_mut().enumerate().take(self.outputs.len()) {
            *dst = self.output_unit(index).unwrap_or(0.0);
        }
    }

    /// Raw quantised output values, widened to u32 (float outputs are bits)
    pub fn raw_output(&self, index: usize) -> Option<u32> {
        let neuron = *self.outputs.get(index)? as usize;
        Some(match &self.state {
            NetworkState::Q8(b) => b.neurons[neuron] as u32,
            NetworkState::Q16(b) => b.neurons[neuron] as u32,
            NetworkState::F32(b) => b.neurons[neuron].to_bits(),
        })
    }
}

fn quantize_into<Q: Quantum>(values: &[f32], out: &mut [Q]) {
    for (dst, &v) in out.iter_mut().zip(values) {
        *dst = Q::from_unit(v as f64);
    }
}

#[cfg(test)]
#[path = "inference_tests.rs"]
mod tests;
