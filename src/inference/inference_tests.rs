use super::*;
use crate::dsp::SampleKind;
use crate::input::{InputConfig, InputSamples, ScaleTable, WindowConfig, WindowMode};
use crate::model::{NeuronGraph, OutputMeta, TaskType};

/// Two inputs -> sigmoid neuron 0 -> linear output neuron 1 (also reads input 1)
fn chain_model(params: ModelParams) -> ModelDescriptor {
    ModelDescriptor {
        solution_id: "chain".to_string(),
        task: TaskType::Regression,
        uses_as_input: UsesAsInput {
            raw: true,
            extracted: false,
        },
        input: InputConfig {
            input_type: SampleKind::F32,
            window: WindowConfig {
                mode: WindowMode::NoWindow,
                unique_num: 2,
                window_size: 1,
                window_shift: 0,
                usage_mask: None,
            },
            subwindow_num: 1,
            scale: ScaleTable::new(vec![0.0, 0.0], vec![1.0, 1.0]),
        },
        features: None,
        network: NeuronGraph {
            internal_links: vec![0, 1],
            external_links: vec![2, 1],
            links: vec![0, 1, 0, 1],
            activation_mask: vec![0b01],
            outputs: vec![1],
        },
        params,
        output: OutputMeta {
            scale: ScaleTable::new(vec![0.0], vec![1.0]),
            ..OutputMeta::default()
        },
    }
}

fn f32_params() -> ModelParams {
    ModelParams::F32 {
        weights: vec![0.0, 1.0, 1.0, 0.0, 0.5, 0.5],
        act_weights: vec![1.0, 1.0],
    }
}

#[test]
fn test_f32_chain_zero_input() {
    let mut net = Network::new(&chain_model(f32_params())).unwrap();
    assert_eq!(net.inputs_num(), 2);
    net.set_input_units(&[0.0, 0.0]).unwrap();
    net.run();
    // sigmoid(0) = 0.5, then 0.5 * 0.5
    assert_eq!(net.output_unit(0), Some(0.25));
    assert_eq!(net.output_unit(1), None);
}

#[test]
fn test_q8_chain_zero_input() {
    let params = ModelParams::Q8 {
        weights: vec![0, 16, 16, 0, 8, 8],
        act_weights: vec![16, 16],
    };
    let mut net = Network::new(&chain_model(params)).unwrap();
    net.set_input_units(&[0.0, 0.0]).unwrap();
    net.run();
    // 0.5 in Q8 is 128; half of it truncates to 64
    assert_eq!(net.raw_output(0), Some(64));
}

#[test]
fn test_q16_chain_zero_input() {
    let params = ModelParams::Q16 {
        weights: vec![0, 4096, 4096, 0, 2048, 2048],
        act_weights: vec![256, 256],
    };
    let mut net = Network::new(&chain_model(params)).unwrap();
    net.set_input_units(&[0.0, 0.0]).unwrap();
    net.run();
    assert_eq!(net.raw_output(0), Some(16384));
    assert!((net.output_unit(0).unwrap() - 0.25).abs() < 1e-4);
}

#[test]
fn test_precisions_agree_on_chain() {
    let q8 = ModelParams::Q8 {
        weights: vec![0, 16, 16, 0, 8, 8],
        act_weights: vec![16, 16],
    };
    let mut outputs = Vec::new();
    for params in [q8, f32_params()] {
        let mut net = Network::new(&chain_model(params)).unwrap();
        net.set_input_units(&[0.5, 1.0]).unwrap();
        net.run();
        outputs.push(net.output_unit(0).unwrap());
    }
    // sigmoid(1.5) * 0.5 + 0.5 = 0.9085
    assert!((outputs[1] - 0.9085).abs() < 1e-3);
    assert!((outputs[0] - outputs[1]).abs() < 0.02);
}

#[test]
fn test_inference_is_deterministic() {
    let mut net = Network::new(&chain_model(f32_params())).unwrap();
    net.set_input_units(&[0.3, 0.7]).unwrap();
    net.run();
    let first = net.raw_output(0);
    net.run();
    assert_eq!(net.raw_output(0), first);

    let mut clone = net.clone();
    clone.run();
    assert_eq!(clone.raw_output(0), first);
}

#[test]
fn test_load_input_from_window() {
    let model = chain_model(f32_params());
    let mut ctx = InputContext::new(&model.input, true).unwrap();
    let mut net = Network::new(&model).unwrap();

    assert!(matches!(
        net.load_input(&ctx, None),
        Err(PipelineError::Unavailable { .. })
    ));

    ctx.feed(InputSamples::F32(&[1.0, 0.0])).unwrap();
    net.load_input(&ctx, None).unwrap();
    net.run();
    let expected = 0.5 * activation::sigmoid(1.0);
    assert!((net.output_unit(0).unwrap() - expected).abs() < 1e-6);
}

#[test]
fn test_input_length_checked() {
    let mut net = Network::new(&chain_model(f32_params())).unwrap();
    assert!(matches!(
        net.set_input_units(&[0.0]),
        Err(PipelineError::InvalidArgument { .. })
    ));
}

#[test]
fn test_setup_rejects_weight_mismatch() {
    let params = ModelParams::F32 {
        weights: vec![0.0; 5],
        act_weights: vec![1.0, 1.0],
    };
    assert!(matches!(
        Network::new(&chain_model(params)),
        Err(SetupError::TableLength { table: "weights", .. })
    ));
}

#[test]
fn test_walk_saturates_without_overflow() {
    let params = ModelParams::Q8 {
        weights: vec![127, 127, 127, 127, 127, 127],
        act_weights: vec![255, 255],
    };
    let mut net = Network::new(&chain_model(params)).unwrap();
    net.set_input_units(&[1.0, 1.0]).unwrap();
    net.run();
    assert_eq!(net.raw_output(0), Some(255));
}
