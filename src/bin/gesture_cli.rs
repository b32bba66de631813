use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use gesture_engine::config::AppConfig;
use gesture_engine::engine::{spawn_inference_thread, GestureEngine, GestureRuntime};
use gesture_engine::model::{ModelDescriptor, Precision};
use gesture_engine::postprocess::PredictionEvent;
use gesture_engine::sensor::{SensorChannels, SensorFrame};
use gesture_engine::testing::StubModelBuilder;
use gesture_engine::transport::{BroadcastTransport, LogTransport};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "gesture_cli",
    about = "Replay harness for the gesture inference pipeline"
)]
struct Cli {
    /// Runtime configuration (defaults to assets/gesture_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a summary of a model descriptor
    Info {
        #[arg(long)]
        model: PathBuf,
    },
    /// Feed CSV sensor frames (one per row) through the pipeline
    Replay {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        samples: PathBuf,
        /// Emit every prediction without debouncing
        #[arg(long)]
        raw: bool,
        /// Synthetic sample period between rows
        #[arg(long, default_value_t = 10)]
        period_ms: u64,
    },
    /// Run the built-in stub model on all-zero frames through the inference thread
    Demo {
        /// Class the stub model predicts
        #[arg(long, default_value_t = 9)]
        class: usize,
        #[arg(long, default_value_t = 4)]
        windows: usize,
        #[arg(long, default_value = "f32")]
        precision: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Info { model } => run_info(&model),
        Commands::Replay {
            model,
            samples,
            raw,
            period_ms,
        } => run_replay(config, &model, &samples, raw, period_ms),
        Commands::Demo {
            class,
            windows,
            precision,
        } => run_demo(config, class, windows, &precision),
    }
}

fn load_model(path: &Path) -> Result<ModelDescriptor> {
    ModelDescriptor::load_from_file(path)
        .with_context(|| format!("loading model {}", path.display()))
}

fn setup_engine(model: &ModelDescriptor) -> Result<GestureEngine> {
    GestureEngine::setup(model)
        .with_context(|| format!("setting up model '{}'", model.solution_id))
}

#[derive(Serialize)]
struct ModelSummary<'a> {
    solution_id: &'a str,
    task: String,
    precision: String,
    input_type: String,
    window_mode: String,
    unique_inputs: usize,
    window_size: usize,
    subwindows: usize,
    features: usize,
    neurons: usize,
    weights: usize,
    outputs: usize,
}

fn run_info(path: &Path) -> Result<ExitCode> {
    let model = load_model(path)?;
    let engine = setup_engine(&model)?;
    let summary = ModelSummary {
        solution_id: engine.solution_id(),
        task: format!("{:?}", engine.task()),
        precision: format!("{:?}", engine.precision()),
        input_type: format!("{:?}", engine.input_type()),
        window_mode: format!("{:?}", engine.window_mode()),
        unique_inputs: engine.unique_inputs(),
        window_size: engine.window_size(),
        subwindows: engine.subwindow_num(),
        features: engine.features_num(),
        neurons: engine.neurons_num(),
        weights: engine.weights_num(),
        outputs: engine.outputs_num(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(ExitCode::from(0))
}

fn parse_csv(path: &Path) -> Result<Vec<Vec<f32>>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut rows = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split(',')
            .map(|field| field.trim().parse::<f32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("{}:{}: invalid number", path.display(), line_no + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

fn run_replay(
    mut config: AppConfig,
    model_path: &Path,
    samples: &Path,
    raw: bool,
    period_ms: u64,
) -> Result<ExitCode> {
    if raw {
        config.postprocess.enabled = false;
    }
    let model = load_model(model_path)?;
    let engine = setup_engine(&model)?;
    let rows = parse_csv(samples)?;
    let mut runtime = GestureRuntime::new(engine, &config, Box::new(LogTransport));

    for (i, row) in rows.iter().enumerate() {
        let frame = SensorFrame::new(i as u64 * period_ms, row)
            .with_context(|| format!("row {}", i + 1))?;
        let event = runtime
            .process_frame(&frame)
            .with_context(|| format!("row {}", i + 1))?;
        if let Some(event) = event {
            emit_event(&event)?;
        }
    }

    eprintln!(
        "{} rows, {} inferences, {} events",
        rows.len(),
        runtime.inferences(),
        runtime.events()
    );
    Ok(ExitCode::from(0))
}

fn emit_event(event: &PredictionEvent) -> Result<()> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

fn parse_precision(name: &str) -> Result<Precision> {
    match name.to_ascii_lowercase().as_str() {
        "q8" => Ok(Precision::Q8),
        "q16" => Ok(Precision::Q16),
        "f32" => Ok(Precision::F32),
        other => bail!("unknown precision '{}', expected q8, q16 or f32", other),
    }
}

#[derive(Serialize)]
struct DemoReport {
    solution_id: String,
    inferences: u64,
    events: u64,
    overruns: u64,
    payloads: Vec<String>,
}

fn run_demo(config: AppConfig, class: usize, windows: usize, precision: &str) -> Result<ExitCode> {
    let model = StubModelBuilder::new()
        .axes(config.sensor.axes)
        .winning_class(class)
        .precision(parse_precision(precision)?)
        .build();
    let engine = setup_engine(&model)?;
    let frames = windows * engine.window_size();

    let transport = BroadcastTransport::new(frames.max(1));
    let mut subscriber = transport.subscribe();
    let runtime = GestureRuntime::new(engine, &config, Box::new(transport));

    let SensorChannels {
        mut producer,
        consumer,
    } = SensorChannels::from_config(&config.sensor);
    let thread = spawn_inference_thread(runtime, consumer).context("spawning inference thread")?;

    let zeros = vec![0.0f32; config.sensor.axes];
    for i in 0..frames {
        let frame = SensorFrame::new(i as u64 * 10, &zeros)?;
        while producer.free_slots() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        producer.push(frame);
    }
    let overruns = producer.overruns();
    let runtime = thread
        .stop()
        .map_err(|_| anyhow!("inference thread panicked"))?;

    let mut payloads = Vec::new();
    while let Ok(payload) = subscriber.try_recv() {
        payloads.push(String::from_utf8_lossy(&payload).into_owned());
    }
    let report = DemoReport {
        solution_id: runtime.engine().solution_id().to_string(),
        inferences: runtime.inferences(),
        events: runtime.events(),
        overruns,
        payloads,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}
