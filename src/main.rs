//! pims - inspect lazy image stacks from the command line.
//!
//! Output is JSON on stdout; logs go to stderr.

use clap::Parser;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pims::{
    config::{Cli, Command},
    mime, DType, Dispatcher, Input, PimsError, Plane, ReaderConfig, Stack,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Info { input, reader } => run_info(&input, &reader),
        Command::Read {
            input,
            index,
            reader,
        } => run_read(&input, index, &reader),
        Command::Mime { names } => Ok(run_mime(&names)),
    };

    match result.and_then(|value| print_json(&value)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Info Command
// =============================================================================

fn run_info(input: &str, config: &ReaderConfig) -> Result<Value, PimsError> {
    config.validate().map_err(PimsError::Config)?;

    let dispatcher = Dispatcher::global();
    let input = Input::from(input);
    let content_type = dispatcher.classify(&input)?;
    let reader = dispatcher.open_reader(input, config)?;
    let stack = reader.read()?;

    Ok(json!({
        "reader": reader.describe(),
        "content_type": content_type,
        "stack": stack.info(),
        "metadata": reader.metadata(),
    }))
}

// =============================================================================
// Read Command
// =============================================================================

/// Summary statistics of one decoded plane.
#[derive(Debug, Serialize)]
struct PlaneStats {
    index: usize,
    source: String,
    page: usize,
    shape: Vec<usize>,
    dtype: DType,
    min: f64,
    max: f64,
    mean: f64,
}

fn run_read(input: &str, index: Option<usize>, config: &ReaderConfig) -> Result<Value, PimsError> {
    let stack = pims::open_with(input, config)?;
    let indices: Vec<usize> = match index {
        Some(i) => vec![i],
        None => (0..stack.plane_count()).collect(),
    };

    let mut planes = Vec::with_capacity(indices.len());
    for i in indices {
        planes.push(plane_stats(&stack, i)?);
    }
    Ok(json!({ "shape": stack.shape(), "dtype": stack.dtype(), "planes": planes }))
}

fn plane_stats(stack: &Stack, index: usize) -> Result<PlaneStats, PimsError> {
    let plane = stack.force(index)?;
    // force() succeeded, so the lazy plane exists
    let (source, page) = stack
        .plane(index)
        .map(|p| (p.source().to_string(), p.page()))
        .unwrap_or_default();

    let (min, max, mean) = summarize(&plane);
    Ok(PlaneStats {
        index,
        source,
        page,
        shape: plane.shape().to_vec(),
        dtype: plane.dtype(),
        min,
        max,
        mean,
    })
}

fn summarize(plane: &Plane) -> (f64, f64, f64) {
    let values = plane.to_f64();
    if values.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.sum() / values.len() as f64;
    (min, max, mean)
}

// =============================================================================
// Mime Command
// =============================================================================

fn run_mime(names: &[String]) -> Value {
    let registry = mime::init();
    let mut types = Map::new();
    for name in names {
        let content_type = registry.guess_type(name).map_or(Value::Null, Value::from);
        types.insert(name.clone(), content_type);
    }
    Value::Object(types)
}

// =============================================================================
// Helpers
// =============================================================================

fn print_json(value: &Value) -> Result<(), PimsError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| PimsError::Config(format!("failed to serialize output: {e}")))?;
    println!("{text}");
    Ok(())
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose { "pims=debug" } else { "pims=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
