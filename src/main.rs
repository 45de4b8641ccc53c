//! Shapesense - Sketch recognition for whiteboard strokes
//!
//! Reads a recorded freehand stroke, runs it through the
//! normalize/classify/decide pipeline against an ONNX doodle classifier,
//! and reports whether the stroke would be replaced by a canonical shape.

mod capture;
mod classify;
mod config;
mod decide;
mod document;
mod pipeline;
mod raster;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::capture::Point;
use crate::classify::{ChannelClassifier, Classifier, LabelVocabulary, OnnxClassifier};
use crate::config::AppConfig;
use crate::decide::{descriptor_for, outline_points, ShapeKind};
use crate::document::Whiteboard;
use crate::pipeline::{SketchPipeline, StrokeOutcome, StrokeSession};
use crate::raster::normalize;

/// Shapesense - Sketch recognition pipeline
#[derive(Parser, Debug)]
#[command(name = "shapesense")]
#[command(about = "Classify a recorded freehand stroke and preview its replacement shape")]
struct Args {
    /// JSON file holding the stroke as an array of {"x": .., "y": ..} points
    stroke: PathBuf,

    /// Path to the ONNX doodle classifier (overrides config)
    #[arg(long)]
    model: Option<PathBuf>,

    /// JSON label file overriding the built-in vocabulary
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Minimum confidence to accept a classification (overrides config)
    #[arg(long)]
    threshold: Option<f32>,

    /// Write the 28x28 normalized raster as a PNG
    #[arg(long)]
    dump_raster: Option<PathBuf>,

    /// Write a rendering of the decided replacement shape as a PNG
    #[arg(long)]
    dump_shape: Option<PathBuf>,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let mut config = load_or_default_config(args.config.as_deref());

    if let Some(model) = args.model {
        config.model.model_path = model;
    }
    if let Some(labels) = args.labels {
        config.model.labels_path = Some(labels);
    }
    if let Some(threshold) = args.threshold {
        config.decision.confidence_threshold = threshold;
    }

    let stroke_points = read_stroke_file(&args.stroke)?;

    let vocabulary = match &config.model.labels_path {
        Some(path) => LabelVocabulary::from_json_file(path)?,
        None => LabelVocabulary::default(),
    };

    // Inference runs on a dedicated worker task; the session only ever
    // talks to it over the request channel
    let onnx = Arc::new(OnnxClassifier::new(
        config.model.model_path.clone(),
        vocabulary,
    ));
    let classifier = Arc::new(ChannelClassifier::spawn(onnx));
    // A failed load degrades to always-unknown rather than aborting; the
    // stroke is still processed and kept as drawn.
    if let Err(e) = classifier.load().await {
        tracing::warn!(
            "Failed to load model from {}: {e}; strokes will be kept as drawn",
            config.model.model_path.display()
        );
    }

    let pipeline = Arc::new(SketchPipeline::new(
        classifier,
        config.raster.clone(),
        config.decision.clone(),
    ));
    let doc = Arc::new(Mutex::new(Whiteboard::new()));
    let mut session = StrokeSession::new(Arc::clone(&pipeline), Arc::clone(&doc));

    // Replay the recorded gesture through the capture state machine
    let mut points = stroke_points.into_iter();
    let first = points
        .next()
        .context("stroke file contains no points")?;
    session.pointer_down(first);
    for point in points {
        session.pointer_move(point);
    }
    let pending = session
        .pointer_up()
        .context("gesture produced no stroke")?;

    if let Some(path) = &args.dump_raster {
        let raster = normalize(&pending.stroke, &config.raster);
        raster
            .image()
            .save(path)
            .with_context(|| format!("writing raster to {}", path.display()))?;
        info!("Wrote normalized raster to {}", path.display());
    }

    let stroke = pending.stroke.clone();
    let outcome = session.resolve(pending).await;

    match &outcome {
        StrokeOutcome::Kept => {
            println!("unknown: stroke kept as drawn");
        }
        StrokeOutcome::Replaced {
            shape,
            label,
            confidence,
        } => {
            println!("recognized \"{label}\" at {confidence:.2}; replaced as shape {shape}");
        }
        StrokeOutcome::Skipped { label } => {
            println!("recognized \"{label}\" but the stroke was gone before commit");
        }
    }

    if let Some(path) = &args.dump_shape {
        if let StrokeOutcome::Replaced { label, .. } = &outcome {
            let kind = config.decision.shapes.kind_for(label);
            dump_shape_preview(kind, &stroke, &config, path)?;
            info!("Wrote shape preview to {}", path.display());
        } else {
            info!("No replacement shape to preview");
        }
    }

    Ok(())
}

/// Load configuration from an explicit path, the per-user location, or
/// fall back to defaults
fn load_or_default_config(explicit: Option<&std::path::Path>) -> AppConfig {
    if let Some(path) = explicit {
        match config::load_config(path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                return config;
            }
            Err(e) => {
                tracing::warn!("Ignoring config at {}: {e}", path.display());
            }
        }
    } else if let Some(path) = config::default_config_path() {
        if path.exists() {
            if let Ok(config) = config::load_config(&path) {
                info!("Loaded configuration from {}", path.display());
                return config;
            }
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}

/// Parse a stroke file: a JSON array of {"x": .., "y": ..} objects
fn read_stroke_file(path: &std::path::Path) -> Result<Vec<Point>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading stroke from {}", path.display()))?;
    let points: Vec<Point> = serde_json::from_str(&content)
        .with_context(|| format!("parsing stroke points from {}", path.display()))?;
    Ok(points)
}

/// Render the replacement shape's outline through the same rasterizer the
/// classifier input uses, scaled up for inspection
fn dump_shape_preview(
    kind: ShapeKind,
    stroke: &capture::Stroke,
    config: &AppConfig,
    path: &std::path::Path,
) -> Result<()> {
    let descriptor = descriptor_for(kind, stroke.bounds(), config.decision.fit_margin);
    let outline = outline_points(&descriptor);

    let preview =
        capture::Stroke::from_points(outline).context("replacement shape outline is empty")?;

    let mut preview_config = config.raster.clone();
    preview_config.target_size = 256;
    preview_config.fit_margin_px = 16;
    preview_config.stroke_width_px = descriptor.stroke_width;

    let raster = normalize(&preview, &preview_config);
    raster
        .image()
        .save(path)
        .with_context(|| format!("writing shape preview to {}", path.display()))?;
    Ok(())
}
