use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use eva_annotation::AutoFillStrategy;

#[derive(Parser)]
#[command(name = "eva")]
#[command(about = "Keyframe point annotation checker and exporter", long_about = None)]
#[command(version)]
pub(crate) struct Cli {
    /// Settings file (JSON). Missing files fall back to defaults.
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Reconcile every keyframe against keyframe 0 and report corrections.
    Check {
        #[command(flatten)]
        video: VideoArgs,
        /// Annotation log (JSON).
        log: PathBuf,
        /// Write the corrected annotations back to the log.
        #[arg(long)]
        fix: bool,
        /// Print corrections as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Copy annotations into one keyframe from a reference keyframe.
    Fill {
        #[command(flatten)]
        video: VideoArgs,
        log: PathBuf,
        keyframe: usize,
        /// Overrides the configured auto-fill strategy.
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
    },

    /// Move one point by the configured nudge step, clamped to the frame.
    Nudge {
        #[command(flatten)]
        video: VideoArgs,
        log: PathBuf,
        keyframe: usize,
        index: usize,
        /// 0 left, 1 up, 2 right, 3 down.
        direction: u8,
        /// Overrides the configured nudge step.
        #[arg(long, value_parser = clap::value_parser!(i32).range(0..))]
        step: Option<i32>,
    },

    /// Write labels.json and texts.json for one sample.
    Export {
        #[command(flatten)]
        video: VideoArgs,
        log: PathBuf,
        out_dir: PathBuf,
        /// Place output under <out_dir>/<class>/<direction>/seqNNN/segmentation.
        #[arg(long, requires = "seq_index")]
        class_index: Option<usize>,
        #[arg(long, requires = "class_index")]
        seq_index: Option<usize>,
        #[arg(long, default_value = "left")]
        direction: String,
    },

    /// Print slot counts and labeled/vacant states per keyframe.
    Summary {
        #[command(flatten)]
        video: VideoArgs,
        log: PathBuf,
    },
}

/// The video being annotated. Geometry flags skip probing with ffprobe.
#[derive(Args, Clone)]
pub(crate) struct VideoArgs {
    /// Video file.
    pub(crate) video: PathBuf,
    /// Frame count, when known.
    #[arg(long, requires_all = ["width", "height"])]
    pub(crate) frames: Option<usize>,
    #[arg(long)]
    pub(crate) width: Option<u32>,
    #[arg(long)]
    pub(crate) height: Option<u32>,
    #[arg(long, default_value_t = 30.0)]
    pub(crate) fps: f64,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum StrategyArg {
    First,
    Previous,
}

impl From<StrategyArg> for AutoFillStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::First => AutoFillStrategy::FromFirstFrame,
            StrategyArg::Previous => AutoFillStrategy::FromPreviousFrame,
        }
    }
}
