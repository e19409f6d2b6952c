//! EVA - keyframe point annotation tool
//!
//! Entry point for the headless command-line front end.

mod cli;

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use eva_annotation::{
    clip_file_name, AnnotationStore, ExportLayout, LogFile, SampleExport, Settings, SlotState,
};
use eva_core::{Direction, FrameSize};
use eva_media::{VideoInfo, VideoProbe, VideoSource};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::cli::{Cli, Command, VideoArgs};

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_env("EVA_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    match cli.command {
        Command::Check {
            video,
            log,
            fix,
            json,
        } => {
            let (_, mut store) = open_store(&video, &log, &settings)?;
            let records = store.auto_fix_all()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No inconsistencies detected.");
            } else {
                for record in &records {
                    println!("{} {}", record.title(), record.content());
                }
            }
            if fix && !records.is_empty() {
                LogFile::save(&log, &store)?;
                info!("Applied {} corrections", records.len());
            }
        }
        Command::Fill {
            video,
            log,
            keyframe,
            strategy,
        } => {
            let (_, mut store) = open_store(&video, &log, &settings)?;
            let strategy = strategy.map(Into::into).unwrap_or(settings.auto_fill);
            if !store.schedule().contains(keyframe) {
                bail!("Frame {} is not a keyframe", keyframe);
            }
            if store.auto_fill(keyframe, strategy)? {
                if settings.simplify_annotation {
                    for record in store.auto_fix(keyframe)? {
                        println!("{} {}", record.title(), record.content());
                    }
                }
                LogFile::save(&log, &store)?;
            } else {
                warn!("Keyframe {} is the reference keyframe, nothing to fill", keyframe);
            }
        }
        Command::Nudge {
            video,
            log,
            keyframe,
            index,
            direction,
            step,
        } => {
            let (_, mut store) = open_store(&video, &log, &settings)?;
            let direction = Direction::try_from(direction)?;
            store.fix_point(
                keyframe,
                index,
                direction,
                step.unwrap_or(settings.nudge_step),
            )?;
            if let Some(point) = store.points(keyframe)?[index] {
                println!("Frame{}/Point{}: {}", keyframe, index, point);
            }
            LogFile::save(&log, &store)?;
        }
        Command::Export {
            video,
            log,
            out_dir,
            class_index,
            seq_index,
            direction,
        } => {
            let (info, store) = open_store(&video, &log, &settings)?;
            let target = match (class_index, seq_index) {
                (Some(class_index), Some(seq_index)) => {
                    let layout = ExportLayout::new(class_index, direction, seq_index);
                    match clip_file_name(info.frame_count(), info.fps()) {
                        Ok(name) => info!(
                            "Clip destination: {}",
                            layout.frames_dir(&out_dir).join(name).display()
                        ),
                        Err(e) => warn!("No clip name for this video: {}", e),
                    }
                    layout.segmentation_dir(&out_dir)
                }
                _ => out_dir,
            };
            SampleExport::from_store(&store).write(&target)?;
        }
        Command::Summary { video, log } => {
            let (_, store) = open_store(&video, &log, &settings)?;
            println!(
                "{} keyframes, frame size {}",
                store.schedule().len(),
                store.frame_size()
            );
            for keyframe in store.keyframes() {
                let states = store.slot_states(keyframe)?;
                let lights: String = states
                    .iter()
                    .map(|s| match s {
                        SlotState::Labeled => '#',
                        SlotState::Vacant => '.',
                    })
                    .collect();
                let labeled = states.iter().filter(|s| **s == SlotState::Labeled).count();
                println!(
                    "{:>6}  {:>3}/{:<3} {}",
                    keyframe,
                    labeled,
                    states.len(),
                    lights
                );
            }
        }
    }

    Ok(())
}

/// Geometry from flags when given, otherwise from ffprobe.
fn video_info(args: &VideoArgs) -> Result<VideoInfo> {
    if let (Some(frames), Some(width), Some(height)) = (args.frames, args.width, args.height) {
        return Ok(VideoInfo {
            frame_count: frames,
            frame_size: FrameSize::new(width, height),
            fps: args.fps,
        });
    }
    if !eva_media::ffprobe_available() {
        bail!("ffprobe not found; pass --frames, --width and --height to skip probing");
    }
    let probe = VideoProbe::probe(&args.video)
        .with_context(|| format!("Failed to probe {}", args.video.display()))?;
    Ok(probe.info)
}

fn open_store(
    video: &VideoArgs,
    log: &Path,
    settings: &Settings,
) -> Result<(VideoInfo, AnnotationStore)> {
    let info = video_info(video)?;
    let schedule = info.keyframe_schedule(settings.keyframe_interval);
    let loaded = LogFile::load(log);
    let store = match settings.legacy_scale {
        Some(scale) => {
            AnnotationStore::open_with_legacy_scale(schedule, info.frame_size(), loaded, scale)?
        }
        None => AnnotationStore::open(schedule, info.frame_size(), loaded),
    };
    Ok((info, store))
}
