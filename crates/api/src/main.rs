//! ShelfSight - shelf ROI capture and behaviour analysis from the terminal.
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use shelfsight_domain::{Config, Point, VideoId};
use shelfsight_infra::config;
use shelfsight_lib::{
    capture_polygon, list_rois, list_videos, persist_rois, reference_frame, render_rois, reset_analysis, stage_saved_rois,
    start_analysis, stop_analysis, upload_video, validate_video, wait_for_analysis, AppContext, PolygonDraft,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: shelfsight <command>

commands:
  videos                                   list uploaded videos
  rois                                     list saved ROIs of every video
  validate <file>                          check a video against the upload limits
  upload <file>                            validate and upload a video
  define <video> <frame> <name> <x,y>...   capture one polygon over a frame image and save it
  analyze <video>                          run a behaviour analysis and wait for the result
  reset <video>                            reset the analysis state of a video
  render <frame> <video> <out>             paint the ROIs of a video over a frame image";

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing();

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env file loaded"),
    }

    let config = match config::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "No configuration found, using defaults");
            Config::default()
        }
    };

    let ctx = AppContext::new_with_config(config).context("failed to initialise application context")?;
    let args: Vec<String> = env::args().skip(1).collect();

    let outcome = run(&ctx, &args).await;
    ctx.shutdown().await;
    outcome
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    let json = env::var("SHELFSIGHT_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(ctx: &AppContext, args: &[String]) -> Result<()> {
    let Some((command, rest)) = args.split_first() else {
        bail!("{USAGE}");
    };

    match (command.as_str(), rest) {
        ("videos", []) => print_json(&list_videos(ctx).await?),
        ("rois", []) => print_json(&list_rois(ctx).await?),
        ("validate", [file]) => print_json(&validate_video(ctx, &PathBuf::from(file)).await?),
        ("upload", [file]) => {
            let last_percent = AtomicU8::new(0);
            let progress = Arc::new(move |update: shelfsight_domain::UploadProgress| {
                if last_percent.swap(update.percent, Ordering::Relaxed) != update.percent {
                    info!(percent = update.percent, sent = update.bytes_sent, total = update.total_bytes, "uploading");
                }
            });
            print_json(&upload_video(ctx, &PathBuf::from(file), progress).await?)
        }
        ("define", [video, frame, name, points @ ..]) if !points.is_empty() => {
            let video = VideoId::new(video.as_str());
            let frame = reference_frame(ctx, Path::new(frame)).await?;
            let draft = PolygonDraft {
                name: name.clone(),
                points: points.iter().map(|raw| parse_point(raw)).collect::<Result<_>>()?,
            };

            let kept = stage_saved_rois(ctx, &video).await?;
            let roi = capture_polygon(ctx, &video, frame, &draft).await?;
            let saved = persist_rois(ctx, &video).await?;
            info!(video = %video, roi = %roi.id, kept, saved, "polygon saved");
            print_json(&roi)
        }
        ("analyze", [video]) => {
            let video = VideoId::new(video.as_str());
            list_rois(ctx).await?;
            start_analysis(ctx, &video).await?;

            tokio::select! {
                snapshot = wait_for_analysis(ctx, &video) => print_json(&snapshot?),
                interrupted = tokio::signal::ctrl_c() => {
                    interrupted.context("failed to listen for Ctrl-C")?;
                    print_json(&stop_analysis(ctx, &video).await?)
                }
            }
        }
        ("reset", [video]) => print_json(&reset_analysis(ctx, &VideoId::new(video.as_str())).await?),
        ("render", [frame, video, out]) => print_json(
            &render_rois(ctx, &PathBuf::from(frame), &VideoId::new(video.as_str()), &PathBuf::from(out)).await?,
        ),
        _ => bail!("{USAGE}"),
    }
}

/// `x,y` in frame pixels.
fn parse_point(raw: &str) -> Result<Point> {
    let (x, y) = raw.split_once(',').with_context(|| format!("point '{raw}' is not in x,y form"))?;
    let x = x.trim().parse().with_context(|| format!("invalid x in '{raw}'"))?;
    let y = y.trim().parse().with_context(|| format!("invalid y in '{raw}'"))?;
    Ok(Point::new(x, y))
}

#[allow(clippy::print_stdout)]
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
