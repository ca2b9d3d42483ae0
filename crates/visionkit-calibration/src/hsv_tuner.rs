use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use visionkit_core::{
    camera::{FrameSource, StillImageSource},
    config::Config,
    detection::run_color_mask,
    display::{DashboardSink, DirectorySink, FrameSink, QUIT_KEY},
    streaming::{run_dashboard_server, AppState},
    Frame,
};
use visionkit_detection::color::{color_limits, ColorRange};
use visionkit_detection::resize::Interpolation;

const MAX_STEP: u8 = 50;

#[derive(Parser)]
#[command(name = "hsv-tuner", version, about = "Tune HSV mask bounds with the keyboard")]
struct Cli {
    /// Configuration file (defaults to config/default.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write windows as PNGs here instead of serving the dashboard
    #[arg(long)]
    output: Option<PathBuf>,

    /// Tune against a still image instead of the camera
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct HsvTunerState {
    lower: [u8; 3],
    upper: [u8; 3],
    step: u8,
}

impl HsvTunerState {
    // Starts from the bounds derived for the target color.
    fn seeded(range: ColorRange) -> Self {
        Self {
            lower: range.lower,
            upper: range.upper,
            step: 1,
        }
    }

    fn range(&self) -> ColorRange {
        ColorRange {
            lower: self.lower,
            upper: self.upper,
        }
    }

    // Returns false for keys that do nothing.
    fn apply_key(&mut self, key: char) -> bool {
        let keys = [
            ('a', false, 0, true), // (key, is_upper, channel, is_add)
            ('z', false, 0, false),
            ('s', false, 1, true),
            ('x', false, 1, false),
            ('d', false, 2, true),
            ('c', false, 2, false),
            ('f', true, 0, true),
            ('v', true, 0, false),
            ('g', true, 1, true),
            ('b', true, 1, false),
            ('h', true, 2, true),
            ('n', true, 2, false),
        ];

        match key {
            '+' => {
                self.step = self.step.saturating_add(1).min(MAX_STEP);
                return true;
            }
            '-' => {
                self.step = self.step.saturating_sub(1).max(1);
                return true;
            }
            _ => {}
        }

        let step = self.step;
        for (k, is_upper, ch, is_add) in keys {
            if k == key {
                let bounds = if is_upper {
                    &mut self.upper
                } else {
                    &mut self.lower
                };
                bounds[ch] = if is_add {
                    bounds[ch].saturating_add(step)
                } else {
                    bounds[ch].saturating_sub(step)
                };
                return true;
            }
        }
        false
    }
}

// Preview at half size.
fn tuner_windows(frame: &Frame, state: &HsvTunerState) -> anyhow::Result<Vec<(&'static str, Frame)>> {
    let resize_factor = 2;
    let preview = frame.resize(
        (frame.width() / resize_factor).max(1),
        (frame.height() / resize_factor).max(1),
        Interpolation::Area,
    )?;
    let mask = run_color_mask(&preview, &state.range());
    Ok(vec![("frame", preview), ("mask", Frame::from_plane(mask)?)])
}

fn tune(
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
    state: &mut HsvTunerState,
) -> anyhow::Result<()> {
    // Setup timing
    let mut frames: u64 = 0;
    let mut last_log = Instant::now();

    loop {
        if let Some(frame) = source.read()? {
            for (name, out) in tuner_windows(&frame, state)? {
                sink.show(name, &out)?;
            }
            frames += 1;
        }

        match sink.wait_key(Some(Duration::from_millis(1))) {
            Some(QUIT_KEY) => break,
            Some(key) => {
                if !state.apply_key(key) {
                    tracing::debug!(%key, "unmapped key");
                }
            }
            None => {}
        }

        let elapsed = last_log.elapsed();
        if elapsed >= Duration::from_secs(1) && frames > 0 {
            tracing::info!(
                frames_in_window = frames,
                hsv_lower = ?state.lower,
                hsv_upper = ?state.upper,
                step = state.step
            );
            frames = 0;
            last_log = Instant::now();
        }
    }

    tracing::info!(hsv_lower = ?state.lower, hsv_upper = ?state.upper, "final bounds");
    Ok(())
}

fn open_source(config: &Config, image: Option<PathBuf>) -> anyhow::Result<Box<dyn FrameSource>> {
    if let Some(path) = image {
        let source = StillImageSource::open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        return Ok(Box::new(source));
    }
    open_camera(config)
}

#[cfg(feature = "camera")]
fn open_camera(config: &Config) -> anyhow::Result<Box<dyn FrameSource>> {
    Ok(Box::new(visionkit_core::camera::CameraSource::open(&config.camera)?))
}

#[cfg(not(feature = "camera"))]
fn open_camera(_config: &Config) -> anyhow::Result<Box<dyn FrameSource>> {
    anyhow::bail!("built without the `camera` feature; pass --image to tune against a still")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = visionkit_core::bootstrap(cli.config.as_deref());
    tracing::info!("HSV tuner waking up...");

    let mut state = HsvTunerState::seeded(color_limits(config.detection.target()));
    tracing::info!(hsv_lower = ?state.lower, hsv_upper = ?state.upper, "seeded from target color");

    let mut sink: Box<dyn FrameSink + Send> = match &cli.output {
        Some(dir) => Box::new(DirectorySink::new(dir)?),
        None => {
            let (app, keys) = AppState::new(config.clone());
            run_dashboard_server(app.clone()).await?;
            Box::new(DashboardSink::new(app, keys))
        }
    };

    let image = cli.image.clone();
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let mut source = open_source(&config, image)?;
        tune(source.as_mut(), sink.as_mut(), &mut state)
    })
    .await??;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use visionkit_core::camera::SequenceSource;
    use visionkit_core::PixelFormat;
    use visionkit_detection::palette;

    fn seeded() -> HsvTunerState {
        HsvTunerState::seeded(color_limits(palette::YELLOW))
    }

    #[test]
    fn seeds_from_target_limits() {
        let state = seeded();
        assert_eq!(state.lower, [20, 100, 100]);
        assert_eq!(state.upper, [40, 255, 255]);
        assert_eq!(state.step, 1);
    }

    #[test]
    fn keys_move_the_matching_bound() {
        let mut state = seeded();
        assert!(state.apply_key('a'));
        assert!(state.apply_key('x'));
        assert!(state.apply_key('v'));
        assert_eq!(state.lower, [21, 99, 100]);
        assert_eq!(state.upper, [39, 255, 255]);
        assert!(!state.apply_key('?'));
    }

    #[test]
    fn bounds_saturate() {
        let mut state = seeded();
        state.step = 50;
        for _ in 0..10 {
            state.apply_key('h');
            state.apply_key('z');
        }
        assert_eq!(state.upper[2], 255);
        assert_eq!(state.lower[0], 0);
    }

    #[test]
    fn step_stays_in_range() {
        let mut state = seeded();
        state.apply_key('-');
        assert_eq!(state.step, 1);
        for _ in 0..100 {
            state.apply_key('+');
        }
        assert_eq!(state.step, MAX_STEP);
    }

    #[test]
    fn tuning_session_applies_keys_until_quit() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::new(visionkit_core::frame::FrameConfig {
            data: palette::YELLOW.to_array().repeat(16),
            width: 4,
            height: 4,
            format: PixelFormat::BGR8,
        })
        .unwrap();
        let mut source = SequenceSource::new(vec![Some(frame.clone()), None, Some(frame)]);
        let mut sink = DirectorySink::new(dir.path()).unwrap().with_keys(['+', 'a', 'a']);
        let mut state = seeded();

        tune(&mut source, &mut sink, &mut state).unwrap();
        assert_eq!(state.step, 2);
        assert_eq!(state.lower[0], 24);
        assert!(dir.path().join("mask.png").exists());

        // Last frame was masked with lower hue 22, still below yellow's 30.
        let mask = Frame::load(dir.path().join("mask.png")).unwrap();
        assert_eq!(mask.get_pixel(0, 0), Some(&[255u8, 255, 255][..]));
    }
}
