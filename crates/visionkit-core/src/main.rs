use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use visionkit_core::camera::{FrameSource, StillImageSource};
use visionkit_core::display::{DashboardSink, DirectorySink, FrameSink};
use visionkit_core::lessons::{self, Lesson};
use visionkit_core::streaming::{run_dashboard_server, AppState};
use visionkit_core::Config;
use visionkit_detection::hand::NullDetector;

#[derive(Parser)]
#[command(name = "visionkit", version, about = "Computer-vision lessons")]
struct Cli {
    /// Configuration file (defaults to config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write every window as a PNG here instead of serving the dashboard
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Input image. Live lessons replay it instead of reading the camera
    #[arg(long, global = true)]
    image: Option<PathBuf>,

    #[command(subcommand)]
    lesson: LessonCommand,
}

#[derive(Subcommand, Clone, Copy, Debug)]
enum LessonCommand {
    /// Show an image
    Images,
    /// Cut out rows 200..300, columns 100..500
    Crop,
    /// Resize to 650x650 and rescale by 0.75
    Resize,
    /// Box, Gaussian and median blur
    Blur,
    /// BGR, RGB, grayscale and HSV views
    ColorSpace,
    /// Global threshold followed by a median blur
    Threshold,
    /// Gaussian adaptive threshold of a document
    AdaptiveThreshold,
    /// Line, rectangle and circle on a whiteboard
    Drawing,
    /// Trace and draw every contour
    Contours,
    /// Box every contour above the minimum area
    ObjectBoxes,
    /// Mirrored camera feed
    Webcam,
    /// Mask of a fixed green range
    Masking,
    /// Box everything close in hue to the target color
    ColorDetection,
    /// Hand landmarks with highlighted fingertips
    Hands,
}

impl From<LessonCommand> for Lesson {
    fn from(cmd: LessonCommand) -> Self {
        match cmd {
            LessonCommand::Images => Lesson::Images,
            LessonCommand::Crop => Lesson::Crop,
            LessonCommand::Resize => Lesson::Resize,
            LessonCommand::Blur => Lesson::Blur,
            LessonCommand::ColorSpace => Lesson::ColorSpace,
            LessonCommand::Threshold => Lesson::Threshold,
            LessonCommand::AdaptiveThreshold => Lesson::AdaptiveThreshold,
            LessonCommand::Drawing => Lesson::Drawing,
            LessonCommand::Contours => Lesson::Contours,
            LessonCommand::ObjectBoxes => Lesson::ObjectBoxes,
            LessonCommand::Webcam => Lesson::Webcam,
            LessonCommand::Masking => Lesson::Masking,
            LessonCommand::ColorDetection => Lesson::ColorDetection,
            LessonCommand::Hands => Lesson::Hands,
        }
    }
}

fn open_source(
    lesson: Lesson,
    config: &Config,
    image: Option<PathBuf>,
) -> anyhow::Result<Box<dyn FrameSource>> {
    if let Some(path) = image {
        let source = StillImageSource::open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        return Ok(Box::new(source));
    }
    if !lesson.is_live() {
        let path = lesson.default_image(config);
        let source = StillImageSource::open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        return Ok(Box::new(source));
    }
    open_camera(config)
}

#[cfg(feature = "camera")]
fn open_camera(config: &Config) -> anyhow::Result<Box<dyn FrameSource>> {
    let camera = visionkit_core::camera::CameraSource::open(&config.camera)?;
    Ok(Box::new(camera))
}

#[cfg(not(feature = "camera"))]
fn open_camera(_config: &Config) -> anyhow::Result<Box<dyn FrameSource>> {
    anyhow::bail!("built without the `camera` feature; pass --image to replay a still instead")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = visionkit_core::bootstrap(cli.config.as_deref());
    tracing::info!("visionkit waking up...");

    let lesson = Lesson::from(cli.lesson);
    let mut sink: Box<dyn FrameSink + Send> = match &cli.output {
        Some(dir) => Box::new(DirectorySink::new(dir)?),
        None => {
            let (state, keys) = AppState::new(config.clone());
            run_dashboard_server(state.clone()).await?;
            Box::new(DashboardSink::new(state, keys))
        }
    };

    let image = cli.image.clone();
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let mut source = open_source(lesson, &config, image)?;
        lessons::run(lesson, &config, source.as_mut(), sink.as_mut(), &mut NullDetector)?;
        Ok(())
    })
    .await??;

    tracing::info!("bye");
    Ok(())
}
