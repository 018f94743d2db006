use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;

use facematch_core::dataset::infrastructure::json_dataset_file;
use facematch_core::detection::domain::detector_mode::DetectorMode;
use facematch_core::detection::infrastructure::model_resolver::ProgressFn;
use facematch_core::imaging::domain::image_source::ImageSource;
use facematch_core::recognition::recognizer::Recognizer;
use facematch_core::recognition::recognizer_config::{PreprocessMode, RecognizerConfig};
use facematch_core::shared::constants::{DEFAULT_CONFIDENCE, DEFAULT_TOLERANCE, IMAGE_EXTENSIONS};
use facematch_core::shared::rectangle::Rectangle;

/// Enroll faces into a dataset and classify images against it.
#[derive(Parser)]
#[command(name = "facematch")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Maximum descriptor distance accepted as a match (smaller is stricter).
    #[arg(long, global = true, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f32,

    /// Also embed each face mirrored and average (slower, more stable).
    #[arg(long, global = true)]
    accurate: bool,

    /// Keep colour instead of converting images to grayscale first.
    #[arg(long, global = true)]
    no_grayscale: bool,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, global = true, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Directory searched for model files before the cache.
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Add one sample per image under a label.
    Enroll {
        /// Dataset JSON file (created if missing).
        #[arg(long)]
        dataset: PathBuf,

        #[arg(long)]
        label: String,

        /// Images, each containing exactly one face.
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Remove the earliest sample of a label, or all of them with --all.
    Remove {
        #[arg(long)]
        dataset: PathBuf,

        #[arg(long)]
        label: String,

        #[arg(long)]
        all: bool,
    },
    /// Print each label with its sample count.
    List {
        #[arg(long)]
        dataset: PathBuf,
    },
    /// Print matches for the faces in an image as JSON.
    Classify {
        #[arg(long)]
        dataset: PathBuf,

        image: PathBuf,

        /// Classify every face instead of requiring exactly one.
        #[arg(long)]
        multiple: bool,
    },
    /// Print the rectangles of all faces in an image as JSON.
    Detect { image: PathBuf },
}

#[derive(Serialize)]
struct LabelCount<'a> {
    label: &'a str,
    samples: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = build_config(&cli);

    match &cli.command {
        Command::Enroll {
            dataset,
            label,
            images,
        } => run_enroll(&cli, config, dataset, label, images),
        Command::Remove {
            dataset,
            label,
            all,
        } => run_remove(dataset, label, *all),
        Command::List { dataset } => run_list(dataset),
        Command::Classify {
            dataset,
            image,
            multiple,
        } => run_classify(&cli, config, dataset, image, *multiple),
        Command::Detect { image } => run_detect(&cli, config, image),
    }
}

fn run_enroll(
    cli: &Cli,
    config: RecognizerConfig,
    dataset_path: &Path,
    label: &str,
    images: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut recognizer = build_recognizer(cli, config)?;
    recognizer.set_dataset(json_dataset_file::load_or_default(dataset_path)?);

    let mut enrolled = 0;
    for image in images {
        match recognizer.add_image_to_dataset(image, label) {
            Ok(_) => enrolled += 1,
            Err(e) if e.is_face_count_error() => {
                log::warn!("Skipping {}: {e}", image.display());
            }
            Err(e) => return Err(e.into()),
        }
    }
    if enrolled == 0 {
        return Err(format!("No usable face found for '{label}'").into());
    }

    json_dataset_file::save(dataset_path, recognizer.dataset())?;
    log::info!(
        "Enrolled {enrolled}/{} image(s) as '{label}' in {}",
        images.len(),
        dataset_path.display()
    );
    Ok(())
}

fn run_remove(
    dataset_path: &Path,
    label: &str,
    all: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut dataset = json_dataset_file::load_or_default(dataset_path)?;
    let removed = if all {
        dataset.remove_all_by_label(label)
    } else {
        usize::from(dataset.remove_by_label(label))
    };
    if removed == 0 {
        log::warn!("No samples labeled '{label}'");
        return Ok(());
    }
    json_dataset_file::save(dataset_path, &dataset)?;
    log::info!("Removed {removed} sample(s) of '{label}'");
    Ok(())
}

fn run_list(dataset_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = json_dataset_file::load_or_default(dataset_path)?;
    let counts: Vec<LabelCount> = dataset
        .label_counts()
        .into_iter()
        .map(|(label, samples)| LabelCount { label, samples })
        .collect();
    println!("{}", serde_json::to_string_pretty(&counts)?);
    Ok(())
}

fn run_classify(
    cli: &Cli,
    config: RecognizerConfig,
    dataset_path: &Path,
    image: &Path,
    multiple: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = json_dataset_file::load_or_default(dataset_path)?;
    if dataset.is_empty() {
        log::warn!("Dataset {} has no samples", dataset_path.display());
    }
    let mut recognizer = build_recognizer(cli, config)?;
    recognizer.set_dataset(dataset);

    let matches = if multiple {
        recognizer.classify_multiple(image)?
    } else {
        recognizer.classify_single(image)?
    };
    println!("{}", serde_json::to_string_pretty(&matches)?);
    Ok(())
}

fn run_detect(
    cli: &Cli,
    config: RecognizerConfig,
    image: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut recognizer = build_recognizer(cli, config)?;
    let rectangles: Vec<Rectangle> = recognizer
        .recognize_multiple(ImageSource::Path(image))?
        .into_iter()
        .map(|face| face.rectangle)
        .collect();
    println!("{}", serde_json::to_string_pretty(&rectangles)?);
    Ok(())
}

fn build_config(cli: &Cli) -> RecognizerConfig {
    RecognizerConfig {
        tolerance: cli.tolerance,
        detector_mode: if cli.accurate {
            DetectorMode::Accurate
        } else {
            DetectorMode::Standard
        },
        preprocess_mode: if cli.no_grayscale {
            PreprocessMode::None
        } else {
            PreprocessMode::Grayscale
        },
        confidence: cli.confidence,
        jpeg_quality: None,
    }
}

fn build_recognizer(
    cli: &Cli,
    config: RecognizerConfig,
) -> Result<Recognizer, Box<dyn std::error::Error>> {
    log::info!("Loading face models");
    let progress: ProgressFn = Box::new(download_progress);
    let recognizer = Recognizer::from_models(cli.models_dir.as_deref(), config, Some(progress))?;
    Ok(recognizer)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    build_config(cli).validate()?;
    if let Some(dir) = &cli.models_dir {
        if !dir.is_dir() {
            return Err(format!("Models directory not found: {}", dir.display()).into());
        }
    }
    match &cli.command {
        Command::Enroll { label, images, .. } => {
            validate_label(label)?;
            for image in images {
                validate_image(image)?;
            }
        }
        Command::Remove { label, .. } => validate_label(label)?,
        Command::List { .. } => {}
        Command::Classify { image, .. } => validate_image(image)?,
        Command::Detect { image } => validate_image(image)?,
    }
    Ok(())
}

fn validate_label(label: &str) -> Result<(), Box<dyn std::error::Error>> {
    if label.trim().is_empty() {
        return Err("Label must not be empty".into());
    }
    Ok(())
}

fn validate_image(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Input file not found: {}", path.display()).into());
    }
    if !is_image(path) {
        return Err(format!(
            "Unsupported image type: {} (expected one of: {})",
            path.display(),
            IMAGE_EXTENSIONS.join(", ")
        )
        .into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}
