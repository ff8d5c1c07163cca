//! fillergen CLI - renders fallback fillers for every row of an entity CSV
//!
//! Prints each processed id to stdout.
//! Returns non-zero on the first failing row.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use fillergen_core::{
    colors::ColorTable,
    compose::{BlendMode, Composer},
    config::RenderSettings,
    input::open_rows,
    output::OutputLayout,
    pipeline::{FillerPipeline, PipelineError, RunSummary},
    presets::PresetRegistry,
    shadow::ShadowMethod,
};

#[derive(Parser)]
#[command(name = "fillergen-cli")]
#[command(about = "Generate text fallback filler sprites from an entity CSV")]
struct Cli {
    /// Entity CSV: type,id,name,color,looks_like,copy_from
    input: PathBuf,

    /// Palette definitions (JSON array, first object maps names to RGB)
    #[arg(short, long, default_value = "../Cataclysm-DDA/data/raw/colors.json")]
    colors: PathBuf,

    /// Extra or overriding type presets (JSON object keyed by type)
    #[arg(short, long)]
    presets: Option<PathBuf>,

    /// Render settings file (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// TrueType/OpenType font; the built-in bitmap face is used otherwise
    #[arg(short, long)]
    font: Option<PathBuf>,

    /// Output root directory
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Shadow fill policy
    #[arg(long, value_enum)]
    shadow: Option<ShadowMethod>,

    /// Shadow blend mode
    #[arg(long, value_enum)]
    blend: Option<BlendMode>,

    /// Shadow blur sigma
    #[arg(long)]
    blur: Option<f32>,

    /// Directory holding preset background images
    #[arg(long)]
    backgrounds: Option<PathBuf>,

    /// Write all files into a single directory instead of the size/type tree
    #[arg(long)]
    flat: bool,

    /// Write manifest.json with artifact digests
    #[arg(long)]
    manifest: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn settings(&self) -> Result<RenderSettings, String> {
        let mut settings = match &self.config {
            Some(path) => RenderSettings::load_from_file(path).map_err(|e| e.to_string())?,
            None => RenderSettings::default(),
        };
        if let Some(font) = &self.font {
            settings.font = Some(font.clone());
        }
        if let Some(method) = self.shadow {
            settings.shadow_method = method;
        }
        if let Some(mode) = self.blend {
            settings.blend_mode = mode;
        }
        if let Some(blur) = self.blur {
            settings.shadow_blur = blur;
        }
        if let Some(dir) = &self.backgrounds {
            settings.backgrounds_dir = Some(dir.clone());
        }
        Ok(settings)
    }

    fn build_pipeline(&self) -> Result<FillerPipeline, String> {
        let colors = ColorTable::load_from_file(&self.colors).map_err(|e| e.to_string())?;
        log::debug!("loaded {} colors from {}", colors.len(), self.colors.display());

        let presets = match &self.presets {
            Some(path) => PresetRegistry::load_from_file(path).map_err(|e| e.to_string())?,
            None => PresetRegistry::builtin(),
        };
        log::debug!("presets: {}", presets.tags().join(", "));

        let composer = Composer::new(self.settings()?).map_err(|e| e.to_string())?;
        log::debug!("typeface: {}", composer.typeface().name());

        let layout = if self.flat {
            OutputLayout::flat(&self.out)
        } else {
            OutputLayout::tree(&self.out)
        };

        Ok(FillerPipeline::new(colors, presets, composer, layout))
    }
}

fn run(cli: &Cli, pipeline: &FillerPipeline) -> Result<RunSummary, PipelineError> {
    let summary = pipeline.run_rows(open_rows(&cli.input)?, |id| println!("{}", id))?;

    if cli.manifest {
        let path = pipeline.write_manifest(&summary)?;
        log::info!("manifest written to {}", path.display());
    }
    Ok(summary)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let pipeline = match cli.build_pipeline() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &pipeline) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
