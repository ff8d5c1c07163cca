//! Filler Pipeline - single entry point per input row
//!
//! resolve colors → normalize text → compose → write artifacts.
//! A failing row aborts the run; nothing is written for it.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::PathBuf;
use thiserror::Error;

use crate::colors::{ColorError, ColorTable};
use crate::compose::{ComposeError, Composer, RenderRequest};
use crate::hashing::{canonical_json, compute_manifest_hash};
use crate::input::{read_rows, InputError, InputRow};
use crate::output::{write_file, OutputError, OutputLayout, WrittenFiller};
use crate::presets::{PresetError, PresetRegistry};
use crate::text::normalize_with_start;
use crate::ENGINE_VERSION;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Color(#[from] ColorError),

    #[error(transparent)]
    Preset(#[from] PresetError),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Row '{id}': {source}")]
    Row {
        id: String,
        #[source]
        source: Box<PipelineError>,
    },
}

/// Result of a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub written: Vec<WrittenFiller>,
    pub skipped: usize,
}

/// Reproducibility record of a run: every artifact and its PNG digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub engine_version: String,
    pub entries: Vec<WrittenFiller>,
    pub manifest_hash: String,
}

impl RunManifest {
    pub fn from_summary(summary: &RunSummary) -> Result<Self, serde_json::Error> {
        let mut manifest = Self {
            engine_version: ENGINE_VERSION.to_string(),
            entries: summary.written.clone(),
            manifest_hash: String::new(),
        };
        manifest.manifest_hash = compute_manifest_hash(&(&manifest.engine_version, &manifest.entries))?;
        Ok(manifest)
    }
}

/// The filler pipeline - owns the read-only tables for a run
pub struct FillerPipeline {
    colors: ColorTable,
    presets: PresetRegistry,
    composer: Composer,
    layout: OutputLayout,
}

impl FillerPipeline {
    pub fn new(colors: ColorTable, presets: PresetRegistry, composer: Composer, layout: OutputLayout) -> Self {
        Self { colors, presets, composer, layout }
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    pub fn presets(&self) -> &PresetRegistry {
        &self.presets
    }

    /// Render and write one row. `Ok(None)` for rows without id or name.
    pub fn process_row(&self, row: &InputRow) -> Result<Option<WrittenFiller>, PipelineError> {
        if !row.is_renderable() {
            return Ok(None);
        }

        let settings = self.composer.settings();
        let (fg, bg) = self.colors.resolve(&row.color, &settings.default_color)?;

        let type_tag = row.type_tag();
        let preset = self.presets.get_or_default(&type_tag)?;
        let text = normalize_with_start(&row.name, settings.break_start);
        log::debug!("{}: text {:?}, fg {:?}, bg {:?}", row.id, text, fg, bg);

        let request = RenderRequest { preset, id: &row.id, text: &text, fg, bg };
        let image = self.composer.compose(&request)?;

        Ok(Some(self.layout.write(preset, &type_tag, &row.id, &image)?))
    }

    /// Process every CSV row in order. `progress` sees each id before it is
    /// rendered.
    pub fn run<R: Read>(&self, reader: R, progress: impl FnMut(&str)) -> Result<RunSummary, PipelineError> {
        self.run_rows(read_rows(reader), progress)
    }

    pub fn run_rows(
        &self,
        rows: impl Iterator<Item = Result<InputRow, InputError>>,
        mut progress: impl FnMut(&str),
    ) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();

        for row in rows {
            let row = row?;
            if !row.is_renderable() {
                summary.skipped += 1;
                continue;
            }
            progress(&row.id);

            let written = self
                .process_row(&row)
                .map_err(|e| PipelineError::Row { id: row.id.clone(), source: Box::new(e) })?;
            summary.written.extend(written);
        }

        log::info!("wrote {} fillers, skipped {} rows", summary.written.len(), summary.skipped);
        Ok(summary)
    }

    /// Write `manifest.json` at the output root.
    pub fn write_manifest(&self, summary: &RunSummary) -> Result<PathBuf, PipelineError> {
        let manifest = RunManifest::from_summary(summary)?;
        let path = self.layout.root().join(MANIFEST_FILE);
        write_file(&path, canonical_json(&manifest)?.as_bytes())?;
        Ok(path)
    }
}
