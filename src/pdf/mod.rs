//! E-pass rendering
//!
//! A pass is a single US Letter page written to
//! `<output_dir>/<record id>-epass.pdf`. Files are created once and never
//! overwritten; the name is derived from the record id alone, so the
//! download URL can be rebuilt from the id.

pub mod assets;
pub mod builder;
pub mod layout;

use std::fs;
use std::path::PathBuf;

use chrono_tz::Tz;
use thiserror::Error;

use crate::config::DocumentsConfig;
use crate::models::visitor::VisitorRecord;

use self::builder::DocumentBuilder;
use self::layout::{PassAssets, PassLayout};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unknown time zone: {0}")]
    Timezone(String),
}

/// A pass written to disk
#[derive(Debug, Clone)]
pub struct RenderedPass {
    pub filename: String,
    pub path: PathBuf,
}

pub struct PassRenderer {
    output_dir: PathBuf,
    logo_path: PathBuf,
    map_path: PathBuf,
    layout: PassLayout,
}

impl PassRenderer {
    pub fn new(config: &DocumentsConfig) -> Result<Self, RenderError> {
        let timezone = config
            .timezone
            .parse::<Tz>()
            .map_err(|_| RenderError::Timezone(config.timezone.clone()))?;

        Ok(Self {
            output_dir: config.output_dir.clone(),
            logo_path: config.logo_path.clone(),
            map_path: config.map_path.clone(),
            layout: PassLayout {
                institution_name: config.institution_name.clone(),
                map_heading: config.map_heading.clone(),
                timezone,
            },
        })
    }

    /// Render the pass of `record`. Blocks until the file is closed.
    pub fn render(&self, record: &VisitorRecord) -> Result<RenderedPass, RenderError> {
        // create_dir_all treats an existing directory as success
        fs::create_dir_all(&self.output_dir)?;

        let filename = record.pass_filename();
        let path = self.output_dir.join(&filename);

        let assets = PassAssets {
            logo: assets::load_optional(&self.logo_path)?,
            map: assets::load_optional(&self.map_path)?,
        };

        let mut builder = DocumentBuilder::create(&path)?;
        layout::draw_pass(&mut builder, record, &self.layout, &assets);
        builder.finish()?;

        tracing::debug!(id = %record.id, path = %path.display(), "Pass written");
        Ok(RenderedPass { filename, path })
    }

    /// Path of a rendered pass, if `filename` names an existing one
    pub fn locate(&self, filename: &str) -> Option<PathBuf> {
        if !is_plain_filename(filename) {
            return None;
        }
        let path = self.output_dir.join(filename);
        path.is_file().then_some(path)
    }
}

/// A single path component without separators or dot segments
fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
