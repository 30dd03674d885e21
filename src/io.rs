use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::bmp::BmpEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canvas::Canvas;
use crate::error::{SketchError, SketchResult};
use crate::history::{HistoryEntry, HistoryLog};
use crate::project::Session;
use crate::surface::EncodedImage;
use crate::tools::{ShapeStyle, StrokeParams};

// ============================================================================
// RASTER EXPORT
// ============================================================================

/// Lossless output formats for exporting the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Bmp,
    Tga,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Bmp => "bmp",
            ExportFormat::Tga => "tga",
        }
    }

    /// Parse a format name or file extension. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim_start_matches('.').to_lowercase().as_str() {
            "png" => Some(ExportFormat::Png),
            "bmp" => Some(ExportFormat::Bmp),
            "tga" => Some(ExportFormat::Tga),
            _ => None,
        }
    }

    /// Infer from a path's extension, defaulting to PNG.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_name)
            .unwrap_or_default()
    }
}

/// Encode an RGBA image into an in-memory file of the given format.
pub fn encode_image(image: &RgbaImage, format: ExportFormat) -> SketchResult<Vec<u8>> {
    let mut bytes = Vec::new();
    write_encoded(image, &mut bytes, format)?;
    Ok(bytes)
}

/// Encode and write an image to a file.
pub fn encode_and_write(image: &RgbaImage, path: &Path, format: ExportFormat) -> SketchResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_encoded(image, &mut writer, format)?;
    writer.flush()?;
    tracing::info!(path = %path.display(), format = format.extension(), "exported image");
    Ok(())
}

fn write_encoded<W: Write>(image: &RgbaImage, writer: &mut W, format: ExportFormat) -> SketchResult<()> {
    let (w, h) = image.dimensions();
    match format {
        ExportFormat::Png => {
            PngEncoder::new(writer).write_image(image.as_raw(), w, h, ColorType::Rgba8)?;
        }
        ExportFormat::Bmp => {
            BmpEncoder::new(writer).write_image(image.as_raw(), w, h, ColorType::Rgba8)?;
        }
        ExportFormat::Tga => {
            TgaEncoder::new(writer).write_image(image.as_raw(), w, h, ColorType::Rgba8)?;
        }
    }
    Ok(())
}

// ============================================================================
// SESSION FILES (.sketch) — history log + surface geometry
// ============================================================================

const SESSION_MAGIC_V1: &str = "SKP1";

/// Maximum supported display dimension (per axis) in a session file.
const MAX_DISPLAY_DIM: u32 = 16_384;
/// Maximum number of history entries accepted from a session file.
const MAX_ENTRIES: usize = 4_096;

#[derive(Serialize, Deserialize)]
struct SessionFileV1 {
    magic: String,
    id: Uuid,
    name: String,
    display_width: u32,
    display_height: u32,
    scale: f32,
    background: [u8; 4],
    color: [u8; 4],
    line_width: u32,
    filled_shapes: bool,
    /// History cap in force when saved; 0 = unlimited.
    max_entries: usize,
    cursor: usize,
    entries: Vec<EntryDataV1>,
}

#[derive(Serialize, Deserialize)]
struct EntryDataV1 {
    description: String,
    png: Vec<u8>,
}

/// Write a session (geometry, stroke parameters and full history) to disk.
pub fn save_session(session: &Session, path: &Path) -> SketchResult<()> {
    let canvas = &session.canvas;
    let surface = canvas.surface();
    let params = canvas.params();
    let (display_width, display_height) = surface.display_size();

    let file = SessionFileV1 {
        magic: SESSION_MAGIC_V1.to_string(),
        id: session.id,
        name: session.name.clone(),
        display_width,
        display_height,
        scale: surface.scale(),
        background: params.background.0,
        color: params.color.0,
        line_width: params.line_width,
        filled_shapes: params.shape_style == ShapeStyle::Filled,
        max_entries: canvas.history().max_entries(),
        cursor: canvas.history().cursor(),
        entries: canvas
            .history()
            .entries()
            .iter()
            .map(|e| EntryDataV1 {
                description: e.description().to_string(),
                png: e.image().as_bytes().to_vec(),
            })
            .collect(),
    };

    let writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(writer, &file)?;
    tracing::info!(
        path = %path.display(),
        entries = file.entries.len(),
        "saved session"
    );
    Ok(())
}

/// Load a session file written by [`save_session`].
pub fn load_session(path: &Path) -> SketchResult<Session> {
    let raw = std::fs::read(path)?;
    if raw.len() < 12 {
        return Err(SketchError::Session("file too small".into()));
    }

    // bincode encodes a String as an 8-byte length prefix + UTF-8 data;
    // the 4-char magic therefore sits at bytes 8..12.
    let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("");
    if magic != SESSION_MAGIC_V1 {
        return Err(SketchError::Session(format!("unknown magic '{}'", magic)));
    }

    let file: SessionFileV1 = bincode::deserialize(&raw)?;

    if file.display_width == 0
        || file.display_height == 0
        || file.display_width > MAX_DISPLAY_DIM
        || file.display_height > MAX_DISPLAY_DIM
    {
        return Err(SketchError::Session(format!(
            "display size {}×{} out of range",
            file.display_width, file.display_height
        )));
    }
    if !(file.scale.is_finite() && file.scale > 0.0 && file.scale <= 8.0) {
        return Err(SketchError::Session(format!("device scale {} out of range", file.scale)));
    }
    if file.entries.is_empty() || file.entries.len() > MAX_ENTRIES {
        return Err(SketchError::Session(format!(
            "history entry count {} out of range",
            file.entries.len()
        )));
    }

    let entries: Vec<HistoryEntry> = file
        .entries
        .into_iter()
        .map(|e| HistoryEntry::new(e.description, EncodedImage::from_bytes(e.png)))
        .collect();
    let history = HistoryLog::from_parts(entries, file.cursor, file.max_entries)
        .ok_or_else(|| SketchError::Session(format!("cursor {} out of range", file.cursor)))?;

    let params = StrokeParams {
        color: Rgba(file.color),
        line_width: file.line_width.max(1),
        background: Rgba(file.background),
        shape_style: if file.filled_shapes {
            ShapeStyle::Filled
        } else {
            ShapeStyle::Outline
        },
    };

    let canvas = Canvas::from_parts(
        (file.display_width, file.display_height),
        file.scale,
        params,
        history,
    )?;

    let mut session = Session::from_file(path.to_path_buf(), canvas);
    session.id = file.id;
    if !file.name.is_empty() {
        session.name = file.name;
    }
    tracing::info!(path = %path.display(), id = %session.id, "loaded session");
    Ok(session)
}
