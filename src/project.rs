use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::canvas::Canvas;
use crate::config::SketchConfig;
use crate::error::SketchResult;
use crate::io;

/// Single open drawing.
pub struct Session {
    pub id: Uuid,
    pub canvas: Canvas,
    /// `None` for sessions never saved to disk.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,

    /// Display name (derived from path or "Untitled-X")
    pub name: String,
}

impl Session {
    pub fn new_untitled(untitled_counter: usize, config: &SketchConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            canvas: Canvas::from_config(config),
            path: None,
            is_dirty: false,
            name: format!("Untitled-{}", untitled_counter),
        }
    }

    pub fn from_file(path: PathBuf, canvas: Canvas) -> Self {
        let name = display_name(&path);
        Self {
            id: Uuid::new_v4(),
            canvas,
            path: Some(path),
            is_dirty: false,
            name,
        }
    }

    pub fn open(path: &Path) -> SketchResult<Self> {
        io::load_session(path)
    }

    /// Write to `path` and adopt it as the session's location.
    pub fn save_as(&mut self, path: &Path) -> SketchResult<()> {
        self.path = Some(path.to_path_buf());
        self.name = display_name(path);
        io::save_session(self, path)?;
        self.mark_clean();
        Ok(())
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    /// Get the display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}
