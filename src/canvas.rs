// ============================================================================
// CANVAS — the surface, its history and the tool engine behind one façade
// ============================================================================

use std::path::Path;

use image::Rgba;

use crate::color::parse_color;
use crate::config::SketchConfig;
use crate::error::{SketchError, SketchResult};
use crate::fill::flood_fill_spec;
use crate::history::{HistoryEntry, HistoryLog};
use crate::io::ExportFormat;
use crate::surface::{PixelSurface, Point};
use crate::tools::{Outcome, ShapeStyle, StrokeParams, Tool, ToolEngine};

const BLANK_DESCRIPTION: &str = "Blank";

/// Everything a UI layer needs: pointer input, stroke parameters, undo,
/// clear, resize and export. All methods run on the caller's thread.
pub struct Canvas {
    surface: PixelSurface,
    history: HistoryLog,
    engine: ToolEngine,
    params: StrokeParams,
}

impl Canvas {
    /// A cleared canvas with its blank state recorded as history entry 0.
    pub fn new(display_width: u32, display_height: u32, scale: f32, params: StrokeParams) -> Self {
        Self::with_history_limit(display_width, display_height, scale, params, 0)
    }

    pub fn with_history_limit(
        display_width: u32,
        display_height: u32,
        scale: f32,
        params: StrokeParams,
        history_limit: usize,
    ) -> Self {
        let surface = PixelSurface::new(display_width, display_height, scale, params.background);
        let mut canvas = Self {
            surface,
            history: HistoryLog::new(history_limit),
            engine: ToolEngine::new(Tool::Pencil),
            params,
        };
        canvas.seed_blank();
        tracing::info!(
            width = canvas.surface.width(),
            height = canvas.surface.height(),
            scale = canvas.surface.scale(),
            "canvas created"
        );
        canvas
    }

    pub fn from_config(config: &SketchConfig) -> Self {
        let mut canvas = Self::with_history_limit(
            config.display_width,
            config.display_height,
            config.device_pixel_scale,
            config.stroke_params(),
            config.history_limit,
        );
        canvas.engine = ToolEngine::new(config.tool);
        canvas
    }

    /// Rebuild a canvas around an existing history, showing the entry at
    /// the history cursor.
    pub fn from_parts(
        display: (u32, u32),
        scale: f32,
        params: StrokeParams,
        history: HistoryLog,
    ) -> SketchResult<Self> {
        let mut surface = PixelSurface::new(display.0, display.1, scale, params.background);
        let current = history
            .current()
            .ok_or_else(|| SketchError::Session("history is empty".into()))?;
        surface.restore_encoded(current.image())?;
        Ok(Self {
            surface,
            history,
            engine: ToolEngine::default(),
            params,
        })
    }

    fn seed_blank(&mut self) {
        self.surface.clear(self.params.background);
        match self.surface.snapshot_encoded() {
            Ok(image) => self.history.reset(HistoryEntry::new(BLANK_DESCRIPTION, image)),
            Err(e) => tracing::error!(error = %e, "failed to encode blank canvas"),
        }
    }

    // ---- accessors ----------------------------------------------------------

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn params(&self) -> &StrokeParams {
        &self.params
    }

    pub fn tool(&self) -> Tool {
        self.engine.tool()
    }

    pub fn is_gesture_active(&self) -> bool {
        self.engine.is_active()
    }

    pub fn is_floating(&self) -> bool {
        self.engine.is_floating()
    }

    // ---- parameters ---------------------------------------------------------

    /// Returns `false` if a gesture is in progress.
    pub fn set_tool(&mut self, tool: Tool) -> bool {
        self.engine.select_tool(tool)
    }

    pub fn set_color(&mut self, color: Rgba<u8>) {
        self.params.color = Rgba([color[0], color[1], color[2], 255]);
    }

    /// Parse and apply a color; the current color is kept on error.
    pub fn set_color_spec(&mut self, spec: &str) -> SketchResult<()> {
        let color = parse_color(spec)?;
        self.set_color(color);
        Ok(())
    }

    pub fn set_line_width(&mut self, width: u32) {
        self.params.line_width = width.max(1);
    }

    pub fn set_shape_style(&mut self, style: ShapeStyle) {
        self.params.shape_style = style;
    }

    /// Change the background color. While the history still sits at the
    /// blank entry the canvas is re-cleared and that entry re-seeded.
    pub fn set_background(&mut self, color: Rgba<u8>) {
        let color = Rgba([color[0], color[1], color[2], 255]);
        self.params.background = color;
        self.surface.set_background(color);
        if self.at_blank_entry() && !self.engine.is_active() && !self.engine.is_floating() {
            self.seed_blank();
        }
    }

    fn at_blank_entry(&self) -> bool {
        self.history.cursor() == 0
            && self
                .history
                .current()
                .is_some_and(|e| e.description() == BLANK_DESCRIPTION)
    }

    // ---- pointer input ------------------------------------------------------

    pub fn pointer_down(&mut self, point: Point) -> Outcome {
        self.engine
            .pointer_down(&mut self.surface, &mut self.history, &self.params, point)
    }

    pub fn pointer_move(&mut self, point: Point) -> Outcome {
        self.engine.pointer_move(&mut self.surface, point)
    }

    pub fn pointer_up(&mut self, point: Point) -> Outcome {
        self.engine
            .pointer_up(&mut self.surface, &mut self.history, point)
    }

    pub fn pointer_leave(&mut self) -> Outcome {
        self.engine.pointer_leave(&mut self.surface, &mut self.history)
    }

    pub fn abandon_gesture(&mut self) -> bool {
        self.engine.abandon(&mut self.surface)
    }

    /// Fill at `point` with a textual color, independent of the active
    /// tool. A malformed color aborts before anything is touched.
    pub fn fill_with_spec(&mut self, point: Point, spec: &str) -> SketchResult<usize> {
        let (x, y) = self.surface.to_buffer_pixel(point);
        let filled = flood_fill_spec(self.surface.image_mut(), x, y, spec)?;
        let image = self.surface.snapshot_encoded()?;
        self.history.push(HistoryEntry::new(Tool::Fill.label(), image));
        Ok(filled)
    }

    // ---- history ------------------------------------------------------------

    /// Step back one history entry and show it. A gesture in progress is
    /// abandoned first; a floating region is cancelled instead of stepping
    /// back, returning the canvas to the last committed state. Returns
    /// `false` at the blank state.
    pub fn undo(&mut self) -> bool {
        self.engine.abandon(&mut self.surface);
        if self.engine.discard_floating() {
            self.restore_current();
            tracing::debug!("undo cancelled floating region");
            return true;
        }

        // The cursor only moves once the previous entry is on the surface.
        let Some(entry) = self.history.previous().cloned() else {
            return false;
        };

        match self
            .surface
            .decode_for_restore(entry.image())
            .map(|pending| self.surface.apply_restore(pending))
        {
            Ok(true) => {
                self.history.undo();
                tracing::debug!(cursor = self.history.cursor(), "undo");
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::error!(error = %e, "failed to decode history entry");
                false
            }
        }
    }

    fn restore_current(&mut self) {
        if let Some(entry) = self.history.current().cloned()
            && let Err(e) = self.surface.restore_encoded(entry.image())
        {
            tracing::error!(error = %e, "failed to restore current history entry");
        }
    }

    /// Fill with the background and record the cleared state.
    pub fn clear(&mut self) {
        self.engine.abandon(&mut self.surface);
        self.engine.discard_floating();
        self.surface.clear(self.params.background);
        match self.surface.snapshot_encoded() {
            Ok(image) => self.history.push(HistoryEntry::new("Clear", image)),
            Err(e) => tracing::error!(error = %e, "failed to encode cleared canvas"),
        }
    }

    // ---- geometry -----------------------------------------------------------

    /// Resize the display area. Zero sizes are refused.
    pub fn resize(&mut self, display_width: u32, display_height: u32) -> bool {
        self.surface.resize(display_width, display_height)
    }

    pub fn set_device_pixel_scale(&mut self, scale: f32) -> bool {
        self.surface.set_device_pixel_scale(scale)
    }

    // ---- export -------------------------------------------------------------

    pub fn encode_png(&self) -> SketchResult<Vec<u8>> {
        self.surface.encode_png()
    }

    pub fn export(&self, path: &Path, format: ExportFormat) -> SketchResult<()> {
        self.surface.export(path, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, WHITE, opaque};
    use crate::surface::EncodedImage;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    fn canvas(w: u32, h: u32) -> Canvas {
        Canvas::new(w, h, 1.0, StrokeParams::default())
    }

    #[test]
    fn starts_with_blank_entry() {
        let c = canvas(8, 8);
        assert_eq!(c.history().len(), 1);
        assert_eq!(c.history().cursor(), 0);
        assert!(c.surface().image().pixels().all(|px| *px == WHITE));
    }

    #[test]
    fn background_change_reseeds_blank_state() {
        let mut c = canvas(4, 4);
        c.set_background(opaque(10, 20, 30));
        assert_eq!(c.history().len(), 1);
        assert_eq!(c.surface().get_pixel(0, 0), Some(opaque(10, 20, 30)));

        c.pointer_down(p(0.5, 0.5));
        c.pointer_up(p(3.5, 0.5));
        c.set_background(WHITE);
        assert_eq!(c.history().len(), 2);
        assert_eq!(c.surface().get_pixel(2, 2), Some(opaque(10, 20, 30)));
    }

    #[test]
    fn clear_pushes_history() {
        let mut c = canvas(4, 4);
        c.pointer_down(p(0.5, 0.5));
        c.pointer_move(p(3.5, 3.5));
        c.pointer_up(p(3.5, 3.5));
        c.clear();
        assert_eq!(c.history().len(), 3);
        assert!(c.surface().image().pixels().all(|px| *px == WHITE));
        assert!(c.undo());
        assert!(c.surface().image().pixels().any(|px| *px == BLACK));
    }

    #[test]
    fn undo_at_blank_is_noop() {
        let mut c = canvas(4, 4);
        assert!(!c.undo());
        assert_eq!(c.history().cursor(), 0);
    }

    #[test]
    fn malformed_fill_color_aborts() {
        let mut c = canvas(4, 4);
        assert!(c.fill_with_spec(p(1.0, 1.0), "rgb(1,2)").is_err());
        assert_eq!(c.history().len(), 1);
        assert!(c.surface().image().pixels().all(|px| *px == WHITE));
        assert_eq!(c.fill_with_spec(p(1.0, 1.0), "#00ff00").unwrap(), 16);
        assert_eq!(c.history().len(), 2);
    }

    #[test]
    fn undo_while_floating_cancels_move() {
        let mut c = canvas(10, 10);
        c.set_color(opaque(200, 0, 0));
        c.set_shape_style(ShapeStyle::Filled);
        c.set_tool(Tool::Rectangle);
        c.pointer_down(p(1.0, 1.0));
        c.pointer_up(p(4.0, 4.0));
        let drawn = c.surface().image().clone();

        c.set_tool(Tool::Move);
        c.pointer_down(p(0.0, 0.0));
        c.pointer_up(p(5.0, 5.0));
        assert!(c.is_floating());
        assert!(c.undo());
        assert!(!c.is_floating());
        assert_eq!(c.surface().image(), &drawn);
        assert_eq!(c.history().cursor(), 1);

        assert!(c.undo());
        assert!(c.surface().image().pixels().all(|px| *px == WHITE));
    }

    #[test]
    fn capped_history_keeps_blank_base_and_drawing() {
        let params = StrokeParams {
            line_width: 1,
            ..Default::default()
        };
        let mut c = Canvas::with_history_limit(8, 8, 1.0, params, 3);
        for row in [0.5, 2.5, 4.5, 6.5] {
            c.pointer_down(p(0.5, row));
            c.pointer_move(p(7.5, row));
            c.pointer_up(p(7.5, row));
        }
        assert_eq!(c.history().len(), 3);
        assert_eq!(c.history().entries()[0].description(), BLANK_DESCRIPTION);

        assert!(c.undo());
        let drawn = c.surface().image().clone();
        assert!(drawn.pixels().any(|px| *px == BLACK));
        c.set_background(opaque(10, 20, 30));
        assert_eq!(c.history().len(), 3);
        assert_eq!(c.surface().image(), &drawn);

        assert!(c.undo());
        assert!(c.surface().image().pixels().all(|px| *px == WHITE));
        assert!(!c.undo());

        c.set_background(opaque(10, 20, 30));
        assert_eq!(c.history().len(), 1);
        assert_eq!(c.surface().get_pixel(3, 3), Some(opaque(10, 20, 30)));
    }

    #[test]
    fn failed_undo_decode_keeps_cursor() {
        let good = PixelSurface::new(4, 4, 1.0, BLACK).snapshot_encoded().unwrap();
        let history = HistoryLog::from_parts(
            vec![
                HistoryEntry::new(
                    BLANK_DESCRIPTION,
                    EncodedImage::from_bytes(b"not a png".to_vec()),
                ),
                HistoryEntry::new("Pencil", good),
            ],
            1,
            0,
        )
        .unwrap();
        let mut c = Canvas::from_parts((4, 4), 1.0, StrokeParams::default(), history).unwrap();
        assert!(!c.undo());
        assert_eq!(c.history().cursor(), 1);
        assert!(c.surface().image().pixels().all(|px| *px == BLACK));
    }

    #[test]
    fn set_color_forces_opaque() {
        let mut c = canvas(2, 2);
        c.set_color(Rgba([1, 2, 3, 4]));
        assert_eq!(c.params().color, opaque(1, 2, 3));
        assert!(c.set_color_spec("nope").is_err());
        assert_eq!(c.params().color, opaque(1, 2, 3));
    }
}
