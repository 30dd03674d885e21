use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::color::{BLACK, WHITE};
use crate::fill::flood_fill;
use crate::history::{HistoryEntry, HistoryLog};
use crate::raster::{self, Composite, Pen};
use crate::surface::{PixelSurface, Point, Snapshot};
use crate::transfer::{RegionTransfer, SelectionRect};

/// Dash length of the move-selection marquee, in buffer pixels.
const MARQUEE_DASH: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pencil,
    Eraser,
    Line,
    Rectangle,
    Circle,
    Move,
    Fill,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Eraser => "Eraser",
            Tool::Line => "Line",
            Tool::Rectangle => "Rectangle",
            Tool::Circle => "Circle",
            Tool::Move => "Move",
            Tool::Fill => "Fill",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::Pencil,
            Tool::Eraser,
            Tool::Line,
            Tool::Rectangle,
            Tool::Circle,
            Tool::Move,
            Tool::Fill,
        ]
    }

    /// Tools that preview by restoring a gesture snapshot every frame.
    fn uses_snapshot(&self) -> bool {
        matches!(self, Tool::Line | Tool::Rectangle | Tool::Circle | Tool::Move)
    }
}

/// Whether rectangles and circles are stroked or solid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeStyle {
    #[default]
    Outline,
    Filled,
}

/// Drawing parameters. A copy is taken when a gesture starts and used for
/// the rest of that gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeParams {
    pub color: Rgba<u8>,
    /// Line width in display pixels.
    pub line_width: u32,
    pub background: Rgba<u8>,
    pub shape_style: ShapeStyle,
}

impl Default for StrokeParams {
    fn default() -> Self {
        Self {
            color: BLACK,
            line_width: 2,
            background: WHITE,
            shape_style: ShapeStyle::Outline,
        }
    }
}

impl StrokeParams {
    fn pen(&self, tool: Tool, scale: f32) -> Pen {
        let width = self.line_width.max(1) as f32 * scale;
        match tool {
            Tool::Eraser => Pen::new(self.background, width, Composite::Replace),
            _ => Pen::new(self.color, width, Composite::SourceOver),
        }
    }
}

/// What a pointer event did, reported back to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The event had no effect in the current state.
    Ignored,
    /// A drag gesture began.
    Started,
    /// The buffer was redrawn without committing.
    Previewed,
    /// The gesture finished and a history entry was written.
    Committed,
    /// A move selection ended as a floating region (no history entry).
    Detached,
    /// The gesture ended without changing anything.
    Aborted,
}

struct ActiveGesture {
    tool: Tool,
    params: StrokeParams,
    start: (f32, f32),
    last: (f32, f32),
    snapshot: Option<Snapshot>,
}

/// Interprets pointer gestures for the active tool.
///
/// States are `Idle` and `Active(tool)`; a floating move region lives
/// alongside them and survives the return to `Idle`.
#[derive(Default)]
pub struct ToolEngine {
    tool: Tool,
    active: Option<ActiveGesture>,
    transfer: RegionTransfer,
}

impl ToolEngine {
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            ..Default::default()
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools. Refused while a gesture is in progress.
    pub fn select_tool(&mut self, tool: Tool) -> bool {
        if let Some(active) = &self.active {
            tracing::warn!(
                current = active.tool.label(),
                requested = tool.label(),
                "tool change refused during gesture"
            );
            return false;
        }
        self.tool = tool;
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_floating(&self) -> bool {
        self.transfer.is_floating()
    }

    pub fn transfer(&self) -> &RegionTransfer {
        &self.transfer
    }

    // ---- pointer input ------------------------------------------------------

    pub fn pointer_down(
        &mut self,
        surface: &mut PixelSurface,
        history: &mut HistoryLog,
        params: &StrokeParams,
        point: Point,
    ) -> Outcome {
        if self.transfer.is_floating() {
            let at = surface.to_buffer_pixel(point);
            self.transfer.commit(surface, at);
            self.tool = Tool::Pencil;
            commit(surface, history, Tool::Move);
            return Outcome::Committed;
        }

        if self.active.is_some() {
            return Outcome::Ignored;
        }

        if self.tool == Tool::Fill {
            let (x, y) = surface.to_buffer_pixel(point);
            let filled = flood_fill(surface.image_mut(), x, y, params.color);
            tracing::debug!(x, y, filled, "fill click");
            commit(surface, history, Tool::Fill);
            return Outcome::Committed;
        }

        let start = surface.to_buffer(point);
        let snapshot = self.tool.uses_snapshot().then(|| surface.snapshot());
        self.active = Some(ActiveGesture {
            tool: self.tool,
            params: *params,
            start,
            last: start,
            snapshot,
        });
        Outcome::Started
    }

    pub fn pointer_move(&mut self, surface: &mut PixelSurface, point: Point) -> Outcome {
        if self.active.is_none() && self.transfer.is_floating() {
            let at = surface.to_buffer_pixel(point);
            self.transfer.preview(surface, at);
            return Outcome::Previewed;
        }

        let Some(active) = self.active.as_mut() else {
            return Outcome::Ignored;
        };
        let current = surface.to_buffer(point);
        let scale = surface.scale();

        match active.tool {
            Tool::Pencil | Tool::Eraser => {
                let pen = active.params.pen(active.tool, scale);
                raster::stroke_segment(surface.image_mut(), active.last, current, &pen);
            }
            Tool::Line | Tool::Rectangle | Tool::Circle => {
                if let Some(snapshot) = &active.snapshot {
                    surface.restore_snapshot(snapshot);
                }
                draw_shape(surface, active, current);
            }
            Tool::Move => {
                if let Some(snapshot) = &active.snapshot {
                    surface.restore_snapshot(snapshot);
                }
                raster::dashed_rect(
                    surface.image_mut(),
                    active.start,
                    current,
                    active.params.color,
                    MARQUEE_DASH,
                );
            }
            Tool::Fill => return Outcome::Ignored,
        }
        active.last = current;
        Outcome::Previewed
    }

    pub fn pointer_up(
        &mut self,
        surface: &mut PixelSurface,
        history: &mut HistoryLog,
        point: Point,
    ) -> Outcome {
        if self.active.is_none() {
            return Outcome::Ignored;
        }
        let end = surface.to_buffer(point);
        self.finish(surface, history, end)
    }

    /// The pointer left the surface: end the gesture at the last known point.
    pub fn pointer_leave(&mut self, surface: &mut PixelSurface, history: &mut HistoryLog) -> Outcome {
        let Some(active) = &self.active else {
            return Outcome::Ignored;
        };
        let end = active.last;
        self.finish(surface, history, end)
    }

    /// Cancel the gesture in progress without committing. Shape and move
    /// previews are erased; freehand pixels already laid down stay.
    pub fn abandon(&mut self, surface: &mut PixelSurface) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        if let Some(snapshot) = &active.snapshot {
            surface.restore_snapshot(snapshot);
        }
        tracing::debug!(tool = active.tool.label(), "gesture abandoned");
        true
    }

    /// Drop a floating region without committing it. The hole left by the
    /// detach stays on the surface until the caller restores history.
    pub fn discard_floating(&mut self) -> bool {
        std::mem::take(&mut self.transfer).is_floating()
    }

    fn finish(&mut self, surface: &mut PixelSurface, history: &mut HistoryLog, end: (f32, f32)) -> Outcome {
        let Some(mut active) = self.active.take() else {
            return Outcome::Ignored;
        };
        let scale = surface.scale();

        match active.tool {
            Tool::Pencil | Tool::Eraser => {
                if active.last != end {
                    let pen = active.params.pen(active.tool, scale);
                    raster::stroke_segment(surface.image_mut(), active.last, end, &pen);
                }
                commit(surface, history, active.tool);
                Outcome::Committed
            }
            Tool::Line | Tool::Rectangle | Tool::Circle => {
                if let Some(snapshot) = &active.snapshot {
                    surface.restore_snapshot(snapshot);
                }
                active.last = end;
                draw_shape(surface, &active, end);
                commit(surface, history, active.tool);
                Outcome::Committed
            }
            Tool::Move => {
                if let Some(snapshot) = &active.snapshot {
                    surface.restore_snapshot(snapshot);
                }
                let Some(rect) = SelectionRect::from_drag(active.start, end) else {
                    tracing::debug!(start = ?active.start, ?end, "move selection too small, ignoring");
                    return Outcome::Aborted;
                };
                self.transfer.detach(surface, rect, active.params.background);
                Outcome::Detached
            }
            Tool::Fill => Outcome::Ignored,
        }
    }
}

fn draw_shape(surface: &mut PixelSurface, active: &ActiveGesture, current: (f32, f32)) {
    let pen = active.params.pen(active.tool, surface.scale());
    let filled = active.params.shape_style == ShapeStyle::Filled;
    let start = active.start;
    let img = surface.image_mut();

    match active.tool {
        Tool::Line => raster::stroke_segment(img, start, current, &pen),
        Tool::Rectangle if filled => {
            raster::rect_filled(img, start, current, pen.color, pen.composite)
        }
        Tool::Rectangle => raster::rect_outline(img, start, current, &pen),
        Tool::Circle => {
            let (dx, dy) = (current.0 - start.0, current.1 - start.1);
            let radius = (dx * dx + dy * dy).sqrt();
            if filled {
                raster::circle_filled(img, start, radius, pen.color, pen.composite);
            } else {
                raster::circle_outline(img, start, radius, &pen);
            }
        }
        _ => {}
    }
}

/// Encode the surface and push it as a new history entry.
fn commit(surface: &PixelSurface, history: &mut HistoryLog, tool: Tool) {
    match surface.snapshot_encoded() {
        Ok(image) => {
            history.push(HistoryEntry::new(tool.label(), image));
            tracing::debug!(tool = tool.label(), depth = history.len(), "history commit");
        }
        Err(e) => tracing::error!(tool = tool.label(), error = %e, "failed to encode history entry"),
    }
}
