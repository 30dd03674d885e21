// ============================================================================
// GESTURE SCRIPTS — JSON step lists replayed against a canvas
// ============================================================================
//
// A script is either a bare array of steps or an object that also sets up
// the canvas:
//
//   {
//     "width": 64, "height": 48, "background": "#ffffff",
//     "steps": [
//       { "op": "tool", "tool": "rectangle" },
//       { "op": "shape_style", "style": "filled" },
//       { "op": "down", "x": 4, "y": 4 },
//       { "op": "up", "x": 20, "y": 12 },
//       { "op": "fill", "x": 0, "y": 0, "color": "rgb(255,0,0)" }
//     ]
//   }
//
// Coordinates are in display pixels, like live pointer input.

use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::color::parse_color;
use crate::error::{SketchError, SketchResult};
use crate::surface::Point;
use crate::tools::{Outcome, ShapeStyle, Tool};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Tool { tool: Tool },
    Color { color: String },
    Background { color: String },
    LineWidth { width: u32 },
    ShapeStyle { style: ShapeStyle },
    Down { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Up { x: f32, y: f32 },
    Leave,
    Abandon,
    Undo,
    Clear,
    Resize { width: u32, height: u32 },
    Scale { scale: f32 },
    Fill { x: f32, y: f32, color: String },
}

/// Parsed script: optional canvas setup plus the steps to replay.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub scale: Option<f32>,
    #[serde(default)]
    pub background: Option<String>,
    pub steps: Vec<ScriptStep>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptDocument {
    Steps(Vec<ScriptStep>),
    Full(Script),
}

/// Counters collected while replaying.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScriptReport {
    pub steps: usize,
    pub commits: usize,
    pub undos: usize,
    pub filled_pixels: usize,
    /// Steps the canvas declined (tool switch mid-gesture, zero resize, ...).
    pub refused: usize,
}

pub fn parse_script(text: &str) -> SketchResult<Script> {
    let doc: ScriptDocument =
        serde_json::from_str(text).map_err(|e| SketchError::Script(e.to_string()))?;
    Ok(match doc {
        ScriptDocument::Steps(steps) => Script {
            steps,
            ..Default::default()
        },
        ScriptDocument::Full(script) => script,
    })
}

/// Replay `steps` in order. Stops at the first step that errors (malformed
/// colors); refused steps are counted and skipped.
pub fn run_script(canvas: &mut Canvas, steps: &[ScriptStep]) -> SketchResult<ScriptReport> {
    let mut report = ScriptReport::default();

    for (index, step) in steps.iter().enumerate() {
        let accepted = apply_step(canvas, step, &mut report)
            .map_err(|e| SketchError::Script(format!("step {}: {}", index + 1, e)))?;
        if !accepted {
            tracing::warn!(step = index + 1, ?step, "step refused");
            report.refused += 1;
        }
        report.steps += 1;
    }

    tracing::debug!(?report, "script finished");
    Ok(report)
}

fn apply_step(canvas: &mut Canvas, step: &ScriptStep, report: &mut ScriptReport) -> SketchResult<bool> {
    let accepted = match step {
        ScriptStep::Tool { tool } => canvas.set_tool(*tool),
        ScriptStep::Color { color } => {
            canvas.set_color_spec(color)?;
            true
        }
        ScriptStep::Background { color } => {
            canvas.set_background(parse_color(color)?);
            true
        }
        ScriptStep::LineWidth { width } => {
            canvas.set_line_width(*width);
            true
        }
        ScriptStep::ShapeStyle { style } => {
            canvas.set_shape_style(*style);
            true
        }
        ScriptStep::Down { x, y } => outcome(report, canvas.pointer_down(Point::new(*x, *y))),
        ScriptStep::Move { x, y } => outcome(report, canvas.pointer_move(Point::new(*x, *y))),
        ScriptStep::Up { x, y } => outcome(report, canvas.pointer_up(Point::new(*x, *y))),
        ScriptStep::Leave => outcome(report, canvas.pointer_leave()),
        ScriptStep::Abandon => {
            canvas.abandon_gesture();
            true
        }
        ScriptStep::Undo => {
            if canvas.undo() {
                report.undos += 1;
            }
            true
        }
        ScriptStep::Clear => {
            canvas.clear();
            true
        }
        ScriptStep::Resize { width, height } => canvas.resize(*width, *height),
        ScriptStep::Scale { scale } => canvas.set_device_pixel_scale(*scale),
        ScriptStep::Fill { x, y, color } => {
            report.filled_pixels += canvas.fill_with_spec(Point::new(*x, *y), color)?;
            report.commits += 1;
            true
        }
    };
    Ok(accepted)
}

fn outcome(report: &mut ScriptReport, result: Outcome) -> bool {
    if result == Outcome::Committed {
        report.commits += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, WHITE, opaque};
    use crate::tools::StrokeParams;

    #[test]
    fn parses_bare_array_and_object_forms() {
        let bare = parse_script(r#"[{"op":"undo"},{"op":"down","x":1,"y":2.5}]"#).unwrap();
        assert_eq!(bare.width, None);
        assert_eq!(bare.steps, vec![ScriptStep::Undo, ScriptStep::Down { x: 1.0, y: 2.5 }]);

        let full = parse_script(
            r##"{"width": 12, "background": "#000000",
                 "steps": [{"op":"tool","tool":"circle"},{"op":"shape_style","style":"filled"}]}"##,
        )
        .unwrap();
        assert_eq!(full.width, Some(12));
        assert_eq!(full.height, None);
        assert_eq!(full.background.as_deref(), Some("#000000"));
        assert_eq!(
            full.steps,
            vec![
                ScriptStep::Tool { tool: Tool::Circle },
                ScriptStep::ShapeStyle { style: ShapeStyle::Filled },
            ]
        );
    }

    #[test]
    fn unknown_op_is_a_script_error() {
        assert!(matches!(
            parse_script(r#"[{"op":"teleport"}]"#),
            Err(SketchError::Script(_))
        ));
    }

    #[test]
    fn replays_rectangle_fill_and_undo() {
        let script = parse_script(
            r#"[
                {"op":"tool","tool":"rectangle"},
                {"op":"shape_style","style":"filled"},
                {"op":"down","x":2,"y":2},
                {"op":"up","x":7,"y":7},
                {"op":"fill","x":0,"y":0,"color":"rgb(255,0,0)"}
            ]"#,
        )
        .unwrap();
        let mut canvas = Canvas::new(10, 10, 1.0, StrokeParams::default());
        let report = run_script(&mut canvas, &script.steps).unwrap();
        assert_eq!(report.steps, 5);
        assert_eq!(report.commits, 2);
        assert_eq!(report.filled_pixels, 100 - 25);
        assert_eq!(canvas.surface().get_pixel(0, 0), Some(opaque(255, 0, 0)));
        assert_eq!(canvas.surface().get_pixel(4, 4), Some(BLACK));

        let report = run_script(&mut canvas, &[ScriptStep::Undo, ScriptStep::Undo]).unwrap();
        assert_eq!(report.undos, 2);
        assert!(canvas.surface().image().pixels().all(|px| *px == WHITE));
    }

    #[test]
    fn refused_steps_are_counted() {
        let mut canvas = Canvas::new(4, 4, 1.0, StrokeParams::default());
        let steps = [
            ScriptStep::Down { x: 1.0, y: 1.0 },
            ScriptStep::Tool { tool: Tool::Line },
            ScriptStep::Up { x: 2.0, y: 2.0 },
            ScriptStep::Resize { width: 0, height: 4 },
        ];
        let report = run_script(&mut canvas, &steps).unwrap();
        assert_eq!(report.refused, 2);
        assert_eq!(canvas.tool(), Tool::Pencil);
    }

    #[test]
    fn bad_color_stops_replay() {
        let mut canvas = Canvas::new(4, 4, 1.0, StrokeParams::default());
        let steps = [
            ScriptStep::Color { color: "#12".into() },
            ScriptStep::Clear,
        ];
        let err = run_script(&mut canvas, &steps).unwrap_err();
        assert!(err.to_string().contains("step 1"));
        assert_eq!(canvas.history().len(), 1);
    }
}
