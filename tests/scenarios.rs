//! End-to-end drawing scenarios through the public `Canvas` API.

use image::Rgba;
use sketchpad::color::{BLACK, WHITE, opaque};
use sketchpad::config::SketchConfig;
use sketchpad::project::Session;
use sketchpad::script::{parse_script, run_script};
use sketchpad::{Canvas, Outcome, Point, ShapeStyle, StrokeParams, Tool};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

fn p(x: f32, y: f32) -> Point {
    Point::new(x, y)
}

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas::new(w, h, 1.0, StrokeParams::default())
}

fn stroke(c: &mut Canvas, tool: Tool, from: Point, to: Point) {
    assert!(c.set_tool(tool));
    c.pointer_down(from);
    c.pointer_move(to);
    assert_eq!(c.pointer_up(to), Outcome::Committed);
}

#[test]
fn rectangle_fill_then_undo_twice() {
    let mut c = canvas(10, 10);
    c.set_shape_style(ShapeStyle::Filled);
    stroke(&mut c, Tool::Rectangle, p(2.0, 2.0), p(7.0, 7.0));
    let after_rect = c.surface().image().clone();

    c.set_color(RED);
    assert!(c.set_tool(Tool::Fill));
    assert_eq!(c.pointer_down(p(0.0, 0.0)), Outcome::Committed);

    for y in 0..10 {
        for x in 0..10 {
            let inside = (2..7).contains(&x) && (2..7).contains(&y);
            let want = if inside { BLACK } else { RED };
            assert_eq!(c.surface().get_pixel(x, y), Some(want), "pixel ({x}, {y})");
        }
    }

    assert!(c.undo());
    assert_eq!(c.surface().image(), &after_rect);
    assert!(c.undo());
    assert!(c.surface().image().pixels().all(|px| *px == WHITE));
    assert!(!c.undo());
}

#[test]
fn eraser_restores_background_exactly() {
    let bg = opaque(30, 60, 90);
    let mut c = Canvas::new(
        12,
        12,
        1.0,
        StrokeParams {
            background: bg,
            ..Default::default()
        },
    );
    c.set_color(opaque(250, 250, 0));
    c.set_line_width(1);
    stroke(&mut c, Tool::Pencil, p(1.5, 5.5), p(8.5, 5.5));
    assert!(c.surface().image().pixels().any(|px| *px != bg));

    c.set_line_width(3);
    stroke(&mut c, Tool::Eraser, p(1.5, 5.5), p(8.5, 5.5));
    assert!(c.surface().image().pixels().all(|px| *px == bg));
}

#[test]
fn move_dropped_at_origin_reproduces_canvas() {
    let mut c = canvas(16, 16);
    c.set_color(opaque(0, 128, 255));
    c.set_line_width(2);
    stroke(&mut c, Tool::Pencil, p(2.0, 2.0), p(9.0, 6.0));
    c.set_shape_style(ShapeStyle::Filled);
    stroke(&mut c, Tool::Circle, p(5.0, 5.0), p(8.0, 5.0));
    let before = c.surface().image().clone();

    assert!(c.set_tool(Tool::Move));
    c.pointer_down(p(1.0, 1.0));
    c.pointer_move(p(10.0, 10.0));
    assert_eq!(c.pointer_up(p(10.0, 10.0)), Outcome::Detached);
    assert!(c.is_floating());
    assert_ne!(c.surface().image(), &before);

    c.pointer_move(p(12.0, 3.0));
    assert_eq!(c.pointer_down(p(1.0, 1.0)), Outcome::Committed);
    assert!(!c.is_floating());
    assert_eq!(c.surface().image(), &before);
    assert_eq!(c.history().current().map(|e| e.description()), Some("Move"));
}

#[test]
fn redo_branch_is_discarded_after_new_commit() {
    let mut c = canvas(8, 8);
    stroke(&mut c, Tool::Line, p(0.5, 0.5), p(7.5, 0.5));
    stroke(&mut c, Tool::Line, p(0.5, 3.5), p(7.5, 3.5));
    assert!(c.undo());
    stroke(&mut c, Tool::Line, p(0.5, 6.5), p(7.5, 6.5));

    assert_eq!(c.history().len(), 3);
    assert_eq!(c.history().descriptions(), vec!["Line", "Line", "Blank"]);
    assert_eq!(c.surface().get_pixel(3, 3), Some(WHITE));
    assert_eq!(c.surface().get_pixel(3, 6), Some(BLACK));

    assert!(c.undo());
    assert_eq!(c.surface().get_pixel(3, 6), Some(WHITE));
    assert_eq!(c.surface().get_pixel(3, 3), Some(WHITE));
    assert_eq!(c.surface().get_pixel(3, 0), Some(BLACK));
}

#[test]
fn device_scale_maps_display_points() {
    let mut c = Canvas::new(5, 5, 2.0, StrokeParams::default());
    assert_eq!(c.surface().width(), 10);
    c.set_shape_style(ShapeStyle::Filled);
    stroke(&mut c, Tool::Rectangle, p(1.0, 1.0), p(2.0, 2.0));
    assert_eq!(c.surface().get_pixel(2, 2), Some(BLACK));
    assert_eq!(c.surface().get_pixel(3, 3), Some(BLACK));
    assert_eq!(c.surface().get_pixel(4, 4), Some(WHITE));
    assert_eq!(c.surface().get_pixel(1, 1), Some(WHITE));
}

#[test]
fn undo_across_resize_shows_older_entry_over_background() {
    let mut c = canvas(4, 4);
    c.set_shape_style(ShapeStyle::Filled);
    stroke(&mut c, Tool::Rectangle, p(0.0, 0.0), p(2.0, 2.0));
    assert!(c.resize(8, 8));
    stroke(&mut c, Tool::Rectangle, p(5.0, 5.0), p(7.0, 7.0));
    assert_eq!(c.surface().get_pixel(6, 6), Some(BLACK));

    assert!(c.undo());
    assert_eq!(c.surface().display_size(), (8, 8));
    assert_eq!(c.surface().get_pixel(1, 1), Some(BLACK));
    assert_eq!(c.surface().get_pixel(6, 6), Some(WHITE));
}

#[test]
fn session_file_round_trip() {
    let config = SketchConfig {
        display_width: 20,
        display_height: 14,
        ..Default::default()
    };
    let mut session = Session::new_untitled(3, &config);
    assert_eq!(session.display_title(), "Untitled-3");
    session.canvas.set_shape_style(ShapeStyle::Filled);
    stroke(&mut session.canvas, Tool::Rectangle, p(3.0, 3.0), p(12.0, 9.0));
    stroke(&mut session.canvas, Tool::Line, p(0.5, 12.5), p(19.5, 12.5));
    assert!(session.canvas.undo());
    session.mark_dirty();
    assert_eq!(session.display_title(), "Untitled-3*");

    let path = std::env::temp_dir().join(format!("sketchpad-{}.sketch", session.id));
    session.save_as(&path).unwrap();
    assert!(!session.is_dirty);

    let loaded = Session::open(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.id, session.id);
    assert_eq!(loaded.name, session.name);
    assert_eq!(loaded.canvas.surface().image(), session.canvas.surface().image());
    assert_eq!(loaded.canvas.surface().display_size(), (20, 14));
    assert_eq!(loaded.canvas.history().len(), 3);
    assert_eq!(loaded.canvas.history().cursor(), 1);
    assert_eq!(loaded.canvas.params().shape_style, ShapeStyle::Filled);
    assert_eq!(loaded.canvas.history().max_entries(), config.history_limit);
}

#[test]
fn script_replay_matches_live_input() {
    let script = parse_script(
        r#"[
            {"op":"line_width","width":1},
            {"op":"tool","tool":"line"},
            {"op":"down","x":0.5,"y":0.5},
            {"op":"move","x":3.5,"y":3.5},
            {"op":"up","x":7.5,"y":0.5}
        ]"#,
    )
    .unwrap();
    let mut scripted = canvas(8, 8);
    let report = run_script(&mut scripted, &script.steps).unwrap();
    assert_eq!(report.commits, 1);

    let mut live = canvas(8, 8);
    live.set_line_width(1);
    live.set_tool(Tool::Line);
    live.pointer_down(p(0.5, 0.5));
    live.pointer_move(p(3.5, 3.5));
    live.pointer_up(p(7.5, 0.5));

    assert_eq!(scripted.surface().image(), live.surface().image());
    assert_eq!(scripted.surface().get_pixel(3, 3), Some(WHITE));
}
