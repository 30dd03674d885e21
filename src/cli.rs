// ============================================================================
// Sketchpad CLI — headless replay of gesture scripts
// ============================================================================
//
// Usage examples:
//   sketchpad --input house.json --output house.png
//   sketchpad -i strokes/*.json --output-dir renders/ --format bmp
//   sketchpad -i demo.json -o demo.png --session        (also writes demo.sketch)
//   sketchpad -i demo.json -o demo.png --width 320 --height 240 --scale 2
//
// Everything runs synchronously on the current thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::config::SketchConfig;
use crate::io::ExportFormat;
use crate::project::Session;
use crate::script::{parse_script, run_script};

/// Sketchpad headless renderer.
///
/// Replays JSON gesture scripts against a fresh canvas and writes the result.
#[derive(Parser, Debug)]
#[command(
    name = "sketchpad",
    version,
    about = "Replay sketchpad gesture scripts and export the drawings",
    long_about = "Replay JSON gesture scripts (pointer down/move/up, tool and color\n\
                  changes, fills, undo) against a fresh canvas and export the result\n\
                  as PNG, BMP or TGA, optionally with a .sketch session file.\n\n\
                  Example:\n  \
                  sketchpad --input house.json --output house.png\n  \
                  sketchpad -i strokes/*.json --output-dir renders/ --format png"
)]
pub struct CliArgs {
    /// Script file(s). Glob patterns accepted (e.g. "scripts/*.json").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output image path. Only valid for a single input; use --output-dir for batches.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory; files are named after the script stem.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, bmp, tga. Inferred from --output when omitted.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Canvas width in display pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Canvas height in display pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Device pixel scale (buffer pixels per display pixel).
    #[arg(long)]
    pub scale: Option<f32>,

    /// Background color (#rgb, #rrggbb or rgb(r,g,b)).
    #[arg(long, value_name = "COLOR")]
    pub background: Option<String>,

    /// Initial drawing color.
    #[arg(long, value_name = "COLOR")]
    pub color: Option<String>,

    /// Initial line width in display pixels.
    #[arg(long)]
    pub line_width: Option<u32>,

    /// Settings file; defaults to the platform config location.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write a .sketch session file next to each output image.
    #[arg(long)]
    pub session: bool,

    /// Print per-file statistics and timing.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Config file values with any command-line overrides applied.
    pub fn effective_config(&self) -> SketchConfig {
        let mut config = SketchConfig::load_or_default(self.config.as_deref());
        if let Some(w) = self.width {
            config.display_width = w;
        }
        if let Some(h) = self.height {
            config.display_height = h;
        }
        if let Some(s) = self.scale {
            config.device_pixel_scale = s;
        }
        if let Some(bg) = &self.background {
            config.background = bg.clone();
        }
        if let Some(c) = &self.color {
            config.color = c.clone();
        }
        if let Some(lw) = self.line_width {
            config.line_width = lw;
        }
        config
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all inputs and return an OS exit code.
/// `0` = every script rendered, `1` = one or more failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch rendering.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let format = match parse_format(args.format.as_deref(), args.output.as_deref()) {
        Ok(f) => f,
        Err(name) => {
            eprintln!("error: unknown output format '{}' (expected png, bmp or tga).", name);
            return ExitCode::FAILURE;
        }
    };

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!(
            "error: could not create output directory '{}': {}",
            dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let config = args.effective_config();
    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let Some(output_path) = build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            format,
        ) else {
            eprintln!(
                "  error: cannot determine output path for '{}'.",
                input_path.display()
            );
            any_failure = true;
            continue;
        };

        match run_one(input_path, &output_path, &config, format, args.session, args.verbose) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                tracing::error!(input = %input_path.display(), error = %e, "render failed");
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    base: &SketchConfig,
    format: ExportFormat,
    write_session: bool,
    verbose: bool,
) -> Result<(), String> {
    // -- Step 1: Parse ---------------------------------------------------
    let text = std::fs::read_to_string(input).map_err(|e| format!("read failed: {}", e))?;
    let script = parse_script(&text).map_err(|e| e.to_string())?;

    // Script header settings beat config and flags for that one file.
    let mut config = base.clone();
    if let Some(w) = script.width {
        config.display_width = w;
    }
    if let Some(h) = script.height {
        config.display_height = h;
    }
    if let Some(s) = script.scale {
        config.device_pixel_scale = s;
    }
    if let Some(bg) = &script.background {
        config.background = bg.clone();
    }

    // -- Step 2: Replay --------------------------------------------------
    let mut session = Session::new_untitled(1, &config);
    if let Some(stem) = input.file_stem() {
        session.name = stem.to_string_lossy().into_owned();
    }
    let report = run_script(&mut session.canvas, &script.steps).map_err(|e| e.to_string())?;
    if session.canvas.abandon_gesture() {
        tracing::warn!(input = %input.display(), "script ended mid-gesture; preview discarded");
    }
    if report.commits > 0 {
        session.mark_dirty();
    }

    if verbose {
        println!(
            "  {} steps, {} commits, {} undos, {} refused, {} history entries",
            report.steps,
            report.commits,
            report.undos,
            report.refused,
            session.canvas.history().len()
        );
    }

    // -- Step 3: Save ----------------------------------------------------
    session
        .canvas
        .export(output, format)
        .map_err(|e| format!("save failed: {}", e))?;

    if write_session {
        let session_path = output.with_extension("sketch");
        session
            .save_as(&session_path)
            .map_err(|e| format!("session save failed: {}", e))?;
        if verbose {
            println!("  session → {}", session_path.display());
        }
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand the `--input` arguments into script paths, deduplicated, in
/// argument order. A literal file is taken as-is; a pattern contributes only
/// its `.json` file matches.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut scripts: Vec<PathBuf> = Vec::new();
    let mut add = |path: PathBuf| {
        if !scripts.contains(&path) {
            scripts.push(path);
        }
    };

    for pattern in patterns {
        let literal = Path::new(pattern);
        if literal.is_file() {
            add(literal.to_path_buf());
            continue;
        }

        let entries = match glob::glob(pattern) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
                continue;
            }
        };
        let mut matched = 0usize;
        for path in entries.flatten().filter(|p| is_script(p)) {
            add(path);
            matched += 1;
        }
        if matched == 0 {
            eprintln!("warning: pattern '{}' matched no .json scripts.", pattern);
        }
    }

    scripts
}

fn is_script(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Pick the format from `--format`, else from the output extension, else PNG.
/// An unrecognised `--format` name is returned as the error.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> Result<ExportFormat, String> {
    if let Some(f) = format_arg {
        return ExportFormat::from_name(f).ok_or_else(|| f.to_string());
    }
    Ok(output.map(ExportFormat::from_path).unwrap_or_default())
}

/// Where a script's render goes: `--output` if given, else
/// `<stem>.<ext>` in `--output-dir`, else beside the script.
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: ExportFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy();
    let file_name = format!("{}.{}", stem, format.extension());
    let rendered = match output_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    };

    // A script given literally as e.g. `odd.png` must survive its own render.
    if rendered == input {
        Some(input.with_file_name(format!("{}_out.{}", stem, format.extension())))
    } else {
        Some(rendered)
    }
}
