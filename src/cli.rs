use crate::config::{Config, load_config};
use crate::ir::SequenceDiagram;
use crate::layout::{Layout, compute_layout};
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::parser::parse_sequence;
use crate::render::{write_output_png, write_output_svg};
use crate::{RenderOptions, render_diagram};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{LevelFilter, debug, info};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(
    name = "seqsketch",
    version,
    about = "Render text sequence diagrams with control-flow fragments to SVG"
)]
pub struct Args {
    /// Input file (.seq, .txt or .md) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for svg, json and source output.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Theme preset (default, purple, green, orange, dark, pastel)
    #[arg(short = 't', long = "theme")]
    pub theme: Option<String>,

    /// Aspect ratio (auto, 16:9, 4:3, a4-portrait, a4-landscape, square)
    #[arg(short = 'a', long = "aspectRatio")]
    pub aspect_ratio: Option<String>,

    /// Maximum PNG width in pixels; the image is scaled to fit, keeping proportions
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Maximum PNG height in pixels; the image is scaled to fit, keeping proportions
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    /// Layout dump as JSON
    Json,
    /// Canonical diagram text
    Source,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Json => "json",
            OutputFormat::Source => "seq",
        }
    }
}

fn init_logging(level: &str) {
    let log_level = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);
    debug!(args:?; "parsed arguments");

    let config = build_config(&args)?;
    let (input, is_markdown) = read_input(args.input.as_deref())?;
    let diagrams = if is_markdown {
        extract_sequence_blocks(&input)
    } else {
        vec![input]
    };

    if diagrams.is_empty() {
        return Err(anyhow::anyhow!("No sequence diagrams found in input"));
    }

    if diagrams.len() == 1 {
        let output = match args.output_format {
            OutputFormat::Png => Some(ensure_output(&args.output, "png")?),
            _ => args.output.clone(),
        };
        return render_one(&diagrams[0], &config, args.output_format, output.as_deref());
    }

    let outputs = resolve_multi_outputs(args.output.as_deref(), args.output_format, diagrams.len())?;
    for (idx, diagram) in diagrams.iter().enumerate() {
        render_one(diagram, &config, args.output_format, Some(&outputs[idx]))
            .with_context(|| format!("diagram {} of {}", idx + 1, diagrams.len()))?;
    }
    info!(count = diagrams.len(); "rendered markdown diagrams");

    Ok(())
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(theme) = args.theme.as_deref() {
        config.apply_theme_name(theme);
    }
    if let Some(ratio) = args.aspect_ratio.as_deref() {
        config.render.aspect_ratio = Some(ratio.parse()?);
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    Ok(config)
}

fn render_one(
    source: &str,
    config: &Config,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let diagram = parse_sequence(source)?;
    info!(
        participants = diagram.participants.len(),
        elements = diagram.elements.len();
        "parsed sequence diagram"
    );

    match format {
        OutputFormat::Source => write_text(&diagram.to_source(), output),
        OutputFormat::Json => {
            let layout = compute_layout(&diagram, &config.layout);
            write_dump(&layout, &diagram, output)
        }
        OutputFormat::Svg | OutputFormat::Png => {
            let rendered = render_diagram(&diagram, &RenderOptions::from_config(config));
            if format == OutputFormat::Svg {
                return write_output_svg(&rendered.svg, output);
            }
            let path = output.ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
            write_output_png(&rendered.svg, path, &config.render)
        }
    }
}

fn write_dump(
    layout: &Layout,
    diagram: &SequenceDiagram,
    output: Option<&Path>,
) -> Result<()> {
    match output {
        Some(path) => write_layout_dump(path, layout, diagram),
        None => {
            let dump = LayoutDump::from_layout(layout, diagram);
            println!("{}", serde_json::to_string_pretty(&dump)?);
            Ok(())
        }
    }
}

fn write_text(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)?,
        None => print!("{text}"),
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<(String, bool)> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok((buf, false));
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let is_md = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| matches!(ext, "md" | "markdown"))
            .unwrap_or(false);
        return Ok((content, is_md));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, false))
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

/// Pulls the bodies of ```` ```sequence ```` and `~~~sequence` fences out of markdown.
/// The `sequence:` header is restored when the block body omits it.
fn extract_sequence_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut in_block = false;
    let mut current: Vec<&str> = Vec::new();
    let mut fence = "";

    for line in input.lines() {
        let trimmed = line.trim();
        if !in_block {
            if let Some(start_fence) = detect_sequence_fence(trimmed) {
                in_block = true;
                fence = start_fence;
            }
            continue;
        }
        if is_fence_end(trimmed, fence) {
            in_block = false;
            blocks.push(finish_block(&current));
            current.clear();
            continue;
        }
        current.push(line);
    }

    blocks
}

fn finish_block(lines: &[&str]) -> String {
    let body = lines.join("\n");
    let has_header = lines
        .iter()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| line.trim().to_ascii_lowercase().starts_with("sequence:"));
    if has_header {
        body
    } else {
        format!("sequence:\n{body}")
    }
}

fn detect_sequence_fence(line: &str) -> Option<&'static str> {
    for (fence, marker) in [("```", '`'), ("~~~", '~')] {
        if let Some(rest) = line.strip_prefix(fence) {
            let rest = rest.trim_start_matches(marker).trim();
            if rest.eq_ignore_ascii_case("sequence") {
                return Some(fence);
            }
        }
    }
    None
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    if !line.starts_with(fence) {
        return false;
    }
    line[fence.len()..].trim().is_empty()
}

fn resolve_multi_outputs(
    output: Option<&Path>,
    format: OutputFormat,
    count: usize,
) -> Result<Vec<PathBuf>> {
    let ext = format.extension();
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for markdown input"))?;
    if base.is_dir() {
        return Ok((0..count)
            .map(|idx| base.join(format!("diagram-{}.{}", idx + 1, ext)))
            .collect());
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("diagram");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    Ok((0..count)
        .map(|idx| parent.join(format!("{}-{}.{}", stem, idx + 1, ext)))
        .collect())
}
