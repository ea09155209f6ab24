pub mod aspect;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod theme;

pub use aspect::AspectRatio;
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use error::ParseError;
pub use ir::{Element, Fragment, FragmentKind, Message, MessageType, SequenceDiagram};
pub use layout::{Layout, compute_layout};
pub use parser::parse_sequence;
pub use render::render_svg;
pub use theme::Theme;

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub aspect_ratio: Option<AspectRatio>,
}

impl RenderOptions {
    /// The render section's background replaces the theme's own.
    pub fn from_config(config: &Config) -> Self {
        let mut theme = config.theme.clone();
        theme.background = config.render.background.clone();
        Self {
            theme,
            layout: config.layout.clone(),
            aspect_ratio: config.render.aspect_ratio,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub svg: String,
    /// Outer size after aspect-ratio adjustment.
    pub width: u32,
    pub height: u32,
}

/// Parses and renders with the default theme and geometry.
pub fn render(input: &str) -> Result<String, ParseError> {
    render_with_options(input, &RenderOptions::default()).map(|rendered| rendered.svg)
}

pub fn render_with_options(input: &str, options: &RenderOptions) -> Result<Rendered, ParseError> {
    render_parsed(parse_sequence(input), options)
}

/// Renders an already-parsed diagram. A parse error is handed back untouched, so callers
/// can feed the parser result straight through.
pub fn render_parsed(
    parsed: Result<SequenceDiagram, ParseError>,
    options: &RenderOptions,
) -> Result<Rendered, ParseError> {
    let diagram = parsed?;
    Ok(render_diagram(&diagram, options))
}

pub fn render_diagram(diagram: &SequenceDiagram, options: &RenderOptions) -> Rendered {
    let layout = compute_layout(diagram, &options.layout);
    let (width, height) = aspect::adjust(layout.width, layout.height, options.aspect_ratio);
    let svg = render_svg(&layout, &options.theme, (width, height));
    Rendered { svg, width, height }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_produces_svg() {
        let svg = render("sequence:\nA -> B: Hello").unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Hello"));
    }

    #[test]
    fn parse_errors_pass_through() {
        let err = render_parsed(Err(ParseError::UnmatchedEnd { line: 3 }), &RenderOptions::default())
            .unwrap_err();
        assert_eq!(err, ParseError::UnmatchedEnd { line: 3 });
        assert_eq!(render("A -> B: x").unwrap_err(), ParseError::MissingHeader);
    }

    #[test]
    fn aspect_ratio_changes_outer_size_only() {
        let input = "sequence:\nA -> B: x\nB -> C: y\nC -> D: z";
        let natural = render_with_options(input, &RenderOptions::default()).unwrap();
        let square = render_with_options(
            input,
            &RenderOptions::default().with_aspect_ratio(AspectRatio::Square),
        )
        .unwrap();
        assert_eq!(square.width, square.height);
        assert_eq!(square.height, natural.height);
        let view_box = format!("viewBox=\"0 0 {} {}\"", natural.width, natural.height);
        assert!(square.svg.contains(&view_box));
    }

    #[test]
    fn config_background_reaches_the_svg() {
        let mut config = Config::default();
        config.apply_theme_name("green");
        config.render.background = "#000000".to_string();
        config.render.aspect_ratio = Some(AspectRatio::Square);
        let options = RenderOptions::from_config(&config);
        assert_eq!(options.theme.name, "green");
        assert_eq!(options.theme.background, "#000000");
        let diagram = parse_sequence("sequence:\nA -> B: x").unwrap();
        let rendered = render_diagram(&diagram, &options);
        assert!(rendered.svg.contains("<rect width=\"100%\" height=\"100%\" fill=\"#000000\"/>"));
        assert_eq!(rendered.width, rendered.height);
    }

    #[test]
    fn rendering_is_deterministic() {
        let input = "sequence:\nloop [retry]\nA -> B: call\nB --> A: ok\nend";
        let options = RenderOptions::default().with_theme(Theme::purple());
        assert_eq!(
            render_with_options(input, &options).unwrap(),
            render_with_options(input, &options).unwrap()
        );
    }
}
