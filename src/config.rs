use crate::aspect::AspectRatio;
use crate::theme::Theme;
use anyhow::Context;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Grid geometry, in SVG user units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub participant_width: f32,
    pub participant_height: f32,
    /// Distance between the left edges of neighbouring participant boxes.
    pub participant_spacing: f32,
    pub row_height: f32,
    pub top_margin: f32,
    pub side_margin: f32,
    pub lifeline_extension: f32,
    pub activation_width: f32,
    /// Horizontal shift per nesting level of stacked activations.
    pub activation_offset: f32,
    pub self_message_width: f32,
    pub self_message_height: f32,
    pub arrow_size: f32,
    pub fragment_padding: f32,
    /// How much each nesting level pulls a fragment box inwards.
    pub fragment_inset: f32,
    pub header_tab_height: f32,
    pub label_offset: f32,
    pub font_size: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            participant_width: 120.0,
            participant_height: 40.0,
            participant_spacing: 150.0,
            row_height: 50.0,
            top_margin: 20.0,
            side_margin: 50.0,
            lifeline_extension: 40.0,
            activation_width: 10.0,
            activation_offset: 5.0,
            self_message_width: 40.0,
            self_message_height: 20.0,
            arrow_size: 8.0,
            fragment_padding: 10.0,
            fragment_inset: 8.0,
            header_tab_height: 20.0,
            label_offset: 6.0,
            font_size: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// PNG output is scaled to fit inside `width` x `height`, keeping its proportions.
    /// SVG output ignores both.
    pub width: f32,
    pub height: f32,
    /// Canvas fill. Replaces the theme background when rendering.
    pub background: String,
    pub aspect_ratio: Option<AspectRatio>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FFFFFF".to_string(),
            aspect_ratio: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::default();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

impl Config {
    /// Switches to a named preset, keeping the render background in step with it.
    /// Unknown names are logged and ignored.
    pub fn apply_theme_name(&mut self, name: &str) {
        match Theme::by_name(name) {
            Some(theme) => {
                self.render.background = theme.background.clone();
                self.theme = theme;
            }
            None => warn!(
                theme = name;
                "unknown theme, keeping '{}' (available: {})",
                self.theme.name,
                Theme::preset_names().join(", ")
            ),
        }
    }

    /// Unknown names are logged and ignored.
    pub fn apply_aspect_ratio_name(&mut self, name: &str) {
        match name.parse::<AspectRatio>() {
            Ok(ratio) => self.render.aspect_ratio = Some(ratio),
            Err(err) => warn!("{err}"),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    participant_fill: Option<String>,
    participant_stroke: Option<String>,
    participant_text: Option<String>,
    message_stroke: Option<String>,
    message_text: Option<String>,
    fragment_stroke: Option<String>,
    fragment_fill: Option<String>,
    fragment_text: Option<String>,
    lifeline: Option<String>,
    activation_fill: Option<String>,
    activation_stroke: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    participant_width: Option<f32>,
    participant_height: Option<f32>,
    participant_spacing: Option<f32>,
    row_height: Option<f32>,
    top_margin: Option<f32>,
    side_margin: Option<f32>,
    lifeline_extension: Option<f32>,
    activation_width: Option<f32>,
    activation_offset: Option<f32>,
    self_message_width: Option<f32>,
    self_message_height: Option<f32>,
    arrow_size: Option<f32>,
    fragment_padding: Option<f32>,
    fragment_inset: Option<f32>,
    header_tab_height: Option<f32>,
    label_offset: Option<f32>,
    font_size: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    background: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
    aspect_ratio: Option<String>,
}

fn parse_config_file(contents: &str) -> anyhow::Result<ConfigFile> {
    match serde_json::from_str::<ConfigFile>(contents) {
        Ok(parsed) => Ok(parsed),
        Err(strict) => json5::from_str::<ConfigFile>(contents)
            .with_context(|| format!("config is neither JSON ({strict}) nor JSON5")),
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let parsed = parse_config_file(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    apply_config_file(&mut config, parsed);
    Ok(config)
}

fn apply_config_file(config: &mut Config, parsed: ConfigFile) {
    if let Some(name) = parsed.theme.as_deref() {
        config.apply_theme_name(name);
    }

    if let Some(vars) = parsed.theme_variables {
        let theme = &mut config.theme;
        if let Some(v) = vars.font_family {
            theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            theme.background = v;
        }
        if let Some(v) = vars.participant_fill {
            theme.participant.fill = v;
        }
        if let Some(v) = vars.participant_stroke {
            theme.participant.stroke = v;
        }
        if let Some(v) = vars.participant_text {
            theme.participant.text = v;
        }
        if let Some(v) = vars.message_stroke {
            theme.message.stroke = v;
        }
        if let Some(v) = vars.message_text {
            theme.message.text = v;
        }
        if let Some(v) = vars.fragment_stroke {
            theme.fragment.stroke = v;
        }
        if let Some(v) = vars.fragment_fill {
            theme.fragment.fill = v;
        }
        if let Some(v) = vars.fragment_text {
            theme.fragment.text = v;
        }
        if let Some(v) = vars.lifeline {
            theme.lifeline = v;
        }
        if let Some(v) = vars.activation_fill {
            theme.activation_fill = v;
        }
        if let Some(v) = vars.activation_stroke {
            theme.activation_stroke = v;
        }
    }

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        let fields = [
            (layout.participant_width, &mut target.participant_width),
            (layout.participant_height, &mut target.participant_height),
            (layout.participant_spacing, &mut target.participant_spacing),
            (layout.row_height, &mut target.row_height),
            (layout.top_margin, &mut target.top_margin),
            (layout.side_margin, &mut target.side_margin),
            (layout.lifeline_extension, &mut target.lifeline_extension),
            (layout.activation_width, &mut target.activation_width),
            (layout.activation_offset, &mut target.activation_offset),
            (layout.self_message_width, &mut target.self_message_width),
            (layout.self_message_height, &mut target.self_message_height),
            (layout.arrow_size, &mut target.arrow_size),
            (layout.fragment_padding, &mut target.fragment_padding),
            (layout.fragment_inset, &mut target.fragment_inset),
            (layout.header_tab_height, &mut target.header_tab_height),
            (layout.label_offset, &mut target.label_offset),
            (layout.font_size, &mut target.font_size),
        ];
        for (value, slot) in fields {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.background {
            config.render.background = v;
        }
    }

    if let Some(name) = parsed.aspect_ratio.as_deref() {
        config.apply_aspect_ratio_name(name);
    }
}
