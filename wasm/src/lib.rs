use seqsketch::{AspectRatio, RenderOptions, Theme, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SequenceRenderOptions {
    theme: Option<String>,
    aspect_ratio: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
}

fn build_render_options(options: SequenceRenderOptions) -> Result<RenderOptions, String> {
    let mut render_options = RenderOptions::default();

    if let Some(name) = options.theme.as_deref() {
        render_options.theme = Theme::by_name(name).ok_or_else(|| format!("unknown theme '{name}'"))?;
    }
    if let Some(ratio) = options.aspect_ratio.as_deref() {
        let ratio = ratio.parse::<AspectRatio>().map_err(|error| error.to_string())?;
        render_options.aspect_ratio = Some(ratio);
    }
    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }

    Ok(render_options)
}

fn render_sequence(code: &str, options_json: Option<&str>) -> Result<String, String> {
    let options = match options_json {
        Some(raw_options) => serde_json::from_str::<SequenceRenderOptions>(raw_options)
            .map_err(|error| error.to_string())?,
        None => SequenceRenderOptions::default(),
    };
    let render_options = build_render_options(options)?;
    render_with_options(code, &render_options)
        .map(|rendered| rendered.svg)
        .map_err(|error| error.to_string())
}

#[wasm_bindgen]
pub fn render_sequence_svg(code: &str, options_json: Option<String>) -> Result<String, JsValue> {
    render_sequence(code, options_json.as_deref()).map_err(|error| JsValue::from_str(&error))
}
