use crate::layout::{StyleClass, TextAnchor};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantColors {
    pub fill: String,
    pub stroke: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageColors {
    pub stroke: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentColors {
    pub stroke: String,
    pub fill: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub participant: ParticipantColors,
    pub message: MessageColors,
    pub fragment: FragmentColors,
    pub lifeline: String,
    pub activation_fill: String,
    pub activation_stroke: String,
}

/// Resolved presentation for one [`StyleClass`].
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub fill: String,
    pub stroke: Option<String>,
    pub stroke_width: f32,
    pub dasharray: Option<&'static str>,
    pub font_size: Option<f32>,
    pub font_weight: Option<&'static str>,
    pub text_anchor: Option<TextAnchor>,
}

impl Style {
    fn shape(fill: &str, stroke: &str, stroke_width: f32) -> Self {
        Self {
            fill: fill.to_string(),
            stroke: Some(stroke.to_string()),
            stroke_width,
            dasharray: None,
            font_size: None,
            font_weight: None,
            text_anchor: None,
        }
    }

    fn text(fill: &str, font_size: f32) -> Self {
        Self {
            fill: fill.to_string(),
            stroke: None,
            stroke_width: 0.0,
            dasharray: None,
            font_size: Some(font_size),
            font_weight: None,
            text_anchor: None,
        }
    }

    fn dashed(mut self) -> Self {
        self.dasharray = Some("5,5");
        self
    }
}

const PRESETS: [&str; 6] = ["default", "purple", "green", "orange", "dark", "pastel"];

impl Theme {
    fn preset(
        name: &str,
        participant: [&str; 3],
        message: [&str; 2],
        fragment: [&str; 3],
    ) -> Self {
        Self {
            name: name.to_string(),
            font_family: "Arial, sans-serif".to_string(),
            font_size: 12.0,
            background: "#FFFFFF".to_string(),
            participant: ParticipantColors {
                fill: participant[0].to_string(),
                stroke: participant[1].to_string(),
                text: participant[2].to_string(),
            },
            message: MessageColors {
                stroke: message[0].to_string(),
                text: message[1].to_string(),
            },
            fragment: FragmentColors {
                stroke: fragment[0].to_string(),
                fill: fragment[1].to_string(),
                text: fragment[2].to_string(),
            },
            lifeline: "#999999".to_string(),
            activation_fill: fragment[1].to_string(),
            activation_stroke: participant[1].to_string(),
        }
    }

    pub fn default_blue() -> Self {
        Self::preset(
            "default",
            ["#4A90E2", "#2E5C8A", "white"],
            ["#333", "#333"],
            ["#666", "#E8EAF6", "#333"],
        )
    }

    pub fn purple() -> Self {
        Self::preset(
            "purple",
            ["#9C27B0", "#7B1FA2", "white"],
            ["#4A148C", "#4A148C"],
            ["#7B1FA2", "#F3E5F5", "#4A148C"],
        )
    }

    pub fn green() -> Self {
        Self::preset(
            "green",
            ["#4CAF50", "#388E3C", "white"],
            ["#1B5E20", "#1B5E20"],
            ["#388E3C", "#E8F5E9", "#1B5E20"],
        )
    }

    pub fn orange() -> Self {
        Self::preset(
            "orange",
            ["#FF9800", "#F57C00", "white"],
            ["#E65100", "#E65100"],
            ["#F57C00", "#FFF3E0", "#E65100"],
        )
    }

    pub fn dark() -> Self {
        let mut theme = Self::preset(
            "dark",
            ["#37474F", "#263238", "white"],
            ["#CFD8DC", "#CFD8DC"],
            ["#607D8B", "#455A64", "#CFD8DC"],
        );
        theme.background = "#263238".to_string();
        theme.lifeline = "#78909C".to_string();
        theme
    }

    pub fn pastel() -> Self {
        Self::preset(
            "pastel",
            ["#81D4FA", "#4FC3F7", "#01579B"],
            ["#0277BD", "#0277BD"],
            ["#4FC3F7", "#E1F5FE", "#01579B"],
        )
    }

    /// Looks up a preset by name, case-insensitively. `blue` is accepted for `default`.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" | "blue" => Some(Self::default_blue()),
            "purple" => Some(Self::purple()),
            "green" => Some(Self::green()),
            "orange" => Some(Self::orange()),
            "dark" => Some(Self::dark()),
            "pastel" => Some(Self::pastel()),
            _ => None,
        }
    }

    pub fn preset_names() -> &'static [&'static str] {
        &PRESETS
    }

    pub fn style(&self, class: StyleClass) -> Style {
        let size = self.font_size;
        match class {
            StyleClass::ParticipantBox => {
                Style::shape(&self.participant.fill, &self.participant.stroke, 2.0)
            }
            StyleClass::ParticipantText => Style {
                text_anchor: Some(TextAnchor::Middle),
                ..Style::text(&self.participant.text, size + 2.0)
            },
            StyleClass::Lifeline => Style::shape("none", &self.lifeline, 1.0).dashed(),
            StyleClass::MessageLine => Style::shape("none", &self.message.stroke, 2.0),
            StyleClass::ResponseLine => Style::shape("none", &self.message.stroke, 2.0).dashed(),
            StyleClass::ArrowFilled => Style::shape(&self.message.stroke, &self.message.stroke, 1.0),
            StyleClass::ArrowOpen => Style::shape("none", &self.message.stroke, 2.0),
            StyleClass::MessageText => Style::text(&self.message.text, size),
            StyleClass::Activation => {
                Style::shape(&self.activation_fill, &self.activation_stroke, 1.0)
            }
            StyleClass::FragmentBox => Style::shape("none", &self.fragment.stroke, 1.5),
            StyleClass::FragmentHeader => {
                Style::shape(&self.fragment.fill, &self.fragment.stroke, 1.5)
            }
            StyleClass::FragmentLabel => Style {
                font_weight: Some("bold"),
                ..Style::text(&self.fragment.text, size)
            },
            StyleClass::FragmentCondition => Style::text(&self.fragment.text, size - 1.0),
            StyleClass::FragmentDivider => Style::shape("none", &self.fragment.stroke, 1.0).dashed(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_blue()
    }
}
