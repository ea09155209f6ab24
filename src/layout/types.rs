use super::activation::ActivationInterval;

/// Style hooks attached to every primitive. Colours are resolved later through
/// [`crate::theme::Theme::style`]; the layout never emits a colour itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleClass {
    ParticipantBox,
    ParticipantText,
    Lifeline,
    MessageLine,
    ResponseLine,
    ArrowFilled,
    ArrowOpen,
    MessageText,
    Activation,
    FragmentBox,
    FragmentHeader,
    FragmentLabel,
    FragmentCondition,
    FragmentDivider,
}

impl StyleClass {
    pub const ALL: [StyleClass; 14] = [
        Self::ParticipantBox,
        Self::ParticipantText,
        Self::Lifeline,
        Self::MessageLine,
        Self::ResponseLine,
        Self::ArrowFilled,
        Self::ArrowOpen,
        Self::MessageText,
        Self::Activation,
        Self::FragmentBox,
        Self::FragmentHeader,
        Self::FragmentLabel,
        Self::FragmentCondition,
        Self::FragmentDivider,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParticipantBox => "participant-box",
            Self::ParticipantText => "participant-text",
            Self::Lifeline => "lifeline",
            Self::MessageLine => "message-line",
            Self::ResponseLine => "response-line",
            Self::ArrowFilled => "arrow-filled",
            Self::ArrowOpen => "arrow-open",
            Self::MessageText => "message-text",
            Self::Activation => "activation",
            Self::FragmentBox => "fragment-box",
            Self::FragmentHeader => "fragment-header",
            Self::FragmentLabel => "fragment-label",
            Self::FragmentCondition => "fragment-condition",
            Self::FragmentDivider => "fragment-divider",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
}

impl TextAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        rx: f32,
        class: StyleClass,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        class: StyleClass,
    },
    Polyline {
        points: Vec<(f32, f32)>,
        class: StyleClass,
    },
    Polygon {
        points: Vec<(f32, f32)>,
        class: StyleClass,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        anchor: TextAnchor,
        class: StyleClass,
    },
}

impl Primitive {
    pub fn class(&self) -> StyleClass {
        match self {
            Self::Rect { class, .. }
            | Self::Line { class, .. }
            | Self::Polyline { class, .. }
            | Self::Polygon { class, .. }
            | Self::Text { class, .. } => *class,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rect { .. } => "rect",
            Self::Line { .. } => "line",
            Self::Polyline { .. } => "polyline",
            Self::Polygon { .. } => "polygon",
            Self::Text { .. } => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantLayout {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Lifeline position.
    pub center_x: f32,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    /// Row slots reserved by the counting pre-pass.
    pub rows: usize,
    pub participants: Vec<ParticipantLayout>,
    pub activations: Vec<ActivationInterval>,
    pub primitives: Vec<Primitive>,
}

impl Layout {
    pub fn primitives_of(&self, class: StyleClass) -> impl Iterator<Item = &Primitive> {
        self.primitives.iter().filter(move |p| p.class() == class)
    }
}
