use serde::Serialize;
use std::fmt;

/// Participants are identified by name; layout order is order of first appearance.
pub type Participant = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Sync,
    Async,
    Response,
}

impl MessageType {
    pub fn from_arrow(arrow: &str) -> Option<Self> {
        match arrow {
            "-->" => Some(Self::Response),
            "->>" => Some(Self::Async),
            "->" | "-" => Some(Self::Sync),
            _ => None,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::Sync => "->",
            Self::Async => "->>",
            Self::Response => "-->",
        }
    }

    /// Sync and async messages open activations, responses close them.
    pub fn is_request(self) -> bool {
        !matches!(self, Self::Response)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub from: Participant,
    pub to: Participant,
    pub text: String,
    pub message_type: MessageType,
    pub is_self: bool,
}

impl Message {
    pub fn new(from: &str, to: &str, text: &str, message_type: MessageType) -> Self {
        let from = from.trim();
        let to = to.trim();
        Self {
            from: from.to_string(),
            to: to.to_string(),
            text: text.trim().to_string(),
            message_type,
            is_self: from == to,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Loop,
    Alt,
    Opt,
    Par,
    Break,
    Strict,
    Seq,
    Critical,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 8] = [
        Self::Loop,
        Self::Alt,
        Self::Opt,
        Self::Par,
        Self::Break,
        Self::Strict,
        Self::Seq,
        Self::Critical,
    ];

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let lower = keyword.to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.keyword() == lower)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Loop => "loop",
            Self::Alt => "alt",
            Self::Opt => "opt",
            Self::Par => "par",
            Self::Break => "break",
            Self::Strict => "strict",
            Self::Seq => "seq",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One `else`-delimited branch of an `alt` fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alternative {
    pub condition: String,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub condition: String,
    pub elements: Vec<Element>,
    /// Only populated for `alt`.
    pub alternatives: Vec<Alternative>,
}

impl Fragment {
    pub fn new(kind: FragmentKind, condition: impl Into<String>) -> Self {
        Self {
            kind,
            condition: condition.into(),
            elements: Vec::new(),
            alternatives: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Message(Message),
    Fragment(Fragment),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SequenceDiagram {
    pub participants: Vec<Participant>,
    pub elements: Vec<Element>,
}

impl SequenceDiagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_participant(&mut self, name: &str) {
        if !self.participants.iter().any(|p| p == name) {
            self.participants.push(name.to_string());
        }
    }

    /// Writes the diagram back in the line syntax accepted by
    /// [`crate::parser::parse_sequence`].
    ///
    /// Every alternative gets its own `else` line, so re-parsing the output never
    /// promotes a body into an extra leading alternative.
    pub fn to_source(&self) -> String {
        let mut out = String::from("sequence:\n");
        write_elements(&mut out, &self.elements, 0);
        out
    }
}

fn write_elements(out: &mut String, elements: &[Element], depth: usize) {
    for element in elements {
        match element {
            Element::Message(message) => {
                push_indent(out, depth);
                out.push_str(&format!(
                    "{} {} {}: {}\n",
                    message.from,
                    message.message_type.arrow(),
                    message.to,
                    message.text
                ));
            }
            Element::Fragment(fragment) => {
                push_indent(out, depth);
                out.push_str(fragment.kind.keyword());
                push_condition(out, &fragment.condition);
                write_elements(out, &fragment.elements, depth + 1);
                for alternative in &fragment.alternatives {
                    push_indent(out, depth);
                    out.push_str("else");
                    push_condition(out, &alternative.condition);
                    write_elements(out, &alternative.elements, depth + 1);
                }
                push_indent(out, depth);
                out.push_str("end\n");
            }
        }
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn push_condition(out: &mut String, condition: &str) {
    if !condition.is_empty() {
        out.push_str(" [");
        out.push_str(condition);
        out.push(']');
    }
    out.push('\n');
}
