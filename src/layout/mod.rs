mod activation;
mod text;
pub(crate) mod types;

pub use activation::ActivationInterval;
pub use types::*;

use activation::ActivationTracker;
use text::text_width;

use crate::config::LayoutConfig;
use crate::ir::{Element, Fragment, Message, MessageType, SequenceDiagram};
use log::debug;
use std::collections::HashMap;

/// Number of row slots the element tree occupies: one per message, two per fragment
/// (header and closing rows) and one per divider between consecutive alternatives.
pub fn count_rows(elements: &[Element]) -> usize {
    elements
        .iter()
        .map(|element| match element {
            Element::Message(_) => 1,
            Element::Fragment(fragment) => {
                let body = count_rows(&fragment.elements);
                let alternatives: usize = fragment
                    .alternatives
                    .iter()
                    .map(|alternative| count_rows(&alternative.elements))
                    .sum();
                let dividers = fragment.alternatives.len().saturating_sub(1);
                2 + body + alternatives + dividers
            }
        })
        .sum()
}

/// Lays a parsed diagram out on a fixed grid: participants left to right in discovery
/// order, one row per message, fragments stacked top-down.
///
/// The canvas size is known before anything is placed (see [`count_rows`]). The model is
/// trusted as-is; a hand-built tree that breaks the parser's invariants still lays out,
/// just not meaningfully.
pub fn compute_layout(diagram: &SequenceDiagram, config: &LayoutConfig) -> Layout {
    let rows = count_rows(&diagram.elements);
    let grid = Grid::new(diagram, config, rows);

    let mut layers = Layers::default();
    let mut tracker = ActivationTracker::new();
    let end = draw_elements(
        &diagram.elements,
        RowCursor::start(),
        &grid,
        &mut layers,
        &mut tracker,
        0,
    );
    debug_assert_eq!(end.row(), rows, "row pre-pass drifted from the draw pass");
    debug!(rows = rows, drawn = end.row(); "sequence rows laid out");

    if tracker.open_count() > 0 {
        debug!(open = tracker.open_count(); "closing activations left open at end of diagram");
    }
    let activations = tracker.finish(end.row().saturating_sub(1), &diagram.participants);
    let activation_bars = activations
        .iter()
        .map(|interval| grid.activation_bar(interval))
        .collect::<Vec<_>>();

    let participants = grid.participant_layouts(diagram);
    let mut primitives = Vec::new();
    for participant in &participants {
        primitives.push(Primitive::Line {
            x1: participant.center_x,
            y1: grid.lifeline_start,
            x2: participant.center_x,
            y2: grid.lifeline_end(),
            class: StyleClass::Lifeline,
        });
    }
    for participant in &participants {
        primitives.push(Primitive::Rect {
            x: participant.x,
            y: participant.y,
            width: participant.width,
            height: participant.height,
            rx: 5.0,
            class: StyleClass::ParticipantBox,
        });
        primitives.push(Primitive::Text {
            x: participant.center_x,
            y: participant.y + participant.height / 2.0 + config.font_size * 0.4,
            text: participant.name.clone(),
            anchor: TextAnchor::Middle,
            class: StyleClass::ParticipantText,
        });
    }
    primitives.extend(layers.frames);
    primitives.extend(activation_bars);
    primitives.extend(layers.messages);
    primitives.extend(layers.labels);

    Layout {
        width: grid.width,
        height: grid.height,
        rows,
        participants,
        activations,
        primitives,
    }
}

/// The vertical position of the walk, in row slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowCursor(usize);

impl RowCursor {
    fn start() -> Self {
        Self(0)
    }

    fn row(self) -> usize {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Debug, Default)]
struct Layers {
    frames: Vec<Primitive>,
    messages: Vec<Primitive>,
    labels: Vec<Primitive>,
}

/// Fixed geometry shared by the whole walk.
struct Grid<'a> {
    config: &'a LayoutConfig,
    centers: HashMap<&'a str, f32>,
    first_center: f32,
    last_center: f32,
    lifeline_start: f32,
    width: u32,
    height: u32,
}

impl<'a> Grid<'a> {
    fn new(diagram: &'a SequenceDiagram, config: &'a LayoutConfig, rows: usize) -> Self {
        let centers = diagram
            .participants
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), Self::center_for(config, idx)))
            .collect::<HashMap<_, _>>();
        let count = diagram.participants.len();
        let width = config.side_margin * 2.0 + count as f32 * config.participant_spacing;
        let lifeline_start = config.top_margin + config.participant_height;
        let height = lifeline_start + rows as f32 * config.row_height + config.lifeline_extension;
        Self {
            config,
            centers,
            first_center: Self::center_for(config, 0),
            last_center: Self::center_for(config, count.saturating_sub(1)),
            lifeline_start,
            width: width.round().max(1.0) as u32,
            height: height.round().max(1.0) as u32,
        }
    }

    fn center_for(config: &LayoutConfig, idx: usize) -> f32 {
        config.side_margin + idx as f32 * config.participant_spacing + config.participant_width / 2.0
    }

    fn center_x(&self, participant: &str) -> f32 {
        self.centers
            .get(participant)
            .copied()
            .unwrap_or(self.first_center)
    }

    /// Y of the message line drawn in `row`.
    fn baseline(&self, row: usize) -> f32 {
        self.lifeline_start + (row + 1) as f32 * self.config.row_height
    }

    /// Y of the horizontal edge that opens `row` (fragment tops, bottoms and dividers).
    fn band_top(&self, row: usize) -> f32 {
        self.baseline(row) - self.config.row_height * 0.25
    }

    fn lifeline_end(&self) -> f32 {
        self.height as f32 - self.config.lifeline_extension / 2.0
    }

    fn participant_layouts(&self, diagram: &SequenceDiagram) -> Vec<ParticipantLayout> {
        diagram
            .participants
            .iter()
            .enumerate()
            .map(|(idx, name)| ParticipantLayout {
                name: name.clone(),
                x: self.config.side_margin + idx as f32 * self.config.participant_spacing,
                y: self.config.top_margin,
                width: self.config.participant_width,
                height: self.config.participant_height,
                center_x: Self::center_for(self.config, idx),
            })
            .collect()
    }

    fn activation_bar(&self, interval: &ActivationInterval) -> Primitive {
        let config = self.config;
        let x = self.center_x(&interval.participant) - config.activation_width / 2.0
            + interval.depth as f32 * config.activation_offset;
        let y = self.baseline(interval.start_row);
        let height = (self.baseline(interval.end_row) - y).max(config.row_height * 0.3);
        Primitive::Rect {
            x,
            y,
            width: config.activation_width,
            height,
            rx: 0.0,
            class: StyleClass::Activation,
        }
    }

    /// Leftmost and rightmost x touched by anything inside the fragment.
    fn fragment_span(&self, fragment: &Fragment) -> (f32, f32) {
        let mut span: Option<(f32, f32)> = None;
        self.extend_span(&fragment.elements, &mut span);
        for alternative in &fragment.alternatives {
            self.extend_span(&alternative.elements, &mut span);
        }
        span.unwrap_or((self.first_center, self.last_center))
    }

    fn extend_span(&self, elements: &[Element], span: &mut Option<(f32, f32)>) {
        for element in elements {
            match element {
                Element::Message(message) => {
                    let from = self.center_x(&message.from);
                    let to = self.center_x(&message.to);
                    let mut right = from.max(to);
                    if message.is_self {
                        right += self.config.self_message_width;
                    }
                    let left = from.min(to);
                    *span = Some(match *span {
                        Some((min, max)) => (min.min(left), max.max(right)),
                        None => (left, right),
                    });
                }
                Element::Fragment(fragment) => {
                    self.extend_span(&fragment.elements, span);
                    for alternative in &fragment.alternatives {
                        self.extend_span(&alternative.elements, span);
                    }
                }
            }
        }
    }
}

/// Walks `elements` top-down from `cursor` and returns the cursor past the last row used.
fn draw_elements(
    elements: &[Element],
    mut cursor: RowCursor,
    grid: &Grid<'_>,
    layers: &mut Layers,
    tracker: &mut ActivationTracker,
    depth: usize,
) -> RowCursor {
    for element in elements {
        cursor = match element {
            Element::Message(message) => draw_message(message, cursor, grid, layers, tracker),
            Element::Fragment(fragment) => {
                draw_fragment(fragment, cursor, grid, layers, tracker, depth)
            }
        };
    }
    cursor
}

fn draw_message(
    message: &Message,
    cursor: RowCursor,
    grid: &Grid<'_>,
    layers: &mut Layers,
    tracker: &mut ActivationTracker,
) -> RowCursor {
    let row = cursor.row();
    if message.message_type.is_request() {
        tracker.activate(&message.from, row);
        if !message.is_self {
            tracker.activate(&message.to, row);
        }
    } else {
        tracker.deactivate(&message.from, row);
        if !message.is_self {
            tracker.deactivate(&message.to, row);
        }
    }

    let config = grid.config;
    let y = grid.baseline(row);
    let line_class = match message.message_type {
        MessageType::Response => StyleClass::ResponseLine,
        MessageType::Sync | MessageType::Async => StyleClass::MessageLine,
    };
    let filled = message.message_type == MessageType::Sync;
    let head = config.arrow_size;

    if message.is_self {
        let x = grid.center_x(&message.from);
        let right = x + config.self_message_width;
        let bottom = y + config.self_message_height;
        let tail = if filled { x + head } else { x };
        layers.messages.push(Primitive::Polyline {
            points: vec![(x, y), (right, y), (right, bottom), (tail, bottom)],
            class: line_class,
        });
        layers.messages.push(arrowhead(x, bottom, -1.0, head, filled));
        if !message.text.is_empty() {
            layers.labels.push(Primitive::Text {
                x: x + config.label_offset,
                y: y - config.label_offset,
                text: message.text.clone(),
                anchor: TextAnchor::Start,
                class: StyleClass::MessageText,
            });
        }
        return cursor.next();
    }

    let x1 = grid.center_x(&message.from);
    let x2 = grid.center_x(&message.to);
    let direction = if x2 >= x1 { 1.0 } else { -1.0 };
    let line_end = if filled { x2 - direction * head } else { x2 };
    layers.messages.push(Primitive::Line {
        x1,
        y1: y,
        x2: line_end,
        y2: y,
        class: line_class,
    });
    layers.messages.push(arrowhead(x2, y, direction, head, filled));
    if !message.text.is_empty() {
        layers.labels.push(Primitive::Text {
            x: (x1 + x2) / 2.0,
            y: y - config.label_offset,
            text: message.text.clone(),
            anchor: TextAnchor::Middle,
            class: StyleClass::MessageText,
        });
    }
    cursor.next()
}

/// Arrowhead with its tip at `(x, y)`, pointing right for `direction > 0`.
fn arrowhead(x: f32, y: f32, direction: f32, size: f32, filled: bool) -> Primitive {
    let back = x - direction * size;
    let half = size / 2.0;
    if filled {
        Primitive::Polygon {
            points: vec![(x, y), (back, y - half), (back, y + half)],
            class: StyleClass::ArrowFilled,
        }
    } else {
        Primitive::Polyline {
            points: vec![(back, y - half), (x, y), (back, y + half)],
            class: StyleClass::ArrowOpen,
        }
    }
}

fn draw_fragment(
    fragment: &Fragment,
    cursor: RowCursor,
    grid: &Grid<'_>,
    layers: &mut Layers,
    tracker: &mut ActivationTracker,
    depth: usize,
) -> RowCursor {
    let open_row = cursor.row();
    let mut cursor = draw_elements(
        &fragment.elements,
        cursor.next(),
        grid,
        layers,
        tracker,
        depth + 1,
    );

    let mut dividers = Vec::new();
    for (idx, alternative) in fragment.alternatives.iter().enumerate() {
        if idx > 0 {
            dividers.push((cursor.row(), alternative.condition.as_str()));
            cursor = cursor.next();
        }
        cursor = draw_elements(
            &alternative.elements,
            cursor,
            grid,
            layers,
            tracker,
            depth + 1,
        );
    }
    let close_row = cursor.row();

    let config = grid.config;
    let (min_x, max_x) = grid.fragment_span(fragment);
    let pad = (config.participant_width / 2.0 - depth as f32 * config.fragment_inset)
        .max(config.fragment_inset);
    let x = min_x - pad;
    let width = (max_x - min_x) + pad * 2.0;
    let top = grid.band_top(open_row);
    let bottom = grid.band_top(close_row);

    layers.frames.push(Primitive::Rect {
        x,
        y: top,
        width,
        height: bottom - top,
        rx: 0.0,
        class: StyleClass::FragmentBox,
    });

    let label = fragment.kind.keyword();
    let tab_height = config.header_tab_height;
    let tab_width = (text_width(label, config.font_size) + config.fragment_padding * 2.0)
        .max(tab_height * 2.0);
    let notch = tab_height * 0.35;
    let text_y = top + tab_height * 0.7;
    layers.frames.push(Primitive::Polygon {
        points: vec![
            (x, top),
            (x + tab_width, top),
            (x + tab_width, top + tab_height - notch),
            (x + tab_width - notch, top + tab_height),
            (x, top + tab_height),
        ],
        class: StyleClass::FragmentHeader,
    });
    layers.labels.push(Primitive::Text {
        x: x + config.fragment_padding,
        y: text_y,
        text: label.to_string(),
        anchor: TextAnchor::Start,
        class: StyleClass::FragmentLabel,
    });

    let header_condition = fragment
        .alternatives
        .first()
        .map(|alternative| alternative.condition.as_str())
        .filter(|condition| !condition.is_empty())
        .unwrap_or(fragment.condition.as_str());
    if !header_condition.is_empty() {
        layers.labels.push(Primitive::Text {
            x: x + tab_width + config.fragment_padding,
            y: text_y,
            text: format!("[{header_condition}]"),
            anchor: TextAnchor::Start,
            class: StyleClass::FragmentCondition,
        });
    }

    for (row, condition) in dividers {
        let y = grid.band_top(row);
        layers.frames.push(Primitive::Line {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y,
            class: StyleClass::FragmentDivider,
        });
        if !condition.is_empty() {
            layers.labels.push(Primitive::Text {
                x: x + config.fragment_padding,
                y: y + tab_height * 0.7,
                text: format!("[{condition}]"),
                anchor: TextAnchor::Start,
                class: StyleClass::FragmentCondition,
            });
        }
    }

    cursor.next()
}
