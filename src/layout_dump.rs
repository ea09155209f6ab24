use crate::ir::{Element, SequenceDiagram};
use crate::layout::{Layout, Primitive};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: u32,
    pub height: u32,
    pub rows: usize,
    pub messages: usize,
    pub fragments: usize,
    pub participants: Vec<ParticipantDump>,
    pub activations: Vec<ActivationDump>,
    pub primitives: Vec<PrimitiveDump>,
}

#[derive(Debug, Serialize)]
pub struct ParticipantDump {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub center_x: f32,
}

#[derive(Debug, Serialize)]
pub struct ActivationDump {
    pub participant: String,
    pub start_row: usize,
    pub end_row: usize,
    pub depth: usize,
    pub closed: bool,
}

#[derive(Debug, Serialize)]
pub struct PrimitiveDump {
    pub kind: &'static str,
    pub class: &'static str,
    pub points: Vec<[f32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<[f32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl PrimitiveDump {
    fn from_primitive(primitive: &Primitive) -> Self {
        let (points, size, text) = match primitive {
            Primitive::Rect {
                x, y, width, height, ..
            } => (vec![[*x, *y]], Some([*width, *height]), None),
            Primitive::Line { x1, y1, x2, y2, .. } => (vec![[*x1, *y1], [*x2, *y2]], None, None),
            Primitive::Polyline { points, .. } | Primitive::Polygon { points, .. } => (
                points.iter().map(|(x, y)| [*x, *y]).collect(),
                None,
                None,
            ),
            Primitive::Text { x, y, text, .. } => (vec![[*x, *y]], None, Some(text.clone())),
        };
        PrimitiveDump {
            kind: primitive.kind(),
            class: primitive.class().as_str(),
            points,
            size,
            text,
        }
    }
}

fn count_elements(elements: &[Element]) -> (usize, usize) {
    elements.iter().fold((0, 0), |(messages, fragments), element| match element {
        Element::Message(_) => (messages + 1, fragments),
        Element::Fragment(fragment) => {
            let (m, f) = count_elements(&fragment.elements);
            let (am, af) = fragment
                .alternatives
                .iter()
                .map(|alternative| count_elements(&alternative.elements))
                .fold((0, 0), |acc, (m, f)| (acc.0 + m, acc.1 + f));
            (messages + m + am, fragments + 1 + f + af)
        }
    })
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout, diagram: &SequenceDiagram) -> Self {
        let (messages, fragments) = count_elements(&diagram.elements);

        let participants = layout
            .participants
            .iter()
            .map(|participant| ParticipantDump {
                name: participant.name.clone(),
                x: participant.x,
                y: participant.y,
                width: participant.width,
                height: participant.height,
                center_x: participant.center_x,
            })
            .collect();

        let activations = layout
            .activations
            .iter()
            .map(|interval| ActivationDump {
                participant: interval.participant.clone(),
                start_row: interval.start_row,
                end_row: interval.end_row,
                depth: interval.depth,
                closed: interval.closed,
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            rows: layout.rows,
            messages,
            fragments,
            participants,
            activations,
            primitives: layout
                .primitives
                .iter()
                .map(PrimitiveDump::from_primitive)
                .collect(),
        }
    }
}

pub fn write_layout_dump(
    path: &Path,
    layout: &Layout,
    diagram: &SequenceDiagram,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, diagram);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::compute_layout;
    use crate::parser::parse_sequence;

    #[test]
    fn dump_counts_and_serialises() {
        let diagram = parse_sequence(
            "sequence:\nalt [ok]\nA -> B: go\nelse [no]\nopt\nB -> A: retry\nend\nend",
        )
        .unwrap();
        let layout = compute_layout(&diagram, &LayoutConfig::default());
        let dump = LayoutDump::from_layout(&layout, &diagram);
        assert_eq!(dump.messages, 2);
        assert_eq!(dump.fragments, 2);
        assert_eq!(dump.rows, layout.rows);
        assert_eq!(dump.participants.len(), 2);

        let json = serde_json::to_value(&dump).unwrap();
        let first = &json["primitives"][0];
        assert_eq!(first["kind"], "line");
        assert_eq!(first["class"], "lifeline");
        assert!(first.get("text").is_none());
    }
}
