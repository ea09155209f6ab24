use crate::error::ParseError;
use crate::ir::{Alternative, Element, Fragment, FragmentKind, Message, MessageType, SequenceDiagram};
use log::{debug, trace, warn};
use once_cell::sync::Lazy;
use regex::Regex;

const HEADER: &str = "sequence:";

static FRAGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(loop|alt|opt|par|break|strict|seq|critical)(?:\s*\[(.*)\])?$").unwrap()
});
static ELSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^else(?:\s*\[(.*)\])?$").unwrap());
static END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^end$").unwrap());

/// Longest first, so `-->` and `->>` never lose to their `->` prefix.
const ARROW_TOKENS: [&str; 3] = ["-->", "->>", "->"];

/// A fragment under construction on the parser's explicit stack.
#[derive(Debug)]
struct FrameBuilder {
    fragment: Fragment,
    line: usize,
    /// The alternative started by the latest `else`; receives elements until the next
    /// `else` or `end`.
    pending: Option<Alternative>,
}

impl FrameBuilder {
    fn new(kind: FragmentKind, condition: String, line: usize) -> Self {
        Self {
            fragment: Fragment::new(kind, condition),
            line,
            pending: None,
        }
    }

    fn push(&mut self, element: Element) {
        match self.pending.as_mut() {
            Some(alternative) => alternative.elements.push(element),
            None => self.fragment.elements.push(element),
        }
    }

    fn start_alternative(&mut self, condition: String) {
        if let Some(done) = self.pending.take() {
            self.fragment.alternatives.push(done);
        }
        self.pending = Some(Alternative {
            condition,
            elements: Vec::new(),
        });
    }

    fn finish(mut self) -> Fragment {
        if let Some(done) = self.pending.take() {
            self.fragment.alternatives.push(done);
        }
        let fragment = &mut self.fragment;
        if fragment.kind == FragmentKind::Alt
            && !fragment.alternatives.is_empty()
            && !fragment.elements.is_empty()
        {
            let body = std::mem::take(&mut fragment.elements);
            fragment.alternatives.insert(
                0,
                Alternative {
                    condition: fragment.condition.clone(),
                    elements: body,
                },
            );
        }
        self.fragment
    }
}

/// Parses the sequence dialect into a nested element tree.
///
/// The first non-blank line must start with `sequence:` (any case). Fragment keywords,
/// `else` and `end` must stand alone on their line, apart from an optional `[condition]`.
/// Lines that match nothing are skipped with a warning.
pub fn parse_sequence(input: &str) -> Result<SequenceDiagram, ParseError> {
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(idx, raw)| (idx + 1, raw.trim()))
        .filter(|(_, line)| !line.is_empty());

    match lines.next() {
        Some((_, header)) if header.to_ascii_lowercase().starts_with(HEADER) => {}
        _ => return Err(ParseError::MissingHeader),
    }

    let mut diagram = SequenceDiagram::new();
    let mut stack: Vec<FrameBuilder> = Vec::new();

    for (line_no, line) in lines {
        if let Some(caps) = FRAGMENT_RE.captures(line) {
            let Some(kind) = caps.get(1).and_then(|m| FragmentKind::from_keyword(m.as_str()))
            else {
                continue;
            };
            let condition = capture_condition(&caps);
            trace!(line = line_no, kind = kind.keyword(); "open fragment");
            stack.push(FrameBuilder::new(kind, condition, line_no));
            continue;
        }

        if let Some(caps) = ELSE_RE.captures(line) {
            match stack.last_mut() {
                Some(frame) if frame.fragment.kind == FragmentKind::Alt => {
                    frame.start_alternative(capture_condition(&caps));
                }
                _ => return Err(ParseError::MisplacedElse { line: line_no }),
            }
            continue;
        }

        if END_RE.is_match(line) {
            let Some(frame) = stack.pop() else {
                return Err(ParseError::UnmatchedEnd { line: line_no });
            };
            let fragment = frame.finish();
            route(&mut stack, &mut diagram.elements, Element::Fragment(fragment));
            continue;
        }

        if let Some(message) = parse_message_line(line) {
            diagram.ensure_participant(&message.from);
            diagram.ensure_participant(&message.to);
            route(&mut stack, &mut diagram.elements, Element::Message(message));
            continue;
        }

        warn!(line = line_no, text = line; "ignoring unrecognized line");
    }

    if let Some(frame) = stack.pop() {
        return Err(ParseError::UnclosedFragment {
            kind: frame.fragment.kind,
            line: frame.line,
        });
    }

    debug!(
        participants = diagram.participants.len(),
        elements = diagram.elements.len();
        "sequence diagram parsed"
    );
    Ok(diagram)
}

fn route(stack: &mut [FrameBuilder], top_level: &mut Vec<Element>, element: Element) {
    match stack.last_mut() {
        Some(frame) => frame.push(element),
        None => top_level.push(element),
    }
}

fn capture_condition(caps: &regex::Captures<'_>) -> String {
    caps.get(caps.len() - 1)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// `<source> <arrow> <target>: <text>`. The leftmost arrow wins; the text starts after the
/// first colon that follows it.
fn parse_message_line(line: &str) -> Option<Message> {
    for (pos, _) in line.match_indices('-') {
        let Some((message_type, len)) = arrow_at(line, pos) else {
            continue;
        };
        let source = line[..pos].trim();
        let Some((target, text)) = line[pos + len..].split_once(':') else {
            continue;
        };
        let target = target.trim();
        if source.is_empty() || target.is_empty() {
            continue;
        }
        return Some(Message::new(source, target, text, message_type));
    }
    None
}

/// Arrow starting at byte `pos`, longest token first. A bare dash only counts when it
/// stands apart, so `my-service` stays a name.
fn arrow_at(line: &str, pos: usize) -> Option<(MessageType, usize)> {
    let rest = &line[pos..];
    if let Some(token) = ARROW_TOKENS.iter().find(|token| rest.starts_with(**token)) {
        return MessageType::from_arrow(token).map(|kind| (kind, token.len()));
    }
    let spaced = line[..pos].ends_with(char::is_whitespace)
        && line[pos + 1..].starts_with(char::is_whitespace);
    spaced.then_some((MessageType::Sync, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(element: &Element) -> &Message {
        match element {
            Element::Message(message) => message,
            Element::Fragment(fragment) => panic!("expected message, got {fragment:?}"),
        }
    }

    fn fragment(element: &Element) -> &Fragment {
        match element {
            Element::Fragment(fragment) => fragment,
            Element::Message(message) => panic!("expected fragment, got {message:?}"),
        }
    }

    #[test]
    fn parse_request_and_response() {
        let parsed = parse_sequence("sequence:\nA -> B: Hello\nB --> A: Hi").unwrap();
        assert_eq!(parsed.participants, vec!["A", "B"]);
        assert_eq!(parsed.elements.len(), 2);
        let first = message(&parsed.elements[0]);
        assert_eq!(first.message_type, MessageType::Sync);
        assert_eq!(first.text, "Hello");
        assert!(!first.is_self);
        let second = message(&parsed.elements[1]);
        assert_eq!(second.message_type, MessageType::Response);
        assert_eq!(second.from, "B");
        assert_eq!(second.to, "A");
        assert!(!second.is_self);
    }

    #[test]
    fn parse_self_message() {
        let parsed = parse_sequence("sequence:\nA -> A: Ping").unwrap();
        assert_eq!(parsed.participants, vec!["A"]);
        assert!(message(&parsed.elements[0]).is_self);
    }

    #[test]
    fn parse_loop_fragment() {
        let parsed = parse_sequence("sequence:\nloop [n times]\nA -> B: X\nend").unwrap();
        assert_eq!(parsed.elements.len(), 1);
        let frag = fragment(&parsed.elements[0]);
        assert_eq!(frag.kind, FragmentKind::Loop);
        assert_eq!(frag.condition, "n times");
        assert_eq!(frag.elements.len(), 1);
        assert!(frag.alternatives.is_empty());
    }

    #[test]
    fn alt_body_becomes_first_alternative() {
        let input = "sequence:\nalt [cond1]\nA -> B: X\nelse [cond2]\nA -> C: Y\nend";
        let parsed = parse_sequence(input).unwrap();
        let frag = fragment(&parsed.elements[0]);
        assert_eq!(frag.kind, FragmentKind::Alt);
        assert!(frag.elements.is_empty());
        assert_eq!(frag.alternatives.len(), 2);
        assert_eq!(frag.alternatives[0].condition, "cond1");
        assert_eq!(message(&frag.alternatives[0].elements[0]).text, "X");
        assert_eq!(frag.alternatives[1].condition, "cond2");
        assert_eq!(message(&frag.alternatives[1].elements[0]).text, "Y");
        assert_eq!(parsed.participants, vec!["A", "B", "C"]);
    }

    #[test]
    fn alt_without_else_keeps_plain_body() {
        let parsed = parse_sequence("sequence:\nalt [only]\nA -> B: X\nend").unwrap();
        let frag = fragment(&parsed.elements[0]);
        assert_eq!(frag.elements.len(), 1);
        assert!(frag.alternatives.is_empty());
    }

    #[test]
    fn alt_with_empty_body_has_no_implicit_alternative() {
        let input = "sequence:\nalt [c]\nelse [a]\nA -> B: X\nelse [b]\nB -> A: Y\nend";
        let parsed = parse_sequence(input).unwrap();
        let frag = fragment(&parsed.elements[0]);
        assert_eq!(frag.condition, "c");
        let conditions: Vec<_> = frag.alternatives.iter().map(|a| a.condition.as_str()).collect();
        assert_eq!(conditions, vec!["a", "b"]);
    }

    #[test]
    fn misplaced_else_reports_line() {
        let err = parse_sequence("sequence:\nelse [bad]").unwrap_err();
        assert_eq!(err, ParseError::MisplacedElse { line: 2 });
    }

    #[test]
    fn else_inside_non_alt_is_misplaced() {
        let err = parse_sequence("sequence:\nloop\nA -> B: X\nelse\nend").unwrap_err();
        assert_eq!(err, ParseError::MisplacedElse { line: 4 });
    }

    #[test]
    fn else_binds_to_innermost_fragment() {
        let input = "sequence:\nalt [x]\nloop\nA -> B: X\nelse\nend\nend";
        let err = parse_sequence(input).unwrap_err();
        assert_eq!(err, ParseError::MisplacedElse { line: 5 });
    }

    #[test]
    fn unclosed_fragment_names_kind() {
        let err = parse_sequence("sequence:\nloop\nA -> B: X").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnclosedFragment {
                kind: FragmentKind::Loop,
                line: 2
            }
        );
    }

    #[test]
    fn unclosed_reports_innermost_fragment() {
        let err = parse_sequence("sequence:\nloop\nopt [maybe]\nA -> B: X").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnclosedFragment {
                kind: FragmentKind::Opt,
                line: 3
            }
        );
    }

    #[test]
    fn unmatched_end_reports_line() {
        let err = parse_sequence("sequence:\nA -> B: X\n\nend").unwrap_err();
        assert_eq!(err, ParseError::UnmatchedEnd { line: 4 });
    }

    #[test]
    fn missing_header() {
        assert_eq!(
            parse_sequence("A -> B: X").unwrap_err(),
            ParseError::MissingHeader
        );
        assert_eq!(parse_sequence("").unwrap_err(), ParseError::MissingHeader);
        assert_eq!(parse_sequence("   \n\n").unwrap_err(), ParseError::MissingHeader);
    }

    #[test]
    fn header_is_case_insensitive_after_blank_lines() {
        let parsed = parse_sequence("\n\n  SEQUENCE:\nA -> B: X").unwrap();
        assert_eq!(parsed.elements.len(), 1);
    }

    #[test]
    fn arrows_match_longest_first() {
        let parsed =
            parse_sequence("sequence:\nA->B:x\nA->>B: y\nB-->A: z\nA - B: w\nmy-app -> db: q")
                .unwrap();
        let kinds: Vec<_> = parsed
            .elements
            .iter()
            .map(|el| message(el).message_type)
            .collect();
        assert_eq!(
            kinds,
            vec![
                MessageType::Sync,
                MessageType::Async,
                MessageType::Response,
                MessageType::Sync,
                MessageType::Sync
            ]
        );
        assert_eq!(message(&parsed.elements[0]).text, "x");
        assert_eq!(message(&parsed.elements[4]).from, "my-app");
        assert_eq!(parsed.participants, vec!["A", "B", "my-app", "db"]);
    }

    #[test]
    fn participant_names_may_contain_spaces() {
        let parsed = parse_sequence("sequence:\nWeb Client -> Auth Server: login: retry").unwrap();
        let msg = message(&parsed.elements[0]);
        assert_eq!(msg.from, "Web Client");
        assert_eq!(msg.to, "Auth Server");
        assert_eq!(msg.text, "login: retry");
    }

    #[test]
    fn colon_inside_source_name() {
        let parsed = parse_sequence("sequence:\nsvc:8080 -> db: query\ndb --> svc:8080: rows").unwrap();
        assert_eq!(parsed.elements.len(), 2);
        let request = message(&parsed.elements[0]);
        assert_eq!(request.from, "svc:8080");
        assert_eq!(request.to, "db");
        assert_eq!(request.text, "query");
        let reply = message(&parsed.elements[1]);
        assert_eq!(reply.message_type, MessageType::Response);
        assert_eq!(reply.to, "svc");
        assert_eq!(reply.text, "8080: rows");
        assert_eq!(parsed.participants, vec!["svc:8080", "db", "svc"]);
    }

    #[test]
    fn text_may_hold_arrows_and_dashes() {
        let parsed = parse_sequence("sequence:\nA -> B: x -> y\nA - B: a - b\nA -> B").unwrap();
        assert_eq!(parsed.elements.len(), 2);
        assert_eq!(message(&parsed.elements[0]).text, "x -> y");
        assert_eq!(message(&parsed.elements[1]).to, "B");
        assert_eq!(message(&parsed.elements[1]).text, "a - b");
    }

    #[test]
    fn keyword_with_trailing_tokens_falls_through() {
        let parsed = parse_sequence("sequence:\nloop -> B: spin\nloop forever").unwrap();
        assert_eq!(parsed.elements.len(), 1);
        assert_eq!(message(&parsed.elements[0]).from, "loop");
    }

    #[test]
    fn unknown_lines_are_ignored() {
        let parsed = parse_sequence("sequence:\n# a comment\nA -> B: X\nnonsense").unwrap();
        assert_eq!(parsed.elements.len(), 1);
    }

    #[test]
    fn nested_fragments_route_into_active_alternative() {
        let input = "sequence:\nalt [a]\nA -> B: 1\nelse [b]\nloop [again]\nB -> C: 2\nend\nC --> A: 3\nend\nA -> A: done";
        let parsed = parse_sequence(input).unwrap();
        assert_eq!(parsed.elements.len(), 2);
        let alt = fragment(&parsed.elements[0]);
        assert_eq!(alt.alternatives.len(), 2);
        let second = &alt.alternatives[1].elements;
        assert_eq!(second.len(), 2);
        let inner = fragment(&second[0]);
        assert_eq!(inner.kind, FragmentKind::Loop);
        assert_eq!(inner.condition, "again");
        assert_eq!(message(&second[1]).message_type, MessageType::Response);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let parsed = parse_sequence("sequence:\nPAR\nA -> B: X\nEnd\nCritical[lock]\nB -> A: Y\nEND").unwrap();
        assert_eq!(fragment(&parsed.elements[0]).kind, FragmentKind::Par);
        let critical = fragment(&parsed.elements[1]);
        assert_eq!(critical.kind, FragmentKind::Critical);
        assert_eq!(critical.condition, "lock");
    }

    #[test]
    fn every_fragment_kind_parses() {
        for kind in FragmentKind::ALL {
            let input = format!("sequence:\n{} [c]\nA -> B: X\nend", kind.keyword());
            let parsed = parse_sequence(&input).unwrap();
            assert_eq!(fragment(&parsed.elements[0]).kind, kind);
        }
    }
}
