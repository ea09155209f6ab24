use crate::ir::Participant;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActivationRecord {
    start_row: usize,
    depth: usize,
}

/// A finished activation bar on one participant's lifeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationInterval {
    pub participant: Participant,
    pub start_row: usize,
    pub end_row: usize,
    /// Number of activations already open on the same participant when this one started.
    pub depth: usize,
    /// `false` when no response closed it and the walk ended first.
    pub closed: bool,
}

/// Per-participant stacks of open activations, owned by a single layout run.
#[derive(Debug, Default)]
pub(crate) struct ActivationTracker {
    stacks: HashMap<Participant, Vec<ActivationRecord>>,
    finished: Vec<ActivationInterval>,
}

impl ActivationTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn activate(&mut self, participant: &str, row: usize) {
        let stack = self.stacks.entry(participant.to_string()).or_default();
        let depth = stack.len();
        stack.push(ActivationRecord {
            start_row: row,
            depth,
        });
    }

    /// Pops the innermost open activation. Returns `false` when nothing was open.
    pub(crate) fn deactivate(&mut self, participant: &str, row: usize) -> bool {
        let Some(record) = self.stacks.get_mut(participant).and_then(Vec::pop) else {
            return false;
        };
        self.finished.push(ActivationInterval {
            participant: participant.to_string(),
            start_row: record.start_row,
            end_row: row.max(record.start_row),
            depth: record.depth,
            closed: true,
        });
        true
    }

    pub(crate) fn open_count(&self) -> usize {
        self.stacks.values().map(Vec::len).sum()
    }

    /// Closes whatever is still open at `last_row` and returns every interval.
    ///
    /// Leftovers are emitted in participant order, then by name for participants the
    /// diagram does not list, so the output stays deterministic.
    pub(crate) fn finish(mut self, last_row: usize, order: &[Participant]) -> Vec<ActivationInterval> {
        let mut leftover: Vec<Participant> = self
            .stacks
            .iter()
            .filter(|(_, stack)| !stack.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        leftover.sort_by_key(|name| {
            (
                order.iter().position(|p| p == name).unwrap_or(usize::MAX),
                name.clone(),
            )
        });

        for name in leftover {
            let Some(stack) = self.stacks.remove(&name) else {
                continue;
            };
            for record in stack {
                self.finished.push(ActivationInterval {
                    participant: name.clone(),
                    start_row: record.start_row,
                    end_row: last_row.max(record.start_row),
                    depth: record.depth,
                    closed: false,
                });
            }
        }
        self.finished
    }
}
