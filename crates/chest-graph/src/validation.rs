use std::collections::HashMap;

use serde::Serialize;

use chest_types::ChestId;

use crate::chest::ItemChest;
use crate::graph::ChestGraph;

/// Result of checking a graph against its link invariants.
///
/// Graphs built only through [`ChestGraph`] mutations always validate.
/// Violations show up when a data file was edited by hand or written by a
/// buggy older build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub chest_count: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub(crate) fn build(graph: &ChestGraph) -> Self {
        let mut by_id: HashMap<&str, &ItemChest> = HashMap::with_capacity(graph.len());
        let mut violations = Vec::new();

        for chest in graph {
            if by_id.insert(chest.id().as_str(), chest).is_some() {
                violations.push(Violation {
                    chest: chest.id().clone(),
                    kind: ViolationKind::DuplicateId,
                    description: format!("id {} is used by more than one chest", chest.id()),
                });
            }
        }

        for chest in graph {
            for receiver_id in chest.receivers() {
                match by_id.get(receiver_id.as_str()) {
                    None => violations.push(Violation {
                        chest: chest.id().clone(),
                        kind: ViolationKind::DanglingReceiver,
                        description: format!("receiver {receiver_id} does not exist"),
                    }),
                    Some(receiver) if !receiver.senders().contains(chest.id()) => {
                        violations.push(Violation {
                            chest: chest.id().clone(),
                            kind: ViolationKind::AsymmetricLink,
                            description: format!(
                                "sends to {receiver_id}, which does not list it as a sender"
                            ),
                        })
                    }
                    Some(_) => {}
                }
            }

            for sender_id in chest.senders() {
                match by_id.get(sender_id.as_str()) {
                    None => violations.push(Violation {
                        chest: chest.id().clone(),
                        kind: ViolationKind::DanglingSender,
                        description: format!("sender {sender_id} does not exist"),
                    }),
                    Some(sender) if !sender.receivers().contains(chest.id()) => {
                        violations.push(Violation {
                            chest: chest.id().clone(),
                            kind: ViolationKind::AsymmetricLink,
                            description: format!(
                                "receives from {sender_id}, which does not list it as a receiver"
                            ),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        Self {
            chest_count: graph.len(),
            violations,
        }
    }
}

/// A specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub chest: ChestId,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ViolationKind {
    DuplicateId,
    DanglingReceiver,
    DanglingSender,
    AsymmetricLink,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_from_json(raw: &str) -> ChestGraph {
        serde_json::from_str(raw).unwrap()
    }

    fn chest_json(id: &str, x: i32, senders: &[&str], receivers: &[&str]) -> String {
        serde_json::json!({
            "id": id,
            "cords": { "left": { "x": x, "y": 64, "z": 0, "world": "w" } },
            "senders": senders,
            "receivers": receivers,
        })
        .to_string()
    }

    #[test]
    fn consistent_graph_is_valid() {
        let raw = format!(
            "[{},{}]",
            chest_json("a", 0, &[], &["b"]),
            chest_json("b", 1, &["a"], &[])
        );
        let report = graph_from_json(&raw).validate();
        assert!(report.is_valid());
        assert_eq!(report.chest_count, 2);
    }

    #[test]
    fn detects_dangling_receiver() {
        let raw = format!("[{}]", chest_json("a", 0, &[], &["ghost"]));
        let report = graph_from_json(&raw).validate();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::DanglingReceiver);
        assert_eq!(report.violations[0].chest.as_str(), "a");
    }

    #[test]
    fn detects_dangling_sender() {
        let raw = format!("[{}]", chest_json("a", 0, &["ghost"], &[]));
        let report = graph_from_json(&raw).validate();
        assert_eq!(report.violations[0].kind, ViolationKind::DanglingSender);
    }

    #[test]
    fn detects_one_sided_link() {
        let raw = format!(
            "[{},{}]",
            chest_json("a", 0, &[], &["b"]),
            chest_json("b", 1, &[], &[])
        );
        let report = graph_from_json(&raw).validate();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::AsymmetricLink);
    }

    #[test]
    fn detects_duplicate_ids() {
        let raw = format!(
            "[{},{}]",
            chest_json("a", 0, &[], &[]),
            chest_json("a", 5, &[], &[])
        );
        let report = graph_from_json(&raw).validate();
        assert!(report
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::DuplicateId));
    }
}
