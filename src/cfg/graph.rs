use std::collections::HashSet;

use super::tac::Tac;

/// Fresh label and temporary names for one compilation.
///
/// Shared by every method built in the same run so labels stay unique
/// across the whole instruction stream.
#[derive(Debug, Default)]
pub struct NameGen {
    labels: usize,
    temps: usize,
}

impl NameGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(&mut self) -> String {
        let name = format!("L{}", self.labels);
        self.labels += 1;
        name
    }

    pub fn temp(&mut self) -> String {
        let name = format!("_t{}", self.temps);
        self.temps += 1;
        name
    }
}

/// Index of a node in a [`ControlFlowGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub label: String,
    pub instructions: Vec<Tac>,
}

/// A block plus its successors.
///
/// No exits: the block ends the method. Only `true_exit`: unconditional
/// jump. Both: conditional branch on `condition`, taking `false_exit` when it
/// is false.
#[derive(Debug, Clone)]
pub struct ControlFlowNode {
    pub block: Block,
    pub true_exit: Option<NodeId>,
    pub false_exit: Option<NodeId>,
    /// Operand tested by a conditional branch.
    pub condition: Option<String>,
}

impl ControlFlowNode {
    pub fn is_terminal(&self) -> bool {
        self.true_exit.is_none() && self.false_exit.is_none()
    }
}

/// Control-flow graph of one method, stored as an arena.
///
/// Loops make it cyclic, so every traversal tracks visited nodes.
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    nodes: Vec<ControlFlowNode>,
}

impl ControlFlowGraph {
    /// A graph holding only its (empty) entry node.
    pub fn new(names: &mut NameGen) -> Self {
        let mut graph = Self { nodes: Vec::new() };
        graph.add_node(names);
        graph
    }

    pub fn entry(&self) -> NodeId {
        NodeId(0)
    }

    pub fn add_node(&mut self, names: &mut NameGen) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ControlFlowNode {
            block: Block {
                label: names.label(),
                instructions: Vec::new(),
            },
            true_exit: None,
            false_exit: None,
            condition: None,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &ControlFlowNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn label(&self, id: NodeId) -> &str {
        &self.nodes[id.0].block.label
    }

    pub fn push(&mut self, id: NodeId, tac: Tac) {
        self.nodes[id.0].block.instructions.push(tac);
    }

    /// Wire an unconditional edge.
    pub fn jump(&mut self, from: NodeId, to: NodeId) {
        self.nodes[from.0].true_exit = Some(to);
    }

    /// Wire a conditional branch on `condition`.
    pub fn branch(&mut self, from: NodeId, condition: String, on_true: NodeId, on_false: NodeId) {
        let node = &mut self.nodes[from.0];
        node.condition = Some(condition);
        node.true_exit = Some(on_true);
        node.false_exit = Some(on_false);
    }

    /// Control transfer implied by a node's edges, if any.
    pub fn terminator(&self, id: NodeId) -> Option<Tac> {
        let node = self.node(id);
        match (node.true_exit, node.false_exit) {
            (Some(on_true), None) => Some(Tac::Jump {
                label: self.label(on_true).to_string(),
            }),
            (Some(_), Some(on_false)) => Some(Tac::IfFalse {
                condition: node.condition.clone().unwrap_or_default(),
                label: self.label(on_false).to_string(),
            }),
            _ => None,
        }
    }

    /// Reachable nodes in depth-first order from the entry, true exits
    /// before false exits.
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut pending = vec![self.entry()];

        while let Some(id) = pending.pop() {
            if !visited.insert(id) {
                continue;
            }
            order.push(id);

            let node = self.node(id);
            if let Some(on_false) = node.false_exit {
                pending.push(on_false);
            }
            if let Some(on_true) = node.true_exit {
                pending.push(on_true);
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique_and_sequential() {
        let mut names = NameGen::new();
        assert_eq!(names.label(), "L0");
        assert_eq!(names.label(), "L1");
        assert_eq!(names.temp(), "_t0");
        assert_eq!(names.temp(), "_t1");
    }

    #[test]
    fn test_terminators() {
        let mut names = NameGen::new();
        let mut graph = ControlFlowGraph::new(&mut names);
        let entry = graph.entry();
        let body = graph.add_node(&mut names);
        let join = graph.add_node(&mut names);

        graph.branch(entry, "c".to_string(), body, join);
        graph.jump(body, entry);

        assert_eq!(
            graph.terminator(entry),
            Some(Tac::IfFalse {
                condition: "c".to_string(),
                label: "L2".to_string()
            })
        );
        assert_eq!(graph.terminator(body), Some(Tac::Jump { label: "L0".to_string() }));
        assert_eq!(graph.terminator(join), None);
        assert!(graph.node(join).is_terminal());
    }

    #[test]
    fn test_depth_first_terminates_on_cycles() {
        let mut names = NameGen::new();
        let mut graph = ControlFlowGraph::new(&mut names);
        let entry = graph.entry();
        let cond = graph.add_node(&mut names);
        let body = graph.add_node(&mut names);
        let join = graph.add_node(&mut names);
        let unreachable = graph.add_node(&mut names);

        graph.jump(entry, cond);
        graph.branch(cond, "c".to_string(), body, join);
        graph.jump(body, cond);

        assert_eq!(graph.depth_first(), vec![entry, cond, body, join]);
        assert!(!graph.depth_first().contains(&unreachable));
    }
}
