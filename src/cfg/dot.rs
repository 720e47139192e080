use std::fmt::Write;

use super::builder::EntryPoint;

/// Render every method's graph as one Graphviz digraph, a cluster per
/// method and a box per block.
pub fn to_dot(entry_points: &[EntryPoint<'_>]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph CFG {{");
    let _ = writeln!(out, "    node [shape=box, fontname=\"monospace\"];");

    for (index, entry_point) in entry_points.iter().enumerate() {
        let graph = &entry_point.graph;
        let order = graph.depth_first();

        let _ = writeln!(out, "    subgraph cluster_{} {{", index);
        let _ = writeln!(out, "        label=\"{}\";", escape(&entry_point.qualified_name()));
        for &id in &order {
            let block = &graph.node(id).block;
            let mut text = format!("{}:\\l", escape(&block.label));
            for tac in &block.instructions {
                text.push_str(&escape(&tac.to_string()));
                text.push_str("\\l");
            }
            let _ = writeln!(out, "        {} [label=\"{}\"];", block.label, text);
        }
        let _ = writeln!(out, "    }}");

        for &id in &order {
            let node = graph.node(id);
            let from = graph.label(id);
            if let Some(to) = node.true_exit {
                let _ = writeln!(out, "    {} -> {} [label=\"True\"];", from, graph.label(to));
            }
            if let Some(to) = node.false_exit {
                let _ = writeln!(out, "    {} -> {} [label=\"False\"];", from, graph.label(to));
            }
        }
    }

    let _ = writeln!(out, "}}");
    out
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::SymbolTable;
    use crate::cfg::{CfgBuilder, NameGen};
    use crate::lang::{Node, NodeKind};

    #[test]
    fn test_clusters_and_edges() {
        let ident = |name: &str| Node::new(NodeKind::Identifier, name, 1);
        let body = vec![
            Node::new(NodeKind::VarDecl, "boolean", 1).with_child(ident("go")),
            Node::new(NodeKind::While, "", 2).with_children(vec![
                ident("go"),
                Node::new(NodeKind::Print, "", 2).with_child(Node::new(NodeKind::StringLiteral, "\"hi\"", 2)),
            ]),
        ];
        let main = Node::new(NodeKind::MethodDecl, "void", 1).with_children(vec![
            ident("main"),
            Node::new(NodeKind::MethodBody, "", 1).with_children(body),
        ]);
        let ast = Node::new(NodeKind::Program, "", 1).with_child(
            Node::new(NodeKind::MainClass, "", 1).with_children(vec![ident("Main"), main]),
        );
        let table = SymbolTable::build(&ast);
        let entry_points = CfgBuilder::new(&table, NameGen::new()).build_all("main").unwrap();

        let dot = to_dot(&entry_points);
        assert!(dot.starts_with("digraph CFG {\n"));
        assert!(dot.contains("subgraph cluster_0 {"));
        assert!(dot.contains("label=\"Main.main\";"));
        assert!(dot.contains("L0 -> L1 [label=\"True\"];"));
        assert!(dot.contains("L1 -> L2 [label=\"True\"];"));
        assert!(dot.contains("L1 -> L3 [label=\"False\"];"));
        assert!(dot.contains("L2 -> L1 [label=\"True\"];"));
        assert!(dot.contains("print \\\"hi\\\"\\l"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
