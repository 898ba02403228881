//! 任务结构森林 → 平铺的节点 / 边图描述，输出 Mermaid 文本。
//!
//! 节点 id 由 `stage_name` 中的非单词字符替换为下划线得到。两个不同阶段清洗后
//! 同名时会被合并为一个节点，这是已知限制，编译时会记录到 `collisions` 并告警。

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use tracing::warn;

use crate::models::{StageStatus, StatusSnapshot, TaskTreeNode};

const STYLE_BLOCK: &str = "\
classDef whiteNode fill:#ffffff,stroke:#333,stroke-width:1px;
classDef greyNode fill:#f3f4f6,stroke:#999,stroke-width:1px;
classDef greenNode fill:#dcfce7,stroke:#16a34a,stroke-width:2px;
";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeShape {
    Box,
    Round,
    Subgraph,
}

impl NodeShape {
    pub fn for_func(func_name: &str) -> Self {
        match func_name {
            "_split_task" => Self::Round,
            "_trans_redis" => Self::Subgraph,
            _ => Self::Box,
        }
    }

    fn wrap(self, label: &str) -> String {
        let label = escape_label(label);
        match self {
            Self::Box => format!("[\"{label}\"]"),
            Self::Round => format!("(\"{label}\")"),
            Self::Subgraph => format!("[[\"{label}\"]]"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    /// 无状态信息或未运行
    White,
    Grey,
    Green,
}

impl StatusClass {
    pub fn lookup(node: &TaskTreeNode, statuses: &StatusSnapshot) -> Self {
        match statuses.get(&node.status_tag()).map(|status| status.status) {
            Some(StageStatus::Running) => Self::Green,
            Some(StageStatus::Stopped) => Self::Grey,
            Some(StageStatus::NotRunning) | None => Self::White,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::White => "whiteNode",
            Self::Grey => "greyNode",
            Self::Green => "greenNode",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
    pub class: StatusClass,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdCollision {
    pub id: String,
    pub stage_names: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphDescription {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub collisions: Vec<IdCollision>,
}

impl GraphDescription {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");
        for node in &self.nodes {
            let _ = writeln!(out, "  {}{}", node.id, node.shape.wrap(&node.label));
        }
        for edge in &self.edges {
            let _ = writeln!(out, "  {} --> {}", edge.from, edge.to);
        }
        for node in &self.nodes {
            let _ = writeln!(out, "  class {} {};", node.id, node.class.name());
        }
        out.push_str(STYLE_BLOCK);
        out
    }
}

/// `\W+` → `_`，连续的非单词字符只替换成一个下划线。
pub fn node_id(stage_name: &str) -> String {
    let mut id = String::with_capacity(stage_name.len());
    let mut in_run = false;
    for ch in stage_name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            id.push(ch);
            in_run = false;
        } else if !in_run {
            id.push('_');
            in_run = true;
        }
    }
    id
}

#[derive(Default)]
struct GraphBuilder {
    nodes: Vec<GraphNode>,
    node_index: HashMap<String, usize>,
    sources: HashMap<String, Vec<String>>,
    edges: Vec<GraphEdge>,
    edge_set: HashSet<GraphEdge>,
}

impl GraphBuilder {
    fn visit(&mut self, node: &TaskTreeNode, statuses: &StatusSnapshot) {
        let id = node_id(&node.stage_name);
        let entry = GraphNode {
            id: id.clone(),
            label: node.stage_name.clone(),
            shape: NodeShape::for_func(&node.func_name),
            class: StatusClass::lookup(node, statuses),
        };

        // 重复访问时保留首次出现的位置，内容以最后一次为准
        match self.node_index.get(&id) {
            Some(&slot) => self.nodes[slot] = entry,
            None => {
                self.node_index.insert(id.clone(), self.nodes.len());
                self.nodes.push(entry);
            }
        }

        let names = self.sources.entry(id.clone()).or_default();
        if !names.contains(&node.stage_name) {
            names.push(node.stage_name.clone());
        }

        for child in &node.next_stages {
            let edge = GraphEdge {
                from: id.clone(),
                to: node_id(&child.stage_name),
            };
            if self.edge_set.insert(edge.clone()) {
                self.edges.push(edge);
            }
            self.visit(child, statuses);
        }
    }

    fn finish(self) -> GraphDescription {
        let collisions: Vec<IdCollision> = self
            .nodes
            .iter()
            .filter_map(|node| {
                let names = self.sources.get(&node.id)?;
                (names.len() > 1).then(|| IdCollision {
                    id: node.id.clone(),
                    stage_names: names.clone(),
                })
            })
            .collect();

        for collision in &collisions {
            warn!(
                id = %collision.id,
                stages = ?collision.stage_names,
                "distinct stages share a graph node id and are rendered as one node"
            );
        }

        GraphDescription {
            nodes: self.nodes,
            edges: self.edges,
            collisions,
        }
    }
}

/// 深度优先遍历每一棵树；相同输入产生相同输出。
pub fn compile_graph(forest: &[TaskTreeNode], statuses: &StatusSnapshot) -> GraphDescription {
    let mut builder = GraphBuilder::default();
    for root in forest {
        builder.visit(root, statuses);
    }
    builder.finish()
}

fn escape_label(label: &str) -> String {
    label.replace('"', "#quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn forest(value: serde_json::Value) -> Vec<TaskTreeNode> {
        serde_json::from_value(value).unwrap()
    }

    fn statuses(value: serde_json::Value) -> StatusSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn root_and_child_compile_to_one_edge() {
        let tree = forest(json!([
            {"stage_name": "Root", "func_name": "f", "next_stages": [
                {"stage_name": "Child", "func_name": "g", "next_stages": []}
            ]}
        ]));
        let graph = compile_graph(&tree, &StatusSnapshot::default());
        assert_eq!(
            graph.edges,
            vec![GraphEdge {
                from: "Root".into(),
                to: "Child".into()
            }]
        );
        assert_eq!(graph.nodes.len(), 2);
        assert_ne!(graph.nodes[0].id, graph.nodes[1].id);
        assert!(graph.to_mermaid().contains("  Root --> Child\n"));
        assert!(graph.collisions.is_empty());
    }

    #[test]
    fn node_id_collapses_non_word_runs() {
        assert_eq!(node_id("Stage A"), "Stage_A");
        assert_eq!(node_id("a--b c"), "a_b_c");
        assert_eq!(node_id("keep_under"), "keep_under");
        assert_eq!(node_id("结果"), "_");
    }

    #[test]
    fn shapes_and_status_classes() {
        let tree = forest(json!([
            {"stage_name": "Split", "func_name": "_split_task", "next_stages": [
                {"stage_name": "Redis", "func_name": "_trans_redis"},
                {"stage_name": "Plain", "func_name": "work"}
            ]}
        ]));
        let states = statuses(json!({
            "Split[_split_task]": {"status": 1},
            "Redis[_trans_redis]": {"status": 2},
        }));
        let graph = compile_graph(&tree, &states);
        let shapes: Vec<NodeShape> = graph.nodes.iter().map(|n| n.shape).collect();
        assert_eq!(shapes, vec![NodeShape::Round, NodeShape::Subgraph, NodeShape::Box]);
        let classes: Vec<StatusClass> = graph.nodes.iter().map(|n| n.class).collect();
        assert_eq!(
            classes,
            vec![StatusClass::Green, StatusClass::Grey, StatusClass::White]
        );

        let code = graph.to_mermaid();
        assert!(code.starts_with("graph TD\n"));
        assert!(code.contains("  Split(\"Split\")\n"));
        assert!(code.contains("  Redis[[\"Redis\"]]\n"));
        assert!(code.contains("  class Plain whiteNode;\n"));
        assert!(code.contains("classDef greenNode"));
    }

    #[test]
    fn shared_child_does_not_duplicate_edges() {
        let tree = forest(json!([
            {"stage_name": "A", "func_name": "f", "next_stages": [
                {"stage_name": "Shared", "func_name": "g"}
            ]},
            {"stage_name": "A", "func_name": "f", "next_stages": [
                {"stage_name": "Shared", "func_name": "g"}
            ]}
        ]));
        let graph = compile_graph(&tree, &StatusSnapshot::default());
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn sanitized_id_collisions_are_reported() {
        let tree = forest(json!([
            {"stage_name": "load data", "func_name": "f", "next_stages": [
                {"stage_name": "load-data", "func_name": "g"}
            ]}
        ]));
        let graph = compile_graph(&tree, &StatusSnapshot::default());
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.collisions.len(), 1);
        assert_eq!(graph.collisions[0].id, "load_data");
        assert_eq!(
            graph.collisions[0].stage_names,
            vec!["load data".to_string(), "load-data".to_string()]
        );
    }

    #[test]
    fn compilation_is_deterministic() {
        let tree = forest(json!([
            {"stage_name": "R", "func_name": "f", "next_stages": [
                {"stage_name": "X", "func_name": "g"},
                {"stage_name": "Y", "func_name": "g", "next_stages": [
                    {"stage_name": "Z", "func_name": "h"}
                ]}
            ]}
        ]));
        let states = statuses(json!({"Y[g]": {"status": 1}}));
        let first = compile_graph(&tree, &states).to_mermaid();
        let second = compile_graph(&tree, &states).to_mermaid();
        assert_eq!(first, second);
    }

    #[test]
    fn labels_escape_quotes() {
        let tree = forest(json!([{"stage_name": "say \"hi\"", "func_name": "f"}]));
        let code = compile_graph(&tree, &StatusSnapshot::default()).to_mermaid();
        assert!(code.contains("say #quot;hi#quot;"));
    }
}
