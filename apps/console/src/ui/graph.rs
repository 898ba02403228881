use std::collections::BTreeSet;

use dioxus::prelude::*;
use tracing::warn;

use crate::model::topology::{node_id, IdCollision};
use crate::models::TaskTreeNode;
use crate::state::{use_app_actions, use_app_state};

const GRAPH_CONTAINER_ID: &str = "pipeline-graph";

fn render_script(code: &str) -> String {
    let source = serde_json::to_string(code).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"(async () => {{
  const el = document.getElementById("{GRAPH_CONTAINER_ID}");
  if (!el || !window.mermaid) return;
  const {{ svg }} = await window.mermaid.render("pipeline-graph-svg", {source});
  el.innerHTML = svg;
}})();"#
    )
}

#[component]
pub fn GraphPanel() -> Element {
    let state = use_app_state();
    let snapshot = state.read();
    let code = snapshot.model.frame.mermaid.clone();
    let empty = snapshot.model.frame.graph.is_empty();
    let collisions = snapshot.model.frame.graph.collisions.clone();
    let forest = snapshot.model.topology.clone();
    let collapsed = snapshot.model.view.collapsed_nodes.clone();
    drop(snapshot);

    use_effect(use_reactive!(|(code, empty)| {
        if empty {
            return;
        }
        let eval = document::eval(&render_script(&code));
        spawn(async move {
            if let Err(err) = eval.await {
                warn!(?err, "mermaid render failed");
            }
        });
    }));

    rsx! {
        section { class: "rounded-lg border border-slate-200 bg-white p-4 shadow-sm space-y-3",
            h2 { class: "text-sm font-semibold text-slate-900", "任务结构" }
            if empty {
                p { class: "text-xs text-slate-500", "暂无结构数据" }
            } else {
                div { id: GRAPH_CONTAINER_ID, class: "overflow-auto" }
                for collision in collisions {
                    CollisionNotice { collision }
                }
                details { class: "text-xs text-slate-500",
                    summary { "节点树" }
                    ul { class: "mt-2 space-y-1",
                        for root in forest {
                            TreeItem { node: root, collapsed: collapsed.clone() }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn CollisionNotice(collision: IdCollision) -> Element {
    let names = collision.stage_names.join("、");
    rsx! {
        p { class: "text-xs text-amber-600",
            "节点 {names} 在图中共用标识 {collision.id}，被合并显示"
        }
    }
}

#[component]
fn TreeItem(node: TaskTreeNode, collapsed: BTreeSet<String>) -> Element {
    let actions = use_app_actions();
    let id = node_id(&node.stage_name);
    let is_collapsed = collapsed.contains(&id);
    let has_children = !node.next_stages.is_empty();
    let marker = match (has_children, is_collapsed) {
        (false, _) => "·",
        (true, true) => "▸",
        (true, false) => "▾",
    };

    rsx! {
        li {
            button {
                class: "font-mono text-slate-700 hover:text-slate-900",
                disabled: !has_children,
                onclick: move |_| actions.toggle_collapsed(&id),
                "{marker} {node.stage_name}"
                span { class: "ml-1 text-slate-400", "[{node.func_name}]" }
            }
            if has_children && !is_collapsed {
                ul { class: "ml-4 space-y-1",
                    for child in node.next_stages.iter().cloned() {
                        TreeItem { node: child, collapsed: collapsed.clone() }
                    }
                }
            }
        }
    }
}
