use dioxus::prelude::*;

use crate::format::format_duration;
use crate::state::use_app_state;

#[component]
fn SummaryTile(label: &'static str, value: String, tone: &'static str) -> Element {
    rsx! {
        div { class: "rounded-lg border border-slate-200 bg-white p-3 shadow-sm",
            p { class: "text-xs text-slate-500", "{label}" }
            p { class: format!("text-lg font-semibold {tone}"), "{value}" }
        }
    }
}

#[component]
pub fn SummaryPanel() -> Element {
    let state = use_app_state();
    let frame = state.read();
    let summary = frame.model.frame.summary.clone();
    let backend = frame.model.frame.backend_summary.clone();
    drop(frame);

    let remain = backend
        .as_ref()
        .map(|backend| format_duration(backend.total_remain))
        .unwrap_or_else(|| "-".to_string());
    let backend_title = backend
        .map(|b| {
            format!(
                "后端合计：成功 {} / 等待 {} / 失败 {} / 重复 {} / 节点 {}",
                b.total_successed, b.total_pending, b.total_failed, b.total_duplicated, b.total_nodes
            )
        })
        .unwrap_or_default();

    let nodes = format!("{} / {}", summary.active, summary.total_nodes);

    rsx! {
        section { class: "grid grid-cols-2 gap-3 md:grid-cols-7", title: "{backend_title}",
            SummaryTile { label: "运行节点", value: nodes, tone: "text-emerald-600" }
            SummaryTile { label: "成功", value: summary.successed.to_string(), tone: "text-slate-900" }
            SummaryTile { label: "已处理", value: summary.processed.to_string(), tone: "text-slate-900" }
            SummaryTile { label: "等待", value: summary.pending.to_string(), tone: "text-sky-600" }
            SummaryTile { label: "失败", value: summary.failed.to_string(), tone: "text-red-600" }
            SummaryTile { label: "重复", value: summary.duplicated.to_string(), tone: "text-amber-600" }
            SummaryTile { label: "预计剩余", value: remain, tone: "text-slate-900" }
        }
    }
}
