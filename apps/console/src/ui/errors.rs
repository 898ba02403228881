use dioxus::prelude::*;

use crate::format::format_timestamp;
use crate::state::{use_app_actions, use_app_state};

const ALL_NODES: &str = "";

#[component]
pub fn ErrorTable() -> Element {
    let actions = use_app_actions();
    let state = use_app_state();
    let snapshot = state.read();
    let page = snapshot.model.error_page().clone();
    let options = snapshot.model.frame.filter_options.clone();
    let selected = snapshot
        .model
        .view
        .error_filter_node
        .clone()
        .unwrap_or_else(|| ALL_NODES.to_string());
    drop(snapshot);

    let mut jump = use_signal(String::new);

    let on_filter = {
        let actions = actions.clone();
        move |evt: FormEvent| actions.set_error_filter(Some(&evt.value()))
    };
    let prev = {
        let actions = actions.clone();
        let current = page.page;
        move |_: MouseEvent| actions.set_error_page(current.saturating_sub(1))
    };
    let next = {
        let actions = actions.clone();
        let current = page.page;
        move |_: MouseEvent| actions.set_error_page(current + 1)
    };
    let on_jump = {
        let actions = actions.clone();
        move |evt: FormEvent| {
            evt.prevent_default();
            // 非数字输入按第一页处理，越界由页码夹取负责
            let target = jump.read().trim().parse::<usize>().unwrap_or(1);
            actions.set_error_page(target);
            jump.set(String::new());
        }
    };

    let page_count = page.page_count.max(1);

    rsx! {
        section { class: "rounded-lg border border-slate-200 bg-white p-4 shadow-sm space-y-3",
            div { class: "flex flex-wrap items-center justify-between gap-2",
                h2 { class: "text-sm font-semibold text-slate-900", "错误日志 ({page.total})" }
                select {
                    class: "rounded border border-slate-300 px-2 py-1 text-sm",
                    value: "{selected}",
                    onchange: on_filter,
                    option { value: ALL_NODES, selected: selected == ALL_NODES, "全部节点" }
                    for node in options {
                        option { value: "{node}", selected: node == selected, "{node}" }
                    }
                }
            }
            if page.rows.is_empty() {
                p { class: "text-xs text-slate-500", "暂无错误" }
            } else {
                table { class: "w-full table-fixed text-left text-xs",
                    thead {
                        tr { class: "text-slate-500",
                            th { class: "w-40 py-1", "时间" }
                            th { class: "w-40 py-1", "节点" }
                            th { class: "w-32 py-1", "任务" }
                            th { class: "py-1", "错误" }
                        }
                    }
                    tbody {
                        for row in page.rows.iter() {
                            tr { class: "border-t border-slate-100 align-top",
                                td { class: "py-1 font-mono", {format_timestamp(row.timestamp)} }
                                td { class: "py-1 truncate", title: "{row.node}", "{row.node}" }
                                td { class: "py-1 font-mono truncate", title: "{row.task_id}", "{row.task_id}" }
                                td { class: "py-1 break-all text-red-700", "{row.error}" }
                            }
                        }
                    }
                }
            }
            div { class: "flex items-center justify-end gap-2 text-xs",
                button {
                    class: "rounded bg-slate-100 px-2 py-1 disabled:opacity-40",
                    disabled: page.page <= 1,
                    onclick: prev,
                    "上一页"
                }
                span { class: "text-slate-600", "{page.page} / {page_count}" }
                button {
                    class: "rounded bg-slate-100 px-2 py-1 disabled:opacity-40",
                    disabled: page.page >= page_count,
                    onclick: next,
                    "下一页"
                }
                form { class: "flex items-center gap-1", onsubmit: on_jump,
                    input {
                        class: "w-14 rounded border border-slate-300 px-1 py-0.5",
                        r#type: "number",
                        min: "1",
                        value: "{jump}",
                        oninput: move |evt: FormEvent| jump.set(evt.value()),
                    }
                    button { class: "rounded bg-slate-100 px-2 py-1", r#type: "submit", "跳转" }
                }
            }
        }
    }
}
