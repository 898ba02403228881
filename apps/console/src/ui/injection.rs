use std::collections::BTreeSet;

use dioxus::prelude::*;

use crate::services::injection::{self, selectable_nodes, TERMINATION_PRESET};
use crate::state::{use_app_actions, use_app_state};
use crate::API_CLIENT;

const CONTEXT: &str = "任务注入";

#[component]
pub fn InjectionPanel() -> Element {
    let actions = use_app_actions();
    let state = use_app_state();
    let mut search = use_signal(String::new);
    let mut payload = use_signal(String::new);
    let mut selected = use_signal(BTreeSet::<String>::new);
    let mut submitting = use_signal(|| false);

    let no_nodes = state.read().model.status.snapshot().is_empty();
    let nodes = selectable_nodes(state.read().model.status.snapshot(), &search.read());

    let on_submit = {
        let actions = actions.clone();
        move |evt: FormEvent| {
            evt.prevent_default();
            if *submitting.read() {
                return;
            }
            let Some(client) = API_CLIENT.get().cloned() else {
                actions.set_operation_error(CONTEXT, "客户端未初始化".to_string());
                return;
            };
            // 勾选之后才停止的节点不再提交
            let targets: Vec<String> = selectable_nodes(state.read().model.status.snapshot(), "")
                .into_iter()
                .filter(|node| node.selectable && selected.read().contains(&node.name))
                .map(|node| node.name)
                .collect();
            let input = payload.read().clone();
            let actions = actions.clone();
            submitting.set(true);
            spawn(async move {
                match injection::submit(&client, &targets, &input).await {
                    Ok(count) => {
                        actions.set_operation_success(CONTEXT, format!("已向 {count} 个节点提交任务"));
                        selected.write().clear();
                        payload.set(String::new());
                    }
                    Err(err) => actions.set_operation_error(CONTEXT, err.to_string()),
                }
                submitting.set(false);
            });
        }
    };

    rsx! {
        section { class: "rounded-lg border border-slate-200 bg-white p-4 shadow-sm",
            h2 { class: "mb-3 text-sm font-semibold text-slate-900", "任务注入" }
            form { class: "grid gap-3 md:grid-cols-2", onsubmit: on_submit,
                div { class: "space-y-2",
                    input {
                        class: "w-full rounded border border-slate-300 px-2 py-1 text-sm",
                        placeholder: "搜索节点",
                        value: "{search}",
                        oninput: move |evt: FormEvent| search.set(evt.value()),
                    }
                    if no_nodes {
                        p { class: "text-xs text-slate-500", "暂无可用节点" }
                    }
                    ul { class: "max-h-48 space-y-1 overflow-auto text-xs",
                        for node in nodes {
                            li {
                                label {
                                    class: if node.selectable { "flex items-center gap-2" } else { "flex items-center gap-2 text-slate-400" },
                                    input {
                                        r#type: "checkbox",
                                        disabled: !node.selectable,
                                        checked: selected.read().contains(&node.name),
                                        onchange: {
                                            let name = node.name.clone();
                                            move |evt: FormEvent| {
                                                if evt.checked() {
                                                    selected.write().insert(name.clone());
                                                } else {
                                                    selected.write().remove(&name);
                                                }
                                            }
                                        },
                                    }
                                    "{node.name}"
                                    if !node.selectable {
                                        span { "（已停止）" }
                                    }
                                }
                            }
                        }
                    }
                }
                div { class: "space-y-2",
                    textarea {
                        class: "h-32 w-full rounded border border-slate-300 p-2 font-mono text-xs",
                        placeholder: "JSON 数组，例如 [1, 2, 3]",
                        value: "{payload}",
                        oninput: move |evt: FormEvent| payload.set(evt.value()),
                    }
                    div { class: "flex gap-2",
                        button {
                            class: "rounded bg-slate-100 px-3 py-1 text-xs text-slate-700 hover:bg-slate-200",
                            r#type: "button",
                            onclick: move |_| payload.set(TERMINATION_PRESET.to_string()),
                            "终止信号"
                        }
                        button {
                            class: "rounded bg-sky-600 px-3 py-1 text-xs text-white hover:bg-sky-700 disabled:opacity-50",
                            r#type: "submit",
                            disabled: *submitting.read(),
                            "提交"
                        }
                    }
                }
            }
        }
    }
}
