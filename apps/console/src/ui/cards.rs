use dioxus::prelude::*;

use crate::format::{DeltaDirection, DeltaText};
use crate::model::dashboard::CardView;
use crate::state::{use_app_actions, use_app_state};
use crate::ui::is_mobile;

#[component]
fn Counter(label: &'static str, value: DeltaText) -> Element {
    rsx! {
        div { class: "flex items-baseline justify-between text-xs",
            span { class: "text-slate-500", "{label}" }
            span { class: "font-mono text-slate-800",
                "{value.value}"
                if let Some((direction, text)) = value.delta.as_ref() {
                    span {
                        class: match direction {
                            DeltaDirection::Up => "ml-1 text-emerald-600",
                            DeltaDirection::Down => "ml-1 text-red-600",
                        },
                        "{text}"
                    }
                }
            }
        }
    }
}

#[component]
fn NodeCard(card: CardView, draggable: bool, dragging: bool) -> Element {
    let actions = use_app_actions();
    let name = card.name.clone();
    let wrapper = if dragging {
        "rounded-lg border border-dashed border-sky-400 bg-white p-4 opacity-60 shadow-sm"
    } else {
        "rounded-lg border border-slate-200 bg-white p-4 shadow-sm"
    };

    let on_drag_start = {
        let actions = actions.clone();
        let name = name.clone();
        move |_: DragEvent| {
            actions.begin_drag(&name);
        }
    };
    let on_drop = {
        let actions = actions.clone();
        let name = name.clone();
        move |evt: DragEvent| {
            evt.prevent_default();
            evt.stop_propagation();
            actions.drop_card(Some(&name));
        }
    };
    let on_drag_end = {
        let actions = actions.clone();
        move |_: DragEvent| actions.end_drag()
    };

    rsx! {
        article {
            class: wrapper,
            draggable: if draggable { "true" } else { "false" },
            ondragstart: on_drag_start,
            ondragover: move |evt: DragEvent| evt.prevent_default(),
            ondrop: on_drop,
            ondragend: on_drag_end,
            div { class: "mb-2 flex items-center justify-between gap-2",
                h3 { class: "truncate text-sm font-semibold text-slate-900", title: "{card.name}", "{card.name}" }
                span { class: card.badge.class(), {card.badge.label()} }
            }
            div { class: "mb-2 text-[11px] text-slate-500",
                "{card.stage_mode} · {card.execution_mode}"
            }
            div { class: "space-y-1",
                Counter { label: "成功", value: card.successed.clone() }
                Counter { label: "等待", value: card.pending.clone() }
                Counter { label: "失败", value: card.failed.clone() }
                Counter { label: "重复", value: card.duplicated.clone() }
            }
            dl { class: "mt-2 grid grid-cols-2 gap-x-2 text-[11px] text-slate-500",
                dt { "开始" }
                dd { class: "font-mono", "{card.start_time}" }
                dt { "已用" }
                dd { class: "font-mono", "{card.elapsed}" }
                dt { "剩余" }
                dd { class: "font-mono", "{card.remaining}" }
                dt { "平均" }
                dd { class: "font-mono", "{card.avg_time}" }
            }
            div { class: "mt-3 h-2 w-full overflow-hidden rounded bg-slate-100",
                div { class: "h-2 bg-emerald-500", style: "width: {card.progress}%" }
            }
            p { class: "mt-1 text-right text-[11px] text-slate-500", "{card.progress}%" }
        }
    }
}

#[component]
pub fn DashboardCards() -> Element {
    let actions = use_app_actions();
    let state = use_app_state();
    let snapshot = state.read();
    let dragging = snapshot
        .model
        .dragging
        .as_ref()
        .map(|session| session.name.clone());
    let cards: Vec<(CardView, bool)> = snapshot
        .model
        .visible_cards()
        .into_iter()
        .map(|card| {
            let held = dragging.as_deref() == Some(card.name.as_str());
            (card, held)
        })
        .collect();
    drop(snapshot);

    let draggable = !is_mobile();

    if cards.is_empty() {
        return rsx! {
            section { class: "rounded-lg border border-slate-200 bg-white p-4 text-sm text-slate-500",
                "暂无节点状态"
            }
        };
    }

    rsx! {
        section {
            class: "grid grid-cols-1 gap-3 sm:grid-cols-2 lg:grid-cols-4",
            ondragover: move |evt: DragEvent| evt.prevent_default(),
            ondrop: move |evt: DragEvent| {
                evt.prevent_default();
                actions.drop_card(None);
            },
            for (card, held) in cards {
                NodeCard {
                    key: "{card.name}",
                    card,
                    draggable,
                    dragging: held,
                }
            }
        }
    }
}
