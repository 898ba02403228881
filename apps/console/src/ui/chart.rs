use dioxus::prelude::*;

use crate::model::timeseries::{ChartBounds, Series};
use crate::state::{use_app_actions, use_app_state};

const WIDTH: f64 = 720.0;
const HEIGHT: f64 = 260.0;
const MARGIN_LEFT: f64 = 56.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 16.0;
const MARGIN_BOTTOM: f64 = 32.0;

fn plot_width() -> f64 {
    WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

/// 按可见序列的整体范围缩放到绘图区，输出 `points` 属性文本。
fn polyline_points(series: &Series, bounds: &ChartBounds) -> String {
    let span = (bounds.max_ts - bounds.min_ts).max(f64::EPSILON);
    let max_value = bounds.max_value.max(1) as f64;
    series
        .points
        .iter()
        .map(|point| {
            let x = if bounds.max_ts > bounds.min_ts {
                MARGIN_LEFT + (point.timestamp - bounds.min_ts) / span * plot_width()
            } else {
                MARGIN_LEFT + plot_width() / 2.0
            };
            let y = MARGIN_TOP + plot_height() - point.processed as f64 / max_value * plot_height();
            format!("{x:.1},{y:.1}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[component]
pub fn ProgressChart() -> Element {
    let actions = use_app_actions();
    let state = use_app_state();
    let chart = state.read().model.frame.chart.clone();

    if chart.is_empty() {
        return rsx! {
            section { class: "rounded-lg border border-slate-200 bg-white p-4 text-sm text-slate-500",
                "暂无历史数据"
            }
        };
    }

    let bounds = chart.bounds();
    let lines: Vec<(String, &'static str)> = match bounds.as_ref() {
        Some(bounds) => chart
            .series
            .iter()
            .filter(|series| !series.hidden)
            .map(|series| (polyline_points(series, bounds), series.color))
            .collect(),
        None => Vec::new(),
    };
    let max_label = bounds.map(|b| b.max_value).unwrap_or(0).to_string();
    let first_label = chart.labels.first().cloned().unwrap_or_default();
    let last_label = chart.labels.last().cloned().unwrap_or_default();

    let view_box = format!("0 0 {WIDTH} {HEIGHT}");
    let axis_bottom = (MARGIN_TOP + plot_height()).to_string();
    let axis_right = (WIDTH - MARGIN_RIGHT).to_string();
    let ml = MARGIN_LEFT.to_string();
    let mt = MARGIN_TOP.to_string();
    let label_x = (MARGIN_LEFT - 6.0).to_string();
    let label_top = (MARGIN_TOP + 4.0).to_string();
    let time_y = (HEIGHT - 8.0).to_string();

    rsx! {
        section { class: "rounded-lg border border-slate-200 bg-white p-4 shadow-sm space-y-2",
            h2 { class: "text-sm font-semibold text-slate-900", "处理进度" }
            svg {
                class: "w-full",
                view_box: "{view_box}",
                line { x1: "{ml}", y1: "{mt}", x2: "{ml}", y2: "{axis_bottom}", stroke: "#94a3b8", stroke_width: "1" }
                line { x1: "{ml}", y1: "{axis_bottom}", x2: "{axis_right}", y2: "{axis_bottom}", stroke: "#94a3b8", stroke_width: "1" }
                for (points, color) in lines {
                    polyline { points: "{points}", fill: "none", stroke: "{color}", stroke_width: "2" }
                }
                text { x: "{label_x}", y: "{label_top}", fill: "#64748b", font_size: "11", text_anchor: "end", "{max_label}" }
                text { x: "{label_x}", y: "{axis_bottom}", fill: "#64748b", font_size: "11", text_anchor: "end", "0" }
                text { x: "{ml}", y: "{time_y}", fill: "#64748b", font_size: "11", text_anchor: "start", "{first_label}" }
                text { x: "{axis_right}", y: "{time_y}", fill: "#64748b", font_size: "11", text_anchor: "end", "{last_label}" }
            }
            div { class: "flex flex-wrap gap-2 text-xs",
                for series in chart.series {
                    LegendEntry {
                        node: series.node.clone(),
                        color: series.color,
                        hidden: series.hidden,
                        on_toggle: {
                            let actions = actions.clone();
                            move |node: String| actions.toggle_series(&node)
                        },
                    }
                }
            }
        }
    }
}

#[component]
fn LegendEntry(node: String, color: &'static str, hidden: bool, on_toggle: EventHandler<String>) -> Element {
    let class = if hidden {
        "flex items-center gap-1 rounded px-2 py-1 text-slate-400 line-through"
    } else {
        "flex items-center gap-1 rounded px-2 py-1 text-slate-700 hover:bg-slate-100"
    };
    let name = node.clone();
    rsx! {
        button {
            class,
            onclick: move |_| on_toggle.call(name.clone()),
            span { class: "inline-block h-2 w-3 rounded", style: "background: {color}" }
            "{node}"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::timeseries::SeriesPoint;

    fn series(points: &[(f64, u64)]) -> Series {
        Series {
            node: "A".into(),
            color: "#000",
            points: points
                .iter()
                .map(|&(timestamp, processed)| SeriesPoint {
                    timestamp,
                    processed,
                })
                .collect(),
            hidden: false,
        }
    }

    #[test]
    fn points_span_the_plot_area() {
        let line = series(&[(0.0, 0), (10.0, 50)]);
        let bounds = ChartBounds {
            min_ts: 0.0,
            max_ts: 10.0,
            max_value: 50,
        };
        let text = polyline_points(&line, &bounds);
        let expected = format!(
            "{:.1},{:.1} {:.1},{:.1}",
            MARGIN_LEFT,
            MARGIN_TOP + plot_height(),
            WIDTH - MARGIN_RIGHT,
            MARGIN_TOP
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn single_instant_is_centered_and_finite() {
        let line = series(&[(5.0, 0)]);
        let bounds = ChartBounds {
            min_ts: 5.0,
            max_ts: 5.0,
            max_value: 0,
        };
        let text = polyline_points(&line, &bounds);
        assert!(!text.contains("NaN"));
        assert!(text.starts_with(&format!("{:.1},", MARGIN_LEFT + plot_width() / 2.0)));
    }
}
