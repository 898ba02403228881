//! 数值与时间戳的展示格式化，纯函数，无状态。

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::models::TimeValue;

const SERIES_PALETTE: [&str; 9] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#22c55e", "#0ea5e9",
    "#f97316",
];

/// `MM:SS`，超过一小时为 `HH:MM:SS`。不足一秒的正数按一秒显示。
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        (seconds.floor() as u64).max(1)
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

pub fn format_timestamp(timestamp: f64) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    local_datetime(timestamp)
        .and_then(|dt| dt.format(&format).ok())
        .unwrap_or_else(|| "-".to_string())
}

/// 折线图横轴标签。
pub fn format_clock(timestamp: f64) -> String {
    let format = format_description!("[hour]:[minute]:[second]");
    local_datetime(timestamp)
        .and_then(|dt| dt.format(&format).ok())
        .unwrap_or_default()
}

pub fn format_time_value(value: Option<&TimeValue>, as_instant: bool) -> String {
    match value {
        Some(TimeValue::Seconds(secs)) if as_instant => format_timestamp(*secs),
        Some(TimeValue::Seconds(secs)) => format_duration(*secs),
        Some(TimeValue::Text(text)) => text.clone(),
        None if as_instant => "-".to_string(),
        None => format_duration(0.0),
    }
}

fn local_datetime(timestamp: f64) -> Option<OffsetDateTime> {
    if !timestamp.is_finite() {
        return None;
    }
    let utc = OffsetDateTime::from_unix_timestamp(timestamp.floor() as i64).ok()?;
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    Some(utc.to_offset(offset))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaDirection {
    Up,
    Down,
}

/// 计数值与后端给出的区间增量。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeltaText {
    pub value: String,
    pub delta: Option<(DeltaDirection, String)>,
}

impl DeltaText {
    pub fn new(value: u64, delta: Option<i64>) -> Self {
        let delta = match delta {
            Some(d) if d > 0 => Some((DeltaDirection::Up, format!("+{d}"))),
            Some(d) if d < 0 => Some((DeltaDirection::Down, format!("-{}", d.unsigned_abs()))),
            _ => None,
        };
        Self {
            value: value.to_string(),
            delta,
        }
    }
}

pub fn series_color(index: usize) -> &'static str {
    SERIES_PALETTE[index % SERIES_PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formats_minutes_and_hours() {
        assert_eq!(format_duration(0.0), "00:00");
        assert_eq!(format_duration(-3.0), "00:00");
        assert_eq!(format_duration(0.2), "00:01");
        assert_eq!(format_duration(75.9), "01:15");
        assert_eq!(format_duration(3_661.0), "01:01:01");
        assert_eq!(format_duration(f64::NAN), "00:00");
    }

    #[test]
    fn timestamp_has_fixed_shape() {
        let text = format_timestamp(1_700_000_000.0);
        assert_eq!(text.len(), "2023-11-14 22:13:20".len());
        assert_eq!(&text[4..5], "-");
        assert_eq!(&text[10..11], " ");
        assert_eq!(format_timestamp(f64::INFINITY), "-");
    }

    #[test]
    fn time_values_render_by_kind() {
        assert_eq!(format_time_value(Some(&TimeValue::Seconds(90.0)), false), "01:30");
        assert_eq!(
            format_time_value(Some(&TimeValue::Text("2025-05-14 10:15:32".into())), true),
            "2025-05-14 10:15:32"
        );
        assert_eq!(format_time_value(None, true), "-");
        assert_eq!(format_time_value(None, false), "00:00");
    }

    #[test]
    fn delta_sign_and_absence() {
        assert_eq!(DeltaText::new(5, None).delta, None);
        assert_eq!(DeltaText::new(5, Some(0)).delta, None);
        assert_eq!(
            DeltaText::new(5, Some(3)).delta,
            Some((DeltaDirection::Up, "+3".into()))
        );
        assert_eq!(
            DeltaText::new(5, Some(-2)).delta,
            Some((DeltaDirection::Down, "-2".into()))
        );
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(series_color(0), series_color(9));
        assert_ne!(series_color(0), series_color(1));
    }
}
