
use crate::context::StaticContext;
use crate::snapshot::{DashboardSnapshot, WidgetSummary};
use chrono::{DateTime, Local, TimeZone};

pub(super) fn context() -> StaticContext {
    StaticContext::new("Fabrikam Web")
}

pub(super) fn fixed_now() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2024, 3, 14, 9, 5, 0)
        .single()
        .expect("unambiguous local time")
}

pub(super) fn snapshot_with_widgets(name: &str, count: usize) -> DashboardSnapshot {
    let widgets = (0..count)
        .map(|i| WidgetSummary::new(&format!("Widget {}", i + 1), (i % 4) as u32, (i / 4) as u32, 2, 1))
        .collect();
    DashboardSnapshot::new("d-42", name, widgets)
}
