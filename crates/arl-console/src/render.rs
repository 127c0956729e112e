//! Page output as terminal text or escaped markup

use arl_explorer::table::escape_terminal;
use arl_explorer::{
    escape_html, Dashboard, DashboardSummary, DeviceInfo, LoadedView, ResourceSpec, ViewBody,
};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    Text,
    Html,
}

pub(crate) fn page(view: &LoadedView, format: Format) -> String {
    match format {
        Format::Text => page_text(view),
        Format::Html => page_html(view),
    }
}

fn page_text(view: &LoadedView) -> String {
    let mut out = String::new();
    match &view.body {
        ViewBody::Empty => out.push_str("No records.\n"),
        ViewBody::Flat(table) => out.push_str(&table.to_text()),
        ViewBody::Grouped(panels) => {
            for panel in panels {
                let _ = writeln!(
                    out,
                    "== {} ({}) ==\n   {}",
                    escape_terminal(&panel.title),
                    panel.count,
                    escape_terminal(&panel.subtitle)
                );
                out.push_str(&panel.table.to_text());
                out.push('\n');
            }
        }
    }
    let _ = writeln!(out, "{} of {} records", view.items.len(), view.total);
    out
}

fn page_html(view: &LoadedView) -> String {
    let mut out = String::new();
    match &view.body {
        ViewBody::Empty => out.push_str("<p class=\"empty\">No records.</p>"),
        ViewBody::Flat(table) => out.push_str(&table.to_html()),
        ViewBody::Grouped(panels) => {
            for panel in panels {
                let _ = write!(
                    out,
                    "<section class=\"group\"><h3>{}</h3><p>{}</p><span class=\"count\">{}</span>{}</section>",
                    escape_html(&panel.title),
                    escape_html(&panel.subtitle),
                    panel.count,
                    panel.table.to_html()
                );
            }
        }
    }
    out.push('\n');
    out
}

pub(crate) fn dashboard(dashboard: &Dashboard) -> String {
    let mut out = counts(&dashboard.counts);
    out.push_str("\nDevice\n");
    match &dashboard.device {
        DeviceInfo::Available(entries) => {
            let width = entries.keys().map(String::len).max().unwrap_or(0);
            for (key, value) in entries {
                let _ = writeln!(
                    out,
                    "{:<width$}  {}",
                    escape_terminal(key),
                    escape_terminal(value)
                );
            }
        }
        DeviceInfo::Unavailable { reason } => {
            let _ = writeln!(out, "Device info unavailable: {}", escape_terminal(reason));
        }
    }
    out
}

fn counts(summary: &DashboardSummary) -> String {
    match summary {
        DashboardSummary::Counts(counts) => {
            let width = counts.iter().map(|c| c.label.len()).max().unwrap_or(0);
            counts
                .iter()
                .map(|c| format!("{:<width$}  {}\n", c.label, c.total))
                .collect()
        }
        DashboardSummary::Unavailable { reason } => {
            format!("Statistics unavailable: {}\n", escape_terminal(reason))
        }
    }
}

pub(crate) fn catalog(resources: &[ResourceSpec]) -> String {
    let mut out = String::new();
    for spec in resources {
        let actions: Vec<&str> = spec.actions.iter().map(|a| a.label).collect();
        let _ = writeln!(
            out,
            "{:<14} {:<11} {:<8} {}",
            spec.name,
            format!("{:?}", spec.category).to_lowercase(),
            format!("{:?}", spec.default_mode()).to_lowercase(),
            actions.join(", ")
        );
    }
    out
}
