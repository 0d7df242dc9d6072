//! Output formatting: grouped text report, JSON.
//!
//! Text is the primary human-consumed artifact: per-device headers with
//! three labeled sections (raw, device_params, property-list PIDs), one
//! line per changed key.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;

use wyzescope_core::{ChangeKind, DiffReport, Namespace, Snapshot};

use crate::cli::{ColorMode, OutputFormat};

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Diff report rendering ────────────────────────────────────────────

/// Render a diff report in the chosen format.
///
/// The snapshots are only consulted for display metadata (nickname,
/// model) in the per-device headers.
pub fn render_report(
    format: &OutputFormat,
    report: &DiffReport,
    before: &Snapshot,
    after: &Snapshot,
    color: bool,
) -> String {
    match format {
        OutputFormat::Text => render_text(report, before, after, color),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).expect("serialization should not fail")
        }
        OutputFormat::JsonCompact => {
            serde_json::to_string(report).expect("serialization should not fail")
        }
    }
}

fn section_label(ns: Namespace) -> &'static str {
    match ns {
        Namespace::Raw => "RAW CHANGES",
        Namespace::DeviceParams => "DEVICE_PARAMS CHANGES",
        Namespace::PropertyList => "PROPERTY_LIST PID CHANGES",
    }
}

fn render_text(report: &DiffReport, before: &Snapshot, after: &Snapshot, color: bool) -> String {
    if report.is_empty() {
        return "No differences found.".into();
    }

    let mut out = String::new();
    for mac in report.macs() {
        let (nickname, model) = device_display(mac, before, after);
        out.push_str(&format!(
            "#############################\n{mac}  {nickname}  {model}\n#############################\n"
        ));

        for ns in Namespace::ALL {
            let lines: Vec<String> = report
                .entries_for(mac, ns)
                .map(|entry| {
                    let line = match entry.kind {
                        ChangeKind::Added => format!(
                            "+ {}: -> {}",
                            entry.key,
                            fmt_value(entry.after.as_ref())
                        ),
                        ChangeKind::Removed => format!(
                            "- {}: {} ->",
                            entry.key,
                            fmt_value(entry.before.as_ref())
                        ),
                        ChangeKind::Changed => format!(
                            "~ {}: {} -> {}",
                            entry.key,
                            fmt_value(entry.before.as_ref()),
                            fmt_value(entry.after.as_ref())
                        ),
                    };
                    if color {
                        match entry.kind {
                            ChangeKind::Added => line.green().to_string(),
                            ChangeKind::Removed => line.red().to_string(),
                            ChangeKind::Changed => line.yellow().to_string(),
                        }
                    } else {
                        line
                    }
                })
                .collect();

            if !lines.is_empty() {
                out.push_str(&format!("\n== {} ==\n", section_label(ns)));
                for line in lines {
                    out.push_str(&line);
                    out.push('\n');
                }
            }
        }
        out.push('\n');
    }
    out.trim_end().to_owned()
}

/// Nickname/model for a header line, preferring the after-side record.
fn device_display<'a>(mac: &str, before: &'a Snapshot, after: &'a Snapshot) -> (&'a str, &'a str) {
    let find = |snap: &'a Snapshot| snap.devices.iter().find(|d| d.mac == mac);
    let record = find(after).or_else(|| find(before));
    record.map_or(("-", "-"), |d| {
        (
            if d.nickname.is_empty() { "-" } else { &d.nickname },
            if d.product_model.is_empty() { "-" } else { &d.product_model },
        )
    })
}

fn fmt_value(value: Option<&Value>) -> String {
    value.map_or_else(|| "(absent)".into(), ToString::to_string)
}

// ── Scrape summary ───────────────────────────────────────────────────

/// Human summary printed after a scrape, mirroring what matters when
/// hunting a toggle: how many devices and distinct keys were captured.
pub fn scrape_summary(snapshot: &Snapshot, path: &std::path::Path) -> String {
    let mut raw_keys = std::collections::BTreeSet::new();
    let mut param_keys = std::collections::BTreeSet::new();
    let mut pids = std::collections::BTreeSet::new();
    for device in &snapshot.devices {
        raw_keys.extend(device.raw.keys());
        param_keys.extend(device.device_params.keys());
        pids.extend(device.property_list.keys());
    }

    let mut out = format!(
        "Wrote: {}\nDevices: {}\nraw keys: {}\ndevice_params keys: {}\nproperty PIDs: {}",
        path.display(),
        snapshot.devices.len(),
        raw_keys.len(),
        param_keys.len(),
        pids.len(),
    );
    if !snapshot.failures.is_empty() {
        out.push_str(&format!(
            "\nIncomplete devices: {}",
            snapshot.failures.len()
        ));
        for failure in &snapshot.failures {
            out.push_str(&format!(
                "\n  {} ({:?}): {}",
                failure.mac, failure.stage, failure.error
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wyzescope_core::{DeviceRecord, FetchOptions};

    fn device(mac: &str, nickname: &str) -> DeviceRecord {
        DeviceRecord {
            mac: mac.into(),
            nickname: nickname.into(),
            product_model: "CAM1".into(),
            firmware_version: String::new(),
            raw: std::collections::BTreeMap::new(),
            device_params: std::collections::BTreeMap::new(),
            property_list: std::collections::BTreeMap::new(),
            events: None,
        }
    }

    fn snapshot(devices: Vec<DeviceRecord>) -> Snapshot {
        Snapshot::build(devices, FetchOptions::default(), Vec::new()).unwrap()
    }

    #[test]
    fn text_report_groups_sections_per_device() {
        let mut before_dev = device("AA:BB", "Porch");
        before_dev.property_list.insert("P1".into(), json!("0"));
        let mut after_dev = device("AA:BB", "Porch");
        after_dev.property_list.insert("P1".into(), json!("1"));
        after_dev.property_list.insert("P2".into(), json!("on"));
        after_dev.device_params.insert("dongle".into(), json!(1));

        let before = snapshot(vec![before_dev]);
        let after = snapshot(vec![after_dev]);
        let report = wyzescope_core::diff(&before, &after, None).unwrap();

        let text = render_report(&OutputFormat::Text, &report, &before, &after, false);

        assert!(text.contains("AA:BB  Porch  CAM1"));
        assert!(text.contains("== DEVICE_PARAMS CHANGES =="));
        assert!(text.contains("== PROPERTY_LIST PID CHANGES =="));
        assert!(text.contains("~ P1: \"0\" -> \"1\""));
        assert!(text.contains("+ P2: -> \"on\""));
        // No raw changes, so no raw section header.
        assert!(!text.contains("== RAW CHANGES =="));
    }

    #[test]
    fn empty_report_renders_placeholder() {
        let snap = snapshot(vec![device("AA:BB", "Porch")]);
        let report = wyzescope_core::diff(&snap, &snap, None).unwrap();
        let text = render_report(&OutputFormat::Text, &report, &snap, &snap, false);
        assert_eq!(text, "No differences found.");
    }

    #[test]
    fn text_rendering_is_deterministic() {
        let mut before_dev = device("AA:BB", "Porch");
        before_dev.device_params.insert("a".into(), json!(1));
        before_dev.device_params.insert("b".into(), json!(1));
        let mut after_dev = device("AA:BB", "Porch");
        after_dev.device_params.insert("a".into(), json!(2));
        after_dev.device_params.insert("b".into(), json!(2));

        let before = snapshot(vec![before_dev]);
        let after = snapshot(vec![after_dev]);

        let render = || {
            let report = wyzescope_core::diff(&before, &after, None).unwrap();
            render_report(&OutputFormat::Text, &report, &before, &after, false)
        };
        assert_eq!(render(), render());
    }
}
