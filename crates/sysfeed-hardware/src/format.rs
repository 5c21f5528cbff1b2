//! HTML fragment rendering.
//!
//! Each fragment's outer element carries a fixed id (`system-data`, `disk-data`,
//! `cpu-data`, `update-timestamp`) that the page uses as its swap target. Values coming
//! from the host are HTML-escaped.

use std::fmt::Write;

use chrono::{DateTime, TimeZone};

use crate::collect::{CpuInfo, DiskInfo, SystemInfo};

const MEGABYTE: u64 = 1024 * 1024;
const GIGABYTE: u64 = MEGABYTE * 1024;

const TABLE_OPEN: &str = "<table class=\"table table-striped table-hover table-sm\"><tbody>";
const TABLE_CLOSE: &str = "</tbody></table>";

/// Timestamp layout used in the "last update" line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn row(html: &mut String, label: &str, value: &str) {
    let _ = write!(html, "<tr><td>{label}</td><td>{value}</td></tr>");
}

/// Render the "last update" fragment.
pub fn format_timestamp<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "<div id=\"update-timestamp\"><p><i class=\"fa fa-circle\" style=\"color: red;\"></i> Last update: {}</p></div>",
        now.format(TIMESTAMP_FORMAT)
    )
}

/// Render the system section.
pub fn format_system(info: &SystemInfo) -> String {
    let mut html = String::from("<div id=\"system-data\" class=\"system-data\">");
    html.push_str(TABLE_OPEN);
    row(
        &mut html,
        "Operating System:",
        &format!("<i class=\"fa fa-brands fa-linux\"></i> {}", escape_html(&info.os)),
    );
    row(&mut html, "Platform:", &escape_html(&info.platform));
    row(&mut html, "Hostname:", &escape_html(&info.hostname));
    row(
        &mut html,
        "Number of processes running:",
        &info.processes.to_string(),
    );
    row(
        &mut html,
        "Total memory:",
        &format!("{} MB", info.total_memory / MEGABYTE),
    );
    row(
        &mut html,
        "Free memory:",
        &format!("{} MB", info.free_memory / MEGABYTE),
    );
    row(
        &mut html,
        "Percentage used memory:",
        &format!("{:.2}%", info.used_memory_pct),
    );
    html.push_str(TABLE_CLOSE);
    html.push_str("</div>");
    html
}

/// Render the disk section.
pub fn format_disk(info: &DiskInfo) -> String {
    let mut html = String::from("<div id=\"disk-data\" class=\"disk-data\">");
    html.push_str(TABLE_OPEN);
    row(
        &mut html,
        "Total disk space:",
        &format!("{} GB", info.total_space / GIGABYTE),
    );
    row(
        &mut html,
        "Used disk space:",
        &format!("{} GB", info.used_space / GIGABYTE),
    );
    row(
        &mut html,
        "Free disk space:",
        &format!("{} GB", info.free_space / GIGABYTE),
    );
    row(
        &mut html,
        "Percentage disk space usage:",
        &format!("{:.2}%", info.used_space_pct),
    );
    html.push_str(TABLE_CLOSE);
    html.push_str("</div>");
    html
}

/// Render the CPU section. Cores are split across two columns; labels keep each core's
/// global index.
pub fn format_cpu(info: &CpuInfo) -> String {
    let mut html = String::from("<div id=\"cpu-data\" class=\"cpu-data\">");
    html.push_str(TABLE_OPEN);
    row(&mut html, "Model Name:", &escape_html(&info.model_name));
    row(&mut html, "Family:", &escape_html(&info.family));
    row(&mut html, "Speed:", &format!("{} MHz", info.speed_mhz));

    let (first, second) = info.cores_usage.split_at(info.cores_usage.len() / 2);
    html.push_str("<tr><td>Cores:</td><td><div class=\"row mb-4\">");
    core_column(&mut html, first, 0);
    core_column(&mut html, second, first.len());
    html.push_str("</div></td></tr>");

    html.push_str(TABLE_CLOSE);
    html.push_str("</div>");
    html
}

fn core_column(html: &mut String, cores: &[f32], offset: usize) {
    html.push_str("<div class=\"col-md-6\"><table class=\"table table-sm\"><tbody>");
    for (idx, usage) in cores.iter().enumerate() {
        let _ = write!(
            html,
            "<tr><td>CPU [{}]: {usage:.2}%</td></tr>",
            idx + offset
        );
    }
    html.push_str("</tbody></table></div>");
}
