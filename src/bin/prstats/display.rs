use std::io::Write;

use anyhow::Result;
use prstats::StatsReport;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

const INDENT: &[u8] = b"    ";

/// Renders the report as 4-space indented JSON with logins in sorted order.
pub fn render_report(report: &StatsReport) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    report.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(String::from_utf8(buf)?)
}

/// Writes the rendered report in one go, so a rendering failure leaves
/// `writer` untouched.
pub fn write_report<W: Write>(report: &StatsReport, writer: &mut W) -> Result<()> {
    let rendered = render_report(report)?;
    writer.write_all(rendered.as_bytes())?;
    writer.flush()?;
    Ok(())
}
