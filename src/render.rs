use anyhow::Result;
use colored::Colorize;
use csv::WriterBuilder;
use html_escape::{encode_double_quoted_attribute, encode_text};
use itertools::Itertools;
use std::fs;
use std::path::Path;
use strum::EnumString;

use crate::edgar::filing::{FilingRecord, NO_LINKS};

pub const COLUMNS: [&str; 7] = [
    "Company Name",
    "File Date",
    "Business Location(s)",
    "Edgar",
    "Related Persons",
    "Phone Number",
    "Total Offering Amount / Amount Raised",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Html,
}

fn row(record: &FilingRecord) -> [String; 7] {
    [
        record.company_name.clone(),
        record.file_date.clone(),
        record.business_locations.clone(),
        record.detail_link.clone(),
        record.related_persons.clone(),
        record.phone_number.clone(),
        record.amounts(),
    ]
}

pub fn render_table(records: &[FilingRecord]) -> String {
    let rows: Vec<[String; 7]> = records.iter().map(row).collect();

    let mut widths = COLUMNS.map(|c| c.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header = COLUMNS
        .iter()
        .zip(widths.iter())
        .map(|(name, width)| format!("{:<width$}", name, width = *width))
        .join(" | ");
    out.push_str(&header.bold().to_string());
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .join("-+-"),
    );
    out.push('\n');

    for row in &rows {
        let line = row
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .join(" | ");
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

fn link_cell(record: &FilingRecord) -> String {
    let urls = record.detail_urls();
    if urls.is_empty() {
        return encode_text(NO_LINKS).into_owned();
    }
    urls.iter()
        .map(|url| {
            format!(
                r#"<a href="{}" target="_blank">Link</a>"#,
                encode_double_quoted_attribute(url)
            )
        })
        .join(", ")
}

/// HTML table with clickable detail links; every other value is escaped.
pub fn render_html(records: &[FilingRecord]) -> String {
    let mut out = String::from("<table border=\"1\" class=\"dataframe\">\n  <thead>\n    <tr>\n");
    for column in COLUMNS {
        out.push_str(&format!("      <th>{}</th>\n", encode_text(column)));
    }
    out.push_str("    </tr>\n  </thead>\n  <tbody>\n");

    for record in records {
        out.push_str("    <tr>\n");
        for (i, cell) in row(record).iter().enumerate() {
            let value = if COLUMNS[i] == "Edgar" {
                link_cell(record)
            } else {
                encode_text(cell).into_owned()
            };
            out.push_str(&format!("      <td>{}</td>\n", value));
        }
        out.push_str("    </tr>\n");
    }

    out.push_str("  </tbody>\n</table>\n");
    out
}

pub fn write_csv(path: &Path, records: &[FilingRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.write_record(row(record))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_html(path: &Path, records: &[FilingRecord]) -> Result<()> {
    fs::write(path, render_html(records))?;
    Ok(())
}

pub fn export(format: ExportFormat, path: &Path, records: &[FilingRecord]) -> Result<()> {
    log::debug!("Exporting {} filings as {} to {:?}", records.len(), format, path);
    match format {
        ExportFormat::Csv => write_csv(path, records),
        ExportFormat::Html => write_html(path, records),
    }
}
