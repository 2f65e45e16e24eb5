//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use litmeta_extractor::{
    BatchOutput, BatchProgress, BatchSummary, FieldSpecification, ResultsTable,
};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// The selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format extracted results.
    pub fn format_results(&self, table: &ResultsTable) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(table.rows())?),
            OutputFormat::Table => Ok(self.format_results_table(table)),
            OutputFormat::Quiet => Ok(table
                .rows()
                .iter()
                .map(|r| r.filename.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format results as a table.
    fn format_results_table(&self, table: &ResultsTable) -> String {
        if table.is_empty() {
            return self.colorize("No metadata extracted.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(table.columns());
        for record in table.rows() {
            builder.push_record(record.row(table.columns()));
        }

        let mut rendered = builder.build();
        rendered
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        rendered.to_string()
    }

    /// Format the field specification, marking default fields.
    pub fn format_fields(&self, spec: &FieldSpecification, defaults: &[String]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let fields: Vec<serde_json::Value> = spec
                    .iter()
                    .map(|f| {
                        serde_json::json!({
                            "name": f.name,
                            "description": f.description,
                            "default": defaults.contains(&f.name),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&fields)?)
            }
            OutputFormat::Quiet => Ok(spec.names().join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Default", "Description"]);
                for field in spec.iter() {
                    let default = if defaults.contains(&field.name) { "yes" } else { "" };
                    builder.push_record([field.name.as_str(), default, field.description.as_str()]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a finished batch: results followed by the summary.
    pub fn format_batch(&self, output: &BatchOutput) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "results": output.results.rows(),
                "warnings": output.warnings,
                "summary": summary_json(&output.summary),
            }))?),
            OutputFormat::Quiet => self.format_results(&output.results),
            OutputFormat::Table => {
                let summary = output.summary.render();
                let summary = if output.summary.failed == 0 {
                    self.success(&summary)
                } else {
                    self.warning(&summary)
                };
                Ok(format!("{}\n\n{}", self.format_results_table(&output.results), summary))
            }
        }
    }

    /// Format a progress line.
    pub fn progress(&self, progress: &BatchProgress) -> String {
        let counter = format!("[{}/{}]", progress.index, progress.total);
        format!("{} {}", self.colorize(&counter, "cyan"), progress.filename)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn summary_json(summary: &BatchSummary) -> serde_json::Value {
    serde_json::json!({
        "total_files": summary.total_files,
        "succeeded": summary.succeeded,
        "failed": summary.failed,
        "elapsed_secs": summary.elapsed.as_secs_f64(),
        "average_secs_per_file": summary.average_per_file().as_secs_f64(),
        "failures": summary.failures,
    })
}
