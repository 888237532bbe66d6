//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use extman_ops::{
    DiscoveryReport, ExtensionSummary, InstallReport, OperationResult, UninstallReport,
};
use extman_types::ColorChoice;
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        self.term.write_line(&json)
    }

    /// Render as formatted table
    fn render_table(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::ExtensionList(extensions) => self.render_extension_list(extensions),
            OperationResult::Extension(extension) => self.render_extension(extension),
            OperationResult::InstallReport(report) => self.render_install_report(report),
            OperationResult::UninstallReport(report) => self.render_uninstall_report(report),
            OperationResult::DiscoveryReport(report) => self.render_discovery_report(report),
            OperationResult::Success(message) => self.term.write_line(message),
        }
    }

    /// Render registered extensions
    fn render_extension_list(&self, extensions: &[ExtensionSummary]) -> io::Result<()> {
        if extensions.is_empty() {
            return self.term.write_line("No extensions installed.");
        }

        let mut table = summary_table(&["ID", "Element", "Name", "Version", "Client", "Status"]);
        for extension in extensions {
            let status = if extension.protected {
                Cell::new("Protected").fg(Color::Blue)
            } else if extension.enabled {
                Cell::new("Enabled").fg(Color::Green)
            } else {
                Cell::new("Disabled").fg(Color::Yellow)
            };
            table.add_row(vec![
                Cell::new(extension.extension_id),
                Cell::new(&extension.element),
                Cell::new(&extension.name),
                Cell::new(extension.version.as_deref().unwrap_or("-")),
                Cell::new(extension.client.to_string()),
                status,
            ]);
        }

        self.term.write_line(&table.to_string())
    }

    /// Render discovered components
    fn render_discovery_report(&self, report: &DiscoveryReport) -> io::Result<()> {
        if report.candidates.is_empty() {
            return self.term.write_line("No unregistered components found.");
        }

        let mut table = summary_table(&["Element", "Name", "Version", "Client"]);
        for candidate in &report.candidates {
            table.add_row(vec![
                Cell::new(&candidate.element),
                Cell::new(&candidate.name),
                Cell::new(candidate.version.as_deref().unwrap_or("-")),
                Cell::new(candidate.client.to_string()),
            ]);
        }

        self.term.write_line(&table.to_string())?;
        self.term.write_line(&format!(
            "Scanned at {}. Run `extman discover-install <element>` to register one.",
            report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
        ))
    }

    /// Render a single extension
    fn render_extension(&self, extension: &ExtensionSummary) -> io::Result<()> {
        self.term.write_line(&self.bold(&extension.element))?;
        self.term.write_line(&format!("ID:       {}", extension.extension_id))?;
        self.term.write_line(&format!("Name:     {}", extension.name))?;
        if let Some(version) = &extension.version {
            self.term.write_line(&format!("Version:  {version}"))?;
        }
        if let Some(schema) = &extension.schema_version {
            self.term.write_line(&format!("Schema:   {schema}"))?;
        }
        self.term
            .write_line(&format!("Client:   {}", extension.client))?;
        self.term.write_line(&format!(
            "Enabled:  {}",
            if extension.enabled { "yes" } else { "no" }
        ))
    }

    /// Render install, update or discover-install outcome
    fn render_install_report(&self, report: &InstallReport) -> io::Result<()> {
        let version = report
            .version
            .as_deref()
            .map(|v| format!(" {v}"))
            .unwrap_or_default();
        self.term.write_line(&format!(
            "[OK] {} {}{} (id {}) in {}ms",
            report.route, report.element, version, report.extension_id, report.duration_ms
        ))?;

        if !report.warnings.is_empty() {
            self.term.write_line("")?;
            self.term
                .write_line(&format!("Warnings ({}):", report.warnings.len()))?;
            for warning in &report.warnings {
                self.term.write_line(&format!("  • {warning}"))?;
            }
        }

        self.render_messages(&report.messages)
    }

    /// Render uninstall outcome
    fn render_uninstall_report(&self, report: &UninstallReport) -> io::Result<()> {
        let icon = if report.success { "[OK]" } else { "[WARN]" };
        self.term.write_line(&format!(
            "{icon} uninstall {} (id {}) in {}ms",
            report.element, report.extension_id, report.duration_ms
        ))?;

        if !report.failures.is_empty() {
            self.term.write_line("")?;
            self.term
                .write_line(&format!("Left behind ({}):", report.failures.len()))?;
            for failure in &report.failures {
                self.term.write_line(&format!("  • {failure}"))?;
            }
        }

        self.render_messages(&report.messages)
    }

    /// Output captured from lifecycle hooks
    fn render_messages(&self, messages: &str) -> io::Result<()> {
        let messages = messages.trim();
        if messages.is_empty() {
            return Ok(());
        }
        self.term.write_line("")?;
        self.term.write_line(&self.bold("Messages:"))?;
        for line in messages.lines() {
            self.term.write_line(&format!("  {line}"))?;
        }
        Ok(())
    }

    fn bold(&self, text: &str) -> String {
        if self.supports_color() {
            Style::new().bold().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

fn summary_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );
    table
}
