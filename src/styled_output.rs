//! Terminal presentation of the aggregated results using anstyle.
//!
//! Renders three blocks: the top-organization table (% unreachable /
//! % affected with a total row), a stacked horizontal bar chart of the same
//! organizations by domain count, and the in-bailiwick table.

use std::fmt::Write;
use std::io::IsTerminal;

use anstyle::{AnsiColor, Color, Style};

use crate::structured_output::AggregateReport;

/// Width of the longest bar in the chart.
const BAR_WIDTH: usize = 40;

/// Style definitions for different UI elements
pub struct Styles {
    pub header: Style,
    pub subheader: Style,
    pub muted: Style,
    pub bold: Style,
    pub organization: Style,
    pub unreachable: Style,
    pub affected: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            header: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Blue))),
            subheader: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
            muted: Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))),
            bold: Style::new().bold(),
            organization: Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlue))),
            unreachable: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))),
            affected: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        }
    }
}

/// Shorten an organization name at the first `-`, space or `,`.
///
/// `GOOGLE, US` becomes `GOOGLE`; `AMAZON-02, US` becomes `AMAZON`.
pub fn clean_name(org: &str) -> &str {
    match org.find(['-', ' ', ',']) {
        Some(idx) => &org[..idx],
        None => org,
    }
}

/// Styled output formatter for aggregated results
pub struct StyledFormatter {
    styles: Styles,
    use_colors: bool,
}

impl Default for StyledFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl StyledFormatter {
    /// Colors when stdout is a terminal and `NO_COLOR` is unset
    pub fn new() -> Self {
        Self {
            styles: Styles::default(),
            use_colors: Self::should_use_colors(),
        }
    }

    /// Create a formatter without colors (for non-interactive use)
    pub fn without_colors() -> Self {
        Self {
            styles: Styles::default(),
            use_colors: false,
        }
    }

    fn should_use_colors() -> bool {
        std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err()
    }

    /// Apply style to text if colors are enabled
    fn styled(&self, text: &str, style: &Style) -> String {
        if self.use_colors {
            format!("{}{}{}", style.render(), text, style.render_reset())
        } else {
            text.to_string()
        }
    }

    /// Render the full summary.
    pub fn format_report(&self, report: &AggregateReport) -> Result<String, std::fmt::Error> {
        let mut output = String::new();
        self.write_header(&mut output, report)?;
        self.write_org_table(&mut output, report)?;
        self.write_bar_chart(&mut output, report)?;
        self.write_bailiwick_table(&mut output, report)?;
        Ok(output)
    }

    pub fn print_report(&self, report: &AggregateReport) -> Result<(), std::fmt::Error> {
        print!("{}", self.format_report(report)?);
        Ok(())
    }

    fn rule(&self, output: &mut String) -> std::fmt::Result {
        writeln!(output, "{}", self.styled(&"━".repeat(64), &self.styles.muted))
    }

    fn write_header(&self, output: &mut String, report: &AggregateReport) -> std::fmt::Result {
        writeln!(output)?;
        self.rule(output)?;
        writeln!(
            output,
            "{}",
            self.styled(
                "Nameserver Infrastructure Concentration",
                &self.styles.header
            )
        )?;
        writeln!(
            output,
            "{}",
            self.styled(
                &format!(
                    "{} domains analyzed · generated {}",
                    report.metadata.total_domains,
                    report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                &self.styles.muted
            )
        )?;
        self.rule(output)
    }

    fn write_org_table(&self, output: &mut String, report: &AggregateReport) -> std::fmt::Result {
        writeln!(output)?;
        writeln!(
            output,
            "{}",
            self.styled("Top Organizations", &self.styles.subheader)
        )?;

        if report.top_unreachable_percents.is_empty() {
            writeln!(
                output,
                "  {}",
                self.styled("No organization data available", &self.styles.muted)
            )?;
            return Ok(());
        }

        writeln!(
            output,
            "  {}",
            self.styled(
                &format!("{:<24} {:>14} {:>12}", "", "% Unreachable", "% Affected"),
                &self.styles.bold
            )
        )?;

        let mut total_unreachable = 0.0;
        let mut total_affected = 0.0;
        for ((org, unreachable), (_, affected)) in report
            .top_unreachable_percents
            .iter()
            .zip(report.top_affected_percents.iter())
        {
            total_unreachable += unreachable;
            total_affected += affected;
            writeln!(
                output,
                "  {} {:>14.1} {:>12.1}",
                self.styled(&format!("{:<24}", clean_name(org)), &self.styles.organization),
                unreachable,
                affected
            )?;
        }

        writeln!(output, "  {}", self.styled(&"─".repeat(52), &self.styles.muted))?;
        writeln!(
            output,
            "  {}",
            self.styled(
                &format!(
                    "{:<24} {:>14.2} {:>12.2}",
                    "Total",
                    round2(total_unreachable),
                    round2(total_affected)
                ),
                &self.styles.bold
            )
        )
    }

    fn write_bar_chart(&self, output: &mut String, report: &AggregateReport) -> std::fmt::Result {
        if report.top_unreachable_numbers.is_empty() {
            return Ok(());
        }
        writeln!(output)?;
        writeln!(
            output,
            "{}  {} {}",
            self.styled("Number of Domains", &self.styles.subheader),
            self.styled("█ unreachable", &self.styles.unreachable),
            self.styled("▒ affected", &self.styles.affected)
        )?;

        let max = report
            .top_affected_numbers
            .iter()
            .map(|(_, n)| *n)
            .chain(report.top_unreachable_numbers.iter().map(|(_, n)| *n))
            .max()
            .unwrap_or(0);

        for ((org, unreachable), (_, affected)) in report
            .top_unreachable_numbers
            .iter()
            .zip(report.top_affected_numbers.iter())
        {
            let solid = scale(*unreachable, max);
            let stacked = scale(*affected, max).saturating_sub(solid);
            writeln!(
                output,
                "  {:<16} {}{} {}",
                clean_name(org),
                self.styled(&"█".repeat(solid), &self.styles.unreachable),
                self.styled(&"▒".repeat(stacked), &self.styles.affected),
                self.styled(&format!("{unreachable}/{affected}"), &self.styles.muted)
            )?;
        }
        Ok(())
    }

    fn write_bailiwick_table(
        &self,
        output: &mut String,
        report: &AggregateReport,
    ) -> std::fmt::Result {
        writeln!(output)?;
        writeln!(
            output,
            "{}",
            self.styled("In-Bailiwick Nameservers", &self.styles.subheader)
        )?;
        writeln!(
            output,
            "  {} {:>8.2}",
            self.styled(&format!("{:<30}", "Full Inbailiwick Domain %"), &self.styles.bold),
            report.inbailwick_result
        )?;
        writeln!(
            output,
            "  {} {:>8.2}",
            self.styled(&format!("{:<30}", "Partial Inbailiwick Domain %"), &self.styles.bold),
            report.inbailwick_partial_percent
        )?;
        writeln!(output)
    }
}

fn scale(value: usize, max: usize) -> usize {
    if max == 0 {
        0
    } else {
        (value * BAR_WIDTH).div_ceil(max)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analysis;

    const GOOGLE: &str = "GOOGLE, US";
    const AMAZON: &str = "AMAZON-02, US";

    fn report() -> AggregateReport {
        AggregateReport::from_analysis(&Analysis {
            total_domains: 10,
            inbailwick_percent: 20.0,
            inbailwick_partial_percent: 10.0,
            top_unreachable_numbers: vec![(GOOGLE.into(), 4), (AMAZON.into(), 2)],
            top_unreachable_percents: vec![(GOOGLE.into(), 40.0), (AMAZON.into(), 20.0)],
            top_affected_numbers: vec![(GOOGLE.into(), 5), (AMAZON.into(), 4)],
            top_affected_percents: vec![(GOOGLE.into(), 50.0), (AMAZON.into(), 40.0)],
        })
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("GOOGLE, US"), "GOOGLE");
        assert_eq!(clean_name("AMAZON-02, US"), "AMAZON");
        assert_eq!(clean_name("CLOUDFLARENET"), "CLOUDFLARENET");
        assert_eq!(clean_name(""), "");
    }

    #[test]
    fn plain_report_has_tables_without_escapes() {
        let text = StyledFormatter::without_colors()
            .format_report(&report())
            .unwrap();
        assert!(!text.contains('\u{1b}'));
        assert!(text.contains("GOOGLE"));
        assert!(text.contains("Total"));
        assert!(text.contains("60.00"));
        assert!(text.contains("Full Inbailiwick Domain %"));
        assert!(text.contains("4/5"));
    }

    #[test]
    fn bar_scaling() {
        assert_eq!(scale(5, 5), BAR_WIDTH);
        assert_eq!(scale(0, 5), 0);
        assert_eq!(scale(3, 0), 0);
        assert_eq!(scale(1, 80), 1);
    }
}
