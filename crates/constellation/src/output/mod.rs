//! Output formatting for CLI commands.
//!
//! Every printer has a text form (colored, wrapped to the terminal) and a
//! JSON form (pretty `serde_json`). Text printers are generic over
//! [`Write`] so they can be tested against a buffer.

pub mod color;

use crate::analysis::{BusFactorReport, DependencyReport, ImpactReport, ReachedCi};
use crate::domain::{Ci, CiPage, Criticality, GraphStats, RelatedCi, Relationship, RelationshipSummary};
use crate::registry::CiCreationReport;
use serde::Serialize;
use serde_json::json;
use std::env;
use std::io::{self, Write};

pub use color::{error, success, warning};

use color::{bold, colorize_criticality, colorize_id, colorize_relationship_type, dimmed};

const DEFAULT_TERMINAL_WIDTH: usize = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 100;
const MIN_WRAP_WIDTH: usize = 20;

/// Settings that control text rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for wrapped text.
    pub max_width: usize,
    /// Whether to emit ANSI colors.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create an `OutputConfig` with explicit values.
    pub fn new(max_width: usize, use_colors: bool) -> Self {
        Self {
            max_width,
            use_colors,
        }
    }

    /// Read settings from the environment.
    ///
    /// - `CONSTELLATION_MAX_WIDTH`: maximum content width
    /// - `NO_COLOR`: any value disables colors
    /// - `CONSTELLATION_COLOR`: `0` or `false` disables colors
    pub fn from_env() -> Self {
        let max_width = match env::var("CONSTELLATION_MAX_WIDTH") {
            Ok(s) if !s.is_empty() => match s.parse() {
                Ok(width) => width,
                Err(_) => {
                    tracing::warn!(
                        env_var = "CONSTELLATION_MAX_WIDTH",
                        value = %s,
                        default = DEFAULT_MAX_CONTENT_WIDTH,
                        "Invalid value, using default"
                    );
                    DEFAULT_MAX_CONTENT_WIDTH
                }
            },
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("CONSTELLATION_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            max_width,
            use_colors,
        }
    }

    fn content_width(&self) -> usize {
        get_terminal_width().min(self.max_width)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTENT_WIDTH, true)
    }
}

fn get_terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| usize::from(w.0))
        .unwrap_or(DEFAULT_TERMINAL_WIDTH)
}

fn wrap_text(text: &str, width: usize) -> Vec<String> {
    textwrap::wrap(text, width.max(MIN_WRAP_WIDTH))
        .into_iter()
        .map(std::borrow::Cow::into_owned)
        .collect()
}

/// Output format mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputMode {
    /// Pick a mode from the global `--json` flag.
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Run a text printer against stdout, or serialize `value` as JSON.
fn dispatch<T, F>(value: &T, mode: OutputMode, text: F) -> io::Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&mut io::StdoutLock<'static>, &OutputConfig) -> io::Result<()>,
{
    match mode {
        OutputMode::Text => {
            let mut handle = io::stdout().lock();
            text(&mut handle, &OutputConfig::from_env())
        }
        OutputMode::Json => print_json(value),
    }
}

/// Print a single CI summary line.
pub fn print_ci(ci: &Ci, mode: OutputMode) -> io::Result<()> {
    dispatch(ci, mode, |w, config| write_ci_line(w, ci, config))
}

/// Print a CI with all of its attributes and relationships.
pub fn print_ci_details(ci: &Ci, related: &[RelatedCi], mode: OutputMode) -> io::Result<()> {
    let value = json!({ "ci": ci, "relationships": related });
    dispatch(&value, mode, |w, config| {
        write_ci_details(w, ci, related, config)
    })
}

/// Print one page of a listing.
pub fn print_ci_page(page: &CiPage, mode: OutputMode) -> io::Result<()> {
    dispatch(page, mode, |w, config| write_ci_page(w, page, config))
}

/// Print search results.
pub fn print_search_results(cis: &[Ci], mode: OutputMode) -> io::Result<()> {
    dispatch(cis, mode, |w, config| write_ci_list(w, cis, config))
}

/// Print a newly created relationship.
pub fn print_relationship(relationship: &Relationship, mode: OutputMode) -> io::Result<()> {
    dispatch(relationship, mode, |w, config| {
        write_relationship(w, relationship, config)
    })
}

/// Print the relationships of one CI.
pub fn print_related(ci_id: &str, related: &[RelatedCi], mode: OutputMode) -> io::Result<()> {
    dispatch(related, mode, |w, config| {
        write_related(w, ci_id, related, config)
    })
}

/// Print a page of all relationships.
pub fn print_relationship_summaries(
    summaries: &[RelationshipSummary],
    mode: OutputMode,
) -> io::Result<()> {
    dispatch(summaries, mode, |w, config| {
        write_relationship_summaries(w, summaries, config)
    })
}

/// Print graph statistics.
pub fn print_stats(stats: &GraphStats, mode: OutputMode) -> io::Result<()> {
    dispatch(stats, mode, |w, config| write_stats(w, stats, config))
}

/// Print the outcome of a create with relationships.
pub fn print_creation_report(report: &CiCreationReport, mode: OutputMode) -> io::Result<()> {
    dispatch(report, mode, |w, config| {
        write_creation_report(w, report, config)
    })
}

/// Print an impact report.
pub fn print_impact(report: &ImpactReport, mode: OutputMode) -> io::Result<()> {
    dispatch(report, mode, |w, config| write_impact(w, report, config))
}

/// Print a dependency report.
pub fn print_dependencies(report: &DependencyReport, mode: OutputMode) -> io::Result<()> {
    dispatch(report, mode, |w, config| {
        write_dependencies(w, report, config)
    })
}

/// Print a bus factor report.
pub fn print_bus_factor(report: &BusFactorReport, mode: OutputMode) -> io::Result<()> {
    dispatch(report, mode, |w, config| write_bus_factor(w, report, config))
}

/// Print a simple message.
pub fn print_message(msg: &str) -> io::Result<()> {
    let mut handle = io::stdout().lock();
    writeln!(handle, "{msg}")
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let mut handle = io::stdout().lock();
    write_json(&mut handle, value)
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

// ============================================================================
// Text Formatting
// ============================================================================

fn write_ci_line<W: Write>(w: &mut W, ci: &Ci, config: &OutputConfig) -> io::Result<()> {
    writeln!(
        w,
        "{}  {}  {}  {}  {}",
        colorize_id(ci.id.as_str(), config),
        colorize_criticality(ci.criticality, config),
        ci.ci_type,
        dimmed(ci.environment.as_str(), config),
        ci.name
    )
}

fn write_ci_list<W: Write>(w: &mut W, cis: &[Ci], config: &OutputConfig) -> io::Result<()> {
    if cis.is_empty() {
        return writeln!(w, "No CIs found.");
    }
    writeln!(w, "Found {} CI(s):", cis.len())?;
    writeln!(w)?;
    for ci in cis {
        write_ci_line(w, ci, config)?;
    }
    Ok(())
}

fn write_ci_page<W: Write>(w: &mut W, page: &CiPage, config: &OutputConfig) -> io::Result<()> {
    if page.items.is_empty() {
        return writeln!(w, "No CIs found ({} total).", page.total_count);
    }
    let first = page.offset + 1;
    let last = page.offset + page.items.len();
    writeln!(
        w,
        "Showing {first}-{last} of {} CI(s):",
        page.total_count
    )?;
    writeln!(w)?;
    for ci in &page.items {
        write_ci_line(w, ci, config)?;
    }
    Ok(())
}

fn write_field<W: Write>(
    w: &mut W,
    label: &str,
    value: Option<&str>,
    config: &OutputConfig,
) -> io::Result<()> {
    match value {
        Some(value) => writeln!(w, "  {} {value}", dimmed(&format!("{label}:"), config)),
        None => Ok(()),
    }
}

fn write_ci_details<W: Write>(
    w: &mut W,
    ci: &Ci,
    related: &[RelatedCi],
    config: &OutputConfig,
) -> io::Result<()> {
    let width = config.content_width();

    writeln!(
        w,
        "{} {}",
        colorize_id(ci.id.as_str(), config),
        bold(&ci.name, config)
    )?;
    writeln!(w)?;

    write_field(w, "Type", Some(ci.ci_type.as_str()), config)?;
    writeln!(
        w,
        "  {} {}",
        dimmed("Criticality:", config),
        colorize_criticality(ci.criticality, config)
    )?;
    write_field(w, "Environment", Some(ci.environment.as_str()), config)?;
    write_field(w, "Lifecycle", Some(ci.lifecycle_state.as_str()), config)?;

    let optional = [
        ("Hostname", &ci.hostname),
        ("IP address", &ci.ip_address),
        ("FQDN", &ci.fqdn),
        ("Vendor", &ci.vendor),
        ("Model", &ci.model),
        ("Serial", &ci.serial_number),
        ("Asset tag", &ci.asset_tag),
        ("Location", &ci.location),
        ("Rack", &ci.rack_position),
        ("Status", &ci.status),
        ("Owner", &ci.owner),
        ("Cost center", &ci.cost_center),
    ];
    for (label, value) in optional {
        write_field(w, label, value.as_deref(), config)?;
    }

    if !ci.compliance_tags.is_empty() {
        write_field(w, "Compliance", Some(ci.compliance_tags.join(", ").as_str()), config)?;
    }
    write_field(w, "Monitoring", Some(yes_no(ci.monitoring_enabled)), config)?;
    write_field(w, "Backup", Some(yes_no(ci.backup_enabled)), config)?;
    write_field(w, "Created", Some(ci.created_at.to_rfc3339().as_str()), config)?;
    write_field(w, "Updated", Some(ci.updated_at.to_rfc3339().as_str()), config)?;

    if let Some(description) = ci.description.as_deref().filter(|d| !d.is_empty()) {
        writeln!(w)?;
        writeln!(w, "{}", bold("Description:", config))?;
        for line in wrap_text(description, width.saturating_sub(2)) {
            writeln!(w, "  {line}")?;
        }
    }

    if !ci.custom_attributes.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", bold("Attributes:", config))?;
        for (key, value) in &ci.custom_attributes {
            writeln!(w, "  {} {value}", dimmed(&format!("{key}:"), config))?;
        }
    }

    if !related.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", bold("Relationships:", config))?;
        for entry in related {
            write_related_line(w, entry, config)?;
        }
    }

    Ok(())
}

const fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn write_related_line<W: Write>(w: &mut W, entry: &RelatedCi, config: &OutputConfig) -> io::Result<()> {
    let arrow = if entry.direction.includes_outgoing() { "->" } else { "<-" };
    writeln!(
        w,
        "  {arrow} {} {} ({})  {}",
        colorize_relationship_type(entry.relationship_type, config),
        colorize_id(entry.related_id.as_str(), config),
        entry.related_name,
        dimmed(entry.relationship_id.as_str(), config)
    )
}

fn write_relationship<W: Write>(
    w: &mut W,
    relationship: &Relationship,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {} {} {} {}",
        success("Linked", config),
        colorize_id(relationship.source_id.as_str(), config),
        colorize_relationship_type(relationship.relationship_type, config),
        colorize_id(relationship.target_id.as_str(), config),
        dimmed(&format!("({})", relationship.id), config)
    )
}

fn write_related<W: Write>(
    w: &mut W,
    ci_id: &str,
    related: &[RelatedCi],
    config: &OutputConfig,
) -> io::Result<()> {
    if related.is_empty() {
        return writeln!(w, "No relationships for {}.", colorize_id(ci_id, config));
    }
    writeln!(
        w,
        "{} relationship(s) for {}:",
        related.len(),
        colorize_id(ci_id, config)
    )?;
    for entry in related {
        write_related_line(w, entry, config)?;
    }
    Ok(())
}

fn write_relationship_summaries<W: Write>(
    w: &mut W,
    summaries: &[RelationshipSummary],
    config: &OutputConfig,
) -> io::Result<()> {
    if summaries.is_empty() {
        return writeln!(w, "No relationships found.");
    }
    for summary in summaries {
        writeln!(
            w,
            "{}  {} ({}) {} {} ({})",
            dimmed(summary.id.as_str(), config),
            colorize_id(summary.source_id.as_str(), config),
            summary.source_name,
            colorize_relationship_type(summary.relationship_type, config),
            colorize_id(summary.target_id.as_str(), config),
            summary.target_name
        )?;
    }
    Ok(())
}

fn write_stats<W: Write>(w: &mut W, stats: &GraphStats, config: &OutputConfig) -> io::Result<()> {
    writeln!(w, "{}", bold("Graph statistics", config))?;
    writeln!(w, "  {} {}", dimmed("CIs:", config), stats.total_cis)?;
    writeln!(
        w,
        "  {} {}",
        dimmed("Relationships:", config),
        stats.total_relationships
    )?;
    writeln!(
        w,
        "  {} {}",
        dimmed("Relationship types:", config),
        stats.relationship_type_count
    )?;
    for entry in &stats.relationship_types {
        writeln!(
            w,
            "    {:>6}  {}",
            entry.count,
            colorize_relationship_type(entry.relationship_type, config)
        )?;
    }
    Ok(())
}

fn write_creation_report<W: Write>(
    w: &mut W,
    report: &CiCreationReport,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {}",
        success("Created", config),
        colorize_id(report.ci.id.as_str(), config)
    )?;
    write_ci_line(w, &report.ci, config)?;
    for relationship in &report.created_relationships {
        writeln!(
            w,
            "  -> {} {}",
            colorize_relationship_type(relationship.relationship_type, config),
            colorize_id(relationship.target_id.as_str(), config)
        )?;
    }
    for failure in &report.failed_relationships {
        writeln!(
            w,
            "  {} {} {}: {}",
            error("failed", config),
            colorize_relationship_type(failure.relationship_type, config),
            colorize_id(failure.target_id.as_str(), config),
            failure.reason
        )?;
    }
    Ok(())
}

fn write_reached<W: Write>(w: &mut W, reached: &[ReachedCi], config: &OutputConfig) -> io::Result<()> {
    for entry in reached {
        let chain = entry
            .relationship_chain
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(" > ");
        writeln!(
            w,
            "  [{}] {}  {}  {}  {}",
            entry.distance,
            colorize_id(entry.id.as_str(), config),
            colorize_criticality(entry.criticality, config),
            entry.name,
            dimmed(&chain, config)
        )?;
    }
    Ok(())
}

fn write_impact<W: Write>(w: &mut W, report: &ImpactReport, config: &OutputConfig) -> io::Result<()> {
    writeln!(
        w,
        "Impact of {} (depth {}): {} CI(s) affected, risk score {}",
        colorize_id(report.source_id.as_str(), config),
        report.max_depth,
        report.total_impacted,
        bold(&report.risk_score.to_string(), config)
    )?;
    if report.impacted.is_empty() {
        return Ok(());
    }
    let breakdown = Criticality::ALL
        .iter()
        .rev()
        .map(|&c| format!("{} {}", colorize_criticality(c, config), report.criticality_breakdown.get(c)))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(w, "  {breakdown}")?;
    writeln!(w)?;
    write_reached(w, &report.impacted, config)
}

fn write_dependencies<W: Write>(
    w: &mut W,
    report: &DependencyReport,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "Dependencies of {} (depth {}): {} CI(s)",
        colorize_id(report.source_id.as_str(), config),
        report.max_depth,
        report.total_dependencies
    )?;
    if report.dependencies.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    write_reached(w, &report.dependencies, config)
}

fn write_bus_factor<W: Write>(
    w: &mut W,
    report: &BusFactorReport,
    config: &OutputConfig,
) -> io::Result<()> {
    if report.entries.is_empty() {
        return writeln!(w, "No single points of failure found.");
    }
    writeln!(
        w,
        "Top {} of {} CI(s) with dependents:",
        report.total_analyzed, report.total_candidates
    )?;
    writeln!(w)?;
    for entry in &report.entries {
        writeln!(
            w,
            "  {:>7.2}  {}  {}  {} dependent(s)  {}",
            entry.risk_score,
            colorize_id(entry.id.as_str(), config),
            colorize_criticality(entry.criticality, config),
            entry.dependent_count,
            entry.name
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::CriticalityBreakdown;
    use crate::domain::{CiId, CiType, Direction, NewCi, RelationshipId, RelationshipType};
    use chrono::Utc;

    fn plain() -> OutputConfig {
        OutputConfig::new(80, false)
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn sample_ci() -> Ci {
        let mut new = NewCi::new("payments-db")
            .with_type(CiType::Database)
            .with_criticality(Criticality::Critical);
        new.id = Some(CiId::new("ci-1"));
        new.owner = Some("dba-team".to_string());
        new.description = Some("Primary ledger database ".repeat(10));
        new.into_ci(Utc::now())
    }

    #[test]
    fn ci_line_contains_key_fields() {
        let out = render(|w| write_ci_line(w, &sample_ci(), &plain()));
        assert!(out.starts_with("ci-1  CRITICAL  DATABASE"));
        assert!(out.trim_end().ends_with("payments-db"));
    }

    #[test]
    fn empty_list_message() {
        let out = render(|w| write_ci_list(w, &[], &plain()));
        assert_eq!(out, "No CIs found.\n");
    }

    #[test]
    fn page_header_shows_range() {
        let page = CiPage {
            items: vec![sample_ci()],
            total_count: 12,
            limit: 1,
            offset: 4,
        };
        let out = render(|w| write_ci_page(w, &page, &plain()));
        assert!(out.starts_with("Showing 5-5 of 12 CI(s):"));
    }

    #[test]
    fn details_wrap_description_and_list_relationships() {
        let related = vec![RelatedCi {
            relationship_id: RelationshipId::new("rel-1"),
            relationship_type: RelationshipType::HostedOn,
            created_at: Utc::now(),
            related_id: CiId::new("host-1"),
            related_name: "db-host".to_string(),
            direction: Direction::Outgoing,
        }];
        let out = render(|w| write_ci_details(w, &sample_ci(), &related, &plain()));
        assert!(out.contains("Owner: dba-team"));
        assert!(out.contains("Description:"));
        assert!(out.lines().all(|line| line.chars().count() <= 100));
        assert!(out.contains("-> HOSTED_ON host-1 (db-host)  rel-1"));
    }

    #[test]
    fn impact_summary_line() {
        let report = ImpactReport {
            source_id: CiId::new("a"),
            total_impacted: 0,
            impacted: Vec::new(),
            criticality_breakdown: CriticalityBreakdown::default(),
            risk_score: 0,
            max_depth: 3,
        };
        let out = render(|w| write_impact(w, &report, &plain()));
        assert_eq!(
            out,
            "Impact of a (depth 3): 0 CI(s) affected, risk score 0\n"
        );
    }

    #[test]
    fn empty_bus_factor_report() {
        let report = BusFactorReport {
            entries: Vec::new(),
            total_analyzed: 0,
            total_candidates: 0,
            analyzed_at: Utc::now(),
        };
        let out = render(|w| write_bus_factor(w, &report, &plain()));
        assert_eq!(out, "No single points of failure found.\n");
    }

    #[test]
    fn json_is_pretty_printed() {
        let out = render(|w| write_json(w, &json!({"total": 2})));
        assert_eq!(out, "{\n  \"total\": 2\n}\n");
    }

    #[test]
    fn output_mode_from_flag() {
        assert_eq!(OutputMode::from_json_flag(true), OutputMode::Json);
        assert_eq!(OutputMode::from_json_flag(false), OutputMode::Text);
    }
}
