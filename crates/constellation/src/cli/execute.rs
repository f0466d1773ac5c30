//! Command execution logic.
//!
//! Every command except `init` runs against an opened [`App`]; the caller
//! closes it afterwards.

use anyhow::Result;
use serde_json::{json, Map, Value};

use super::args::{
    CreateArgs, DeleteArgs, DepsArgs, EdgesArgs, ImpactArgs, InitArgs, LinkArgs, LinksArgs,
    ListArgs, SearchArgs, ShowArgs, UnlinkArgs, UpdateArgs,
};
use super::Commands;
use crate::app::App;
use crate::domain::{CiFilter, CiId, Direction, NewCi, RelationshipId, RelationshipProperties};
use crate::output::{self, OutputConfig, OutputMode};

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.backend).await?;

    if !args.quiet {
        println!(
            "Initialized constellation in {}",
            result.constellation_dir.display()
        );
        println!("  Config: {}", result.config_file.display());
        if let Some(data_file) = &result.data_file {
            println!("  Graph: {}", data_file.display());
        }
    }

    Ok(())
}

/// Run any command that needs an opened application.
pub async fn dispatch(app: &App, command: &Commands, mode: OutputMode) -> Result<()> {
    match command {
        Commands::Init(_) => anyhow::bail!("init cannot run inside an opened repository"),
        Commands::Create(args) => execute_create(app, args, mode).await,
        Commands::Show(args) => execute_show(app, args, mode).await,
        Commands::List(args) => execute_list(app, args, mode).await,
        Commands::Update(args) => execute_update(app, args, mode).await,
        Commands::Delete(args) => execute_delete(app, args, mode).await,
        Commands::Search(args) => execute_search(app, args, mode).await,
        Commands::Count(_) => execute_count(app, mode).await,
        Commands::Link(args) => execute_link(app, args, mode).await,
        Commands::Links(args) => execute_links(app, args, mode).await,
        Commands::Unlink(args) => execute_unlink(app, args, mode).await,
        Commands::Edges(args) => execute_edges(app, args, mode).await,
        Commands::Stats(_) => execute_stats(app, mode).await,
        Commands::Impact(args) => execute_impact(app, args, mode).await,
        Commands::Deps(args) => execute_deps(app, args, mode).await,
        Commands::BusFactor(_) => execute_bus_factor(app, mode).await,
    }
}

/// Build the CI to create from `create` flags.
pub(crate) fn new_ci_from_args(args: &CreateArgs) -> NewCi {
    NewCi {
        id: args.id.as_deref().map(CiId::from),
        name: args.name.clone(),
        description: args.description.clone(),
        ci_type: args.ci_type,
        criticality: args.criticality,
        environment: args.environment,
        lifecycle_state: args.lifecycle,
        hostname: args.hostname.clone(),
        ip_address: args.ip.clone(),
        fqdn: args.fqdn.clone(),
        vendor: args.vendor.clone(),
        model: args.model.clone(),
        serial_number: args.serial.clone(),
        asset_tag: args.asset_tag.clone(),
        location: args.location.clone(),
        rack_position: args.rack.clone(),
        status: args.status.clone(),
        owner: args.owner.clone(),
        cost_center: args.cost_center.clone(),
        compliance_tags: args.compliance.clone(),
        monitoring_enabled: !args.no_monitoring,
        backup_enabled: args.backup,
        custom_attributes: args.attributes.iter().cloned().collect(),
        risk_assessment: None,
    }
}

/// Execute the create command
pub async fn execute_create(app: &App, args: &CreateArgs, mode: OutputMode) -> Result<()> {
    let new = new_ci_from_args(args);
    let report = app
        .create_ci_with_relationships(new, args.relationships.clone())
        .await?;
    output::print_creation_report(&report, mode)?;
    Ok(())
}

/// Execute the show command
pub async fn execute_show(app: &App, args: &ShowArgs, mode: OutputMode) -> Result<()> {
    let id = CiId::from(args.ci_id.as_str());
    let Some(ci) = app.assets().get(&id).await? else {
        anyhow::bail!("CI not found: {id}");
    };
    let related = app.relationships().list_for(&id, Direction::Both).await?;
    output::print_ci_details(&ci, &related, mode)?;
    Ok(())
}

/// Execute the list command
pub async fn execute_list(app: &App, args: &ListArgs, mode: OutputMode) -> Result<()> {
    let filter = CiFilter {
        ci_type: args.ci_type,
        environment: args.environment,
        criticality: args.criticality,
    };
    let page = app.assets().list(filter, args.limit, args.offset).await?;
    output::print_ci_page(&page, mode)?;
    Ok(())
}

/// Merge `update` flags into one JSON payload.
///
/// Order: `--fields` first, then explicit flags, then `--clear`.
pub(crate) fn update_payload(args: &UpdateArgs) -> Value {
    let mut payload = match &args.fields {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    let flags = [
        ("name", args.name.as_ref().map(|v| json!(v))),
        ("description", args.description.as_ref().map(|v| json!(v))),
        ("ci_type", args.ci_type.map(|v| json!(v))),
        ("criticality", args.criticality.map(|v| json!(v))),
        ("environment", args.environment.map(|v| json!(v))),
        ("lifecycle_state", args.lifecycle.map(|v| json!(v))),
        ("owner", args.owner.as_ref().map(|v| json!(v))),
        ("status", args.status.as_ref().map(|v| json!(v))),
    ];
    for (key, value) in flags {
        if let Some(value) = value {
            payload.insert(key.to_string(), value);
        }
    }
    for key in &args.clear {
        payload.insert(key.clone(), Value::Null);
    }

    Value::Object(payload)
}

/// Execute the update command
pub async fn execute_update(app: &App, args: &UpdateArgs, mode: OutputMode) -> Result<()> {
    let id = CiId::from(args.ci_id.as_str());
    let ci = app.assets().update_json(&id, &update_payload(args)).await?;
    output::print_ci(&ci, mode)?;
    Ok(())
}

/// Execute the delete command
pub async fn execute_delete(app: &App, args: &DeleteArgs, mode: OutputMode) -> Result<()> {
    let id = CiId::from(args.ci_id.as_str());
    let deleted = app.assets().delete(&id).await?;

    match mode {
        OutputMode::Json => output::print_json(&json!({ "id": id, "deleted": deleted }))?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let msg = if deleted {
                output::success(&format!("Deleted {id}"), &config)
            } else {
                output::warning(&format!("No CI with id {id}"), &config)
            };
            output::print_message(&msg)?;
        }
    }
    Ok(())
}

/// Execute the search command
pub async fn execute_search(app: &App, args: &SearchArgs, mode: OutputMode) -> Result<()> {
    let cis = app.assets().search(&args.text, args.limit).await?;
    output::print_search_results(&cis, mode)?;
    Ok(())
}

/// Execute the count command
pub async fn execute_count(app: &App, mode: OutputMode) -> Result<()> {
    let total = app.assets().count().await?;
    match mode {
        OutputMode::Json => output::print_json(&json!({ "total": total }))?,
        OutputMode::Text => output::print_message(&format!("{total} CI(s)"))?,
    }
    Ok(())
}

/// Relationship properties from `link` flags.
pub(crate) fn properties_from_args(args: &LinkArgs) -> RelationshipProperties {
    RelationshipProperties {
        strength: args.strength,
        weight: args.weight,
        active: !args.inactive,
        verified: args.verified,
        description: args.description.clone(),
        conditions: args.conditions.clone(),
        port: args.port,
        protocol: args.protocol.clone(),
        ..Default::default()
    }
}

/// Execute the link command
pub async fn execute_link(app: &App, args: &LinkArgs, mode: OutputMode) -> Result<()> {
    let relationship = app
        .relationships()
        .create(
            &CiId::from(args.source_id.as_str()),
            &CiId::from(args.target_id.as_str()),
            args.relationship_type,
            Some(properties_from_args(args)),
        )
        .await?;
    output::print_relationship(&relationship, mode)?;
    Ok(())
}

/// Execute the links command
pub async fn execute_links(app: &App, args: &LinksArgs, mode: OutputMode) -> Result<()> {
    let id = CiId::from(args.ci_id.as_str());
    let related = app.relationships().list_for(&id, args.direction).await?;
    output::print_related(id.as_str(), &related, mode)?;
    Ok(())
}

/// Execute the unlink command
pub async fn execute_unlink(app: &App, args: &UnlinkArgs, mode: OutputMode) -> Result<()> {
    let id = RelationshipId::from(args.relationship_id.as_str());
    let deleted = app.relationships().delete(&id).await?;

    match mode {
        OutputMode::Json => output::print_json(&json!({ "id": id, "deleted": deleted }))?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let msg = if deleted {
                output::success(&format!("Removed relationship {id}"), &config)
            } else {
                output::warning(&format!("No relationship with id {id}"), &config)
            };
            output::print_message(&msg)?;
        }
    }
    Ok(())
}

/// Execute the edges command
pub async fn execute_edges(app: &App, args: &EdgesArgs, mode: OutputMode) -> Result<()> {
    let summaries = app
        .relationships()
        .list_all(args.limit, args.offset)
        .await?;
    output::print_relationship_summaries(&summaries, mode)?;
    Ok(())
}

/// Execute the stats command
pub async fn execute_stats(app: &App, mode: OutputMode) -> Result<()> {
    let stats = app.relationships().graph_stats().await?;
    output::print_stats(&stats, mode)?;
    Ok(())
}

/// Execute the impact command
pub async fn execute_impact(app: &App, args: &ImpactArgs, mode: OutputMode) -> Result<()> {
    let id = CiId::from(args.ci_id.as_str());
    let report = app.analysis().impact_analysis(&id, args.depth).await?;
    output::print_impact(&report, mode)?;
    Ok(())
}

/// Execute the deps command
pub async fn execute_deps(app: &App, args: &DepsArgs, mode: OutputMode) -> Result<()> {
    let id = CiId::from(args.ci_id.as_str());
    let report = app.analysis().dependency_analysis(&id, args.depth).await?;
    output::print_dependencies(&report, mode)?;
    Ok(())
}

/// Execute the bus-factor command
pub async fn execute_bus_factor(app: &App, mode: OutputMode) -> Result<()> {
    let report = app.analysis().bus_factor_analysis().await?;
    output::print_bus_factor(&report, mode)?;
    Ok(())
}
