//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::Parser;
use serde_json::Value;

use super::validators::{
    parse_attribute, parse_backend, parse_enum, parse_json_object, parse_relationship_arg,
    validate_name, validate_weight,
};
use crate::config::BackendKind;
use crate::domain::{
    CiType, Criticality, Direction, Environment, LifecycleState, RelationshipRequest,
    RelationshipStrength, RelationshipType,
};
use crate::registry::{DEFAULT_LIST_LIMIT, DEFAULT_SEARCH_LIMIT};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Storage backend: `jsonl` persists to `.constellation/graph.jsonl`,
    /// `memory` keeps nothing between runs
    #[arg(short, long, value_parser = parse_backend, default_value = "jsonl")]
    pub backend: BackendKind,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `create` command
#[derive(Parser, Debug, Clone)]
pub struct CreateArgs {
    /// CI name (1-255 characters)
    #[arg(value_parser = validate_name)]
    pub name: String,

    /// Explicit CI id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Free-form description (max 1000 characters)
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// CI type
    #[arg(short = 't', long = "type", value_parser = parse_enum::<CiType>, default_value = "GENERIC")]
    pub ci_type: CiType,

    /// Criticality
    #[arg(short, long, value_parser = parse_enum::<Criticality>, default_value = "MEDIUM")]
    pub criticality: Criticality,

    /// Deployment environment
    #[arg(short, long, value_parser = parse_enum::<Environment>, default_value = "PROD")]
    pub environment: Environment,

    /// Lifecycle state
    #[arg(long, value_parser = parse_enum::<LifecycleState>, default_value = "ACTIVE")]
    pub lifecycle: LifecycleState,

    /// Hostname
    #[arg(long)]
    pub hostname: Option<String>,

    /// IP address
    #[arg(long)]
    pub ip: Option<String>,

    /// Fully qualified domain name
    #[arg(long)]
    pub fqdn: Option<String>,

    /// Vendor
    #[arg(long)]
    pub vendor: Option<String>,

    /// Model
    #[arg(long)]
    pub model: Option<String>,

    /// Serial number
    #[arg(long)]
    pub serial: Option<String>,

    /// Asset tag
    #[arg(long)]
    pub asset_tag: Option<String>,

    /// Physical or logical location
    #[arg(long)]
    pub location: Option<String>,

    /// Rack position
    #[arg(long)]
    pub rack: Option<String>,

    /// Operational status text
    #[arg(long)]
    pub status: Option<String>,

    /// Owning team or person
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Cost center
    #[arg(long)]
    pub cost_center: Option<String>,

    /// Compliance tags (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub compliance: Vec<String>,

    /// Disable monitoring for this CI
    #[arg(long)]
    pub no_monitoring: bool,

    /// Mark the CI as backed up
    #[arg(long)]
    pub backup: bool,

    /// Custom attribute as KEY=VALUE (repeatable; VALUE may be JSON)
    #[arg(long = "attr", value_parser = parse_attribute)]
    pub attributes: Vec<(String, Value)>,

    /// Outgoing relationship as TYPE:TARGET_ID (repeatable)
    ///
    /// Relationships are created best effort: a bad target is reported
    /// but does not undo the CI.
    #[arg(long = "rel", value_parser = parse_relationship_arg)]
    pub relationships: Vec<RelationshipRequest>,
}

/// Arguments for the `show` command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// CI id
    pub ci_id: String,
}

/// Arguments for the `list` command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Filter by CI type
    #[arg(short = 't', long = "type", value_parser = parse_enum::<CiType>)]
    pub ci_type: Option<CiType>,

    /// Filter by environment
    #[arg(short, long, value_parser = parse_enum::<Environment>)]
    pub environment: Option<Environment>,

    /// Filter by criticality
    #[arg(short, long, value_parser = parse_enum::<Criticality>)]
    pub criticality: Option<Criticality>,

    /// Page size (1-1000)
    #[arg(short = 'n', long, default_value_t = DEFAULT_LIST_LIMIT)]
    pub limit: usize,

    /// Number of CIs to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

/// Arguments for the `update` command
#[derive(Parser, Debug, Clone)]
pub struct UpdateArgs {
    /// CI id
    pub ci_id: String,

    /// New name
    #[arg(long, value_parser = validate_name)]
    pub name: Option<String>,

    /// New description
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// New CI type
    #[arg(short = 't', long = "type", value_parser = parse_enum::<CiType>)]
    pub ci_type: Option<CiType>,

    /// New criticality
    #[arg(short, long, value_parser = parse_enum::<Criticality>)]
    pub criticality: Option<Criticality>,

    /// New environment
    #[arg(short, long, value_parser = parse_enum::<Environment>)]
    pub environment: Option<Environment>,

    /// New lifecycle state
    #[arg(long, value_parser = parse_enum::<LifecycleState>)]
    pub lifecycle: Option<LifecycleState>,

    /// New owner
    #[arg(short, long)]
    pub owner: Option<String>,

    /// New status text
    #[arg(long)]
    pub status: Option<String>,

    /// Clear an optional field (repeatable), e.g. `--clear hostname`
    #[arg(long)]
    pub clear: Vec<String>,

    /// Additional fields as a JSON object, e.g. `'{"hostname":"db-02"}'`
    ///
    /// Flags above take precedence over keys given here.
    #[arg(long, value_parser = parse_json_object)]
    pub fields: Option<Value>,
}

/// Arguments for the `delete` command
#[derive(Parser, Debug, Clone)]
pub struct DeleteArgs {
    /// CI id
    pub ci_id: String,
}

/// Arguments for the `search` command
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Text matched against name, description and hostname
    pub text: String,

    /// Maximum results (1-100)
    #[arg(short = 'n', long, default_value_t = DEFAULT_SEARCH_LIMIT)]
    pub limit: usize,
}

/// Arguments for the `count` command
#[derive(Parser, Debug, Clone)]
pub struct CountArgs {}

/// Arguments for the `link` command
#[derive(Parser, Debug, Clone)]
pub struct LinkArgs {
    /// Source CI id
    pub source_id: String,

    /// Target CI id
    pub target_id: String,

    /// Relationship type
    #[arg(short = 't', long = "type", value_parser = parse_enum::<RelationshipType>)]
    pub relationship_type: RelationshipType,

    /// Relationship strength
    #[arg(short, long, value_parser = parse_enum::<RelationshipStrength>, default_value = "MEDIUM")]
    pub strength: RelationshipStrength,

    /// Weight between 0.0 and 10.0
    #[arg(short, long, value_parser = validate_weight, default_value = "1.0")]
    pub weight: f64,

    /// Description (max 500 characters)
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// Conditions under which the relationship applies
    #[arg(long)]
    pub conditions: Option<String>,

    /// Network port
    #[arg(long)]
    pub port: Option<u16>,

    /// Network protocol
    #[arg(long)]
    pub protocol: Option<String>,

    /// Mark the relationship as verified
    #[arg(long)]
    pub verified: bool,

    /// Record the relationship as inactive
    #[arg(long)]
    pub inactive: bool,
}

/// Arguments for the `links` command
#[derive(Parser, Debug, Clone)]
pub struct LinksArgs {
    /// CI id
    pub ci_id: String,

    /// Which side of the CI to list: outgoing, incoming or both
    #[arg(short, long, value_parser = parse_enum::<Direction>, default_value = "both")]
    pub direction: Direction,
}

/// Arguments for the `unlink` command
#[derive(Parser, Debug, Clone)]
pub struct UnlinkArgs {
    /// Relationship id
    pub relationship_id: String,
}

/// Arguments for the `edges` command
#[derive(Parser, Debug, Clone)]
pub struct EdgesArgs {
    /// Page size (1-1000)
    #[arg(short = 'n', long, default_value_t = DEFAULT_LIST_LIMIT)]
    pub limit: usize,

    /// Number of relationships to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

/// Arguments for the `stats` command
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {}

/// Arguments for the `impact` command
#[derive(Parser, Debug, Clone)]
pub struct ImpactArgs {
    /// CI whose failure is analyzed
    pub ci_id: String,

    /// Traversal depth (clamped to 1-5; configured default when omitted)
    #[arg(short, long)]
    pub depth: Option<u32>,
}

/// Arguments for the `deps` command
#[derive(Parser, Debug, Clone)]
pub struct DepsArgs {
    /// CI whose dependencies are listed
    pub ci_id: String,

    /// Traversal depth (clamped to 1-5; configured default when omitted)
    #[arg(short, long)]
    pub depth: Option<u32>,
}

/// Arguments for the `bus-factor` command
#[derive(Parser, Debug, Clone)]
pub struct BusFactorArgs {}
