//! Closed enumerations used by CIs and relationships.
//!
//! Each enum has a fixed wire spelling exposed through `as_str`, `Display`,
//! serde and `FromStr`. Parsing is case-insensitive; anything outside the set
//! is rejected with [`ValidationError::InvalidEnumValue`].

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire spelling of this value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ValidationError::InvalidEnumValue {
                        field: $label,
                        value: s.to_string(),
                    })
            }
        }
    };
}

wire_enum! {
    /// Kind of configuration item.
    CiType ("ci_type") {
        /// Physical hardware.
        Hardware => "HARDWARE",
        /// Installed software.
        Software => "SOFTWARE",
        /// Network device or segment.
        Network => "NETWORK",
        /// Business application.
        Application => "APPLICATION",
        /// Running service.
        Service => "SERVICE",
        /// Network-reachable endpoint.
        Endpoint => "ENDPOINT",
        /// Dataset.
        Dataset => "DATASET",
        /// Database.
        Database => "DATABASE",
        /// Physical or logical location.
        Location => "LOCATION",
        /// Facility such as a data center.
        Facility => "FACILITY",
        /// Human or machine identity.
        Identity => "IDENTITY",
        /// Secret or credential.
        Credential => "CREDENTIAL",
        /// Anything else.
        Generic => "GENERIC",
    }
}

impl Default for CiType {
    fn default() -> Self {
        Self::Generic
    }
}

wire_enum! {
    /// Business criticality, ordered from least to most critical.
    Criticality ("criticality") {
        /// Low.
        Low => "LOW",
        /// Medium.
        Medium => "MEDIUM",
        /// High.
        High => "HIGH",
        /// Critical.
        Critical => "CRITICAL",
    }
}

impl Default for Criticality {
    fn default() -> Self {
        Self::Medium
    }
}

wire_enum! {
    /// Deployment environment.
    Environment ("environment") {
        /// Development.
        Dev => "DEV",
        /// Test.
        Test => "TEST",
        /// Staging.
        Staging => "STAGING",
        /// Production.
        Prod => "PROD",
        /// Sandbox.
        Sandbox => "SANDBOX",
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::Prod
    }
}

wire_enum! {
    /// Lifecycle stage of a CI.
    LifecycleState ("lifecycle_state") {
        /// Not yet deployed.
        Planned => "PLANNED",
        /// In service.
        Active => "ACTIVE",
        /// Scheduled for removal.
        Deprecated => "DEPRECATED",
        /// Out of service.
        Retired => "RETIRED",
        /// Unknown.
        Unknown => "UNKNOWN",
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self::Active
    }
}

wire_enum! {
    /// Type of a directed relationship.
    RelationshipType ("relationship_type") {
        /// Source needs target to function.
        DependsOn => "DEPENDS_ON",
        /// Source runs on target.
        RunsOn => "RUNS_ON",
        /// Source hosts target.
        Hosts => "HOSTS",
        /// Source is hosted on target.
        HostedOn => "HOSTED_ON",
        /// Network connectivity.
        ConnectsTo => "CONNECTS_TO",
        /// Source is installed on target.
        InstalledOn => "INSTALLED_ON",
        /// Source uses target.
        Uses => "USES",
        /// Source produces target data.
        Produces => "PRODUCES",
        /// Source consumes target data.
        Consumes => "CONSUMES",
        /// Source processes target data.
        Processes => "PROCESSES",
        /// Source stores target data.
        Stores => "STORES",
        /// Ownership.
        Owns => "OWNS",
        /// RACI: responsible.
        ResponsibleFor => "RESPONSIBLE_FOR",
        /// RACI: accountable.
        AccountableFor => "ACCOUNTABLE_FOR",
        /// RACI: consulted.
        ConsultedFor => "CONSULTED_FOR",
        /// RACI: informed.
        InformedFor => "INFORMED_FOR",
        /// Group membership.
        MemberOf => "MEMBER_OF",
        /// Role assignment.
        HasRole => "HAS_ROLE",
        /// Skill assignment.
        HasSkill => "HAS_SKILL",
        /// Governed by a policy or body.
        GovernedBy => "GOVERNED_BY",
        /// Subject to a regulation.
        SubjectTo => "SUBJECT_TO",
        /// Complies with a standard.
        CompliesWith => "COMPLIES_WITH",
        /// Control protects an asset.
        Protects => "PROTECTS",
        /// Policy covers an asset.
        Covers => "COVERS",
        /// Outsourced to a vendor.
        OutsourcedTo => "OUTSOURCED_TO",
        /// Provided by a vendor.
        ProvidedBy => "PROVIDED_BY",
        /// Covered by a contract or policy.
        CoveredBy => "COVERED_BY",
        /// Under contract with a party.
        ContractedWith => "CONTRACTED_WITH",
        /// Documents the target.
        Documents => "DOCUMENTS",
        /// Person knows the target.
        Knows => "KNOWS",
        /// References the target.
        References => "REFERENCES",
        /// Untyped association.
        RelatedTo => "RELATED_TO",
    }
}

impl RelationshipType {
    /// Whether the relationship reads the same in both directions.
    #[must_use]
    pub const fn is_bidirectional(self) -> bool {
        matches!(self, Self::ConnectsTo | Self::RelatedTo | Self::MemberOf)
    }
}

wire_enum! {
    /// Strength of a relationship.
    RelationshipStrength ("strength") {
        /// Weak.
        Weak => "WEAK",
        /// Medium.
        Medium => "MEDIUM",
        /// Strong.
        Strong => "STRONG",
        /// Critical.
        Critical => "CRITICAL",
    }
}

impl Default for RelationshipStrength {
    fn default() -> Self {
        Self::Medium
    }
}

wire_enum! {
    /// Edge direction relative to a given CI.
    Direction ("direction") {
        /// Edges pointing at the CI.
        Incoming => "incoming",
        /// Edges leaving the CI.
        Outgoing => "outgoing",
        /// Both.
        Both => "both",
    }
}

impl Default for Direction {
    fn default() -> Self {
        Self::Both
    }
}

impl Direction {
    /// Whether outgoing edges are included.
    #[must_use]
    pub const fn includes_outgoing(self) -> bool {
        matches!(self, Self::Outgoing | Self::Both)
    }

    /// Whether incoming edges are included.
    #[must_use]
    pub const fn includes_incoming(self) -> bool {
        matches!(self, Self::Incoming | Self::Both)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::upper("HIGH", Criticality::High)]
    #[case::lower("critical", Criticality::Critical)]
    #[case::padded("  low ", Criticality::Low)]
    fn criticality_parses_case_insensitively(#[case] input: &str, #[case] expected: Criticality) {
        assert_eq!(input.parse::<Criticality>().unwrap(), expected);
    }

    #[test]
    fn unknown_value_is_rejected() {
        let err = "SERVER".parse::<CiType>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidEnumValue {
                field: "ci_type",
                value: "SERVER".to_string()
            }
        );
    }

    #[test]
    fn criticality_orders_low_to_critical() {
        let mut levels = vec![
            Criticality::Critical,
            Criticality::Low,
            Criticality::High,
            Criticality::Medium,
        ];
        levels.sort();
        assert_eq!(levels, Criticality::ALL);
    }

    #[test]
    fn defaults_match_documented_values() {
        assert_eq!(CiType::default(), CiType::Generic);
        assert_eq!(Criticality::default(), Criticality::Medium);
        assert_eq!(Environment::default(), Environment::Prod);
        assert_eq!(LifecycleState::default(), LifecycleState::Active);
        assert_eq!(RelationshipStrength::default(), RelationshipStrength::Medium);
    }

    #[test]
    fn every_wire_name_round_trips_through_from_str() {
        for t in RelationshipType::ALL {
            assert_eq!(t.as_str().parse::<RelationshipType>().unwrap(), *t);
        }
        assert_eq!(RelationshipType::ALL.len(), 32);
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&RelationshipType::HostedOn).unwrap(),
            "\"HOSTED_ON\""
        );
        assert_eq!(
            serde_json::from_str::<Environment>("\"STAGING\"").unwrap(),
            Environment::Staging
        );
        assert_eq!(serde_json::to_string(&Direction::Incoming).unwrap(), "\"incoming\"");
    }

    #[rstest]
    #[case::connects(RelationshipType::ConnectsTo, true)]
    #[case::related(RelationshipType::RelatedTo, true)]
    #[case::member(RelationshipType::MemberOf, true)]
    #[case::depends(RelationshipType::DependsOn, false)]
    #[case::hosted(RelationshipType::HostedOn, false)]
    fn bidirectional_types(#[case] t: RelationshipType, #[case] expected: bool) {
        assert_eq!(t.is_bidirectional(), expected);
    }
}
