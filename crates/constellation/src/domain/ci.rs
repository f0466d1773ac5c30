//! Configuration item types.

use super::{
    char_len, CiId, CiType, Criticality, Environment, LifecycleState, RiskAssessment,
    MAX_CI_DESCRIPTION_LENGTH, MAX_NAME_LENGTH,
};
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A configuration item: one node of the asset graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ci {
    /// Unique identifier, immutable after creation.
    pub id: CiId,

    /// Display name (1-255 characters).
    pub name: String,

    /// Free-text description (at most 1000 characters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Kind of asset.
    #[serde(default)]
    pub ci_type: CiType,

    /// Business criticality.
    #[serde(default)]
    pub criticality: Criticality,

    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,

    /// Lifecycle stage.
    #[serde(default)]
    pub lifecycle_state: LifecycleState,

    /// Host name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    /// Fully qualified domain name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,

    /// Vendor or manufacturer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,

    /// Model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Serial number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,

    /// Asset tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_tag: Option<String>,

    /// Physical or logical location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Rack position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rack_position: Option<String>,

    /// Free-form operational status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Owning person or team.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Cost center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_center: Option<String>,

    /// Compliance framework tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compliance_tags: Vec<String>,

    /// Whether monitoring is enabled.
    #[serde(default = "default_true")]
    pub monitoring_enabled: bool,

    /// Whether backups are enabled.
    #[serde(default)]
    pub backup_enabled: bool,

    /// Open attribute map.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom_attributes: Map<String, Value>,

    /// Risk likelihood and impact scores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<RiskAssessment>,

    /// Creation time.
    pub created_at: DateTime<Utc>,

    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// Input for creating a CI.
///
/// `id` may be supplied by the caller; a UUID v4 is generated otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct NewCi {
    pub id: Option<CiId>,
    pub name: String,
    pub description: Option<String>,
    pub ci_type: CiType,
    pub criticality: Criticality,
    pub environment: Environment,
    pub lifecycle_state: LifecycleState,
    pub hostname: Option<String>,
    pub ip_address: Option<String>,
    pub fqdn: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub asset_tag: Option<String>,
    pub location: Option<String>,
    pub rack_position: Option<String>,
    pub status: Option<String>,
    pub owner: Option<String>,
    pub cost_center: Option<String>,
    pub compliance_tags: Vec<String>,
    pub monitoring_enabled: bool,
    pub backup_enabled: bool,
    pub custom_attributes: Map<String, Value>,
    pub risk_assessment: Option<RiskAssessment>,
}

impl Default for NewCi {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: None,
            ci_type: CiType::default(),
            criticality: Criticality::default(),
            environment: Environment::default(),
            lifecycle_state: LifecycleState::default(),
            hostname: None,
            ip_address: None,
            fqdn: None,
            vendor: None,
            model: None,
            serial_number: None,
            asset_tag: None,
            location: None,
            rack_position: None,
            status: None,
            owner: None,
            cost_center: None,
            compliance_tags: Vec::new(),
            monitoring_enabled: true,
            backup_enabled: false,
            custom_attributes: Map::new(),
            risk_assessment: None,
        }
    }
}

impl NewCi {
    /// A new CI with the given name and all other fields defaulted.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the CI type.
    #[must_use]
    pub fn with_type(mut self, ci_type: CiType) -> Self {
        self.ci_type = ci_type;
        self
    }

    /// Set the criticality.
    #[must_use]
    pub fn with_criticality(mut self, criticality: Criticality) -> Self {
        self.criticality = criticality;
        self
    }

    /// Check name, description and risk score limits.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_description(self.description.as_deref())?;
        if let Some(id) = &self.id {
            if id.as_str().trim().is_empty() {
                return Err(ValidationError::Empty { field: "id" });
            }
        }
        validate_risk(self.risk_assessment.as_ref())
    }

    /// Build the stored CI, generating an id if none was supplied.
    ///
    /// `created_at` and `updated_at` are both set to `now`.
    #[must_use]
    pub fn into_ci(self, now: DateTime<Utc>) -> Ci {
        Ci {
            id: self.id.unwrap_or_else(CiId::generate),
            name: self.name,
            description: self.description,
            ci_type: self.ci_type,
            criticality: self.criticality,
            environment: self.environment,
            lifecycle_state: self.lifecycle_state,
            hostname: self.hostname,
            ip_address: self.ip_address,
            fqdn: self.fqdn,
            vendor: self.vendor,
            model: self.model,
            serial_number: self.serial_number,
            asset_tag: self.asset_tag,
            location: self.location,
            rack_position: self.rack_position,
            status: self.status,
            owner: self.owner,
            cost_center: self.cost_center,
            compliance_tags: self.compliance_tags,
            monitoring_enabled: self.monitoring_enabled,
            backup_enabled: self.backup_enabled,
            custom_attributes: self.custom_attributes,
            risk_assessment: self.risk_assessment,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Ci {
    /// Check the invariants a stored CI must satisfy.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ValidationError::Empty { field: "id" });
        }
        validate_name(&self.name)?;
        validate_description(self.description.as_deref())?;
        validate_risk(self.risk_assessment.as_ref())
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Empty { field: "name" });
    }
    let len = char_len(name);
    if len > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name",
            max: MAX_NAME_LENGTH,
            actual: len,
        });
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), ValidationError> {
    match description.map(char_len) {
        Some(len) if len > MAX_CI_DESCRIPTION_LENGTH => Err(ValidationError::TooLong {
            field: "description",
            max: MAX_CI_DESCRIPTION_LENGTH,
            actual: len,
        }),
        _ => Ok(()),
    }
}

fn validate_risk(risk: Option<&RiskAssessment>) -> Result<(), ValidationError> {
    risk.map_or(Ok(()), RiskAssessment::validate)
}

/// Fields that can never appear in an update payload.
pub const IMMUTABLE_CI_FIELDS: &[&str] = &["id", "created_at", "updated_at"];

/// Updatable CI fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum CiField {
    Name,
    Description,
    CiType,
    Criticality,
    Environment,
    LifecycleState,
    Hostname,
    IpAddress,
    Fqdn,
    Vendor,
    Model,
    SerialNumber,
    AssetTag,
    Location,
    RackPosition,
    Status,
    Owner,
    CostCenter,
    ComplianceTags,
    MonitoringEnabled,
    BackupEnabled,
    CustomAttributes,
    RiskAssessment,
}

impl CiField {
    /// The complete allowlist.
    pub const ALL: &'static [Self] = &[
        Self::Name,
        Self::Description,
        Self::CiType,
        Self::Criticality,
        Self::Environment,
        Self::LifecycleState,
        Self::Hostname,
        Self::IpAddress,
        Self::Fqdn,
        Self::Vendor,
        Self::Model,
        Self::SerialNumber,
        Self::AssetTag,
        Self::Location,
        Self::RackPosition,
        Self::Status,
        Self::Owner,
        Self::CostCenter,
        Self::ComplianceTags,
        Self::MonitoringEnabled,
        Self::BackupEnabled,
        Self::CustomAttributes,
        Self::RiskAssessment,
    ];

    /// The payload key for this field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::CiType => "ci_type",
            Self::Criticality => "criticality",
            Self::Environment => "environment",
            Self::LifecycleState => "lifecycle_state",
            Self::Hostname => "hostname",
            Self::IpAddress => "ip_address",
            Self::Fqdn => "fqdn",
            Self::Vendor => "vendor",
            Self::Model => "model",
            Self::SerialNumber => "serial_number",
            Self::AssetTag => "asset_tag",
            Self::Location => "location",
            Self::RackPosition => "rack_position",
            Self::Status => "status",
            Self::Owner => "owner",
            Self::CostCenter => "cost_center",
            Self::ComplianceTags => "compliance_tags",
            Self::MonitoringEnabled => "monitoring_enabled",
            Self::BackupEnabled => "backup_enabled",
            Self::CustomAttributes => "custom_attributes",
            Self::RiskAssessment => "risk_assessment",
        }
    }

    /// Look up a payload key, exact match only.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == key)
    }
}

/// A partial CI update.
///
/// `None` leaves a field alone. For nullable text fields, `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(missing_docs)]
pub struct CiUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub ci_type: Option<CiType>,
    pub criticality: Option<Criticality>,
    pub environment: Option<Environment>,
    pub lifecycle_state: Option<LifecycleState>,
    pub hostname: Option<Option<String>>,
    pub ip_address: Option<Option<String>>,
    pub fqdn: Option<Option<String>>,
    pub vendor: Option<Option<String>>,
    pub model: Option<Option<String>>,
    pub serial_number: Option<Option<String>>,
    pub asset_tag: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub rack_position: Option<Option<String>>,
    pub status: Option<Option<String>>,
    pub owner: Option<Option<String>>,
    pub cost_center: Option<Option<String>>,
    pub compliance_tags: Option<Vec<String>>,
    pub monitoring_enabled: Option<bool>,
    pub backup_enabled: Option<bool>,
    pub custom_attributes: Option<Map<String, Value>>,
    pub risk_assessment: Option<Option<RiskAssessment>>,
}

fn decode<T: DeserializeOwned>(field: CiField, value: &Value) -> Result<T, ValidationError> {
    serde_json::from_value(value.clone()).map_err(|e| ValidationError::InvalidFieldValue {
        field: field.as_str().to_string(),
        reason: e.to_string(),
    })
}

impl CiUpdate {
    /// Build an update from a dynamic JSON object.
    ///
    /// Every key is checked against [`CiField`] before anything is decoded.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::NotAnObject`] if `payload` is not an object
    /// - [`ValidationError::EmptyUpdate`] if the object has no keys
    /// - [`ValidationError::ImmutableField`] for `id`, `created_at`, `updated_at`
    /// - [`ValidationError::UnknownField`] for keys outside the allowlist
    /// - [`ValidationError::InvalidFieldValue`] if a value has the wrong shape
    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let object = payload.as_object().ok_or(ValidationError::NotAnObject)?;
        if object.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }

        let mut fields = Vec::with_capacity(object.len());
        for (key, value) in object {
            if IMMUTABLE_CI_FIELDS.contains(&key.as_str()) {
                return Err(ValidationError::ImmutableField(key.clone()));
            }
            let field =
                CiField::from_key(key).ok_or_else(|| ValidationError::UnknownField(key.clone()))?;
            fields.push((field, value));
        }

        let mut update = Self::default();
        for (field, value) in fields {
            update.set(field, value)?;
        }
        Ok(update)
    }

    fn set(&mut self, field: CiField, value: &Value) -> Result<(), ValidationError> {
        match field {
            CiField::Name => self.name = Some(decode(field, value)?),
            CiField::Description => self.description = Some(decode(field, value)?),
            CiField::CiType => self.ci_type = Some(decode(field, value)?),
            CiField::Criticality => self.criticality = Some(decode(field, value)?),
            CiField::Environment => self.environment = Some(decode(field, value)?),
            CiField::LifecycleState => self.lifecycle_state = Some(decode(field, value)?),
            CiField::Hostname => self.hostname = Some(decode(field, value)?),
            CiField::IpAddress => self.ip_address = Some(decode(field, value)?),
            CiField::Fqdn => self.fqdn = Some(decode(field, value)?),
            CiField::Vendor => self.vendor = Some(decode(field, value)?),
            CiField::Model => self.model = Some(decode(field, value)?),
            CiField::SerialNumber => self.serial_number = Some(decode(field, value)?),
            CiField::AssetTag => self.asset_tag = Some(decode(field, value)?),
            CiField::Location => self.location = Some(decode(field, value)?),
            CiField::RackPosition => self.rack_position = Some(decode(field, value)?),
            CiField::Status => self.status = Some(decode(field, value)?),
            CiField::Owner => self.owner = Some(decode(field, value)?),
            CiField::CostCenter => self.cost_center = Some(decode(field, value)?),
            CiField::ComplianceTags => self.compliance_tags = Some(decode(field, value)?),
            CiField::MonitoringEnabled => self.monitoring_enabled = Some(decode(field, value)?),
            CiField::BackupEnabled => self.backup_enabled = Some(decode(field, value)?),
            CiField::CustomAttributes => self.custom_attributes = Some(decode(field, value)?),
            CiField::RiskAssessment => self.risk_assessment = Some(decode(field, value)?),
        }
        Ok(())
    }

    /// The fields this update touches, in allowlist order.
    #[must_use]
    pub fn fields(&self) -> Vec<CiField> {
        CiField::ALL
            .iter()
            .copied()
            .filter(|f| self.touches(*f))
            .collect()
    }

    fn touches(&self, field: CiField) -> bool {
        match field {
            CiField::Name => self.name.is_some(),
            CiField::Description => self.description.is_some(),
            CiField::CiType => self.ci_type.is_some(),
            CiField::Criticality => self.criticality.is_some(),
            CiField::Environment => self.environment.is_some(),
            CiField::LifecycleState => self.lifecycle_state.is_some(),
            CiField::Hostname => self.hostname.is_some(),
            CiField::IpAddress => self.ip_address.is_some(),
            CiField::Fqdn => self.fqdn.is_some(),
            CiField::Vendor => self.vendor.is_some(),
            CiField::Model => self.model.is_some(),
            CiField::SerialNumber => self.serial_number.is_some(),
            CiField::AssetTag => self.asset_tag.is_some(),
            CiField::Location => self.location.is_some(),
            CiField::RackPosition => self.rack_position.is_some(),
            CiField::Status => self.status.is_some(),
            CiField::Owner => self.owner.is_some(),
            CiField::CostCenter => self.cost_center.is_some(),
            CiField::ComplianceTags => self.compliance_tags.is_some(),
            CiField::MonitoringEnabled => self.monitoring_enabled.is_some(),
            CiField::BackupEnabled => self.backup_enabled.is_some(),
            CiField::CustomAttributes => self.custom_attributes.is_some(),
            CiField::RiskAssessment => self.risk_assessment.is_some(),
        }
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Check the supplied values against CI limits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyUpdate`] if nothing is set, or the
    /// first violated field constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_description(description.as_deref())?;
        }
        if let Some(risk) = &self.risk_assessment {
            validate_risk(risk.as_ref())?;
        }
        Ok(())
    }

    /// Apply the supplied fields to `ci` and stamp `updated_at`.
    pub fn apply(&self, ci: &mut Ci, now: DateTime<Utc>) {
        fn set<T: Clone>(target: &mut T, value: Option<&T>) {
            if let Some(v) = value {
                target.clone_from(v);
            }
        }

        set(&mut ci.name, self.name.as_ref());
        set(&mut ci.description, self.description.as_ref());
        set(&mut ci.ci_type, self.ci_type.as_ref());
        set(&mut ci.criticality, self.criticality.as_ref());
        set(&mut ci.environment, self.environment.as_ref());
        set(&mut ci.lifecycle_state, self.lifecycle_state.as_ref());
        set(&mut ci.hostname, self.hostname.as_ref());
        set(&mut ci.ip_address, self.ip_address.as_ref());
        set(&mut ci.fqdn, self.fqdn.as_ref());
        set(&mut ci.vendor, self.vendor.as_ref());
        set(&mut ci.model, self.model.as_ref());
        set(&mut ci.serial_number, self.serial_number.as_ref());
        set(&mut ci.asset_tag, self.asset_tag.as_ref());
        set(&mut ci.location, self.location.as_ref());
        set(&mut ci.rack_position, self.rack_position.as_ref());
        set(&mut ci.status, self.status.as_ref());
        set(&mut ci.owner, self.owner.as_ref());
        set(&mut ci.cost_center, self.cost_center.as_ref());
        set(&mut ci.compliance_tags, self.compliance_tags.as_ref());
        set(&mut ci.monitoring_enabled, self.monitoring_enabled.as_ref());
        set(&mut ci.backup_enabled, self.backup_enabled.as_ref());
        set(&mut ci.custom_attributes, self.custom_attributes.as_ref());
        set(&mut ci.risk_assessment, self.risk_assessment.as_ref());
        ci.updated_at = now;
    }
}

/// Exact-match filter over enumerated CI fields. Unset fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct CiFilter {
    pub ci_type: Option<CiType>,
    pub environment: Option<Environment>,
    pub criticality: Option<Criticality>,
}

impl CiFilter {
    /// Whether `ci` satisfies every set condition.
    #[must_use]
    pub fn matches(&self, ci: &Ci) -> bool {
        self.ci_type.is_none_or(|t| ci.ci_type == t)
            && self.environment.is_none_or(|e| ci.environment == e)
            && self.criticality.is_none_or(|c| ci.criticality == c)
    }
}

/// One page of a CI listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CiPage {
    /// CIs on this page, ordered by name then id.
    pub items: Vec<Ci>,
    /// Number of CIs matching the filter across all pages.
    pub total_count: usize,
    /// Requested page size.
    pub limit: usize,
    /// Requested offset.
    pub offset: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn sample_ci() -> Ci {
        NewCi::new("web-01").into_ci(Utc::now())
    }

    #[test]
    fn into_ci_generates_id_and_equal_timestamps() {
        let ci = sample_ci();
        assert!(!ci.id.as_str().is_empty());
        assert_eq!(ci.created_at, ci.updated_at);
        assert!(ci.monitoring_enabled);
        assert!(!ci.backup_enabled);
    }

    #[test]
    fn into_ci_keeps_supplied_id() {
        let mut new = NewCi::new("db");
        new.id = Some(CiId::new("db-1"));
        assert_eq!(new.into_ci(Utc::now()).id, CiId::new("db-1"));
    }

    #[rstest]
    #[case::empty("", false)]
    #[case::whitespace("   ", false)]
    #[case::one_char("a", true)]
    #[case::max_len(&"x".repeat(255), true)]
    #[case::too_long(&"x".repeat(256), false)]
    fn name_limits(#[case] name: &str, #[case] ok: bool) {
        assert_eq!(NewCi::new(name).validate().is_ok(), ok);
    }

    #[test]
    fn description_limit_is_1000_chars() {
        let mut new = NewCi::new("svc");
        new.description = Some("d".repeat(1000));
        assert!(new.validate().is_ok());
        new.description = Some("d".repeat(1001));
        assert!(matches!(
            new.validate(),
            Err(ValidationError::TooLong {
                field: "description",
                ..
            })
        ));
    }

    #[rstest]
    #[case::id("id")]
    #[case::created("created_at")]
    #[case::updated("updated_at")]
    fn immutable_fields_are_rejected(#[case] key: &str) {
        let payload = json!({ key: "x" });
        assert_eq!(
            CiUpdate::from_json(&payload),
            Err(ValidationError::ImmutableField(key.to_string()))
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let payload = json!({ "name": "ok", "favourite_colour": "blue" });
        assert_eq!(
            CiUpdate::from_json(&payload),
            Err(ValidationError::UnknownField("favourite_colour".to_string()))
        );
    }

    #[test]
    fn empty_and_non_object_payloads_are_rejected() {
        assert_eq!(
            CiUpdate::from_json(&json!({})),
            Err(ValidationError::EmptyUpdate)
        );
        assert_eq!(
            CiUpdate::from_json(&json!(["name"])),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn bad_enum_value_is_invalid_field_value() {
        let err = CiUpdate::from_json(&json!({ "criticality": "EXTREME" })).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFieldValue { field, .. } if field == "criticality"));
    }

    #[test]
    fn json_update_applies_only_supplied_fields() {
        let mut ci = sample_ci();
        ci.hostname = Some("old.example.com".to_string());
        let update = CiUpdate::from_json(&json!({
            "criticality": "HIGH",
            "hostname": null,
            "custom_attributes": { "rack": "B4" }
        }))
        .unwrap();
        assert_eq!(
            update.fields(),
            vec![
                CiField::Criticality,
                CiField::Hostname,
                CiField::CustomAttributes
            ]
        );

        let later = ci.created_at + chrono::Duration::seconds(5);
        update.apply(&mut ci, later);

        assert_eq!(ci.name, "web-01");
        assert_eq!(ci.criticality, Criticality::High);
        assert_eq!(ci.hostname, None);
        assert_eq!(ci.custom_attributes["rack"], json!("B4"));
        assert_eq!(ci.updated_at, later);
        assert!(ci.updated_at > ci.created_at);
    }

    #[test]
    fn update_validate_checks_name() {
        let update = CiUpdate {
            name: Some(String::new()),
            ..CiUpdate::default()
        };
        assert_eq!(
            update.validate(),
            Err(ValidationError::Empty { field: "name" })
        );
        assert_eq!(
            CiUpdate::default().validate(),
            Err(ValidationError::EmptyUpdate)
        );
    }

    #[rstest]
    #[case::likelihood_too_high(json!({ "likelihood": 6, "impact": 3 }), "likelihood")]
    #[case::impact_zero(json!({ "likelihood": 2, "impact": 0 }), "impact")]
    #[case::residual(json!({ "likelihood": 2, "impact": 2, "residual_likelihood": 7 }), "residual_likelihood")]
    fn risk_scores_outside_one_to_five_are_rejected(#[case] risk: Value, #[case] bad: &str) {
        let update = CiUpdate::from_json(&json!({ "risk_assessment": risk })).unwrap();
        assert!(matches!(
            update.validate(),
            Err(ValidationError::ScoreOutOfRange { field, .. }) if field == bad
        ));
    }

    #[test]
    fn risk_assessment_can_be_set_and_cleared() {
        let mut ci = sample_ci();
        let set = CiUpdate::from_json(&json!({
            "risk_assessment": { "likelihood": 4, "impact": 5 }
        }))
        .unwrap();
        set.validate().unwrap();
        set.apply(&mut ci, Utc::now());
        assert_eq!(ci.risk_assessment.map(|r| r.score()), Some(20));

        let clear = CiUpdate::from_json(&json!({ "risk_assessment": null })).unwrap();
        assert_eq!(clear.fields(), vec![CiField::RiskAssessment]);
        clear.apply(&mut ci, Utc::now());
        assert_eq!(ci.risk_assessment, None);
    }

    #[test]
    fn new_ci_with_bad_risk_is_rejected() {
        let mut new = NewCi::new("payments");
        new.risk_assessment = Some(RiskAssessment::new(3, 6));
        assert!(matches!(
            new.validate(),
            Err(ValidationError::ScoreOutOfRange { field: "impact", .. })
        ));
    }

    #[test]
    fn filter_is_a_conjunction() {
        let mut ci = sample_ci();
        ci.criticality = Criticality::High;
        ci.ci_type = CiType::Database;

        let both = CiFilter {
            ci_type: Some(CiType::Database),
            criticality: Some(Criticality::High),
            ..CiFilter::default()
        };
        let mismatch = CiFilter {
            criticality: Some(Criticality::Low),
            ..both
        };

        assert!(CiFilter::default().matches(&ci));
        assert!(both.matches(&ci));
        assert!(!mismatch.matches(&ci));
    }

    #[test]
    fn stored_ci_deserializes_with_defaults() {
        let ci: Ci = serde_json::from_value(json!({
            "id": "x",
            "name": "minimal",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(ci.ci_type, CiType::Generic);
        assert_eq!(ci.environment, Environment::Prod);
        assert!(ci.monitoring_enabled);
    }
}
