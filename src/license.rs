use std::convert::TryFrom;

use log::{warn, Logger};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{Date, PrimitiveDateTime, Time};

use crate::errors::BackendError;
use crate::i18n::Translate;

pub mod builtin;
pub mod register;

pub use register::LicenseRegister;

const DATE_CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Review status against the Open Definition (`od_conformance`) or the Open
/// Source Definition (`osd_conformance`).
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Conformance {
    #[serde(rename = "approved")]
    Approved,

    #[serde(rename = "not reviewed")]
    NotReviewed,

    /// Review status withheld. This is also what the legacy compliance flags
    /// normalize to when they are false.
    #[serde(rename = "")]
    Unspecified,
}

impl Conformance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Conformance::Approved => "approved",
            Conformance::NotReviewed => "not reviewed",
            Conformance::Unspecified => "",
        }
    }

    pub fn approved(&self) -> bool {
        matches!(self, Conformance::Approved)
    }
}

impl Default for Conformance {
    fn default() -> Self {
        Conformance::Unspecified
    }
}

/// A raw license descriptor, as found in an external JSON document or the
/// built-in list, before normalization.
#[derive(Clone, Debug, Deserialize)]
pub struct LicenseDescriptor {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub domain_content: bool,

    #[serde(default)]
    pub domain_data: bool,

    #[serde(default)]
    pub domain_software: bool,

    #[serde(default)]
    pub family: String,

    #[serde(default)]
    pub is_generic: bool,

    #[serde(default)]
    pub od_conformance: Conformance,

    #[serde(default)]
    pub osd_conformance: Conformance,

    #[serde(default)]
    pub maintainer: String,

    #[serde(default = "default_status")]
    pub status: String,

    /// Creation date-time as text, parsed during normalization.
    #[serde(default)]
    pub date_created: Option<String>,

    /// Legacy compliance flag, folded into `od_conformance` during
    /// normalization. Boolean, string and numeric forms are accepted.
    #[serde(default)]
    pub is_okd_compliant: Option<Value>,

    /// Legacy compliance flag, folded into `osd_conformance` during
    /// normalization.
    #[serde(default)]
    pub is_osi_compliant: Option<Value>,

    /// Keys outside the canonical field set, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for LicenseDescriptor {
    fn default() -> Self {
        LicenseDescriptor {
            id: String::new(),
            title: String::new(),
            url: String::new(),
            domain_content: false,
            domain_data: false,
            domain_software: false,
            family: String::new(),
            is_generic: false,
            od_conformance: Conformance::default(),
            osd_conformance: Conformance::default(),
            maintainer: String::new(),
            status: default_status(),
            date_created: None,
            is_okd_compliant: None,
            is_osi_compliant: None,
            extra: Map::new(),
        }
    }
}

fn default_status() -> String {
    "active".to_string()
}

/// A normalized license record.
#[derive(Clone, Debug, PartialEq)]
pub struct License {
    /// Stable identifier, unique within a register.
    pub id: String,

    /// Human-readable title, already translated.
    pub title: String,

    /// Reference URL. May be empty.
    pub url: String,

    pub domain_content: bool,
    pub domain_data: bool,
    pub domain_software: bool,

    pub family: String,
    pub is_generic: bool,

    pub od_conformance: Conformance,
    pub osd_conformance: Conformance,

    pub maintainer: String,
    pub status: String,

    pub date_created: Option<PrimitiveDateTime>,

    /// Descriptor keys outside the canonical field set.
    extra: Map<String, Value>,
}

impl License {
    /// Normalizes a descriptor into a record: folds the legacy compliance
    /// flags into the conformance fields, parses `date_created` and runs a
    /// non-empty title through the translator.
    pub fn new(descriptor: LicenseDescriptor, translator: &dyn Translate) -> Result<Self, BackendError> {
        let od_conformance = match descriptor.is_okd_compliant {
            Some(flag) => normalize_legacy_flag("is_okd_compliant", &flag)?,
            None => descriptor.od_conformance,
        };
        let osd_conformance = match descriptor.is_osi_compliant {
            Some(flag) => normalize_legacy_flag("is_osi_compliant", &flag)?,
            None => descriptor.osd_conformance,
        };

        let date_created = match descriptor.date_created {
            Some(value) => Some(parse_date_created(&value)?),
            None => None,
        };

        let title = if descriptor.title.is_empty() {
            descriptor.title
        } else {
            translator.translate(&descriptor.title)
        };

        Ok(License {
            id: descriptor.id,
            title,
            url: descriptor.url,
            domain_content: descriptor.domain_content,
            domain_data: descriptor.domain_data,
            domain_software: descriptor.domain_software,
            family: descriptor.family,
            is_generic: descriptor.is_generic,
            od_conformance,
            osd_conformance,
            maintainer: descriptor.maintainer,
            status: descriptor.status,
            date_created,
            extra: descriptor.extra,
        })
    }

    /// Whether the license is open: either conformance field is approved.
    pub fn is_open(&self) -> bool {
        self.od_conformance.approved() || self.osd_conformance.approved()
    }

    /// Looks up a field by name.
    ///
    /// Canonical fields return their current value, the deprecated compliance
    /// names return the bool derived from the conformance fields (with a
    /// warning), and preserved descriptor keys are served from the backing
    /// map. Anything else is an error, so presence checks behave correctly.
    pub fn field(&self, name: &str, logger: &Logger) -> Result<Value, BackendError> {
        match name {
            "id" => Ok(Value::String(self.id.clone())),
            "title" => Ok(Value::String(self.title.clone())),
            "url" => Ok(Value::String(self.url.clone())),
            "domain_content" => Ok(Value::Bool(self.domain_content)),
            "domain_data" => Ok(Value::Bool(self.domain_data)),
            "domain_software" => Ok(Value::Bool(self.domain_software)),
            "family" => Ok(Value::String(self.family.clone())),
            "is_generic" => Ok(Value::Bool(self.is_generic)),
            "od_conformance" => Ok(Value::String(self.od_conformance.as_str().to_string())),
            "osd_conformance" => Ok(Value::String(self.osd_conformance.as_str().to_string())),
            "maintainer" => Ok(Value::String(self.maintainer.clone())),
            "status" => Ok(Value::String(self.status.clone())),
            "date_created" => Ok(self
                .date_created
                .map(|date| Value::String(date.format(DATE_CREATED_FORMAT)))
                .unwrap_or(Value::Null)),
            "is_okd_compliant" => Ok(Value::Bool(self.is_okd_compliant(logger))),
            "is_osi_compliant" => Ok(Value::Bool(self.is_osi_compliant(logger))),
            _ => self
                .extra
                .get(name)
                .cloned()
                .ok_or_else(|| self.unknown_field(name)),
        }
    }

    /// Deprecated view of `od_conformance` kept for old callers.
    pub fn is_okd_compliant(&self, logger: &Logger) -> bool {
        warn!(
            logger,
            "license.is_okd_compliant is deprecated - use od_conformance instead"
        );
        self.od_conformance.approved()
    }

    /// Deprecated view of `osd_conformance` kept for old callers.
    pub fn is_osi_compliant(&self, logger: &Logger) -> bool {
        warn!(
            logger,
            "license.is_osi_compliant is deprecated - use osd_conformance instead"
        );
        self.osd_conformance.approved()
    }

    /// Deprecated dictionary-style accessor kept for old callers; prefer
    /// [`License::field`] or the typed fields.
    pub fn item(&self, key: &str, logger: &Logger) -> Result<Value, BackendError> {
        warn!(logger, "License::item is deprecated - use field access instead");
        self.field(key, logger)
    }

    /// Deprecated plain-mapping export kept for old callers.
    ///
    /// Serializes `date_created` to its ISO text form and re-expands the
    /// deprecated compliance bools alongside the conformance fields.
    pub fn to_mapping(&self, logger: &Logger) -> Map<String, Value> {
        warn!(
            logger,
            "License::to_mapping is deprecated - use field access instead"
        );

        let mut data = Map::new();
        data.insert("id".to_string(), Value::String(self.id.clone()));
        data.insert("title".to_string(), Value::String(self.title.clone()));
        data.insert("url".to_string(), Value::String(self.url.clone()));
        data.insert(
            "domain_content".to_string(),
            Value::Bool(self.domain_content),
        );
        data.insert("domain_data".to_string(), Value::Bool(self.domain_data));
        data.insert(
            "domain_software".to_string(),
            Value::Bool(self.domain_software),
        );
        data.insert("family".to_string(), Value::String(self.family.clone()));
        data.insert("is_generic".to_string(), Value::Bool(self.is_generic));
        data.insert(
            "od_conformance".to_string(),
            Value::String(self.od_conformance.as_str().to_string()),
        );
        data.insert(
            "osd_conformance".to_string(),
            Value::String(self.osd_conformance.as_str().to_string()),
        );
        data.insert(
            "maintainer".to_string(),
            Value::String(self.maintainer.clone()),
        );
        data.insert("status".to_string(), Value::String(self.status.clone()));

        if let Some(date) = self.date_created {
            data.insert(
                "date_created".to_string(),
                Value::String(date.format(DATE_CREATED_FORMAT)),
            );
        }

        for (key, value) in &self.extra {
            data.insert(key.clone(), value.clone());
        }

        data.insert(
            "is_okd_compliant".to_string(),
            Value::Bool(self.od_conformance.approved()),
        );
        data.insert(
            "is_osi_compliant".to_string(),
            Value::Bool(self.osd_conformance.approved()),
        );

        data
    }

    /// The preserved descriptor keys outside the canonical field set.
    pub fn extras(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn unknown_field(&self, name: &str) -> BackendError {
        BackendError::UnknownLicenseField {
            id: self.id.clone(),
            field: name.to_string(),
        }
    }
}

fn normalize_legacy_flag(field: &'static str, flag: &Value) -> Result<Conformance, BackendError> {
    Ok(if coerce_bool(field, flag)? {
        Conformance::Approved
    } else {
        Conformance::Unspecified
    })
}

/// Reads a boolean out of the forms the legacy flags appear in: JSON bools,
/// the usual true/false words and 0/1 numbers.
fn coerce_bool(field: &'static str, value: &Value) -> Result<bool, BackendError> {
    let invalid = || BackendError::InvalidBooleanFlag {
        field,
        value: value.to_string(),
    };

    match value {
        Value::Bool(truth) => Ok(*truth),
        Value::Number(number) => Ok(number.as_f64().map(|n| n != 0.0).unwrap_or(false)),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "y" | "t" | "1" => Ok(true),
            "false" | "no" | "off" | "n" | "f" | "0" => Ok(false),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

/// Parses a `date_created` value by splitting it on non-digit separators
/// into (year, month, day[, hour, minute, second]).
fn parse_date_created(value: &str) -> Result<PrimitiveDateTime, BackendError> {
    let invalid = || BackendError::InvalidDateCreated {
        value: value.to_string(),
    };

    let mut parts = Vec::new();

    for piece in value.split(|c: char| !c.is_ascii_digit()) {
        if piece.is_empty() {
            return Err(invalid());
        }

        parts.push(piece.parse::<u32>().map_err(|_| invalid())?);
    }

    if parts.len() < 3 || parts.len() > 6 {
        return Err(invalid());
    }

    parts.resize(6, 0);

    let component = |index: usize| u8::try_from(parts[index]).map_err(|_| invalid());

    let date = Date::try_from_ymd(parts[0] as i32, component(1)?, component(2)?)
        .map_err(|_| invalid())?;
    let time = Time::try_from_hms(component(3)?, component(4)?, component(5)?)
        .map_err(|_| invalid())?;

    Ok(PrimitiveDateTime::new(date, time))
}
