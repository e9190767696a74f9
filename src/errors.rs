use std::io;

use thiserror::Error;
use uuid::Uuid;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents an SQL error.
    #[error("SQLx error")]
    Sqlx { source: sqlx::Error },

    /// Represents an attempt to operate on a package that does not exist.
    #[error("non-existent package: {0}")]
    NonExistentId(Uuid),

    /// Represents an extra bound to a package that does not exist.
    #[error("owning package does not exist")]
    OwningPackageMissing,

    /// Represents an attempt to operate on an extra that does not exist.
    #[error("no extra named {key} for package {package_id}")]
    NonExistentExtra { package_id: Uuid, key: String },

    /// Represents a `state` column value outside the known lifecycle set.
    #[error("unrecognized state: {0}")]
    UnrecognizedState(String),

    /// Represents a license source locator that is not a valid URL.
    #[error("invalid license source {url}")]
    InvalidLicenseSource {
        url: String,
        source: url::ParseError,
    },

    /// Represents a failure to read a local license document.
    #[error("couldn't read the licenses file {url}")]
    LicenseSourceRead { url: String, source: io::Error },

    /// Represents a failure to fetch a remote license document.
    #[error("couldn't get the licenses file {url}")]
    LicenseSourceFetch {
        url: String,
        source: reqwest::Error,
    },

    /// Represents a license document that is not valid JSON or whose
    /// descriptors do not have the expected shape.
    #[error("couldn't parse the licenses file {url}")]
    LicenseSourceParse {
        url: String,
        source: serde_json::Error,
    },

    /// Represents a license document that is neither a list nor a mapping.
    #[error("licenses at {url} must be a list or a mapping of descriptors")]
    MalformedLicenseDocument { url: String },

    /// Represents a lookup for a license id the register does not contain.
    #[error("license not found: {0}")]
    LicenseNotFound(String),

    /// Represents access to a license field outside the recognized set.
    #[error("license {id} has no field named {field}")]
    UnknownLicenseField { id: String, field: String },

    /// Represents a `date_created` value that could not be parsed.
    #[error("couldn't parse date_created value {value}")]
    InvalidDateCreated { value: String },

    /// Represents a legacy compliance flag that could not be read as a boolean.
    #[error("couldn't interpret {field} value {value} as a boolean")]
    InvalidBooleanFlag { field: &'static str, value: String },
}
