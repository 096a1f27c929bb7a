use thiserror::Error;

use crate::{capability::REMEDIATION_MESSAGE, delegate::DelegateFamily};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Unknown field '{field}' on type {type_name}: not a property or storage name")]
    UnknownField { type_name: String, field: String },

    #[error(
        "Field '{field}' on type {type_name} is ambiguous; it resolves to: {}",
        .candidates.join(", ")
    )]
    AmbiguousField {
        type_name: String,
        field: String,
        candidates: Vec<String>,
    },

    #[error(
        "Cannot inspect {suspected} delegation of property '{field}' on type {type_name}. {}",
        REMEDIATION_MESSAGE
    )]
    CapabilityRequired {
        type_name: String,
        field: String,
        suspected: DelegateFamily,
    },

    #[error(
        "Type of property '{property}' on type {type_name} is only partially resolved; \
         unresolved placeholder(s): {}",
        .placeholders.join(", ")
    )]
    UnresolvedGeneric {
        type_name: String,
        property: String,
        placeholders: Vec<String>,
    },

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParse {
        source: toml::de::Error,
        file: String,
    },

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type ProbeResult<T> = Result<T, ProbeError>;
