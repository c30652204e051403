use thiserror::Error;

#[derive(Error, Debug)]
pub enum VeilError {
    #[error("unknown rule type: {rule_type}")]
    UnknownRuleType { rule_type: String },
    #[error("cannot compile an empty rule list")]
    EmptyRuleList,
    #[error("bad operator argument: {0}")]
    Argument(String),
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error("unsupported xpath expression: {0}")]
    XPath(String),
    #[error("rule deserialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VeilError>;
