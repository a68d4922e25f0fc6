use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProposalError {
    #[error("cluster proposal incomplete: missing '{0}'")]
    Incomplete(&'static str),

    #[error("profile '{profile}' references unknown minion '{minion}'")]
    UnresolvedMinion { profile: String, minion: String },

    #[error("primary minion '{0}' is not a cluster minion")]
    UnknownPrimary(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProposalError>;
