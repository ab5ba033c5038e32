#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Kubernetes reported error: {source}")]
    Kube {
        #[from]
        source: kube::Error,
    },

    #[error("Json error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("Invalid cron schedule '{schedule}': {source}")]
    SchedParse {
        schedule: String,
        source: cron::error::Error,
    },

    #[error("Profile '{0}' not found")]
    ProfileNotFound(String),

    #[error("Invalid profile override '{name}': {message}")]
    InvalidOverride { name: String, message: String },

    #[error("{0}")]
    Other(String),
}
