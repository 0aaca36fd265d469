#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("failed to build HTTP client for the proxy control plane")]
    Client { source: reqwest::Error },

    #[error("proxy control plane request failed: {operation}")]
    Http {
        operation: &'static str,
        source: reqwest::Error,
    },

    #[error("proxy control plane rejected {operation}: HTTP {status}\n{body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("proxy control plane returned no transaction id")]
    MissingTransactionId,

    #[error(transparent)]
    Config(#[from] dockyard_core::Error),
}
