//! Output format value object

use serde::{Deserialize, Serialize};

/// How the response is rendered on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Response content only (default)
    #[default]
    Text,
    /// The full response as JSON
    Json,
}
