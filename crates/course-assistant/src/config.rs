use crate::error::AppError;
use crate::mcp_api::DescriptionFormat;

const DEFAULT_MAX_SEARCH_RESULTS: usize = 200;

/// Server configuration loaded explicitly from environment variables.
///
/// The server never talks to the LMS itself, so there are no credentials here; callers
/// pass already-fetched payloads to the tools.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to serve on (e.g. "127.0.0.1:7410"). `None` serves on stdio.
    pub listen_addr: Option<String>,
    /// Format used when a tool call does not name one.
    pub description_format: DescriptionFormat,
    /// Cap on results returned by `search_assignments`.
    pub max_search_results: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: None,
            description_format: DescriptionFormat::default(),
            max_search_results: DEFAULT_MAX_SEARCH_RESULTS,
        }
    }
}

impl Config {
    /// Optional:
    /// - `MCP_TCP_LISTEN_ADDR`: serve over TCP instead of stdio
    /// - `DESCRIPTION_FORMAT`: full, plain or markdown (default: markdown)
    /// - `SEARCH_MAX_RESULTS`: positive integer (default: 200)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let listen_addr = lookup("MCP_TCP_LISTEN_ADDR").filter(|s| !s.trim().is_empty());

        let description_format = match lookup("DESCRIPTION_FORMAT") {
            Some(raw) => raw.parse().map_err(AppError::Config)?,
            None => DescriptionFormat::default(),
        };

        let max_search_results = match lookup("SEARCH_MAX_RESULTS") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "SEARCH_MAX_RESULTS must be a positive integer, got '{raw}'"
                    ))
                })?,
            None => DEFAULT_MAX_SEARCH_RESULTS,
        };

        Ok(Self {
            listen_addr,
            description_format,
            max_search_results,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = load(&[]).unwrap();
        assert!(config.listen_addr.is_none());
        assert_eq!(config.description_format, DescriptionFormat::Markdown);
        assert_eq!(config.max_search_results, 200);
    }

    #[test]
    fn reads_all_settings() {
        let config = load(&[
            ("MCP_TCP_LISTEN_ADDR", "0.0.0.0:9000"),
            ("DESCRIPTION_FORMAT", "plain"),
            ("SEARCH_MAX_RESULTS", "25"),
        ])
        .unwrap();
        assert_eq!(config.listen_addr.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(config.description_format, DescriptionFormat::Plain);
        assert_eq!(config.max_search_results, 25);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(load(&[("DESCRIPTION_FORMAT", "pdf")]), Err(AppError::Config(_))));
        assert!(matches!(load(&[("SEARCH_MAX_RESULTS", "0")]), Err(AppError::Config(_))));
        assert!(matches!(load(&[("SEARCH_MAX_RESULTS", "lots")]), Err(AppError::Config(_))));
    }
}
