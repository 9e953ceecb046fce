use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Health message when every required credential is present.
pub const ENVIRONMENT_OK: &str = "Environment check passed";

/// Which web-search tools back the crew pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisVariant {
    /// Serper and Brave search.
    Full,
    /// Brave search only.
    Reduced,
    /// No search; knowledge-based answers.
    Fallback,
}

impl AnalysisVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Reduced => "reduced",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for AnalysisVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "reduced" => Ok(Self::Reduced),
            "fallback" => Ok(Self::Fallback),
            other => Err(format!("unknown analysis variant: {other}")),
        }
    }
}

/// Analysis collaborator configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub openai_api_key: Option<String>,
    /// Chat model for every stage (default: `gpt-4o-mini`).
    pub openai_model: String,
    /// API root, without the trailing `/chat/completions`.
    pub openai_base_url: String,
    pub serper_api_key: Option<String>,
    pub brave_api_key: Option<String>,
    /// Explicit override; derived from the available search keys when unset.
    pub variant: Option<AnalysisVariant>,
    /// Deadline for one whole analysis in seconds; `0` disables it.
    pub analysis_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            openai_base_url: "https://api.openai.com/v1".into(),
            serper_api_key: None,
            brave_api_key: None,
            variant: None,
            analysis_timeout_secs: 900,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                     |
    /// |-------------------------|-----------------------------|
    /// | `OPENAI_API_KEY`        | unset                       |
    /// | `OPENAI_MODEL`          | `gpt-4o-mini`               |
    /// | `OPENAI_BASE_URL`       | `https://api.openai.com/v1` |
    /// | `SERPER_API_KEY`        | unset                       |
    /// | `BRAVE_API_KEY`         | unset                       |
    /// | `ANALYSIS_VARIANT`      | derived from search keys    |
    /// | `ANALYSIS_TIMEOUT_SECS` | `900`                       |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let openai_model = std::env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model);
        let openai_base_url = std::env::var("OPENAI_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.openai_base_url);

        let variant = non_empty_var("ANALYSIS_VARIANT").map(|raw| {
            raw.parse::<AnalysisVariant>()
                .expect("ANALYSIS_VARIANT must be one of full, reduced, fallback")
        });

        let analysis_timeout_secs: u64 = std::env::var("ANALYSIS_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults.analysis_timeout_secs.to_string())
            .parse()
            .expect("ANALYSIS_TIMEOUT_SECS must be a valid u64");

        Self {
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_model,
            openai_base_url,
            serper_api_key: non_empty_var("SERPER_API_KEY"),
            brave_api_key: non_empty_var("BRAVE_API_KEY"),
            variant,
            analysis_timeout_secs,
        }
    }

    /// Check that the credentials every variant needs are present.
    ///
    /// Returns the human-readable status used by the health endpoint, or
    /// the message naming what is missing.
    pub fn check_environment(&self) -> Result<&'static str, String> {
        let mut missing = Vec::new();
        if self.openai_api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }

        if missing.is_empty() {
            Ok(ENVIRONMENT_OK)
        } else {
            Err(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            ))
        }
    }

    /// Deadline for one analysis, or `None` when disabled.
    pub fn analysis_timeout(&self) -> Option<Duration> {
        (self.analysis_timeout_secs > 0).then(|| Duration::from_secs(self.analysis_timeout_secs))
    }

    /// The explicit override, else the richest variant the keys allow.
    pub fn resolve_variant(&self) -> AnalysisVariant {
        if let Some(variant) = self.variant {
            return variant;
        }
        match (&self.serper_api_key, &self.brave_api_key) {
            (Some(_), Some(_)) => AnalysisVariant::Full,
            (_, Some(_)) => AnalysisVariant::Reduced,
            _ => AnalysisVariant::Fallback,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_keys(serper: bool, brave: bool) -> EngineConfig {
        EngineConfig {
            serper_api_key: serper.then(|| "s".to_string()),
            brave_api_key: brave.then(|| "b".to_string()),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn variant_follows_available_keys() {
        assert_eq!(with_keys(true, true).resolve_variant(), AnalysisVariant::Full);
        assert_eq!(with_keys(false, true).resolve_variant(), AnalysisVariant::Reduced);
        assert_eq!(with_keys(true, false).resolve_variant(), AnalysisVariant::Fallback);
        assert_eq!(with_keys(false, false).resolve_variant(), AnalysisVariant::Fallback);
    }

    #[test]
    fn explicit_variant_wins() {
        let config = EngineConfig {
            variant: Some(AnalysisVariant::Fallback),
            ..with_keys(true, true)
        };
        assert_eq!(config.resolve_variant(), AnalysisVariant::Fallback);
    }

    #[test]
    fn variant_parses_case_insensitively() {
        assert_eq!("FULL".parse::<AnalysisVariant>(), Ok(AnalysisVariant::Full));
        assert_eq!(" reduced ".parse::<AnalysisVariant>(), Ok(AnalysisVariant::Reduced));
        assert!("fancy".parse::<AnalysisVariant>().is_err());
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        let config = EngineConfig {
            analysis_timeout_secs: 0,
            ..EngineConfig::default()
        };
        assert_eq!(config.analysis_timeout(), None);
        assert_eq!(
            EngineConfig::default().analysis_timeout(),
            Some(Duration::from_secs(900))
        );
    }

    #[test]
    fn environment_check_requires_openai_key() {
        assert_eq!(
            EngineConfig::default().check_environment(),
            Err("Missing required environment variables: OPENAI_API_KEY".to_string())
        );
        let ready = EngineConfig {
            openai_api_key: Some("sk".into()),
            ..EngineConfig::default()
        };
        assert_eq!(ready.check_environment(), Ok(ENVIRONMENT_OK));
    }
}
