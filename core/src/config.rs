use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/clinical_notes.csv"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct KnowledgeBaseConfig {
    /// JSON table replacing the builtin symptom map when set.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FusionConfig {
    pub graph_weight: f32,
    pub ner_weight: f32,
    pub top_k: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            graph_weight: 0.6,
            ner_weight: 0.4,
            top_k: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AuditConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MetricsConfig {
    pub max_history: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { max_history: 1000 }
    }
}

/// `CLINIGRAPH_FUSION__NER_WEIGHT=0.3` sets `fusion.ner_weight`.
fn environment() -> Environment {
    Environment::with_prefix("CLINIGRAPH")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub corpus: CorpusConfig,
    pub knowledge_base: KnowledgeBaseConfig,
    pub fusion: FusionConfig,
    pub audit: AuditConfig,
    pub metrics: MetricsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(environment());

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("fusion.graph_weight", self.fusion.graph_weight),
            ("fusion.ner_weight", self.fusion.ner_weight),
        ];
        for (key, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::Message(format!(
                    "{key} must be a finite, non-negative number (got {weight})"
                )));
            }
        }
        if self.fusion.top_k == 0 {
            return Err(ConfigError::Message(
                "fusion.top_k must be at least 1".to_string(),
            ));
        }
        if self.metrics.max_history == 0 {
            return Err(ConfigError::Message(
                "metrics.max_history must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
