//! Wiring shared by the commands that talk to upstream services.

use medplan_config::AppConfig;
use medplan_core::error::{Error, Result};
use medplan_core::knowledge::KnowledgeGenerator;
use medplan_core::provider::Provider;
use medplan_core::registry::DrugRegistry;
use medplan_knowledge::LlmKnowledgeGenerator;
use medplan_registry::RxNavClient;
use std::sync::Arc;

/// The registry, provider and generator a command runs against.
pub struct Services {
    pub registry: Arc<dyn DrugRegistry>,
    pub provider: Arc<dyn Provider>,
    pub generator: Arc<dyn KnowledgeGenerator>,
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let router = medplan_providers::router::build_from_config(config);
        let provider = router.default().ok_or_else(|| Error::Config {
            message: format!("provider '{}' is not available", config.default_provider),
        })?;
        let model = medplan_providers::router::model_for(config, &config.default_provider);

        tracing::debug!(
            provider = %config.default_provider,
            model = %model,
            registry = %config.registry.base_url,
            "Services configured"
        );

        let generator = LlmKnowledgeGenerator::new(provider.clone(), model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_timeout(config.generation.timeout());

        Ok(Self {
            registry: Arc::new(RxNavClient::from_config(&config.registry)),
            provider,
            generator: Arc::new(generator),
        })
    }
}

/// Load config and refuse to go on without an API key.
pub fn load_config() -> Result<AppConfig> {
    let config = AppConfig::load().map_err(|e| Error::Config {
        message: e.to_string(),
    })?;

    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    MEDPLAN_API_KEY     (generic)");
        eprintln!("    OPENAI_API_KEY      (for OpenAI direct)");
        eprintln!("    OPENROUTER_API_KEY  (for OpenRouter)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err(Error::Config {
            message: "no API key found, see above for setup instructions".into(),
        });
    }

    Ok(config)
}
