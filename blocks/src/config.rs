//! Configuration for the block pipeline.

use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::pipeline::BlockPipeline`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Site-wide settings
    pub site: SiteConfig,
    /// Resolver settings
    pub resolver: ResolverConfig,
    /// Bypass the schema cache so schema edits show up without a restart
    pub dev_mode: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            resolver: ResolverConfig::default(),
            dev_mode: false,
        }
    }
}

impl PipelineConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Site-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL prefixed to generated paths, no trailing slash
    pub base_url: String,
    /// Page size for paginated listings
    pub page_size: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            page_size: 10,
        }
    }
}

/// Resolver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Upper bound on blocks resolving concurrently within one page
    pub max_concurrent_blocks: usize,
    /// Default item count for the posts-list block
    pub posts_list_limit: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrent_blocks: 8,
            posts_list_limit: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trip() {
        let config = PipelineConfig {
            site: SiteConfig {
                base_url: "https://blog.example".to_string(),
                page_size: 20,
            },
            ..Default::default()
        };

        let yaml = config.to_yaml().unwrap();
        let parsed = PipelineConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.site.base_url, "https://blog.example");
        assert_eq!(parsed.site.page_size, 20);
        assert!(!parsed.dev_mode);
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.site.page_size, 10);
        assert_eq!(config.resolver.max_concurrent_blocks, 8);
    }
}
