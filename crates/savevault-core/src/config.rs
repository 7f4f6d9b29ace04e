use config::{Config, ConfigError, Environment as ConfigEnv, File as ConfigFile};
use serde::Deserialize;

/// Settings for one discovery run. Built once and moved into the engine;
/// nothing in the engine reads ambient configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Deepest directory level the crawler visits below each root (root = 0).
    pub max_depth: usize,
    /// Executables smaller than this are skipped unless they sit in a game-like folder.
    pub min_executable_size: u64,
    /// Names containing "setup" are skipped below this size.
    pub setup_size_threshold: u64,
    /// Entries iterated between two cancellation polls.
    pub cancel_check_stride: usize,
    /// Visited directories between two folder-count progress messages.
    pub progress_every_dirs: usize,
    pub include_system_roots: bool,
    pub search_roots: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub own_product_tokens: Vec<String>,
    pub executable_extensions: Vec<String>,
    pub catalog_path: Option<String>,
    pub use_registry: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_executable_size: 50 * 1024,
            setup_size_threshold: 5 * 1024 * 1024,
            cancel_check_stride: 50,
            progress_every_dirs: 100,
            include_system_roots: true,
            search_roots: Vec::new(),
            ignore_patterns: Vec::new(),
            own_product_tokens: vec!["savevault".to_string()],
            executable_extensions: vec!["exe".to_string()],
            catalog_path: None,
            use_registry: true,
        }
    }
}

impl DiscoveryConfig {
    /// Config for crawling only the given roots: no volumes, no registry.
    pub fn for_roots<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include_system_roots: false,
            use_registry: false,
            search_roots: roots.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn is_executable_name(&self, file_name: &str) -> bool {
        let Some((_, ext)) = file_name.rsplit_once('.') else {
            return false;
        };
        self.executable_extensions
            .iter()
            .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Load `Config.*` from the working directory (optional) and apply
/// `SAVEVAULT_*` environment overrides on top of the defaults.
pub fn load_configuration() -> Result<DiscoveryConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(ConfigEnv::with_prefix("SAVEVAULT").try_parsing(true))
        .build()?;
    builder.try_deserialize::<DiscoveryConfig>()
}

/// Drop repeated roots, comparing case-insensitively with either separator.
/// The first spelling of each root is kept, in order.
pub fn dedupe_roots(roots: Vec<String>) -> Vec<String> {
    let mut seen = ahash::AHashSet::new();
    roots
        .into_iter()
        .filter(|root| {
            let key = root
                .replace('\\', "/")
                .trim_end_matches('/')
                .to_lowercase();
            seen.insert(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.max_depth, 6);
        assert_eq!(config.min_executable_size, 51200);
        assert!(config.include_system_roots);
        assert!(config.use_registry);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: DiscoveryConfig = Config::builder()
            .add_source(config::File::from_str(
                "max_depth = 3\nsearch_roots = [\"D:/Games\"]",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.search_roots, vec!["D:/Games".to_string()]);
        assert_eq!(config.cancel_check_stride, 50);
        assert_eq!(config.own_product_tokens, vec!["savevault".to_string()]);
    }

    #[test]
    fn test_is_executable_name() {
        let config = DiscoveryConfig::default();
        assert!(config.is_executable_name("Game.EXE"));
        assert!(config.is_executable_name("foo.exe"));
        assert!(!config.is_executable_name("foo.dll"));
        assert!(!config.is_executable_name("exe"));
    }

    #[test]
    fn test_dedupe_roots() {
        let roots = vec![
            "C:\\Program Files".to_string(),
            "c:/program files/".to_string(),
            "D:\\Games".to_string(),
        ];
        let result = dedupe_roots(roots);
        assert_eq!(
            result,
            vec!["C:\\Program Files".to_string(), "D:\\Games".to_string()]
        );
    }
}
