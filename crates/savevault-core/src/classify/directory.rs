use super::{contains_any, evaluate, last_segment, normalize, Decision, Rule, Verdict};
use crate::config::DiscoveryConfig;
use glob::{MatchOptions, Pattern};
use std::path::Path;
use tracing::error;

const BROWSER_DIR_NAMES: &[&str] = &[
    "chrome",
    "google chrome",
    "chromium",
    "firefox",
    "mozilla",
    "mozilla firefox",
    "opera",
    "brave",
    "brave-browser",
    "bravesoftware",
    "edge",
    "microsoft edge",
    "msedge",
    "vivaldi",
    "internet explorer",
];

const STORE_TOKENS: &[&str] = &["game", "steam", "epic", "gog"];

const OS_TOKENS: &[&str] = &[
    "system32",
    "syswow64",
    "$recycle.bin",
    "recycle.bin",
    "recycler",
    "system volume information",
    "winsxs",
    "driverstore",
];

const INSTALLER_DIR_NAMES: &[&str] = &[
    "install",
    "installer",
    "installers",
    "uninstall",
    "uninstaller",
    "setup",
    "redist",
    "redists",
    "redistributable",
    "redistributables",
    "_commonredist",
    "commonredist",
    "vcredist",
];

const TRANSIENT_DIR_NAMES: &[&str] = &["temp", "tmp", "cache", "caches", "log", "logs"];
const UPDATE_DIR_NAMES: &[&str] = &["update", "updates"];

pub(crate) struct DirFacts {
    raw: String,
    path: String,
    name: String,
}

impl DirFacts {
    fn mentions_store(&self) -> bool {
        contains_any(&self.path, STORE_TOKENS)
    }
}

const SKIP_RULES: &[Rule<DirectoryPolicy, DirFacts>] = &[
    Rule {
        name: "configured-exclusion",
        verdict: Verdict::Skip,
        applies: |p, f| {
            let options = MatchOptions {
                case_sensitive: false,
                ..MatchOptions::new()
            };
            p.ignore_patterns
                .iter()
                .any(|pattern| pattern.matches_with(&f.raw, options))
        },
    },
    Rule {
        name: "own-product",
        verdict: Verdict::Skip,
        applies: |p, f| p.own_tokens.iter().any(|t| f.path.contains(t.as_str())),
    },
    Rule {
        name: "browser-vendor",
        verdict: Verdict::Skip,
        applies: |_, f| BROWSER_DIR_NAMES.contains(&f.name.as_str()) && !f.mentions_store(),
    },
    Rule {
        name: "os-internal",
        verdict: Verdict::Skip,
        applies: |_, f| {
            contains_any(&f.path, OS_TOKENS)
                || (contains_any(&f.path, &["windows", "drivers"]) && !f.path.contains("game"))
        },
    },
    Rule {
        name: "installer",
        verdict: Verdict::Skip,
        applies: |_, f| INSTALLER_DIR_NAMES.contains(&f.name.as_str()),
    },
    Rule {
        name: "transient",
        verdict: Verdict::Skip,
        applies: |_, f| {
            TRANSIENT_DIR_NAMES.contains(&f.name.as_str())
                || (UPDATE_DIR_NAMES.contains(&f.name.as_str()) && !f.path.contains("game"))
        },
    },
];

const NEVER_SKIPPED: Decision = Decision {
    rule: "default",
    verdict: Verdict::Keep,
};

/// Decides which directories the crawler prunes.
///
/// Biased toward recall: anything that is not clearly system, installer,
/// browser or scratch space is crawled.
#[derive(Debug, Clone)]
pub struct DirectoryPolicy {
    own_tokens: Vec<String>,
    ignore_patterns: Vec<Pattern>,
}

impl Default for DirectoryPolicy {
    fn default() -> Self {
        Self::new(&DiscoveryConfig::default())
    }
}

impl DirectoryPolicy {
    pub fn new(config: &DiscoveryConfig) -> Self {
        let ignore_patterns = config
            .ignore_patterns
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();
        let own_tokens = config
            .own_product_tokens
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            own_tokens,
            ignore_patterns,
        }
    }

    pub fn should_skip(&self, dir: impl AsRef<Path>) -> bool {
        self.explain(dir.as_ref()).is_skip()
    }

    pub fn explain(&self, dir: &Path) -> Decision {
        let raw = dir.to_string_lossy().into_owned();
        let path = normalize(&raw);
        let name = last_segment(&path).to_string();
        let facts = DirFacts { raw, path, name };
        evaluate(SKIP_RULES, self, &facts, NEVER_SKIPPED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_for(policy: &DirectoryPolicy, dir: &str) -> &'static str {
        policy.explain(Path::new(dir)).rule
    }

    #[test]
    fn test_own_product_skipped() {
        let policy = DirectoryPolicy::default();
        assert!(policy.should_skip("C:\\Program Files\\SaveVault\\cache"));
        assert_eq!(
            rule_for(&policy, "C:\\Program Files\\SaveVault\\cache"),
            "own-product"
        );
    }

    #[test]
    fn test_browser_substring_not_skipped() {
        let policy = DirectoryPolicy::default();
        assert!(!policy.should_skip("C:\\Games\\FireChrome"));
    }

    #[test]
    fn test_browser_exact_name() {
        let policy = DirectoryPolicy::default();
        assert_eq!(
            rule_for(&policy, "C:\\Program Files\\Google\\Chrome"),
            "browser-vendor"
        );
        // Store tokens anywhere in the path keep a browser-named folder.
        assert!(!policy.should_skip("D:\\SteamLibrary\\steamapps\\common\\Chrome"));
    }

    #[test]
    fn test_os_internal() {
        let policy = DirectoryPolicy::default();
        assert!(policy.should_skip("C:\\Windows\\System32"));
        assert_eq!(rule_for(&policy, "C:\\$Recycle.Bin"), "os-internal");
        assert_eq!(rule_for(&policy, "C:\\Windows"), "os-internal");
        assert!(!policy.should_skip("C:\\Games\\Windows Game"));
    }

    #[test]
    fn test_installer_and_transient() {
        let policy = DirectoryPolicy::default();
        assert_eq!(rule_for(&policy, "C:\\Games\\Foo\\_CommonRedist"), "installer");
        assert_eq!(rule_for(&policy, "C:\\Games\\Foo\\Setup"), "installer");
        assert_eq!(rule_for(&policy, "C:\\Games\\Foo\\Logs"), "transient");
        assert_eq!(rule_for(&policy, "C:\\Tools\\Foo\\Updates"), "transient");
        assert!(!policy.should_skip("C:\\Games\\Foo\\Updates"));
        assert!(!policy.should_skip("C:\\Tools\\Foo\\Setups Archive"));
    }

    #[test]
    fn test_plain_dirs_kept() {
        let policy = DirectoryPolicy::default();
        assert_eq!(rule_for(&policy, "/home/ana/Games/Foo"), "default");
        assert!(!policy.should_skip("D:\\Epic Games\\Foo\\Binaries"));
    }

    #[test]
    fn test_configured_exclusion() {
        let config = DiscoveryConfig {
            ignore_patterns: vec!["*/archive/*".to_string(), "[".to_string()],
            ..DiscoveryConfig::default()
        };
        let policy = DirectoryPolicy::new(&config);
        assert_eq!(rule_for(&policy, "/data/Archive/old"), "configured-exclusion");
        assert!(!policy.should_skip("/data/games"));
    }
}
