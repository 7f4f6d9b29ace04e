use super::{
    contains_any, contains_any_anchored, evaluate, last_segment, normalize, Decision, Rule, Verdict,
};
use crate::config::DiscoveryConfig;
use crate::model::ExecutableInfo;

const GAME_PATH_TOKENS: &[&str] = &[
    "game", "steam", "epic", "gog", "ubisoft", "uplay", "origin games", "ea games",
    "riot games", "battle.net", "blizzard", "bethesda", "rockstar", "xbox", "itch.io",
];

const BROWSER_TOKENS: &[&str] = &[
    "chrome", "firefox", "edge", "opera", "brave", "mozilla", "iexplore", "msedge", "browser",
];

const COMPONENT_TOKENS: &[&str] = &[
    "crashreport",
    "updater",
    "helper",
    "gpu",
    "broker",
    "crashpad",
    "notification-helper",
    "notification_helper",
    "plugin-container",
    "service",
];

const ENGINE_TOKENS: &[&str] = &["unreal", "unity", "cryengine", "godot"];
const PLAY_TOKENS: &[&str] = &["start", "launch", "play", "run"];
const ENTRY_TOKENS: &[&str] = &["game", "client", "app", "main", "default"];

/// Pre-computed, lowercased view of one executable.
pub(crate) struct ExeFacts {
    size: u64,
    file_name: String,
    stem: String,
    dir: String,
    dir_name: String,
}

impl ExeFacts {
    fn new(exe: &ExecutableInfo) -> Self {
        let full = normalize(&exe.path.to_string_lossy());
        let (dir, file_name) = match full.rsplit_once('/') {
            Some((dir, name)) => (dir.to_string(), name.to_string()),
            None => (String::new(), full.clone()),
        };
        let stem = file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem.to_string())
            .unwrap_or_else(|| file_name.clone());
        let dir_name = last_segment(&dir).to_string();
        Self {
            size: exe.size,
            file_name,
            stem,
            dir,
            dir_name,
        }
    }

    /// Folder that looks like it holds a game: vendor tokens in the path or
    /// a `bin`/`binaries` leaf.
    fn in_game_like_dir(&self) -> bool {
        contains_any(&self.dir, GAME_PATH_TOKENS)
            || self.dir_name.ends_with("bin")
            || self.dir_name.ends_with("binaries")
    }
}

const SKIP_RULES: &[Rule<ExecutableClassifier, ExeFacts>] = &[
    Rule {
        name: "tiny-outside-game-dir",
        verdict: Verdict::Skip,
        applies: |c, f| f.size < c.min_size && !f.in_game_like_dir(),
    },
    Rule {
        name: "browser",
        verdict: Verdict::Skip,
        applies: |_, f| contains_any(&f.stem, BROWSER_TOKENS) && !is_likely_game(&f.file_name, &f.dir),
    },
    Rule {
        name: "non-game-component",
        verdict: Verdict::Skip,
        applies: |_, f| {
            contains_any_anchored(&f.stem, COMPONENT_TOKENS) || f.stem.contains("unins")
        },
    },
    Rule {
        name: "small-setup",
        verdict: Verdict::Skip,
        applies: |c, f| f.stem.contains("setup") && f.size < c.setup_size,
    },
];

const NOT_SKIPPED: Decision = Decision {
    rule: "default",
    verdict: Verdict::Keep,
};

/// Separates likely game executables from installers, browsers and helpers.
#[derive(Debug, Clone)]
pub struct ExecutableClassifier {
    min_size: u64,
    setup_size: u64,
}

impl Default for ExecutableClassifier {
    fn default() -> Self {
        Self::new(&DiscoveryConfig::default())
    }
}

impl ExecutableClassifier {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            min_size: config.min_executable_size,
            setup_size: config.setup_size_threshold,
        }
    }

    pub fn should_skip(&self, exe: &ExecutableInfo) -> bool {
        self.explain(exe).is_skip()
    }

    pub fn explain(&self, exe: &ExecutableInfo) -> Decision {
        evaluate(SKIP_RULES, self, &ExeFacts::new(exe), NOT_SKIPPED)
    }
}

/// Whether a file name / containing directory pair points at a game.
///
/// `containing_dir` may be a bare folder name or a full directory path.
pub fn is_likely_game(file_name: &str, containing_dir: &str) -> bool {
    let name = file_name.to_lowercase();
    let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(&name);
    let dir = normalize(containing_dir);
    let dir_signals_game = dir.contains("game");

    if contains_any(stem, ENGINE_TOKENS) || contains_any(&dir, ENGINE_TOKENS) {
        return true;
    }
    // "launcher" is not a play verb by itself; only the rest of the name counts.
    let rest = stem.replace("launcher", " ");
    if contains_any(&rest, PLAY_TOKENS) || contains_any(&rest, ENTRY_TOKENS) {
        return true;
    }
    dir_signals_game || last_segment(&dir).contains("bin")
}

#[cfg(test)]
mod tests {
    use super::*;

    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    fn exe(path: &str, size: u64) -> ExecutableInfo {
        ExecutableInfo::new(path, size)
    }

    #[test]
    fn test_small_exe_in_game_dir_kept() {
        let classifier = ExecutableClassifier::default();
        assert!(!classifier.should_skip(&exe("C:\\Games\\Foo\\foo.exe", 10 * KB)));
    }

    #[test]
    fn test_small_exe_outside_game_dir_skipped() {
        let classifier = ExecutableClassifier::default();
        let decision = classifier.explain(&exe("C:\\Temp\\helper.exe", 10 * KB));
        assert!(decision.is_skip());
        assert_eq!(decision.rule, "tiny-outside-game-dir");
    }

    #[test]
    fn test_small_exe_in_binaries_kept() {
        let classifier = ExecutableClassifier::default();
        assert!(!classifier.should_skip(&exe("D:\\Stuff\\Thing\\Binaries\\thing.exe", 10 * KB)));
        assert!(!classifier.should_skip(&exe("/opt/thing/bin/thing.exe", 10 * KB)));
    }

    #[test]
    fn test_browser_skipped() {
        let classifier = ExecutableClassifier::default();
        let decision = classifier.explain(&exe(
            "C:\\Program Files\\Mozilla Firefox\\firefox.exe",
            600 * KB,
        ));
        assert_eq!(decision.rule, "browser");
        assert!(decision.is_skip());
        assert!(classifier.should_skip(&exe(
            "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe",
            3 * MB
        )));
    }

    #[test]
    fn test_browser_named_game_kept() {
        let classifier = ExecutableClassifier::default();
        let decision = classifier.explain(&exe("C:\\Games\\FireChrome\\FireChrome.exe", 20 * MB));
        assert!(!decision.is_skip());
        assert_eq!(decision.rule, "default");
    }

    #[test]
    fn test_components_skipped() {
        let classifier = ExecutableClassifier::default();
        for path in [
            "C:\\Games\\Foo\\CrashReportClient.exe",
            "C:\\Games\\Foo\\Updater.exe",
            "C:\\Games\\Foo\\unins000.exe",
            "C:\\Games\\Foo\\plugin-container.exe",
        ] {
            let decision = classifier.explain(&exe(path, 2 * MB));
            assert_eq!(decision.rule, "non-game-component", "{}", path);
        }
    }

    #[test]
    fn test_setup_size_threshold() {
        let classifier = ExecutableClassifier::default();
        assert_eq!(
            classifier.explain(&exe("C:\\Games\\Foo\\setup.exe", MB)).rule,
            "small-setup"
        );
        assert!(!classifier.should_skip(&exe("C:\\Games\\Foo\\setup.exe", 50 * MB)));
    }

    #[test]
    fn test_is_likely_game_tokens() {
        assert!(is_likely_game("UnrealGame.exe", "Win64"));
        assert!(is_likely_game("Play.exe", "Foo"));
        assert!(is_likely_game("client.exe", "Foo"));
        assert!(is_likely_game("foo.exe", "C:\\Games\\Foo"));
        assert!(is_likely_game("foo.exe", "bin"));
        assert!(!is_likely_game("firefox.exe", "Mozilla Firefox"));
    }

    #[test]
    fn test_launcher_needs_game_dir() {
        assert!(!is_likely_game("Launcher.exe", "C:\\Tools\\Foo"));
        assert!(is_likely_game("Launcher.exe", "C:\\Games\\Foo"));
    }

    #[test]
    fn test_launcher_keeps_other_signals() {
        assert!(is_likely_game("GameLauncher.exe", "C:\\Tools\\Foo"));
        assert!(is_likely_game("launcher.exe", "C:\\Tools\\Foo\\bin"));
        assert!(is_likely_game("UnityLauncher.exe", "C:\\Tools\\Foo"));
    }

    #[test]
    fn test_game_like_dir_needs_whole_vendor_token() {
        let classifier = ExecutableClassifier::default();
        for path in [
            "C:\\Tools\\Kitchen\\tiny.exe",
            "C:\\Tools\\Switch\\tiny.exe",
            "C:\\Tools\\Patriot\\tiny.exe",
            "C:\\Tools\\Originals\\tiny.exe",
        ] {
            assert_eq!(
                classifier.explain(&exe(path, 10 * KB)).rule,
                "tiny-outside-game-dir",
                "{}",
                path
            );
        }
        assert!(!classifier.should_skip(&exe("C:\\Riot Games\\Foo\\tiny.exe", 10 * KB)));
        assert!(!classifier.should_skip(&exe("D:\\itch.io\\foo\\tiny.exe", 10 * KB)));
    }

    #[test]
    fn test_component_tokens_are_anchored() {
        let classifier = ExecutableClassifier::default();
        for path in [
            "C:\\Games\\Foo\\nvidia_gpu_helper.exe",
            "C:\\Games\\Foo\\SteamService.exe",
            "C:\\Games\\Foo\\helper-x64.exe",
        ] {
            assert_eq!(classifier.explain(&exe(path, 2 * MB)).rule, "non-game-component", "{}", path);
        }
        // Tokens buried inside a longer word do not count.
        assert!(!classifier.should_skip(&exe("C:\\Games\\Foo\\Skyservicemen.exe", 2 * MB)));
        assert!(!classifier.should_skip(&exe("C:\\Games\\Foo\\Megpuzzle.exe", 2 * MB)));
    }
}
