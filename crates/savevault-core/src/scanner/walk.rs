use crate::cancel::CancellationToken;
use crate::classify::{DirectoryPolicy, ExecutableClassifier};
use crate::config::DiscoveryConfig;
use crate::error::Cancelled;
use crate::model::ExecutableInfo;
use crate::platform;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Counters of one crawl, accumulated across roots.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlStats {
    pub directories_visited: usize,
    pub directories_pruned: usize,
    pub executables_seen: usize,
    pub executables_skipped: usize,
}

/// Bounded-depth, single-threaded directory walker.
///
/// Per directory: prune via [`DirectoryPolicy`], crawl `bin`-like
/// subdirectories first, classify the executables in place, then descend
/// into the remaining subdirectories. Unreadable entries are logged and
/// left out; only cancellation stops the walk.
pub struct FilesystemCrawler<'a> {
    policy: &'a DirectoryPolicy,
    classifier: &'a ExecutableClassifier,
    config: &'a DiscoveryConfig,
    cancel: &'a CancellationToken,
    stats: CrawlStats,
}

struct DirListing {
    priority_dirs: Vec<PathBuf>,
    other_dirs: Vec<PathBuf>,
    executables: Vec<ExecutableInfo>,
}

impl<'a> FilesystemCrawler<'a> {
    pub fn new(
        policy: &'a DirectoryPolicy,
        classifier: &'a ExecutableClassifier,
        config: &'a DiscoveryConfig,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            policy,
            classifier,
            config,
            cancel,
            stats: CrawlStats::default(),
        }
    }

    pub fn stats(&self) -> CrawlStats {
        self.stats
    }

    /// Walk `root` (depth 0) down to `config.max_depth`, handing every
    /// executable that survives classification to `on_candidate`.
    ///
    /// `on_progress` is called every `progress_every_dirs` visited directories.
    pub fn crawl(
        &mut self,
        root: &Path,
        on_candidate: &mut dyn FnMut(ExecutableInfo),
        on_progress: &mut dyn FnMut(usize, &Path),
    ) -> Result<(), Cancelled> {
        self.visit(root, 0, on_candidate, on_progress)
    }

    fn visit(
        &mut self,
        dir: &Path,
        depth: usize,
        on_candidate: &mut dyn FnMut(ExecutableInfo),
        on_progress: &mut dyn FnMut(usize, &Path),
    ) -> Result<(), Cancelled> {
        if depth > self.config.max_depth {
            return Ok(());
        }
        self.cancel.check()?;

        let decision = self.policy.explain(dir);
        if decision.is_skip() {
            debug!("Pruning {} ({})", dir.display(), decision.rule);
            self.stats.directories_pruned += 1;
            return Ok(());
        }

        self.stats.directories_visited += 1;
        let every = self.config.progress_every_dirs.max(1);
        if self.stats.directories_visited % every == 0 {
            on_progress(self.stats.directories_visited, dir);
        }

        let listing = match self.list(dir)? {
            Some(listing) => listing,
            None => return Ok(()),
        };

        for sub in &listing.priority_dirs {
            self.visit(sub, depth + 1, on_candidate, on_progress)?;
        }

        let stride = self.config.cancel_check_stride.max(1);
        for (i, exe) in listing.executables.into_iter().enumerate() {
            if i % stride == 0 {
                self.cancel.check()?;
            }
            self.stats.executables_seen += 1;
            let verdict = self.classifier.explain(&exe);
            if verdict.is_skip() {
                trace!("Skipping {} ({})", exe.path.display(), verdict.rule);
                self.stats.executables_skipped += 1;
                continue;
            }
            on_candidate(exe);
        }

        for sub in &listing.other_dirs {
            self.visit(sub, depth + 1, on_candidate, on_progress)?;
        }

        Ok(())
    }

    /// Read `dir` once, splitting subdirectories into priority and normal
    /// buckets. `Ok(None)` means the directory could not be read.
    fn list(&self, dir: &Path) -> Result<Option<DirListing>, Cancelled> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                log_io_error("reading directory", dir, &err);
                return Ok(None);
            }
        };

        let mut listing = DirListing {
            priority_dirs: Vec::new(),
            other_dirs: Vec::new(),
            executables: Vec::new(),
        };
        let stride = self.config.cancel_check_stride.max(1);

        for (i, entry_result) in entries.enumerate() {
            if i % stride == 0 {
                self.cancel.check()?;
            }
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    log_io_error("reading entry in", dir, &err);
                    continue;
                }
            };
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(err) => {
                    log_io_error("getting file type of", &entry.path(), &err);
                    continue;
                }
            };
            if file_type.is_symlink() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();

            if file_type.is_dir() {
                match entry.metadata() {
                    Ok(metadata) if platform::is_hidden_or_system(&name, &metadata) => {
                        trace!("Skipping hidden/system {}", path.display());
                    }
                    Ok(_) => {
                        if is_binary_dir_name(&name) {
                            listing.priority_dirs.push(path);
                        } else {
                            listing.other_dirs.push(path);
                        }
                    }
                    Err(err) => log_io_error("getting metadata for", &path, &err),
                }
            } else if file_type.is_file() && self.config.is_executable_name(&name) {
                match entry.metadata() {
                    Ok(metadata) => listing
                        .executables
                        .push(ExecutableInfo::new(path, metadata.len())),
                    Err(err) => log_io_error("getting metadata for", &path, &err),
                }
            }
        }

        // read_dir order is unspecified; sorting keeps runs reproducible.
        listing.priority_dirs.sort();
        listing.other_dirs.sort();
        listing.executables.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Some(listing))
    }
}

/// Folders such as `bin`, `Binaries` or `x64_bin` hold the real game binaries.
pub fn is_binary_dir_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("bin") || lower.contains("binary")
}

fn log_io_error(action: &str, path: &Path, err: &io::Error) {
    if err.kind() == io::ErrorKind::PermissionDenied {
        debug!("Access denied {} {}: {}", action, path.display(), err);
    } else {
        warn!("Error {} {}: {}", action, path.display(), err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const BIG: usize = 64 * 1024;

    fn write_exe(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), vec![0u8; BIG]).unwrap();
    }

    fn crawl_names(root: &Path, config: &DiscoveryConfig) -> Vec<String> {
        let policy = DirectoryPolicy::new(config);
        let classifier = ExecutableClassifier::new(config);
        let cancel = CancellationToken::new();
        let mut crawler = FilesystemCrawler::new(&policy, &classifier, config, &cancel);
        let mut found = Vec::new();
        crawler
            .crawl(
                root,
                &mut |exe| {
                    found.push(exe.path.file_name().unwrap().to_string_lossy().into_owned())
                },
                &mut |_, _| {},
            )
            .unwrap();
        found
    }

    #[test]
    fn test_depth_bound() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("root");
        let mut dir = root.clone();
        for level in 1..=7 {
            dir = dir.join(level.to_string());
            write_exe(&dir, &format!("level{}.exe", level));
        }

        let config = DiscoveryConfig::for_roots([root.to_string_lossy()]);
        let found = crawl_names(&root, &config);

        assert!(found.contains(&"level6.exe".to_string()));
        assert!(!found.contains(&"level7.exe".to_string()));
    }

    #[test]
    fn test_bin_folders_first() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("Foo");
        write_exe(&root, "aaa.exe");
        write_exe(&root.join("Alpha"), "alpha.exe");
        write_exe(&root.join("Binaries"), "zeta.exe");

        let config = DiscoveryConfig::for_roots([root.to_string_lossy()]);
        let found = crawl_names(&root, &config);

        assert_eq!(found, vec!["zeta.exe", "aaa.exe", "alpha.exe"]);
    }

    #[test]
    fn test_pruned_and_hidden_dirs() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("Foo");
        write_exe(&root.join("Game"), "foo.exe");
        write_exe(&root.join("_CommonRedist"), "vc_redist.exe");
        write_exe(&root.join("cache"), "cached.exe");
        #[cfg(not(target_os = "windows"))]
        write_exe(&root.join(".hidden"), "hidden.exe");

        let config = DiscoveryConfig::for_roots([root.to_string_lossy()]);
        let found = crawl_names(&root, &config);

        assert_eq!(found, vec!["foo.exe"]);
    }

    #[test]
    fn test_classifier_applied() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("Tools");
        write_exe(&root, "tool.exe");
        write_exe(&root, "unins000.exe");
        fs::write(root.join("tiny.exe"), b"MZ").unwrap();
        fs::write(root.join("notes.txt"), vec![0u8; BIG]).unwrap();

        let config = DiscoveryConfig::for_roots([root.to_string_lossy()]);
        let found = crawl_names(&root, &config);

        assert_eq!(found, vec!["tool.exe"]);
    }

    #[test]
    fn test_cancelled_before_start() {
        let tmp = tempdir().unwrap();
        write_exe(tmp.path(), "foo.exe");
        let config = DiscoveryConfig::for_roots([tmp.path().to_string_lossy()]);
        let policy = DirectoryPolicy::new(&config);
        let classifier = ExecutableClassifier::new(&config);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut crawler = FilesystemCrawler::new(&policy, &classifier, &config, &cancel);
        let mut found = 0;
        let result = crawler.crawl(tmp.path(), &mut |_| found += 1, &mut |_, _| {});

        assert_eq!(result, Err(Cancelled));
        assert_eq!(found, 0);
    }

    #[test]
    fn test_missing_root_is_not_an_error() {
        let tmp = tempdir().unwrap();
        let config = DiscoveryConfig::for_roots(Vec::<String>::new());
        let found = crawl_names(&tmp.path().join("does-not-exist"), &config);
        assert!(found.is_empty());
    }

    #[test]
    fn test_is_binary_dir_name() {
        assert!(is_binary_dir_name("Binaries"));
        assert!(is_binary_dir_name("x64_bin"));
        assert!(!is_binary_dir_name("Content"));
    }
}
