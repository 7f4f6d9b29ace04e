use crate::cancel::CancellationToken;
use crate::catalog::KnownCatalogMatcher;
use crate::classify::{DirectoryPolicy, ExecutableClassifier};
use crate::config::DiscoveryConfig;
use crate::dedup::{DeduplicationIndex, ProcessedPathSet};
use crate::env::{Environment, ProcessEnvironment};
use crate::error::{Cancelled, Error};
use crate::model::{DiscoveredApplication, ExecutableInfo, KnownGameDescriptor, Source};
use crate::platform::{self, SystemVolumes, Volume, VolumeSource};
use crate::progress::{DiscoveryEvent, DiscoverySink};
use crate::registry::{InstalledProgramsRegistry, RegistrySource};
use crate::scanner::{build_search_roots, FilesystemCrawler};
use std::fs;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Finds installed games by combining the known catalog, the OS registry and
/// a heuristic crawl of likely install folders.
pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    catalog: Vec<KnownGameDescriptor>,
    volumes: Box<dyn VolumeSource>,
    registry: Box<dyn RegistrySource>,
    env: Box<dyn Environment>,
    policy: DirectoryPolicy,
    classifier: ExecutableClassifier,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverySummary {
    pub catalog_found: usize,
    pub registry_found: usize,
    pub filesystem_found: usize,
    pub duplicates_rejected: usize,
    pub directories_visited: usize,
    pub catalog_duration: Duration,
    pub registry_duration: Duration,
    pub filesystem_duration: Duration,
}

impl DiscoverySummary {
    pub fn total_found(&self) -> usize {
        self.catalog_found + self.registry_found + self.filesystem_found
    }
}

/// How a discovery run ended. Records already delivered stay valid either way.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryOutcome {
    Completed(DiscoverySummary),
    Cancelled(DiscoverySummary),
}

impl DiscoveryOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DiscoveryOutcome::Cancelled(_))
    }

    pub fn summary(&self) -> &DiscoverySummary {
        match self {
            DiscoveryOutcome::Completed(s) | DiscoveryOutcome::Cancelled(s) => s,
        }
    }
}

/// Per-run state. Created fresh by every `discover` call.
struct ScanState<'s> {
    sink: &'s dyn DiscoverySink,
    processed: ProcessedPathSet,
    index: DeduplicationIndex,
    summary: DiscoverySummary,
}

impl<'s> ScanState<'s> {
    fn new(sink: &'s dyn DiscoverySink) -> Self {
        Self {
            sink,
            processed: ProcessedPathSet::new(),
            index: DeduplicationIndex::new(),
            summary: DiscoverySummary::default(),
        }
    }

    fn publish(&mut self, app: DiscoveredApplication) {
        if let Err(rejection) = self.index.claim(&app) {
            debug!(
                "Not reporting {} ({:?})",
                app.executable_path.display(),
                rejection
            );
            self.summary.duplicates_rejected += 1;
            return;
        }
        match app.source {
            Source::KnownCatalog => self.summary.catalog_found += 1,
            Source::Registry => self.summary.registry_found += 1,
            Source::FilesystemHeuristic => self.summary.filesystem_found += 1,
        }
        debug!(
            "Found {} at {} ({})",
            app.name,
            app.executable_path.display(),
            app.source
        );
        self.sink.send(DiscoveryEvent::Discovered(app));
    }

    fn fail(&self, message: String) {
        error!("{}", message);
        self.sink.send(DiscoveryEvent::Error(message));
    }
}

impl DiscoveryEngine {
    pub fn new(config: DiscoveryConfig) -> Self {
        let policy = DirectoryPolicy::new(&config);
        let classifier = ExecutableClassifier::new(&config);
        Self {
            config,
            catalog: Vec::new(),
            volumes: Box::new(SystemVolumes),
            registry: Box::new(InstalledProgramsRegistry),
            env: Box::new(ProcessEnvironment),
            policy,
            classifier,
        }
    }

    pub fn with_catalog(mut self, catalog: Vec<KnownGameDescriptor>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_volumes(mut self, volumes: impl VolumeSource + 'static) -> Self {
        self.volumes = Box::new(volumes);
        self
    }

    pub fn with_registry(mut self, registry: impl RegistrySource + 'static) -> Self {
        self.registry = Box::new(registry);
        self
    }

    pub fn with_environment(mut self, env: impl Environment + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Run the three phases in order on the calling thread:
    /// 1. Known catalog probed on every volume
    /// 2. Installed-program registry
    /// 3. Heuristic crawl of the search roots
    ///
    /// Records are sent to `sink` as they are found, then `Finished`.
    pub fn discover(&self, sink: &dyn DiscoverySink, cancel: &CancellationToken) -> DiscoveryOutcome {
        let mut state = ScanState::new(sink);
        let outcome = match self.run_phases(&mut state, cancel) {
            Ok(()) => DiscoveryOutcome::Completed(state.summary.clone()),
            Err(Cancelled) => DiscoveryOutcome::Cancelled(state.summary.clone()),
        };

        let summary = outcome.summary();
        info!(
            "Discovery {}: {} applications ({} catalog, {} registry, {} filesystem), {} folders scanned",
            if outcome.is_cancelled() { "cancelled" } else { "completed" },
            summary.total_found(),
            summary.catalog_found,
            summary.registry_found,
            summary.filesystem_found,
            summary.directories_visited,
        );
        sink.send(DiscoveryEvent::Finished(outcome.clone()));
        outcome
    }

    /// Run [`discover`](Self::discover) on a background thread.
    pub fn spawn(self) -> Result<DiscoveryHandle, Error> {
        let (tx, events) = mpsc::channel::<DiscoveryEvent>();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let thread = thread::Builder::new()
            .name("savevault-discovery".to_string())
            .spawn(move || self.discover(&tx, &token))?;
        Ok(DiscoveryHandle {
            events,
            cancel,
            thread,
        })
    }

    fn run_phases(&self, state: &mut ScanState, cancel: &CancellationToken) -> Result<(), Cancelled> {
        cancel.check()?;
        let volumes = match self.volumes.volumes() {
            Ok(volumes) => volumes,
            Err(e) => {
                state.fail(format!("Volume enumeration failed: {}", e));
                Vec::new()
            }
        };
        debug!("Volumes: {:?}", volumes);

        let start = Instant::now();
        let result = self.catalog_phase(&volumes, state, cancel);
        state.summary.catalog_duration = start.elapsed();
        result?;

        let start = Instant::now();
        let result = self.registry_phase(state, cancel);
        state.summary.registry_duration = start.elapsed();
        result?;

        let start = Instant::now();
        let result = self.filesystem_phase(&volumes, state, cancel);
        state.summary.filesystem_duration = start.elapsed();
        result
    }

    fn catalog_phase(
        &self,
        volumes: &[Volume],
        state: &mut ScanState,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        info!("Checking {} known games...", self.catalog.len());
        state.sink.progress("Checking known games...".to_string());
        let matcher = KnownCatalogMatcher::new(self.env.as_ref());

        let mut pending: Vec<&KnownGameDescriptor> = Vec::new();
        for descriptor in &self.catalog {
            if descriptor.is_complete() {
                pending.push(descriptor);
            } else {
                debug!("Ignoring incomplete catalog entry {}", descriptor.name);
            }
        }

        // Volumes in order, so the first volume holding a game wins and the
        // game is not looked for on later volumes.
        for volume in volumes {
            if pending.is_empty() {
                break;
            }
            cancel.check()?;
            state.sink.progress(format!(
                "Checking known games on {}...",
                volume.root.display()
            ));

            let mut missing = Vec::with_capacity(pending.len());
            for descriptor in pending {
                cancel.check()?;
                match self.locate_on_volume(&matcher, descriptor, volume) {
                    Some(app) => {
                        state.processed.insert(&app.executable_path);
                        state.publish(app);
                    }
                    None => missing.push(descriptor),
                }
            }
            pending = missing;
        }
        Ok(())
    }

    /// Catalog record for `descriptor` if its executable exists on `volume`.
    fn locate_on_volume(
        &self,
        matcher: &KnownCatalogMatcher,
        descriptor: &KnownGameDescriptor,
        volume: &Volume,
    ) -> Option<DiscoveredApplication> {
        let candidate = matcher.candidate(descriptor, volume)?;
        if !candidate.is_file() {
            return None;
        }
        let executable_path = match platform::canonicalize(&candidate) {
            Ok(path) => path,
            Err(e) => {
                warn!("Error canonicalizing {}: {}", candidate.display(), e);
                return None;
            }
        };
        let mut app = DiscoveredApplication::from_executable(executable_path, Source::KnownCatalog);
        app.name = descriptor.name.clone();
        app.save_path = matcher.resolve_save_path(descriptor);
        Some(app)
    }

    fn registry_phase(&self, state: &mut ScanState, cancel: &CancellationToken) -> Result<(), Cancelled> {
        if !self.config.use_registry {
            debug!("Registry phase disabled");
            return Ok(());
        }
        cancel.check()?;
        info!("Reading installed programs...");
        state.sink.progress("Reading installed programs...".to_string());

        let paths = match self.registry.executable_paths() {
            Ok(paths) => paths,
            Err(e) => {
                state.fail(format!("Installed program enumeration failed: {}", e));
                return Ok(());
            }
        };

        let stride = self.config.cancel_check_stride.max(1);
        for (i, raw) in paths.iter().enumerate() {
            if i % stride == 0 {
                cancel.check()?;
            }
            let path = Path::new(raw.trim().trim_matches('"'));
            let size = match fs::metadata(path) {
                Ok(metadata) if metadata.is_file() => metadata.len(),
                Ok(_) => continue,
                Err(e) => {
                    debug!("Registry entry {} is not readable: {}", path.display(), e);
                    continue;
                }
            };
            self.consider(path, size, Source::Registry, state);
        }
        Ok(())
    }

    fn filesystem_phase(
        &self,
        volumes: &[Volume],
        state: &mut ScanState,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        cancel.check()?;
        let roots = build_search_roots(volumes, self.env.as_ref(), &self.config);
        info!("Scanning {} folders for games...", roots.len());

        let sink = state.sink;
        let mut crawler = FilesystemCrawler::new(&self.policy, &self.classifier, &self.config, cancel);

        for (i, root) in roots.iter().enumerate() {
            cancel.check()?;
            sink.progress(format!(
                "Scanning path {} of {}: {}",
                i + 1,
                roots.len(),
                root.display()
            ));

            let result = crawler.crawl(
                root,
                &mut |exe: ExecutableInfo| {
                    // Crawled files are already classified.
                    self.accept(exe, Source::FilesystemHeuristic, state)
                },
                &mut |count, dir| {
                    sink.progress(format!("Scanned {} folders, now in {}", count, dir.display()))
                },
            );
            state.summary.directories_visited = crawler.stats().directories_visited;
            result?;
        }
        Ok(())
    }

    /// Classify an executable from the registry and publish it if it passes.
    fn consider(&self, path: &Path, size: u64, source: Source, state: &mut ScanState) {
        let executable_path = match platform::canonicalize(path) {
            Ok(p) => p,
            Err(e) => {
                warn!("Error canonicalizing {}: {}", path.display(), e);
                return;
            }
        };
        if !state.processed.insert(&executable_path) {
            return;
        }
        let exe = ExecutableInfo::new(executable_path, size);
        let decision = self.classifier.explain(&exe);
        if decision.is_skip() {
            debug!("Skipping {} ({})", exe.path.display(), decision.rule);
            return;
        }
        state.publish(DiscoveredApplication::from_executable(exe.path, source));
    }

    fn accept(&self, exe: ExecutableInfo, source: Source, state: &mut ScanState) {
        let executable_path = match platform::canonicalize(&exe.path) {
            Ok(p) => p,
            Err(e) => {
                warn!("Error canonicalizing {}: {}", exe.path.display(), e);
                return;
            }
        };
        if state.processed.insert(&executable_path) {
            state.publish(DiscoveredApplication::from_executable(executable_path, source));
        }
    }
}

/// A discovery running on its own thread.
pub struct DiscoveryHandle {
    events: Receiver<DiscoveryEvent>,
    cancel: CancellationToken,
    thread: JoinHandle<DiscoveryOutcome>,
}

impl DiscoveryHandle {
    /// Events in emission order; the iterator ends once the run has finished.
    pub fn events(&self) -> &Receiver<DiscoveryEvent> {
        &self.events
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn join(self) -> Result<DiscoveryOutcome, Error> {
        self.thread
            .join()
            .map_err(|_| Error::Other("discovery thread panicked".to_string()))
    }
}
