use std::io::{Read, Write};
use std::sync::Arc;

use mkbom_ledger::{snapshot, DependencyLedger, MakeWriter};
use mkbom_store::{
    BomBuilder, BuildContext, FsObjectStore, HandleTracker, MetadataRecorder, ObjectStore,
};
use mkbom_types::HashAlgorithm;
use tracing::{debug, warn};

use crate::config::BomConfig;
use crate::error::SdkResult;
use crate::report::{AlgorithmReport, SessionReport};

/// One build step's dependency tracking and provenance output.
///
/// The driver records targets and dependencies on the session's ledger as
/// the step runs, then calls [`finish`](Self::finish) once. Provenance is
/// best effort: `finish` never fails, it reports what could not be recorded.
pub struct Session {
    config: BomConfig,
    ledger: DependencyLedger,
    tracker: HandleTracker,
    store: Arc<dyn ObjectStore>,
}

impl Session {
    /// Start a session. The configured vpath specs apply from the start.
    ///
    /// Documents go to an [`FsObjectStore`] under the configured root.
    pub fn new(config: BomConfig) -> SdkResult<Self> {
        let tracker = HandleTracker::new();
        let store = FsObjectStore::with_tracker(&config.root, tracker.clone());
        Self::build(config, tracker, Arc::new(store))
    }

    /// Start a session that files documents in `store`. Metadata is still
    /// written under the configured root.
    pub fn with_store(config: BomConfig, store: Arc<dyn ObjectStore>) -> SdkResult<Self> {
        Self::build(config, HandleTracker::new(), store)
    }

    fn build(
        config: BomConfig,
        tracker: HandleTracker,
        store: Arc<dyn ObjectStore>,
    ) -> SdkResult<Self> {
        config.validate()?;
        let mut ledger = DependencyLedger::new();
        for spec in &config.vpath {
            ledger.add_vpath(spec);
        }
        Ok(Self {
            config,
            ledger,
            tracker,
            store,
        })
    }

    pub fn config(&self) -> &BomConfig {
        &self.config
    }

    pub fn ledger(&self) -> &DependencyLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut DependencyLedger {
        &mut self.ledger
    }

    /// Directory handles opened on behalf of this session.
    pub fn tracker(&self) -> &HandleTracker {
        &self.tracker
    }

    /// Where this session files BOM documents.
    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    // ---- Ledger persistence ----

    /// Append the dependencies of an earlier step, except `self_path`.
    pub fn load_snapshot<R: Read>(&mut self, input: R, self_path: Option<&str>) -> SdkResult<usize> {
        Ok(snapshot::restore(&mut self.ledger, input, self_path)?)
    }

    /// Persist the dependency list for a later step.
    pub fn save_snapshot<W: Write>(&self, out: W) -> SdkResult<()> {
        Ok(snapshot::save(&self.ledger, out)?)
    }

    /// Write Make rules for the recorded dependencies.
    pub fn write_make_rules<W: Write>(&self, out: W) -> SdkResult<()> {
        let mut writer = MakeWriter::new(out, self.config.make.clone());
        writer.write(&self.ledger)?;
        Ok(())
    }

    // ---- Provenance ----

    /// Build, store, and describe a BOM for every configured algorithm.
    pub fn finish(&self, context: &BuildContext) -> SessionReport {
        let algorithms = self
            .config
            .algorithms
            .iter()
            .map(|&algorithm| {
                self.record(algorithm, context).unwrap_or_else(|e| {
                    warn!(%algorithm, error = %e, "no provenance recorded");
                    AlgorithmReport::failed(algorithm, e.to_string())
                })
            })
            .collect();
        SessionReport { algorithms }
    }

    fn record(&self, algorithm: HashAlgorithm, context: &BuildContext) -> SdkResult<AlgorithmReport> {
        let (document, scan) = BomBuilder::new(algorithm).build(self.ledger.dependencies())?;

        let id = self.store.write(&document)?;

        let recorder = MetadataRecorder::with_tracker(&self.config.root, self.tracker.clone());
        let metadata_path =
            recorder.record(algorithm, context, self.ledger.primary_input(), &scan.records)?;

        debug!(
            %algorithm,
            document = %id,
            entries = document.len(),
            metadata = metadata_path.is_some(),
            "provenance recorded"
        );

        Ok(AlgorithmReport {
            algorithm,
            object_path: self.store.location(&id),
            document: Some(id),
            metadata_path,
            entries: document.len(),
            skipped: scan.skipped,
            error: None,
        })
    }
}
