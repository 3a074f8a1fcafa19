//! IDX/PKG archive access by path.
//!
//! [`PkgArchive`] parses the whole index up front and keeps only the PKG
//! path; every extraction run opens its own handle(s) on the payload file,
//! so parallel workers never share a read cursor.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::entry::EntryDescriptor;
use crate::extract::{read_payload, write_payload};
use crate::filter::EntryFilter;
use crate::header::ArchiveHeader;
use crate::index::read_index;
use crate::{Error, Result};

/// What a run does when an entry fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failing entry and return its error.
    #[default]
    FailFast,
    /// Record the failure in the [`ExtractReport`] and carry on.
    Continue,
}

/// Shared flag for cancelling a run between entries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Entries already in progress still finish.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Options for [`PkgArchive::extract_all`] and [`PkgArchive::verify_all`].
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Only process entries whose name matches this pattern (see [`EntryFilter`]).
    pub filter: Option<String>,
    /// Failure handling.
    pub policy: FailurePolicy,
    /// Process entries on the rayon pool. Needs the `parallel` feature.
    pub parallel: bool,
    /// Checked before each entry.
    pub cancel: CancelToken,
}

impl ExtractOptions {
    pub fn with_filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter = Some(pattern.into());
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Outcome of an extraction or verification run.
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Entries completed successfully.
    pub processed: usize,
    /// Total decompressed bytes of the completed entries.
    pub bytes: u64,
    /// Per-entry failures, in index order. Only filled under
    /// [`FailurePolicy::Continue`].
    pub failures: Vec<Error>,
}

impl ExtractReport {
    /// Whether every selected entry succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, result: Result<u64>, policy: FailurePolicy) -> Result<()> {
        match result {
            Ok(bytes) => {
                self.processed += 1;
                self.bytes += bytes;
            }
            Err(err) => match policy {
                FailurePolicy::FailFast => return Err(err),
                FailurePolicy::Continue => {
                    warn!("{}", err);
                    self.failures.push(err);
                }
            },
        }
        Ok(())
    }
}

/// An opened IDX/PKG archive pair.
pub struct PkgArchive {
    /// Archive name (IDX file name)
    name: String,
    /// Payload file, opened per run
    pkg_path: PathBuf,
    header: ArchiveHeader,
    entries: Vec<EntryDescriptor>,
}

impl PkgArchive {
    /// Parse the index at `idx_path` and pair it with the payload at `pkg_path`.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(idx_path: P, pkg_path: Q) -> Result<Self> {
        let idx_path = idx_path.as_ref();
        let pkg_path = pkg_path.as_ref().to_path_buf();

        let idx = File::open(idx_path)?;
        let (header, entries) = read_index(BufReader::new(idx))?;

        let pkg_len = fs::metadata(&pkg_path)?.len();

        let name = idx_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        info!(
            archive = %name,
            entries = entries.len(),
            pkg_bytes = pkg_len,
            "opened archive"
        );

        Ok(Self {
            name,
            pkg_path,
            header,
            entries,
        })
    }

    /// Get the archive name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// All entries, in index order.
    #[inline]
    pub fn entries(&self) -> &[EntryDescriptor] {
        &self.entries
    }

    /// Get the number of entries.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &EntryDescriptor> + '_ {
        self.entries.iter()
    }

    /// Get entry by index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&EntryDescriptor> {
        self.entries.get(index)
    }

    /// Find an entry by name (case-insensitive, either separator).
    pub fn find(&self, name: &str) -> Option<&EntryDescriptor> {
        let normalized = name.replace('\\', "/");
        self.entries
            .iter()
            .find(|e| e.name.replace('\\', "/").eq_ignore_ascii_case(&normalized))
    }

    /// Entries matching `filter`, in index order.
    pub fn select(&self, filter: Option<&str>) -> Result<Vec<&EntryDescriptor>> {
        let filter = filter.map(EntryFilter::new).transpose()?;
        Ok(self
            .entries
            .iter()
            .filter(|e| filter.as_ref().map_or(true, |f| f.matches(&e.name)))
            .collect())
    }

    /// Read entry contents - seeks, decompresses and validates.
    pub fn read(&self, entry: &EntryDescriptor) -> Result<Vec<u8>> {
        let mut pkg = File::open(&self.pkg_path)?;
        read_payload(&mut pkg, entry)
    }

    /// Extract the selected entries below `output_root`.
    ///
    /// `progress` is called once per attempted entry with the decompressed
    /// size or the entry's error. In parallel runs it is called from worker
    /// threads in completion order.
    pub fn extract_all<P, F>(
        &self,
        output_root: P,
        options: &ExtractOptions,
        progress: F,
    ) -> Result<ExtractReport>
    where
        P: AsRef<Path>,
        F: Fn(&EntryDescriptor, std::result::Result<u64, &Error>) + Sync,
    {
        let root = output_root.as_ref();
        fs::create_dir_all(root)?;

        self.run(options, progress, |pkg, entry| {
            let data = read_payload(pkg, entry)?;
            let path = write_payload(entry, &data, root)?;
            debug!(name = %entry.name, path = %path.display(), bytes = data.len(), "extracted");
            Ok(data.len() as u64)
        })
    }

    /// Decompress and validate the selected entries without writing anything.
    pub fn verify_all<F>(&self, options: &ExtractOptions, progress: F) -> Result<ExtractReport>
    where
        F: Fn(&EntryDescriptor, std::result::Result<u64, &Error>) + Sync,
    {
        self.run(options, progress, |pkg, entry| {
            let data = read_payload(pkg, entry)?;
            debug!(name = %entry.name, bytes = data.len(), "verified");
            Ok(data.len() as u64)
        })
    }

    fn run<F, O>(&self, options: &ExtractOptions, progress: F, op: O) -> Result<ExtractReport>
    where
        F: Fn(&EntryDescriptor, std::result::Result<u64, &Error>) + Sync,
        O: Fn(&mut File, &EntryDescriptor) -> Result<u64> + Sync,
    {
        let selected = self.select(options.filter.as_deref())?;
        info!(
            selected = selected.len(),
            total = self.entries.len(),
            policy = ?options.policy,
            parallel = options.parallel,
            "processing entries"
        );

        if options.parallel {
            #[cfg(feature = "parallel")]
            return self.run_parallel(&selected, options, progress, op);

            #[cfg(not(feature = "parallel"))]
            warn!("built without the `parallel` feature, processing sequentially");
        }

        self.run_sequential(&selected, options, progress, op)
    }

    fn run_sequential<F, O>(
        &self,
        selected: &[&EntryDescriptor],
        options: &ExtractOptions,
        progress: F,
        op: O,
    ) -> Result<ExtractReport>
    where
        F: Fn(&EntryDescriptor, std::result::Result<u64, &Error>),
        O: Fn(&mut File, &EntryDescriptor) -> Result<u64>,
    {
        let mut pkg = File::open(&self.pkg_path)?;
        let mut report = ExtractReport::default();

        for &entry in selected {
            if options.cancel.is_cancelled() {
                info!(processed = report.processed, "cancelled");
                return Err(Error::Cancelled);
            }

            let result = op(&mut pkg, entry);
            progress(entry, result.as_ref().copied());
            report.record(result, options.policy)?;
        }

        Ok(report)
    }

    #[cfg(feature = "parallel")]
    fn run_parallel<F, O>(
        &self,
        selected: &[&EntryDescriptor],
        options: &ExtractOptions,
        progress: F,
        op: O,
    ) -> Result<ExtractReport>
    where
        F: Fn(&EntryDescriptor, std::result::Result<u64, &Error>) + Sync,
        O: Fn(&mut File, &EntryDescriptor) -> Result<u64> + Sync,
    {
        use rayon::prelude::*;

        use crate::extract::ExtractStage;

        let abort = AtomicBool::new(false);

        // One PKG handle per worker; `None` marks entries skipped after
        // cancellation or a fail-fast abort.
        let outcomes: Vec<Option<Result<u64>>> = selected
            .par_iter()
            .map_init(
                || File::open(&self.pkg_path),
                |pkg, &entry| {
                    if options.cancel.is_cancelled() || abort.load(Ordering::Relaxed) {
                        return None;
                    }

                    let result = match pkg {
                        Ok(file) => op(file, entry),
                        Err(e) => Err(Error::from(std::io::Error::new(e.kind(), e.to_string()))
                            .in_entry(entry, ExtractStage::Seeking)),
                    };

                    progress(entry, result.as_ref().copied());
                    if result.is_err() && options.policy == FailurePolicy::FailFast {
                        abort.store(true, Ordering::Relaxed);
                    }
                    Some(result)
                },
            )
            .collect();

        let mut report = ExtractReport::default();
        let mut skipped = false;
        for outcome in outcomes {
            match outcome {
                Some(result) => report.record(result, options.policy)?,
                None => skipped = true,
            }
        }

        if skipped && options.cancel.is_cancelled() {
            info!(processed = report.processed, "cancelled");
            return Err(Error::Cancelled);
        }

        Ok(report)
    }
}

impl std::fmt::Debug for PkgArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkgArchive")
            .field("name", &self.name)
            .field("pkg_path", &self.pkg_path)
            .field("entries", &self.entries.len())
            .finish()
    }
}
