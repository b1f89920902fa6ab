/// Parallel file processing module for sift
///
/// Files are linted on a bounded rayon pool. Every worker only reads the
/// shared linter; results come back in input order.
use std::sync::atomic::{AtomicBool, Ordering};

use crate::linter::{FileOutcome, Linter, SourceFile};

/// Configuration for parallel execution
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Enable/disable parallel execution
    pub enabled: bool,
    /// Number of threads to use (None = auto-detect)
    pub thread_count: Option<usize>,
    /// Minimum number of files to enable parallel execution
    pub min_file_count: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            thread_count: None, // Auto-detect based on CPU cores
            min_file_count: 2,  // At least 2 files to benefit from parallelization
        }
    }
}

/// File-level parallel processing for multiple files
pub struct FileParallelProcessor {
    config: ParallelConfig,
}

impl FileParallelProcessor {
    pub fn new(config: ParallelConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(ParallelConfig::default())
    }

    /// Lint every file, in parallel when worthwhile.
    pub fn process_files(&self, files: &[SourceFile], linter: &Linter) -> Vec<FileOutcome> {
        self.process_files_cancellable(files, linter, None)
    }

    /// Like [`process_files`](Self::process_files), but files not yet started
    /// when `cancel` becomes true are reported as [`FileOutcome::Cancelled`].
    pub fn process_files_cancellable(
        &self,
        files: &[SourceFile],
        linter: &Linter,
        cancel: Option<&AtomicBool>,
    ) -> Vec<FileOutcome> {
        let lint_one = |file: &SourceFile| {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                FileOutcome::Cancelled {
                    path: file.path.clone(),
                }
            } else {
                linter.lint_file(file)
            }
        };

        if !self.should_use_parallel(files) {
            return files.iter().map(lint_one).collect();
        }
        self.run_parallel(files, lint_one)
    }

    #[cfg(feature = "parallel")]
    fn run_parallel<F>(&self, files: &[SourceFile], lint_one: F) -> Vec<FileOutcome>
    where
        F: Fn(&SourceFile) -> FileOutcome + Sync,
    {
        use rayon::prelude::*;

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(thread_count) = self.config.thread_count {
            builder = builder.num_threads(thread_count);
        }
        match builder.build() {
            Ok(pool) => pool.install(|| files.par_iter().map(&lint_one).collect()),
            Err(e) => {
                log::warn!("Failed to build thread pool, linting sequentially: {e}");
                files.iter().map(lint_one).collect()
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run_parallel<F>(&self, files: &[SourceFile], lint_one: F) -> Vec<FileOutcome>
    where
        F: Fn(&SourceFile) -> FileOutcome + Sync,
    {
        files.iter().map(lint_one).collect()
    }

    /// Determine if file-level parallel processing should be used
    pub fn should_use_parallel(&self, files: &[SourceFile]) -> bool {
        if !cfg!(feature = "parallel") || !self.config.enabled {
            return false;
        }

        // Need at least minimum files to benefit from parallelization
        if files.len() < self.config.min_file_count {
            return false;
        }

        // Check if we have enough threads
        let threads = self.config.thread_count.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        threads >= 2
    }
}
