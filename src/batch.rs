use crate::codec::Codec;
use crate::compressor::{load_failures, Compressor, OutputTarget};
use crate::config::EngineConfig;
use crate::constants::MIN_AVAILABLE_MEMORY_MIB;
use crate::decision::Overrides;
use crate::error::{CompressionError, Result};
use crate::formats::ImageKind;
use crate::result::{BatchResult, CompressionResult};
use crate::utils::{create_progress_bar, is_image_file};
use glob::Pattern;
use rayon::prelude::*;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;
use sysinfo::{MemoryRefreshKind, RefreshKind, System};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub recursive: bool,
    /// Mirror root for outputs; `None` writes next to each source
    pub output_dir: Option<PathBuf>,
    /// Overrides `batch.workers` from the config
    pub workers: Option<usize>,
    pub progress: bool,
}

/// Fails fast when the batch root cannot be walked at all.
pub fn check_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(CompressionError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CompressionError::RootNotDirectory(root.to_path_buf()));
    }
    fs::read_dir(root).map_err(|e| CompressionError::RootUnreadable {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Lists image files under `root` in a stable, name-sorted order.
///
/// Hidden entries, directories matching `exclude`, and `skip_dir` (typically an
/// output directory nested inside the root) are pruned without descending.
pub fn discover_images(
    root: &Path,
    recursive: bool,
    exclude: &[Pattern],
    skip_dir: Option<&Path>,
) -> Vec<PathBuf> {
    let skip_dir = skip_dir.and_then(|dir| dir.canonicalize().ok());

    let mut walker = WalkDir::new(root).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let keep = |entry: &DirEntry| -> bool {
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            return false;
        }
        if entry.file_type().is_dir() {
            if exclude.iter().any(|pattern| pattern.matches(&name)) {
                return false;
            }
            if let Some(skip) = &skip_dir {
                if entry.path().canonicalize().ok().as_ref() == Some(skip) {
                    return false;
                }
            }
        }
        true
    };

    let mut image_files = Vec::new();
    for entry in walker.into_iter().filter_entry(keep) {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_image_file(entry.path()) => {
                image_files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "skipping unreadable entry"),
        }
    }
    image_files
}

/// Where outputs for `file` go: its directory mirrored under `output_root`,
/// or the file's own directory.
pub fn output_dir_for(root: &Path, file: &Path, output_root: Option<&Path>) -> PathBuf {
    let parent = file.parent().unwrap_or(root);
    match output_root {
        None => parent.to_path_buf(),
        Some(output_root) => match parent.strip_prefix(root) {
            Ok(relative) => output_root.join(relative),
            Err(_) => output_root.to_path_buf(),
        },
    }
}

/// Estimates decoded memory for an image file without loading it.
///
/// Conservative multiples of the file size: decoded buffers of compressed
/// formats are several times their encoded size.
fn estimate_image_memory_mib(file_path: &Path) -> Result<f64> {
    let file_size_mib = fs::metadata(file_path)?.len() as f64 / (1024.0 * 1024.0);

    let multiplier = match ImageKind::from_path(file_path) {
        Some(ImageKind::Jpeg) => 4.0,
        Some(ImageKind::Png) => 3.0,
        Some(ImageKind::WebP) => 3.5,
        Some(ImageKind::Bmp) | Some(ImageKind::Tiff) => 1.2,
        Some(ImageKind::Gif) => 2.0,
        None => 3.0,
    };

    Ok(file_size_mib * multiplier)
}

/// Pool size: the requested count, or CPU parallelism capped by how many
/// average-sized decodes fit in available memory.
pub fn worker_count(requested: Option<usize>, files: &[PathBuf]) -> usize {
    if let Some(workers) = requested {
        return workers.max(1);
    }
    let baseline = num_cpus::get().min(files.len()).max(1);
    if files.is_empty() {
        return baseline;
    }

    let estimated_mib: f64 = files
        .iter()
        .filter_map(|path| estimate_image_memory_mib(path).ok())
        .sum();
    let avg_per_file_mib = ((estimated_mib / files.len() as f64).ceil() as u64).max(1);

    // sysinfo 0.30+ reports bytes
    let mut sys = System::new_with_specifics(RefreshKind::new().with_memory(MemoryRefreshKind::new()));
    sys.refresh_memory();
    let available_mem_mib = sys.available_memory() / (1024 * 1024);

    let mem_cap = (available_mem_mib.saturating_sub(MIN_AVAILABLE_MEMORY_MIB) / avg_per_file_mib)
        .clamp(1, baseline as u64) as usize;
    debug!(baseline, mem_cap, avg_per_file_mib, available_mem_mib, "sized worker pool");
    mem_cap
}

/// Compresses every image under `root`. Only root preconditions and pool
/// construction fail the call; per-file problems become failed results.
pub fn run_batch<C: Codec + ?Sized>(
    root: &Path,
    overrides: &Overrides,
    options: &BatchOptions,
    codec: &C,
    config: &EngineConfig,
) -> Result<BatchResult> {
    check_root(root)?;

    let exclude = config
        .batch
        .exclude_dirs
        .iter()
        .map(|pattern| Pattern::new(pattern))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let start_time = Instant::now();
    let image_files = discover_images(root, options.recursive, &exclude, options.output_dir.as_deref());
    if image_files.is_empty() {
        warn!(root = %root.display(), "no image files found");
        return Ok(BatchResult::new(root.to_path_buf(), options.output_dir.clone(), Vec::new()));
    }

    let workers = worker_count(options.workers.or(config.batch.workers), &image_files);
    info!(
        root = %root.display(),
        files = image_files.len(),
        workers,
        "starting batch"
    );

    // Scoped pool so the chosen parallelism never leaks into the global one
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| CompressionError::WorkerPool(e.to_string()))?;

    let progress = create_progress_bar(image_files.len() as u64, options.progress);
    let compressor = Compressor::new(codec, config);

    // Indexed collect: slot order is discovery order whatever the completion order
    let per_file: Vec<Vec<CompressionResult>> = pool.install(|| {
        image_files
            .par_iter()
            .map(|path| {
                let target = OutputTarget::Directory(output_dir_for(root, path, options.output_dir.as_deref()));
                let results = panic::catch_unwind(AssertUnwindSafe(|| {
                    compressor.compress_file(path, overrides, &target)
                }))
                .unwrap_or_else(|_| {
                    warn!(path = %path.display(), "worker panicked");
                    load_failures(path, overrides, &CompressionError::WorkerPanic(path.clone()))
                });
                progress.inc(1);
                results
            })
            .collect()
    });
    progress.finish_and_clear();

    let batch = BatchResult::new(
        root.to_path_buf(),
        options.output_dir.clone(),
        per_file.into_iter().flatten().collect(),
    );
    info!(
        succeeded = batch.success_count(),
        failed = batch.failure_count(),
        saved_bytes = batch.total_size_saved(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "batch finished"
    );
    Ok(batch)
}
