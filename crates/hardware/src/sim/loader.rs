//! Instruction Stream Loader.
//!
//! This module opens per-core instruction files from disk. It provides:
//! 1. **Naming:** The `core_<n>.txt` convention for an input directory.
//! 2. **Opening:** Buffered [`TextSource`]s, with open failures reported as
//!    [`SimError::MissingSource`] for the owning core.
//! 3. **Batch Loading:** One result per core, so a missing file only excludes
//!    its own core from the run.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::common::{CoreId, SimError};
use crate::sim::source::{InstructionSource, TextSource};

/// A boxed, thread-transferable instruction stream.
pub type BoxedSource = Box<dyn InstructionSource>;

/// Returns the conventional path of `core`'s instruction file inside `dir`.
///
/// # Arguments
///
/// * `dir` - Input directory.
/// * `core` - Core id.
///
/// # Returns
///
/// `dir/core_<core>.txt`.
pub fn core_input_path(dir: &Path, core: CoreId) -> PathBuf {
    dir.join(format!("core_{core}.txt"))
}

/// Opens `path` as the instruction stream of `core`.
///
/// # Errors
///
/// Returns [`SimError::MissingSource`] if the file cannot be opened.
pub fn open_source(core: CoreId, path: &Path) -> Result<BoxedSource, SimError> {
    let file = File::open(path).map_err(|source| SimError::MissingSource {
        core,
        path: path.to_path_buf(),
        source,
    })?;
    debug!(core, path = %path.display(), "opened instruction stream");
    Ok(Box::new(TextSource::new(core, BufReader::new(file))))
}

/// Opens one stream per path, in core order.
pub fn open_sources<P: AsRef<Path>>(paths: &[P]) -> Vec<Result<BoxedSource, SimError>> {
    paths
        .iter()
        .enumerate()
        .map(|(core, path)| open_source(core, path.as_ref()))
        .collect()
}

/// Opens `core_0.txt` through `core_<num_cores - 1>.txt` inside `dir`.
pub fn open_dir(dir: &Path, num_cores: usize) -> Vec<Result<BoxedSource, SimError>> {
    (0..num_cores)
        .map(|core| open_source(core, &core_input_path(dir, core)))
        .collect()
}
