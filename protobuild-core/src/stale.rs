//! Source-versus-output modification time comparison.

use crate::error::CodegenError;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use protobuild_types::SchemaUnit;
use std::io::ErrorKind;
use std::time::SystemTime;
use tracing::debug;

/// Decide staleness from a source mtime and per-output mtimes.
///
/// `None` marks a missing output, which always forces regeneration.
/// Otherwise the unit is stale iff the earliest output is strictly older
/// than the source; equal timestamps are up to date.
pub fn stale_by_mtime<I>(source: SystemTime, outputs: I) -> bool
where
    I: IntoIterator<Item = Option<SystemTime>>,
{
    let mut earliest: Option<SystemTime> = None;
    for output in outputs {
        let Some(mtime) = output else {
            return true;
        };
        earliest = Some(earliest.map_or(mtime, |e| e.min(mtime)));
    }
    earliest.is_some_and(|mtime| mtime < source)
}

/// Whether `unit` must be regenerated, with paths resolved under `root`.
///
/// A missing source is an error, not a staleness signal.
pub fn is_stale(root: &Utf8Path, unit: &SchemaUnit) -> Result<bool, CodegenError> {
    let source = abs_path(root, unit.resolved_path());
    let source_mtime = match fs::metadata(&source) {
        Ok(meta) => meta.modified()?,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(CodegenError::MissingSource {
                path: source,
                source: err,
            });
        }
        Err(err) => return Err(err.into()),
    };

    let mut output_mtimes = Vec::with_capacity(unit.outputs().len());
    for output in unit.outputs() {
        let path = abs_path(root, output);
        match fs::metadata(&path) {
            Ok(meta) => output_mtimes.push(Some(meta.modified()?)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(output = %path, "output missing");
                output_mtimes.push(None);
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(stale_by_mtime(source_mtime, output_mtimes))
}

pub(crate) fn abs_path(root: &Utf8Path, rel: &Utf8Path) -> Utf8PathBuf {
    if rel.is_absolute() {
        rel.to_path_buf()
    } else {
        root.join(rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn t(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn missing_output_is_stale() {
        assert!(stale_by_mtime(t(10), [Some(t(20)), None]));
        assert!(stale_by_mtime(t(10), [None]));
    }

    #[test]
    fn older_output_is_stale() {
        assert!(stale_by_mtime(t(10), [Some(t(5))]));
    }

    #[test]
    fn newer_output_is_fresh() {
        assert!(!stale_by_mtime(t(10), [Some(t(15))]));
    }

    #[test]
    fn equal_timestamps_are_fresh() {
        assert!(!stale_by_mtime(t(10), [Some(t(10))]));
    }

    #[test]
    fn earliest_output_decides() {
        assert!(stale_by_mtime(t(10), [Some(t(30)), Some(t(9)), Some(t(40))]));
        assert!(!stale_by_mtime(t(10), [Some(t(30)), Some(t(10)), Some(t(40))]));
    }

    #[test]
    fn no_outputs_is_fresh() {
        assert!(!stale_by_mtime(t(10), []));
    }

    #[test]
    fn absolute_paths_ignore_root() {
        let abs = if cfg!(windows) { r"C:\gen\a_pb2.py" } else { "/gen/a_pb2.py" };
        assert_eq!(abs_path(Utf8Path::new("root"), Utf8Path::new(abs)), Utf8PathBuf::from(abs));
        assert_eq!(
            abs_path(Utf8Path::new("root"), Utf8Path::new("a_pb2.py")),
            Utf8PathBuf::from("root").join("a_pb2.py")
        );
    }
}
