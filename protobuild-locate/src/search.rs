//! `PATH` search for executables.

use camino::{Utf8Path, Utf8PathBuf};
use protobuild_types::{OsFamily, with_exe_suffix};
use std::ffi::OsString;
use tracing::debug;

/// Where the search list comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchPath {
    /// Read `PATH` from the process environment at search time.
    #[default]
    Env,
    /// Use this value as if it were `PATH`; `None` means unset.
    Value(Option<OsString>),
}

impl SearchPath {
    fn value(&self) -> Option<OsString> {
        match self {
            SearchPath::Env => std::env::var_os("PATH"),
            SearchPath::Value(v) => v.clone(),
        }
    }
}

/// Find `name` as an existing file or in one of the search directories.
///
/// An unset search path falls back to the platform default list; an empty
/// one matches nothing. An entry that is itself empty (as in `PATH=":"`)
/// refers to the current directory.
pub fn find_executable(name: &str, search: &SearchPath, os: &OsFamily) -> Option<Utf8PathBuf> {
    let name = with_exe_suffix(name, os);

    if Utf8Path::new(&name).is_file() {
        return Some(Utf8PathBuf::from(name));
    }

    let path = search
        .value()
        .unwrap_or_else(|| OsString::from(os.default_search_path()));
    if path.is_empty() {
        debug!(executable = %name, "search path is empty");
        return None;
    }

    let found = std::env::split_paths(&path)
        .map(|dir| dir.join(&name))
        .find(|candidate| candidate.is_file())
        .and_then(|candidate| Utf8PathBuf::from_path_buf(candidate).ok());

    debug!(executable = %name, found = ?found, "searched path");
    found
}
