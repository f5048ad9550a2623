// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use path_clean::clean;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "veil.config.yaml";

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Walk up from `path` looking for `filename`
pub fn find_in_parent(path: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = path.to_path_buf();

    loop {
        let file_path = current.join(filename);
        if file_path.exists() {
            return Some(file_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Where the configuration lives and whether the caller asked for it explicitly
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigLocation {
    /// Passed on the command line. A missing file is an error.
    Explicit(PathBuf),
    /// Found by searching upward from the working directory.
    Discovered(PathBuf),
    /// Nothing found; the OS config dir is where it would live.
    Default(PathBuf),
}

impl ConfigLocation {
    pub fn path(&self) -> &Path {
        match self {
            ConfigLocation::Explicit(p) => p,
            ConfigLocation::Discovered(p) => p,
            ConfigLocation::Default(p) => p,
        }
    }
}

pub fn resolve_config_path(
    find_in_parent: FindInParent,
    cwd: &Path,
    default_config_dir: &Path,
    default_filename: &str,
    cli_file: Option<&Path>,
) -> ConfigLocation {
    if let Some(cli_file) = cli_file {
        if cli_file.is_absolute() {
            return ConfigLocation::Explicit(cli_file.to_path_buf());
        }
        return ConfigLocation::Explicit(clean(cwd.join(cli_file)));
    }

    if let Some(found) = find_in_parent(cwd, default_filename) {
        return ConfigLocation::Discovered(found);
    }

    ConfigLocation::Default(clean(default_config_dir.join(default_filename)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found(_: &Path, _: &str) -> Option<PathBuf> {
        None
    }

    fn found(_: &Path, _: &str) -> Option<PathBuf> {
        Some(PathBuf::from("/foo/veil.config.yaml"))
    }

    #[test]
    fn test_resolve_cli() {
        let location = resolve_config_path(
            not_found,
            Path::new("/foo/bar"),
            Path::new("/my/config"),
            DEFAULT_CONFIG_NAME,
            None,
        );
        assert_eq!(
            location,
            ConfigLocation::Default(PathBuf::from("/my/config/veil.config.yaml"))
        );

        let location = resolve_config_path(
            found,
            Path::new("/foo/bar"),
            Path::new("/my/config"),
            DEFAULT_CONFIG_NAME,
            Some(Path::new("/my/absolute/conf.yaml")),
        );
        assert_eq!(
            location,
            ConfigLocation::Explicit(PathBuf::from("/my/absolute/conf.yaml"))
        );

        let location = resolve_config_path(
            found,
            Path::new("/foo/bar"),
            Path::new("/my/config"),
            DEFAULT_CONFIG_NAME,
            Some(Path::new("../conf.yaml")),
        );
        assert_eq!(location.path(), Path::new("/foo/conf.yaml"));

        let location = resolve_config_path(
            found,
            Path::new("/foo/bar"),
            Path::new("/my/config"),
            DEFAULT_CONFIG_NAME,
            None,
        );
        assert_eq!(
            location,
            ConfigLocation::Discovered(PathBuf::from("/foo/veil.config.yaml"))
        );
    }
}
