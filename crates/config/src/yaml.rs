// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use std::{fs, path::Path};

/// Read a yaml file substituting `$VAR` and `${VAR}` from the environment
pub fn load_yaml_with_env(file_path: &Path) -> Result<String> {
    let content = fs::read_to_string(file_path)?;
    Ok(shellexpand::env(&content)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_yaml_env_substitution() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("veil.config.yaml");
        let mut file = File::create(&file_path)?;

        writeln!(
            file,
            "instance: $VEIL_TEST_INSTANCE\noracle:\n  private_key: ${{VEIL_TEST_ORACLE_KEY}}"
        )?;

        env::set_var("VEIL_TEST_INSTANCE", "0x00000000000000000000000000000000000000aa");
        env::set_var("VEIL_TEST_ORACLE_KEY", "0xdeadbeef");

        let processed = load_yaml_with_env(&file_path)?;

        assert!(processed.contains("0x00000000000000000000000000000000000000aa"));
        assert!(processed.contains("0xdeadbeef"));

        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = load_yaml_with_env(Path::new("/definitely/not/here.yaml")).unwrap_err();
        let io = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
    }
}
