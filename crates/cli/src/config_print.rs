// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use veil_config::ProtocolConfig;

const REDACTED: &str = "<redacted>";

fn printable(config: &ProtocolConfig, show_secrets: bool) -> ProtocolConfig {
    let mut config = config.clone();
    if !show_secrets && config.oracle.private_key.is_some() {
        config.oracle.private_key = Some(REDACTED.to_string());
    }
    config
}

pub fn execute(config: &ProtocolConfig, show_secrets: bool) -> Result<()> {
    print!("{}", printable(config, show_secrets).to_yaml()?);
    Ok(())
}
