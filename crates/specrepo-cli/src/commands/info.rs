//! Info command - exact package lookup

use crate::display::{self, PackageSetJson};
use crate::error::{CliError, Result};

use super::GlobalOptions;

pub fn run(options: &GlobalOptions, name: &str, json_output: bool) -> Result<()> {
    let manager = options.manager()?;
    manager.ensure_master_repository_functional()?;

    let set = manager.search(name)?.ok_or_else(|| {
        CliError::not_found(
            format!("Unable to find a package named `{}`", name),
            format!("Run `specrepo search {} --full-text` to look for similar packages", name),
        )
    })?;

    if json_output {
        let json = serde_json::to_string_pretty(&PackageSetJson::from(&set))
            .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", json);
        return Ok(());
    }

    display::print_package_set(&set);
    Ok(())
}
