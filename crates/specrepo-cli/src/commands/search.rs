//! Search command

use crate::display::{self, PackageSetJson};
use crate::error::{CliError, Result};

use super::GlobalOptions;

/// Search packages across every spec repository
pub fn run(options: &GlobalOptions, query: &str, full_text: bool, json_output: bool) -> Result<()> {
    let mut manager = options.manager()?;
    manager.ensure_master_repository_functional()?;

    let sets = manager.search_by_name(query, full_text)?;

    if json_output {
        let rows: Vec<_> = sets.iter().map(PackageSetJson::from).collect();
        let json = serde_json::to_string_pretty(&rows)
            .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", json);
        return Ok(());
    }

    if sets.is_empty() {
        println!("No packages found matching '{}'", query);
        return Ok(());
    }

    display::print_search_results(&sets);
    Ok(())
}
