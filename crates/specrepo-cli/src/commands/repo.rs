//! Repository management commands

use console::style;
use specrepo_repo::RepoError;

use super::GlobalOptions;
use crate::display;
use crate::error::{CliError, Result};

/// List spec repositories
pub fn list(options: &GlobalOptions) -> Result<()> {
    let manager = options.manager()?;
    let repos = manager.all()?;

    if repos.is_empty() {
        println!(
            "No spec repositories found in {}",
            manager.config().repos_dir.display()
        );
        return Ok(());
    }

    println!("{:<20} {:<10} PATH", "NAME", "BACKEND");
    println!("{}", "-".repeat(80));

    for repo in &repos {
        println!(
            "{:<20} {:<10} {}",
            repo.name,
            repo.backend.as_str(),
            repo.path.display()
        );
    }

    Ok(())
}

/// Update one repository, or every git repository
pub fn update(options: &GlobalOptions, name: Option<&str>, verbose: bool) -> Result<()> {
    let mut manager = options.manager()?;
    match manager.update(name, verbose) {
        Ok(report) => {
            display::print_update_report(&report);
            Ok(())
        }
        Err(RepoError::UpdateRejected { source, report }) => {
            display::print_update_report(&report);
            Err(CliError::from(*source))
        }
        Err(e) => Err(e.into()),
    }
}

/// Show compatibility metadata and the verdict for the running version
pub fn lint_version(options: &GlobalOptions, name: Option<&str>) -> Result<()> {
    let manager = options.manager()?;
    let checker = manager.compatibility_checker();
    let checks = manager.check_compatibility(name)?;

    println!(
        "{} Checking {} repositories against specrepo {}",
        style("→").blue(),
        checks.len(),
        checker.current_version()
    );

    let mut failures: Vec<RepoError> = Vec::new();

    for check in checks {
        let repo = &check.repository;
        match check.outcome {
            None => println!(
                "  {} {}: no version control, not checked",
                style("-").dim(),
                repo.name
            ),
            Some(Ok(metadata)) => {
                println!("  {} {}", style("✓").green(), repo.name);
                display::print_metadata(&metadata);
                if checker.update_available(&metadata) {
                    if let Some(last) = &metadata.last {
                        println!("    {} specrepo {} is available", style("ℹ").blue(), last);
                    }
                }
            }
            Some(Err(e)) => {
                println!("  {} {}: {}", style("✗").red(), repo.name, e);
                failures.push(e);
            }
        }
    }

    // The first failure carries the repair help; the rest were printed above
    match failures.into_iter().next() {
        Some(first) => Err(CliError::from(first)),
        None => Ok(()),
    }
}
