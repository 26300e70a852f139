//! Scan command: list discovered migration scripts.

use anyhow::Result;

use crate::cli::{GlobalArgs, ScanArgs, ScanOutput};
use crate::commands::common::{build_filter, load_config, print_table, scripts_path};

pub async fn execute(args: &ScanArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let path = scripts_path(args.path.as_deref(), &config);
    if global.verbose {
        eprintln!("[verbose] Scanning {}", path.display());
    }

    let filter = build_filter(&args.filter, &args.levels)?;
    let scripts = dbm_core::load_scripts(&path, filter.as_ref())?;

    if args.output == ScanOutput::Json {
        println!("{}", serde_json::to_string_pretty(&scripts)?);
        return Ok(());
    }

    if scripts.is_empty() {
        println!("Found no scripts.");
        return Ok(());
    }
    println!("Found {} script(s)", scripts.len());

    match args.output {
        ScanOutput::Table => {
            let rows: Vec<Vec<String>> = scripts
                .iter()
                .map(|s| {
                    vec![
                        s.version().to_string(),
                        s.name().to_string(),
                        s.relative_path().to_string(),
                    ]
                })
                .collect();
            print_table(&["VERSION", "NAME", "PATH"], &rows);
        }
        ScanOutput::Name => {
            for s in &scripts {
                println!("{}", s.name());
            }
        }
        ScanOutput::Path => {
            for s in &scripts {
                println!("{}", s.relative_path());
            }
        }
        ScanOutput::Version => {
            for s in &scripts {
                println!("{}", s.version());
            }
        }
        ScanOutput::VersionName => {
            for s in &scripts {
                println!("{}, {}", s.version(), s.name());
            }
        }
        ScanOutput::VersionPath => {
            for s in &scripts {
                println!("{}, {}", s.version(), s.relative_path());
            }
        }
        ScanOutput::Json => unreachable!("handled above"),
    }

    Ok(())
}
