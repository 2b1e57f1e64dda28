//! Standalone CLI tool printing a WSL distribution's id and utility VM id.

use std::process::ExitCode;

use clap::Parser;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use wslvm_core::VmReport;

#[derive(Parser, Debug)]
#[command(name = "wslvm-id", about = "Print the WSL distribution and utility VM id")]
struct Args {
    /// Distribution name. If omitted, uses the default distribution.
    #[arg(short, long)]
    distribution: Option<String>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Compact JSON output (no pretty-printing)
    #[arg(long, requires = "json")]
    compact: bool,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn render_text(report: &VmReport) -> String {
    let vm_id = match report.vm_id {
        Some(id) => id.to_string(),
        None => "none (WSL1)".to_owned(),
    };
    let mut out = format!(
        "distribution:  {} ({})\n\
         vm id:         {}\n\
         wsl version:   {}\n\
         windows build: {}",
        report.configuration.name,
        report.distribution_id,
        vm_id,
        report.wsl_version,
        report.windows_build,
    );
    if let Some(initiated) = report
        .initiated_distribution_id
        .filter(|id| *id != report.distribution_id)
    {
        out.push_str(&format!("\ninitiated:     {initiated}"));
    }
    out
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if let Err(e) = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("wslvm-id: logger init failed: {e}");
    }

    let report = match wslvm_core::query_vm(args.distribution.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            log::debug!("query_vm failed: {e:?}");
            eprintln!("wslvm-id: {e}");
            return ExitCode::FAILURE;
        }
    };

    let output = if args.json {
        let json = if args.compact {
            serde_json::to_string(&report)
        } else {
            serde_json::to_string_pretty(&report)
        };
        match json {
            Ok(json) => json,
            Err(e) => {
                eprintln!("wslvm-id: report serialization failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        render_text(&report)
    };

    println!("{output}");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use wslvm_core::distribution::DistributionConfiguration;
    use wslvm_core::Guid;

    #[test]
    fn test_args_default_distribution() {
        let args = Args::try_parse_from(["wslvm-id"]).unwrap();
        assert!(args.distribution.is_none());
        assert!(!args.json);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_named_distribution_json() {
        let args = Args::try_parse_from(["wslvm-id", "-d", "Debian", "--json", "--compact"]).unwrap();
        assert_eq!(args.distribution.as_deref(), Some("Debian"));
        assert!(args.json);
        assert!(args.compact);
    }

    #[test]
    fn test_args_compact_requires_json() {
        assert!(Args::try_parse_from(["wslvm-id", "--compact"]).is_err());
    }

    #[test]
    fn test_render_text() {
        let id = Guid::from_u128(0x0b2a4d7e_1c3f_4a8b_9e6d_5f7a8b9c0d1e);
        let report = VmReport {
            distribution_id: id,
            initiated_distribution_id: Some(id),
            vm_id: Some(Guid::from_u128(0xa1b2c3d4_e5f6_4789_8abc_def012345678)),
            wsl_version: 2,
            windows_build: 22631,
            configuration: DistributionConfiguration {
                name: "Ubuntu".into(),
                ..Default::default()
            },
        };
        let text = render_text(&report);
        assert!(text.contains("Ubuntu (0B2A4D7E-1C3F-4A8B-9E6D-5F7A8B9C0D1E)"));
        assert!(text.contains("vm id:         A1B2C3D4-E5F6-4789-8ABC-DEF012345678"));
        assert!(text.contains("windows build: 22631"));
        assert!(!text.contains("initiated"));
    }

    #[test]
    fn test_render_text_wsl1() {
        let report = VmReport {
            distribution_id: Guid::from_u128(0x0b2a4d7e_1c3f_4a8b_9e6d_5f7a8b9c0d1e),
            initiated_distribution_id: None,
            vm_id: None,
            wsl_version: 1,
            windows_build: 19045,
            configuration: DistributionConfiguration {
                name: "Legacy".into(),
                ..Default::default()
            },
        };
        let text = render_text(&report);
        assert!(text.contains("vm id:         none (WSL1)"));
        assert!(text.contains("wsl version:   1"));
    }
}
