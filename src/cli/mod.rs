//! CLI command handling
//!
//! Loads configuration and scenarios, wires the executor and credential
//! provider together, and formats output.

use std::path::Path;

use colored::Colorize;

use crate::commands::{Commands, RunArgs};
use crate::common::config::Config;
use crate::common::Result;
use crate::fixture::IdentityCredentials;
use crate::http::ReqwestExecutor;
use crate::report::{self, ExitStatus, Summary};
use crate::scenario::Scenario;
use crate::suites;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<ExitStatus> {
    match command {
        Commands::Run(args) => run(args).await,
        Commands::List { scenario } => {
            let scenario = load_scenario(scenario.as_deref())?;
            print!("{}", render_steps(&scenario));
            Ok(ExitStatus::Success)
        }
        Commands::Validate { scenario, config } => {
            let config = Config::load(config.as_deref())?;
            let scenario = load_scenario(scenario.as_deref())?;
            scenario.validate(&config)?;
            println!(
                "{} {} ({} steps)",
                "✓".green(),
                scenario.name,
                scenario.step_count()
            );
            Ok(ExitStatus::Success)
        }
    }
}

/// Load a scenario file, or the built-in suite when none is given
fn load_scenario(path: Option<&Path>) -> Result<Scenario> {
    match path {
        Some(path) => Scenario::load(path),
        None => suites::default_scenario(),
    }
}

async fn run(args: RunArgs) -> Result<ExitStatus> {
    let config = Config::load(args.config.as_deref())?;
    let scenario = load_scenario(args.scenario.as_deref())?;
    scenario.validate(&config)?;

    let executor = ReqwestExecutor::new(config.preview)?;
    let provider = IdentityCredentials::from_config(&config, &executor)?;

    report::print_header(
        &scenario.name,
        scenario.description.as_deref(),
        chrono::Local::now(),
    );

    tracing::info!(
        scenario = %scenario.name,
        steps = scenario.step_count(),
        "Starting run"
    );

    let (ledger, _state) = match crate::scenario::run(&scenario, &config, &executor, &provider).await {
        Ok(result) => result,
        Err(e) => {
            println!(
                "\n{} {}",
                "✗".red().bold(),
                "Failed to setup authentication. Exiting.".red().bold()
            );
            return Err(e);
        }
    };

    let summary = Summary::from_ledger(&scenario.name, &ledger);
    println!("{}", summary.render());
    report::print_completed(chrono::Local::now());

    if let Some(path) = &args.report {
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
        tracing::info!(path = %path.display(), "Wrote JSON report");
    }

    tracing::info!(
        passed = summary.passed,
        failed = summary.failed,
        skipped = summary.skipped,
        "Run finished"
    );

    Ok(summary.exit_status())
}

/// Categories and steps with their requirements and extractions
fn render_steps(scenario: &Scenario) -> String {
    let mut out = format!("{}\n", scenario.name.white().bold());
    if let Some(description) = &scenario.description {
        out.push_str(&format!("  {}\n", description.dimmed()));
    }

    let mut current_category: Option<String> = None;
    for (id, step) in scenario.steps() {
        if current_category.as_deref() != Some(id.category.as_str()) {
            out.push_str(&format!("\n{}\n", format!("# {}", id.category).cyan()));
            current_category = Some(id.category.clone());
        }

        let target = step
            .url
            .clone()
            .or_else(|| step.path.clone())
            .unwrap_or_default();
        out.push_str(&format!("  {} {} {}\n", id, step.method, target.dimmed()));

        let requires = step.required_slots();
        if !requires.is_empty() {
            out.push_str(&format!("      requires: {}\n", requires.join(", ").dimmed()));
        }
        if !step.extract.is_empty() {
            let extracts: Vec<String> = step.extract.keys().cloned().collect();
            out.push_str(&format!("      extracts: {}\n", extracts.join(", ").dimmed()));
        }
        if let Some(reason) = &step.skip {
            out.push_str(&format!("      skipped: {}\n", reason.dimmed()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use std::io::Write;

    const UNREACHABLE_SCENARIO: &str = r#"
name: Unreachable
categories:
  - name: Public
    label: PUBLIC
    steps:
      - name: Get All Books
        method: GET
        service: book
        path: /books?page=0&size=10
"#;

    fn temp_file(content: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_run_writes_json_report() {
        let scenario = temp_file(UNREACHABLE_SCENARIO, ".yaml");
        let config = temp_file(
            &format!(
                "[services]\nbook = \"http://127.0.0.1:{}\"\n\n[timeouts]\nrequest_secs = 2\n",
                closed_port()
            ),
            ".toml",
        );
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("summary.json");

        let status = dispatch(Commands::Run(RunArgs {
            scenario: Some(scenario.path().to_path_buf()),
            config: Some(config.path().to_path_buf()),
            report: Some(report_path.clone()),
            verbose: false,
        }))
        .await
        .unwrap();

        assert_eq!(status, ExitStatus::Failures);
        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(report["scenario"], "Unreachable");
        assert_eq!(report["total"], 1);
        assert_eq!(report["failed"], 1);
        assert_eq!(report["failures"][0]["name"], "Get All Books");
        assert_eq!(report["failures"][0]["ordinal"], 1);
        assert!(report["failures"][0]["reason"]
            .as_str()
            .unwrap()
            .starts_with("request failed:"));
    }

    #[tokio::test]
    async fn test_undeclared_account_is_invalid_scenario() {
        let scenario = temp_file(
            "name: Audit\nroles: [auditor]\ncategories:\n  - name: A\n    steps:\n      - name: Ping\n        method: GET\n        url: http://127.0.0.1:1/\n",
            ".yaml",
        );
        let config = temp_file("", ".toml");

        let err = dispatch(Commands::Validate {
            scenario: Some(scenario.path().to_path_buf()),
            config: Some(config.path().to_path_buf()),
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Scenario(_)));
        assert!(err.to_string().contains("'auditor'"));
        assert_eq!(ExitStatus::from_error(&err), ExitStatus::Invalid);
    }

    #[test]
    fn test_render_steps_lists_dependencies() {
        colored::control::set_override(false);
        let scenario = suites::default_scenario().unwrap();
        let listing = render_steps(&scenario);

        assert!(listing.starts_with("Book Service API\n"));
        assert!(listing.contains("\n# Cleanup (Admin)\n"));
        assert!(listing.contains(
            "  [USER] Test 13: Borrow Book POST /api/borrows\n      requires: user_token, book_id_physical\n      extracts: borrow_id\n"
        ));
        assert!(listing.contains("  [PUBLIC] Test 7: Get All Books GET /books?page=0&size=10\n"));
        assert_eq!(listing.matches("Test ").count(), 19);
    }
}
