use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::logging::{init_logging_with_config, LogConfig};
use crate::router::Router;
use crate::schema::{compile_body, compile_path};
use crate::spec::{
    contract_issues, effective_permissions, effective_security, full_template, load_contract,
    operation_location, Contract,
};
use crate::validator::{print_issues, CompileError, ValidationIssue};

/// Command-line interface for strutrouter
#[derive(Parser)]
#[command(name = "strutrouter")]
#[command(about = "Inspect and check dispatch contracts", long_about = None)]
pub struct Cli {
    /// Pretty debug logging instead of the environment-configured output
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the compiled route table
    Routes {
        /// Path to the contract (YAML or JSON)
        #[arg(short, long)]
        contract: PathBuf,

        /// Emit JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Report contract problems and exit non-zero if there are any
    Check {
        /// Path to the contract (YAML or JSON)
        #[arg(short, long)]
        contract: PathBuf,
    },
}

/// One operation in the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRow {
    pub method: String,
    pub template: String,
    pub operation_id: Option<String>,
    pub schemes: Vec<String>,
    pub permissions: Vec<String>,
}

/// Route table rows in template order.
#[must_use]
pub fn route_rows(contract: &Contract) -> Vec<RouteRow> {
    contract
        .operations()
        .map(|(template, method, op)| {
            let schemes: BTreeSet<&String> = effective_security(op, contract)
                .iter()
                .flat_map(|req| req.keys())
                .collect();
            RouteRow {
                method: method.to_ascii_uppercase(),
                template: full_template(contract.base_path.as_deref(), template),
                operation_id: op.operation_id.clone(),
                schemes: schemes.into_iter().cloned().collect(),
                permissions: effective_permissions(op, contract).to_vec(),
            }
        })
        .collect()
}

/// Contract problems that can be found without any registered handlers.
#[must_use]
pub fn check_contract(contract: &Contract) -> Vec<ValidationIssue> {
    let mut issues = contract_issues(contract);

    let templates = contract
        .paths
        .keys()
        .map(|t| (full_template(contract.base_path.as_deref(), t), ()));
    if let Err(CompileError::DuplicateRoute { first, second }) = Router::build(templates) {
        issues.push(ValidationIssue::new(
            &second,
            "DuplicateRoute",
            format!("Template is ambiguous with '{first}'"),
        ));
    }

    for (template, method, op) in contract.operations() {
        let location = operation_location(method, template);
        let compiled = compile_path(&location, &op.parameters)
            .and_then(|_| compile_body(&location, &op.parameters, &contract.definitions));
        if let Err(CompileError::InvalidSchema { location, reason }) = compiled {
            issues.push(ValidationIssue::new(location, "InvalidSchema", reason));
        }
    }

    issues
}

fn print_routes(rows: &[RouteRow]) {
    for row in rows {
        let security = if row.schemes.is_empty() {
            "public".to_string()
        } else {
            row.schemes.join(",")
        };
        println!(
            "{:<7} {:<40} {:<24} {}",
            row.method,
            row.template,
            row.operation_id.as_deref().unwrap_or("-"),
            security
        );
    }
}

/// Parse arguments and run the selected command.
///
/// # Errors
///
/// Returns an error if the contract cannot be loaded, or if `check` finds
/// any issue.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_config = if cli.verbose {
        LogConfig::default_dev()
    } else {
        LogConfig::from_env()
    };
    init_logging_with_config(&log_config)?;

    match &cli.command {
        Commands::Routes { contract, json } => {
            let contract = load_contract(contract)?;
            let rows = route_rows(&contract);
            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&rows).context("Failed to render routes")?
                );
            } else {
                print_routes(&rows);
            }
            Ok(())
        }
        Commands::Check { contract } => {
            let path = contract.display().to_string();
            let contract = load_contract(contract)?;
            let issues = check_contract(&contract);
            if !issues.is_empty() {
                print_issues(&issues);
                bail!("{path}: {} issue(s) found", issues.len());
            }
            println!("✅ {path}: {} operation(s), no issues", contract.operations().count());
            Ok(())
        }
    }
}
