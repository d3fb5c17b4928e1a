//! argocd-helm-template - render Helm charts from ArgoCD Applications

use argohelm_core::{Git, RefMapping};
use argohelm_engine::Helm;
use argohelm_repo::cache::CHART_DIR;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod error;
mod exit_codes;
mod logging;

use commands::Context;
use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "argocd-helm-template")]
#[command(version)]
#[command(
    about = "Render Helm charts from ArgoCD applications",
    long_about = "Extract chart information from an ArgoCD Application, download the chart, \
                  and render Kubernetes manifests with `helm template`.\n\n\
                  Without a subcommand, `render` is run. Arguments after `--` are passed \
                  through to `helm template`."
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    options: GlobalOptions,

    /// Extra arguments for `helm template`
    #[arg(last = true, value_name = "HELM_ARGS")]
    helm_args: Vec<String>,
}

#[derive(Args, Debug)]
struct GlobalOptions {
    /// Working directory containing the application file (default: current directory)
    #[arg(long, global = true, env = "ARGOHELM_WORKDIR")]
    workdir: Option<PathBuf>,

    /// Application file name, relative to the working directory
    #[arg(long, global = true, default_value = "application.yaml")]
    application: String,

    /// Directory to download charts to (default: <workdir>/.chart)
    #[arg(long, global = true, env = "ARGOHELM_CHART_DIR")]
    chart_dir: Option<PathBuf>,

    /// Map a ref source to a local path (repeatable: --ref-map values=../values)
    #[arg(
        long = "ref-map",
        global = true,
        value_name = "REF=PATH",
        value_parser = parse_ref_map
    )]
    ref_map: Vec<(String, PathBuf)>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Decode base64 values in Secret resources and write .manifest.secrets.yaml
    #[arg(long, global = true)]
    secrets: bool,

    /// helm executable
    #[arg(long, global = true, env = "ARGOHELM_HELM", default_value = "helm")]
    helm_bin: PathBuf,

    /// git executable
    #[arg(long, global = true, env = "ARGOHELM_GIT", default_value = "git")]
    git_bin: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Render manifests into <workdir>/.manifest.yaml and print them
    Render {
        /// Extra arguments for `helm template`
        #[arg(last = true, value_name = "HELM_ARGS")]
        helm_args: Vec<String>,
    },

    /// Diff the manifests rendered from a git revision against the working tree
    Diff {
        /// Git revision to compare against
        #[arg(long = "ref", value_name = "REF", default_value = "HEAD")]
        git_ref: String,

        /// Sort YAML keys in both manifests before diffing
        #[arg(long)]
        sort: bool,

        /// Extra arguments for `helm template`
        #[arg(last = true, value_name = "HELM_ARGS")]
        helm_args: Vec<String>,
    },

    /// Validate the application and print the helm template arguments
    Validate,
}

/// Parse a `KEY=VALUE` pair, trimming whitespace around both parts
fn parse_ref_map(s: &str) -> std::result::Result<(String, PathBuf), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("{s} is not a valid key=value pair"))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(format!("{s} is not a valid key=value pair"));
    }
    Ok((key.to_string(), PathBuf::from(value)))
}

fn build_context(options: GlobalOptions, helm_args: Vec<String>) -> Result<Context> {
    let workdir = match options.workdir {
        Some(dir) => std::fs::canonicalize(&dir)
            .map_err(|e| CliError::io(format!("Invalid --workdir {}", dir.display()), e))?,
        None => std::env::current_dir()
            .map_err(|e| CliError::io("Cannot determine the current directory", e))?,
    };
    if !workdir.is_dir() {
        return Err(CliError::validation(format!(
            "--workdir {} is not a directory",
            workdir.display()
        )));
    }

    let chart_dir = match options.chart_dir {
        Some(dir) => std::path::absolute(&dir)
            .map_err(|e| CliError::io(format!("Invalid --chart-dir {}", dir.display()), e))?,
        None => workdir.join(CHART_DIR),
    };

    Ok(Context {
        workdir,
        application: options.application,
        chart_dir,
        ref_map: options.ref_map.into_iter().collect::<RefMapping>(),
        secrets: options.secrets,
        helm_args,
        helm: Helm::new(options.helm_bin),
        git: Git::new(options.git_bin),
    })
}

async fn run(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::Render {
        helm_args: cli.helm_args,
    });

    match command {
        Commands::Render { helm_args } => {
            let ctx = build_context(cli.options, helm_args)?;
            commands::render::run(&ctx).await
        }

        Commands::Diff {
            git_ref,
            sort,
            helm_args,
        } => {
            let ctx = build_context(cli.options, helm_args)?;
            commands::diff::run(&ctx, &git_ref, sort).await
        }

        Commands::Validate => {
            let ctx = build_context(cli.options, Vec::new())?;
            commands::validate::run(&ctx)
        }
    }
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Nothing left to report to if stderr is gone
            err.print().ok();
            std::process::exit(if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            });
        }
    };

    logging::setup_logging(cli.options.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
