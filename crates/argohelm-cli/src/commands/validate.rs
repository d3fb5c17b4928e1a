//! Validate command - check the application without fetching or rendering

use console::style;

use super::{Context, chart_spec, helm_args, load_application};
use crate::error::Result;

pub fn run(ctx: &Context) -> Result<()> {
    let path = ctx.application_path();
    println!("{} Validating {}", style("→").blue(), path.display());

    let app = load_application(&path)?;
    let spec = chart_spec(&app)?;
    println!("  {} {}", style("✓").green(), app);

    println!("  Chart:      {}", spec.name);
    println!("  Repository: {}", spec.repo_url);
    println!("  Version:    {}", spec.version);
    println!("  Chart type: {}", spec.kind);
    println!(
        "  Chart path: {}",
        ctx.chart_cache().chart_path(&spec).display()
    );

    let args = helm_args(ctx, &app, &ctx.ref_map)?;
    println!("{} helm template arguments", style("→").blue());
    println!("  {}", args.join(" "));

    println!("\n{} Validation passed", style("✓").green().bold());
    Ok(())
}
