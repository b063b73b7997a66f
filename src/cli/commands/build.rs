//! Build command - run one build and print its assets

use crate::bundle::BundleResult;
use crate::cli::args::{context_from_pairs, BuildArgs, OutputFormat};
use crate::compiler::{BuildOptions, Compiler};
use crate::config::Config;
use crate::error::PackwrightResult;
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> PackwrightResult<()> {
    let compiler = Compiler::from_config(config.clone())?;
    let options = BuildOptions {
        watch_config: args.watch_config.then_some(true),
        watch_source: args.watch.then_some(true),
        use_cache_file: args.use_cache_file.then_some(true),
        use_manifest: args.use_manifest.then_some(true),
        context: context_from_pairs(&args.context),
        ..Default::default()
    };

    if args.format == OutputFormat::Json {
        let bundle = compiler.build(&args.config_file, options).await?;
        println!("{}", serde_json::to_string_pretty(bundle.data())?);
        return Ok(());
    }

    let ctx = UiContext::detect();
    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Building {}...", args.config_file));

    let bundle = match compiler.build(&args.config_file, options).await {
        Ok(bundle) => bundle,
        Err(e) => {
            spinner.stop_error(&format!("Build of {} failed", args.config_file));
            return Err(e);
        }
    };
    spinner.stop(&format!("Built {}", args.config_file));

    print_bundle(&ctx, &bundle);
    Ok(())
}

fn print_bundle(ctx: &UiContext, bundle: &BundleResult) {
    for warning in bundle.warnings() {
        ui::step_warn(ctx, &warning);
    }

    let assets = bundle.assets();
    if assets.is_empty() {
        ui::remark(ctx, "No assets reported");
    }
    for asset in assets {
        let location = asset.url.or(asset.path).unwrap_or_default();
        ui::key_value(ctx, &asset.name, &location);
    }

    for (entry, urls) in bundle.urls() {
        ui::section(ctx, &entry);
        for url in urls {
            println!("  {}", url);
        }
    }
}
