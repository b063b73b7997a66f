//! Key command - print the cache key for a config file

use crate::cli::args::{context_from_pairs, KeyArgs};
use crate::compiler::Compiler;
use crate::config::Config;
use crate::error::PackwrightResult;

/// Execute the key command
pub async fn execute(args: KeyArgs, config: &Config) -> PackwrightResult<()> {
    let compiler = Compiler::from_config(config.clone())?;
    let context = context_from_pairs(&args.context);

    let path = compiler.resolve_config(&args.config_file)?;
    println!("{}", compiler.key(&path, context.as_ref())?);
    Ok(())
}
