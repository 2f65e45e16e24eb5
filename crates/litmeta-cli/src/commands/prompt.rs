//! Prompt command implementation.

use crate::cli::PromptArgs;
use crate::config::Config;
use crate::error::Result;
use litmeta_extractor::{build_prompt, SYSTEM_INSTRUCTION};

/// Execute the prompt command.
pub fn execute_prompt(args: PromptArgs, config: &Config) -> Result<()> {
    let fields = config.extraction.resolve_fields(&args.fields);
    let prompt = build_prompt(&config.extraction.fields, &fields)?;

    println!("--- system ---\n{}\n", SYSTEM_INSTRUCTION);
    println!("--- prompt ---\n{}", prompt);
    Ok(())
}
