//! Fields command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the fields command.
pub fn execute_fields(config: &Config, formatter: &Formatter) -> Result<()> {
    let output = formatter.format_fields(
        &config.extraction.fields,
        &config.extraction.default_fields,
    )?;
    println!("{}", output);
    Ok(())
}
