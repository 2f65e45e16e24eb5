//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::{Config, OutputFormat, ProviderKind, ResultsFormat};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use litmeta_extractor::{
    save_error_log, save_results, BatchProcessor, Extractor, ExtractorConfig, ResultsTable,
};
use litmeta_llm::{GeminiProvider, LlmProvider, OpenAiProvider};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything a run needs besides the provider.
struct RunPlan {
    paths: Vec<PathBuf>,
    fields: Vec<String>,
    results_path: Option<PathBuf>,
    results_format: ResultsFormat,
    log_dir: PathBuf,
}

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut extraction = config.extraction.clone();
    if let Some(delay) = args.delay {
        extraction.request_delay_secs = delay;
    }
    if let Some(max_attempts) = args.max_attempts {
        extraction.max_attempts = max_attempts;
    }
    extraction.validate()?;

    let fields = extraction.resolve_fields(&args.fields);
    extraction.fields.validate_request(&fields)?;

    let paths = expand_inputs(&args.files)?;
    if paths.is_empty() {
        return Err(CliError::InvalidInput("No PDF files found in the given inputs".to_string()));
    }

    let mut settings = config.provider.clone();
    if let Some(provider) = args.provider {
        settings.kind = provider.into();
    }
    if let Some(model) = args.model {
        settings.model = Some(model);
    }
    if let Some(temperature) = args.temperature {
        settings.temperature = Some(temperature);
    }
    settings.validate()?;

    let plan = RunPlan {
        paths,
        fields,
        results_path: args.output,
        results_format: args
            .output_format
            .map(Into::into)
            .unwrap_or(config.output.results_format),
        log_dir: args.log_dir.unwrap_or_else(|| config.output.log_dir.clone()),
    };

    info!(
        "Using {} model '{}' for {} document(s)",
        provider_label(settings.kind),
        settings.model_name(),
        plan.paths.len()
    );

    // LlmProvider is not object safe; dispatch on the kind once
    match settings.kind {
        ProviderKind::Gemini => {
            let key = api_key(args.gemini_api_key, settings.kind)?;
            let mut provider = GeminiProvider::new(key, settings.model_name())?
                .with_timeout(extraction.request_timeout())?;
            if let Some(endpoint) = &settings.endpoint {
                provider = provider.with_endpoint(endpoint.clone());
            }
            if let Some(temperature) = settings.temperature {
                provider = provider.with_temperature(temperature);
            }
            run_batch(provider, extraction, &plan, formatter).await
        }
        ProviderKind::OpenAi => {
            let key = api_key(args.openai_api_key, settings.kind)?;
            let mut provider = OpenAiProvider::new(key, settings.model_name())?
                .with_timeout(extraction.request_timeout())?;
            if let Some(endpoint) = &settings.endpoint {
                provider = provider.with_endpoint(endpoint.clone());
            }
            if let Some(temperature) = settings.temperature {
                provider = provider.with_temperature(temperature);
            }
            run_batch(provider, extraction, &plan, formatter).await
        }
    }
}

/// Run the batch and report results.
async fn run_batch<L: LlmProvider>(
    provider: L,
    extraction: ExtractorConfig,
    plan: &RunPlan,
    formatter: &Formatter,
) -> Result<()> {
    let delay = extraction.request_delay();
    let batch = BatchProcessor::new(Extractor::new(provider, extraction)?);
    let show_progress = formatter.format() == OutputFormat::Table;

    let output = batch
        .process_batch_with_progress(&plan.paths, &plan.fields, delay, |progress| {
            if show_progress {
                eprintln!("{}", formatter.progress(progress));
            }
        })
        .await?;

    println!("{}", formatter.format_batch(&output)?);

    // JSON output carries the warnings itself
    if formatter.format() != OutputFormat::Json {
        for warning in &output.warnings {
            eprintln!(
                "{}",
                formatter.warning(&format!("{}: {}", warning.filename, warning.message))
            );
        }
    }

    if let Some(path) = &plan.results_path {
        write_results(path, plan.results_format, &output.results)?;
        eprintln!("{}", formatter.info(&format!("Results written to {}", path.display())));
    }

    if let Some(log_path) = save_error_log(&plan.log_dir, &output.error_log)? {
        eprintln!(
            "{}",
            formatter.warning(&format!("Error log written to {}", log_path.display()))
        );
    }

    Ok(())
}

/// Write the results table to `path`.
fn write_results(path: &Path, format: ResultsFormat, table: &ResultsTable) -> Result<()> {
    match format {
        ResultsFormat::Csv => save_results(path, table)?,
        ResultsFormat::Json => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(table.rows())?)?;
        }
    }
    Ok(())
}

/// Expand directories to the PDF files they contain, sorted.
///
/// Other paths are kept as given, so missing files still reach the batch
/// and are reported there.
fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            paths.push(input.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in fs::read_dir(input)? {
            let path = entry?.path();
            if path.is_file() && has_pdf_extension(&path) {
                found.push(path);
            }
        }
        found.sort();

        if found.is_empty() {
            warn!("No PDF files in {}", input.display());
        }
        paths.extend(found);
    }

    Ok(paths)
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn api_key(key: Option<String>, kind: ProviderKind) -> Result<String> {
    key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
        CliError::Config(format!(
            "{} is not set; export it to use the {} provider",
            kind.api_key_env(),
            provider_label(kind)
        ))
    })
}

fn provider_label(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Gemini => "Gemini",
        ProviderKind::OpenAi => "OpenAI",
    }
}
