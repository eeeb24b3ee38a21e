//! The one command: process a video and answer a question about it.

use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the pipeline for `source` (or the configured default) and print the answer.
pub async fn run_ask(query: &str, source: Option<String>, settings: Settings) -> Result<()> {
    let locator = source.unwrap_or_else(|| settings.source.locator.clone());

    preflight::check(&settings, &locator)?;

    let orchestrator = Orchestrator::new(settings)?;

    Output::info(&format!("Processing {}", locator));
    let prepared = orchestrator.prepare(&locator).await?;
    if prepared.transcript_cached {
        Output::success("Using cached transcript");
    }

    let spinner = Output::spinner("Thinking...");
    let outcome = match orchestrator.answer(prepared, query).await {
        Ok(outcome) => {
            spinner.finish_and_clear();
            outcome
        }
        Err(e) => {
            spinner.finish_and_clear();
            return Err(anyhow::Error::new(e).context("Failed to generate answer"));
        }
    };

    println!("\n{}\n", outcome.answer);

    if outcome.retrieved.is_empty() {
        Output::warning("No passage of the transcript matched the question closely enough.");
    } else {
        Output::header("Sources");
        for (rank, result) in outcome.retrieved.iter().enumerate() {
            Output::passage(rank + 1, result.score, &result.passage.content);
        }
    }

    Ok(())
}
