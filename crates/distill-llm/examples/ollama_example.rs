//! Example demonstrating the Ollama summarizer
//!
//! Note: This example requires Ollama to be running locally with a model installed.
//! To run: cargo run --example ollama_example

use distill_llm::{OllamaSummarizer, Summarizer, SummaryStyle};

#[tokio::main]
async fn main() {
    println!("Distill LLM - Ollama Summarizer Example");
    println!("=======================================\n");

    // Assumes Ollama at localhost:11434 with "llama3.2" pulled
    let summarizer = OllamaSummarizer::localhost("llama3.2");

    println!("Summarizer: {}", summarizer.name());
    println!();

    let text = "The river cooperative installed forty new solar panels this spring. \
                Output rose by a third, and the village clinic now runs through the night. \
                Next year the cooperative plans to train two local technicians.";

    println!("Attempting to summarize...");
    println!("(This will fail if Ollama is not running)\n");

    for style in [SummaryStyle::Brief, SummaryStyle::KeyPoints] {
        match summarizer.summarize(text, style).await {
            Ok(summary) => {
                println!("✓ {} summary:", style);
                println!("{}\n", summary);
            }
            Err(e) => {
                println!("✗ Failed to summarize: {}", e);
                println!("  Error code: {}", e.code());
                println!("  {}", e.remediation());
                println!("  Retryable: {}", e.is_retryable());
                break;
            }
        }
    }
}
