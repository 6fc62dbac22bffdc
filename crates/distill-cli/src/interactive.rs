use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Select};
use distill_core::models::{Draft, ProcessingOption};

/// Let the user pick one of the offered processing options.
///
/// The recommended option is preselected.
pub fn select_option(options: &[ProcessingOption]) -> Result<usize> {
    let items: Vec<String> = options
        .iter()
        .map(|option| {
            let mut label = format!(
                "{} - {} request(s)",
                option.strategy, option.estimated_requests
            );
            if option.recommended {
                label.push_str(" (recommended)");
            }
            if let Some(first) = option.benefits.first() {
                label.push_str(&format!(" - {}", first));
            }
            label
        })
        .collect();
    let default = options.iter().position(|o| o.recommended).unwrap_or(0);

    let selection = Select::new()
        .with_prompt("Processing strategy")
        .items(&items)
        .default(default)
        .interact()?;
    Ok(selection)
}

/// Ask before running an option that was reduced to fit the quota
pub fn confirm_constrained(option: &ProcessingOption) -> Result<bool> {
    println!("\n{}", style("Today's quota cannot cover the full strategy.").yellow().bold());
    for drawback in &option.drawbacks {
        println!("  • {}", drawback);
    }
    println!();

    let proceed = Confirm::new()
        .with_prompt(format!("Continue with {} instead?", option.strategy))
        .default(true)
        .interact()?;
    Ok(proceed)
}

/// Offer to continue from a saved draft instead of the given input
pub fn confirm_restore(draft: &Draft) -> Result<bool> {
    let preview: String = draft.content.chars().take(80).collect();
    println!(
        "\n{} {} draft from {}",
        style("Found").cyan(),
        draft.kind,
        draft.modified_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("  {}{}", preview, if draft.content.chars().count() > 80 { "…" } else { "" });

    let restore = Confirm::new()
        .with_prompt("Use the saved draft?")
        .default(false)
        .interact()?;
    Ok(restore)
}
