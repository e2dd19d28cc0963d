use anyhow::Result;
use inquire::{InquireError, Text};
use weather_panel_core::{Action, Units, WeatherPanel, input};

use crate::cli::print_panel;

const HELP: &str = "Enter looks up the city. :units toggles units, :metric / :imperial set them, :quit exits";

#[derive(Debug, PartialEq)]
enum Line {
    Quit,
    ToggleUnits,
    SetUnits(Units),
    Lookup(String),
}

fn parse_line(line: &str) -> Line {
    match line.trim() {
        ":q" | ":quit" | ":exit" => Line::Quit,
        ":u" | ":units" => Line::ToggleUnits,
        ":metric" => Line::SetUnits(Units::Metric),
        ":imperial" => Line::SetUnits(Units::Imperial),
        _ => Line::Lookup(line.to_string()),
    }
}

/// Mount the panel, then read locations until the user quits.
pub async fn run(mut panel: WeatherPanel) -> Result<()> {
    panel.mount();
    refresh(&mut panel).await;

    loop {
        let answer = Text::new("Location:")
            .with_placeholder(input::PLACEHOLDER)
            .with_initial_value(&panel.state().query)
            .with_help_message(HELP)
            .prompt();

        let line = match answer {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err.into()),
        };

        let parsed = parse_line(&line);
        tracing::debug!(?parsed, "input line");
        let actions = match parsed {
            Line::Quit => break,
            Line::ToggleUnits => vec![Action::ToggleUnits],
            Line::SetUnits(units) => vec![Action::SetUnits(units)],
            Line::Lookup(text) => input::submit_line(&text),
        };

        for action in actions {
            panel.dispatch(action);
        }
        refresh(&mut panel).await;
    }

    Ok(())
}

async fn refresh(panel: &mut WeatherPanel) {
    if !panel.is_idle() {
        println!("Loading...");
    }
    panel.settle().await;
    println!();
    print_panel(panel.state());
    println!();
}
