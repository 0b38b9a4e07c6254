//! `scoutline ask`: one question, one answer.

use scoutline_agent::ExchangeOutcome;
use std::sync::Arc;

use crate::terminal_ui::TerminalUi;

pub async fn run(message: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let ui = Arc::new(TerminalUi::new());
    let mut session = super::build_session(&config, ui.clone())?;

    let outcome = session.submit(&message).await;
    ui.finish_stream();

    match outcome {
        ExchangeOutcome::Answered(_) | ExchangeOutcome::Idle => Ok(()),
        ExchangeOutcome::Failed(reason) => Err(reason.into()),
        other => Err(format!("No answer: {other:?}").into()),
    }
}
