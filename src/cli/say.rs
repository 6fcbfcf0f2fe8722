//! Non-interactive "say" command

use std::error::Error;
use std::io::{self, Write};

use crate::core::client::{ChatClient, SessionEvent};
use crate::core::config::ClientSettings;
use crate::utils::logging::LoggingState;

pub async fn run_say(
    prompt: Vec<String>,
    settings: ClientSettings,
    log: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    let logging = LoggingState::new(log)?;
    let mut client = ChatClient::new(settings).with_transcript_log(logging);

    if let Err(rejection) = client.submit(&prompt) {
        eprintln!("Usage: lowkey say <prompt> ({rejection})");
        std::process::exit(1);
    }

    while let Some(event) = client.next_event().await {
        match event {
            SessionEvent::Delta { text, .. } => {
                print!("{text}");
                io::stdout().flush()?;
            }
            SessionEvent::Completed { .. } => {
                println!();
                break;
            }
            SessionEvent::Failed { error, .. } => {
                eprintln!("\n\n❌ Error: {error}");
                std::process::exit(1);
            }
            SessionEvent::Discarded { .. } => {}
        }
    }

    Ok(())
}
