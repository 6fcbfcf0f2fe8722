//! Line-oriented interactive chat on stdin/stdout

use std::error::Error;
use std::io::{self, Write};
use std::ops::ControlFlow;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::core::client::{ChatClient, SessionEvent};
use crate::core::config::ClientSettings;
use crate::core::error::SubmitRejection;
use crate::core::input::InputBuffer;
use crate::core::message::Role;
use crate::core::suggestions::{GREETING, GREETING_DETAIL};
use crate::utils::logging::LoggingState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    Quit,
    Cancel,
    ToggleLog,
    Help,
    /// Zero-based suggestion index.
    Suggestion(usize),
    Text(String),
}

pub fn parse_line(line: &str) -> LineCommand {
    let trimmed = line.trim();
    match trimmed {
        "/quit" | "/exit" => LineCommand::Quit,
        "/cancel" => LineCommand::Cancel,
        "/log" => LineCommand::ToggleLog,
        "/help" => LineCommand::Help,
        _ => match trimmed.strip_prefix('/').and_then(|n| n.parse::<usize>().ok()) {
            Some(n) if n > 0 => LineCommand::Suggestion(n - 1),
            _ => LineCommand::Text(line.to_string()),
        },
    }
}

pub async fn run_chat(settings: ClientSettings, log: Option<String>) -> Result<(), Box<dyn Error>> {
    let logging = LoggingState::new(log)?;
    let mut client = ChatClient::new(settings).with_transcript_log(logging);
    let stdin = BufReader::new(tokio::io::stdin());

    drive_chat(&mut client, stdin, &mut io::stdout()).await?;

    client.cancel();
    Ok(())
}

/// Reads lines from `input` and writes the conversation to `out` until the
/// user quits. Once input ends, a reply that is still in flight is printed
/// to the end before returning.
pub async fn drive_chat<R, W>(
    client: &mut ChatClient,
    input: R,
    out: &mut W,
) -> Result<(), Box<dyn Error>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut buffer = InputBuffer::new();
    let mut lines = input.lines();
    let mut input_open = true;

    writeln!(out, "{GREETING}")?;
    writeln!(out, "{GREETING_DETAIL}")?;
    print_suggestions(client, out)?;
    print_prompt(client, out)?;

    loop {
        if !input_open && !client.status().is_in_flight() {
            break;
        }

        tokio::select! {
            line = lines.next_line(), if input_open => match line? {
                Some(line) => {
                    if handle_line(client, &mut buffer, &line, out)?.is_break() {
                        break;
                    }
                }
                None => input_open = false,
            },
            event = client.next_event() => {
                let Some(event) = event else { break };
                print_event(client, event, out)?;
            }
        }
    }

    Ok(())
}

fn handle_line<W: Write>(
    client: &mut ChatClient,
    buffer: &mut InputBuffer,
    line: &str,
    out: &mut W,
) -> io::Result<ControlFlow<()>> {
    match parse_line(line) {
        LineCommand::Quit => return Ok(ControlFlow::Break(())),
        LineCommand::Help => {
            print_help(client, out)?;
            print_prompt(client, out)?;
        }
        LineCommand::Cancel => {
            if client.cancel() {
                writeln!(out, "\n(cancelled)")?;
            }
            print_prompt(client, out)?;
        }
        LineCommand::ToggleLog => {
            match client.transcript_log_mut().toggle_logging() {
                Ok(message) => writeln!(out, "{message}")?,
                Err(e) => writeln!(out, "{e}")?,
            }
            print_prompt(client, out)?;
        }
        LineCommand::Suggestion(index) => {
            let result = client.submit_suggestion(index);
            after_submit(client, result, out)?;
        }
        LineCommand::Text(text) => {
            buffer.set_text(text);
            let result = client.submit_input(buffer);
            after_submit(client, result, out)?;
        }
    }
    Ok(ControlFlow::Continue(()))
}

fn print_event<W: Write>(client: &ChatClient, event: SessionEvent, out: &mut W) -> io::Result<()> {
    match event {
        SessionEvent::Delta { text, .. } => {
            write!(out, "{text}")?;
            out.flush()
        }
        SessionEvent::Completed { .. } => {
            writeln!(out)?;
            print_prompt(client, out)
        }
        SessionEvent::Failed { error, .. } => {
            writeln!(out, "\nError: {error}")?;
            print_prompt(client, out)
        }
        SessionEvent::Discarded { .. } => Ok(()),
    }
}

fn after_submit<W: Write>(
    client: &ChatClient,
    result: Result<u64, SubmitRejection>,
    out: &mut W,
) -> io::Result<()> {
    match result {
        Ok(_) => {
            write!(out, "{}: ", Role::Assistant.display_label())?;
            out.flush()
        }
        Err(SubmitRejection::Empty) => {
            print_suggestions(client, out)?;
            print_prompt(client, out)
        }
        Err(rejection @ SubmitRejection::Busy) => writeln!(out, "({rejection})"),
    }
}

fn print_suggestions<W: Write>(client: &ChatClient, out: &mut W) -> io::Result<()> {
    for (index, suggestion) in client.visible_suggestions().iter().enumerate() {
        writeln!(out, "  /{} {suggestion}", index + 1)?;
    }
    Ok(())
}

fn print_prompt<W: Write>(client: &ChatClient, out: &mut W) -> io::Result<()> {
    write!(
        out,
        "{} ({}) > ",
        Role::User.display_label(),
        InputBuffer::placeholder(client.status())
    )?;
    out.flush()
}

fn print_help<W: Write>(client: &ChatClient, out: &mut W) -> io::Result<()> {
    writeln!(out, "/1 /2 /3   send a suggestion (before the first message)")?;
    writeln!(out, "/cancel    stop the reply that is streaming")?;
    writeln!(out, "/log       pause or resume the transcript log")?;
    writeln!(out, "/quit      leave the chat")?;
    writeln!(
        out,
        "endpoint: {} (history: {})",
        client.endpoint(),
        client.history_mode()
    )?;
    writeln!(out, "transcript log: {}", client.transcript_log().get_status_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_line("/quit"), LineCommand::Quit);
        assert_eq!(parse_line(" /cancel "), LineCommand::Cancel);
        assert_eq!(parse_line("/log"), LineCommand::ToggleLog);
        assert_eq!(parse_line("/2"), LineCommand::Suggestion(1));
    }

    #[test]
    fn everything_else_is_text() {
        assert_eq!(parse_line("/0"), LineCommand::Text("/0".into()));
        assert_eq!(
            parse_line("3 days in tokyo"),
            LineCommand::Text("3 days in tokyo".into())
        );
        assert_eq!(parse_line(""), LineCommand::Text(String::new()));
    }

    use std::time::Duration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::core::session::ChatStatus;

    fn client_for(endpoint: String) -> ChatClient {
        ChatClient::new(ClientSettings {
            endpoint,
            ..Default::default()
        })
    }

    async fn run_lines(client: &mut ChatClient, input: &str) -> String {
        let mut out = Vec::new();
        drive_chat(client, input.as_bytes(), &mut out)
            .await
            .expect("chat loop");
        String::from_utf8(out).expect("utf-8 output")
    }

    #[tokio::test]
    async fn reply_in_flight_at_end_of_input_is_printed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("Yanaka Ginza at sunset")
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let mut client = client_for(format!("{}/api/chat", server.uri()));
        let out = run_lines(&mut client, "tokyo hidden gems\n").await;

        assert!(out.contains("Lowkey: Yanaka Ginza at sunset\n"), "output: {out}");
        assert_eq!(client.status(), ChatStatus::Idle);
        assert_eq!(client.session().messages()[1].text(), "Yanaka Ginza at sunset");
    }

    #[tokio::test]
    async fn failed_attempt_at_end_of_input_is_reported() {
        let mut client = client_for("http://127.0.0.1:9/api/chat".to_string());
        let out = run_lines(&mut client, "best street food\n").await;

        assert_eq!(client.status(), ChatStatus::Error);
        assert!(out.contains("\nError: Request failed"), "output: {out}");
    }

    #[tokio::test]
    async fn help_shows_endpoint_and_log_status() {
        let mut client = client_for("http://127.0.0.1:9/api/chat".to_string());
        let out = run_lines(&mut client, "/help\n").await;

        assert!(out.contains("endpoint: http://127.0.0.1:9/api/chat (history: full)"));
        assert!(out.contains("transcript log: disabled"));
        assert!(client.transcript().is_empty());
    }
}
