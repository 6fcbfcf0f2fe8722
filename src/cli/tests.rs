use super::*;

fn parse_args(argv: &[&str]) -> Args {
    Args::try_parse_from(argv)
        .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
}

#[test]
fn no_subcommand_defaults_to_chat() {
    let args = parse_args(&["lowkey"]);
    assert!(args.command.is_none());
    assert!(args.endpoint.is_none());
}

#[test]
fn global_flags_become_overrides() {
    let argv = [
        "lowkey",
        "say",
        "--endpoint",
        "http://127.0.0.1:8000/api/chat",
        "--history",
        "latest",
        "-t",
        "20",
        "tokyo",
        "hidden",
        "gems",
    ];
    let args = parse_args(&argv);
    let overrides = args.overrides();
    assert_eq!(
        overrides.endpoint.as_deref(),
        Some("http://127.0.0.1:8000/api/chat")
    );
    assert_eq!(overrides.history, Some(HistoryMode::Latest));
    assert_eq!(overrides.timeout_secs, Some(20));
    match args.command {
        Some(Commands::Say { prompt }) => assert_eq!(prompt, vec!["tokyo", "hidden", "gems"]),
        _ => panic!("expected say subcommand for argv={argv:?}"),
    }
}

#[test]
fn say_requires_a_prompt() {
    assert!(Args::try_parse_from(["lowkey", "say"]).is_err());
}

#[test]
fn invalid_history_mode_is_rejected() {
    assert!(Args::try_parse_from(["lowkey", "--history", "some"]).is_err());
}

#[test]
fn set_collects_multiple_values() {
    let args = parse_args(&["lowkey", "set", "suggestions", "night markets", "onsen"]);
    match args.command {
        Some(Commands::Set { key, value }) => {
            assert_eq!(key, "suggestions");
            assert_eq!(value, vec!["night markets", "onsen"]);
        }
        _ => panic!("expected set subcommand"),
    }
}
