use clap::Parser;
use loops_shell::Args;
use loops_vm::LoopMode;
use pretty_assertions::assert_eq;

#[test]
fn test_args_parse_no_flags() {
    let args = Args::parse_from(["loopsh"]);
    assert!(args.load.is_empty());
    assert!(args.exec.is_none());
    let config = args.config();
    assert_eq!(config.loop_mode, LoopMode::Compiled);
    assert!(config.expand_ahead);
    assert_eq!(config.depth_limit, None);
}

#[test]
fn test_args_parse_repeated_loads() {
    let args = Args::parse_from(["loopsh", "-l", "a.pl", "--load", "b.pl"]);
    let loads: Vec<_> = args
        .load
        .iter()
        .map(|path| path.to_string_lossy().into_owned())
        .collect();
    assert_eq!(loads, ["a.pl", "b.pl"]);
}

#[test]
fn test_args_select_engine_configuration() {
    let args = Args::parse_from([
        "loopsh",
        "--interpret",
        "--no-expand",
        "--depth-limit",
        "64",
        "-e",
        "true",
    ]);
    let config = args.config();
    assert_eq!(config.loop_mode, LoopMode::Interpreted);
    assert!(!config.expand_ahead);
    assert_eq!(config.depth_limit, Some(64));
    assert_eq!(args.exec.as_deref(), Some("true"));
}
