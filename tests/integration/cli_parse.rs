use clap::{CommandFactory, Parser};
use taskfs::tooling::cli::{Cli, Commands};

const ID: &str = "7b0e7f52-3a0c-4c55-9a3e-2f1d6f5b9a10";
const OTHER: &str = "0b7c2a3e-5d8f-4f6a-8c1b-9e0d2f3a4b5c";

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["taskfs", "import", "task.tar.gz"],
        vec!["taskfs", "import", "task.zip", "--id", ID],
        vec!["taskfs", "import-dir", "./task", "--id", ID],
        vec!["taskfs", "export", ID],
        vec!["taskfs", "export", ID, "-o", "out.tar"],
        vec!["taskfs", "ls", ID, "--format", "json"],
        vec!["taskfs", "cat", ID, "src/main.rs"],
        vec!["taskfs", "browse", ID],
        vec!["taskfs", "browse", ID, "/src", "--format", "json"],
        vec!["taskfs", "copy", ID, OTHER],
        vec!["taskfs", "delete", ID],
        vec!["taskfs", "digest", ID, "--log-level", "debug"],
        vec![
            "taskfs",
            "view",
            "--initial",
            ID,
            "--current",
            OTHER,
            "--hidden",
            "tests/**",
            "--hidden",
            "*.secret",
            "--protected",
            "README.md",
        ],
        vec!["taskfs", "--config", "taskfs.toml", "config", "show"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_invalid_commands() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["taskfs"],
        vec!["taskfs", "import"],
        vec!["taskfs", "export", "not-a-uuid"],
        vec!["taskfs", "copy", ID],
        vec!["taskfs", "view", "--initial", ID],
        vec!["taskfs", "config"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_err(), "expected parse failure for args: {args:?}");
    }
}

#[test]
fn parse_view_collects_repeated_patterns() {
    let cli = Cli::try_parse_from([
        "taskfs",
        "view",
        "--initial",
        ID,
        "--current",
        OTHER,
        "--hidden",
        "a/**",
        "--hidden",
        "b/**",
    ])
    .unwrap();
    match cli.command {
        Commands::View {
            hidden,
            protected,
            format,
            output,
            ..
        } => {
            assert_eq!(hidden, vec!["a/**", "b/**"]);
            assert!(protected.is_empty());
            assert_eq!(format, "text");
            assert!(output.is_none());
        }
        _ => panic!("expected view command"),
    }
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}
