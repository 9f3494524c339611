use super::support::tar_of;
use std::io::Cursor;
use taskfs::archive::decode_all;
use taskfs::config::{StorageBackend, TaskfsConfig};
use taskfs::tooling::cli::{CliContext, CommandOutput, Commands, ConfigCommands};
use tempfile::TempDir;
use uuid::Uuid;

fn memory_context() -> CliContext {
    let mut config = TaskfsConfig::default();
    config.storage.backend = StorageBackend::Memory;
    CliContext::new(config).unwrap()
}

fn text(output: CommandOutput) -> String {
    match output {
        CommandOutput::Text(text) => text,
        CommandOutput::Bytes(bytes) => panic!("expected text, got {} bytes", bytes.len()),
    }
}

fn import(cli: &CliContext, temp: &TempDir, name: &str, files: &[(&str, &str)]) -> Uuid {
    let upload = temp.path().join(name);
    std::fs::write(&upload, tar_of(files)).unwrap();
    let id = Uuid::new_v4();
    let out = text(
        cli.execute(&Commands::Import {
            file: upload,
            id: Some(id),
        })
        .unwrap(),
    );
    assert!(out.contains(&id.to_string()), "unexpected output: {out}");
    id
}

#[test]
fn ls_json_lists_records_without_content() {
    let temp = TempDir::new().unwrap();
    let cli = memory_context();
    let id = import(&cli, &temp, "a.tar", &[("src/a.rs", "aaa"), ("b.txt", "bb")]);

    let out = text(
        cli.execute(&Commands::Ls {
            id,
            format: "json".to_string(),
        })
        .unwrap(),
    );
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["path"], "src/a.rs");
    assert_eq!(rows[0]["size"], 3);
    assert_eq!(rows[1]["path"], "b.txt");
    assert!(rows[1].get("content").is_none());
}

#[test]
fn cat_export_and_copy() {
    let temp = TempDir::new().unwrap();
    let cli = memory_context();
    let id = import(&cli, &temp, "a.tar", &[("main.py", "print(1)")]);

    let cat = cli
        .execute(&Commands::Cat {
            id,
            path: "./main.py".to_string(),
        })
        .unwrap();
    assert_eq!(cat, CommandOutput::Bytes(b"print(1)".to_vec()));

    let missing = text(
        cli.execute(&Commands::Cat {
            id,
            path: "nope.py".to_string(),
        })
        .unwrap(),
    );
    assert!(missing.contains("No file"));

    let dest = Uuid::new_v4();
    cli.execute(&Commands::Copy { source: id, dest }).unwrap();
    let digest_a = text(cli.execute(&Commands::Digest { id }).unwrap());
    let digest_b = text(cli.execute(&Commands::Digest { id: dest }).unwrap());
    assert_eq!(digest_a, digest_b);

    match cli.execute(&Commands::Export { id: dest, output: None }).unwrap() {
        CommandOutput::Bytes(bytes) => {
            let files = decode_all(Cursor::new(bytes)).unwrap();
            assert_eq!(files.len(), 1);
            assert_eq!(files[0].path, "main.py");
        }
        other => panic!("expected archive bytes, got {other:?}"),
    }

    let out_path = temp.path().join("out.tar");
    cli.execute(&Commands::Export {
        id,
        output: Some(out_path.clone()),
    })
    .unwrap();
    let files = decode_all(std::fs::File::open(&out_path).unwrap()).unwrap();
    assert_eq!(files[0].content.as_deref(), Some(&b"print(1)"[..]));
}

#[test]
fn delete_then_read_fails() {
    let temp = TempDir::new().unwrap();
    let cli = memory_context();
    let id = import(&cli, &temp, "a.tar", &[("x", "1")]);

    cli.execute(&Commands::Delete { id }).unwrap();
    cli.execute(&Commands::Delete { id }).unwrap();
    assert!(cli.execute(&Commands::Digest { id }).is_err());
}

#[test]
fn browse_json_has_breadcrumbs() {
    let temp = TempDir::new().unwrap();
    let cli = memory_context();
    let id = import(
        &cli,
        &temp,
        "a.tar",
        &[("src/pkg/a.rs", "a"), ("src/b.rs", "b"), ("c.txt", "c")],
    );

    let out = text(
        cli.execute(&Commands::Browse {
            id,
            dir: "/src".to_string(),
            format: "json".to_string(),
        })
        .unwrap(),
    );
    let listing: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(listing["current"], "/src");
    let crumbs = listing["breadcrumbs"].as_array().unwrap();
    assert_eq!(crumbs.len(), 2);
    assert_eq!(crumbs[1]["path"], "/src");
    let names: Vec<&str> = listing["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["b.rs", "pkg"]);
}

#[test]
fn view_applies_patterns() {
    let temp = TempDir::new().unwrap();
    let cli = memory_context();
    let initial = import(
        &cli,
        &temp,
        "initial.tar",
        &[("Main.java", "stub"), ("Test.java", "real test")],
    );
    let current = import(
        &cli,
        &temp,
        "current.tar",
        &[
            ("Main.java", "solution"),
            ("Test.java", "fake test"),
            ("hidden.log", "noise"),
        ],
    );

    let out = text(
        cli.execute(&Commands::View {
            initial,
            current,
            hidden: vec!["*.log".to_string()],
            protected: vec!["Test.java".to_string()],
            format: "json".to_string(),
            output: None,
        })
        .unwrap(),
    );
    let rows: serde_json::Value = serde_json::from_str(&out).unwrap();
    let paths: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["Main.java", "Test.java"]);
    assert_eq!(rows[1]["size"], "real test".len());

    let bad = cli.execute(&Commands::View {
        initial,
        current,
        hidden: vec!["a/../b".to_string()],
        protected: Vec::new(),
        format: "text".to_string(),
        output: None,
    });
    assert!(bad.unwrap_err().is_validation_failure());
}

#[test]
fn config_show_renders_toml() {
    let cli = memory_context();
    let out = text(
        cli.execute(&Commands::Config {
            command: ConfigCommands::Show,
        })
        .unwrap(),
    );
    assert!(out.contains("backend = \"memory\""), "unexpected output: {out}");
}
