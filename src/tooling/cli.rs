//! CLI Tooling
//!
//! Command-line interface over the file service. Every command is one
//! stateless call; collections are addressed by UUID.

use crate::config::TaskfsConfig;
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::service::{FileService, UploadSummary};
use crate::task::{AnswerFiles, OwnerOnly, TaskFiles};
use crate::tree::{DirectoryListing, NodeKind};
use crate::types::{CollectionId, VirtualFile, VirtualFileType};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Caller identity used for pattern configuration from the command line.
const CLI_USER: &str = "cli";

/// taskfs CLI - archive-backed file collections for tasks and answers
#[derive(Parser)]
#[command(name = "taskfs")]
#[command(about = "Archive-backed file collections for programming tasks and answers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Fold command-line logging flags into the loaded configuration.
    pub fn apply_logging_overrides(&self, logging: &mut LoggingConfig) {
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace a collection with a tar, tar.gz, or zip file
    Import {
        /// Archive to upload
        file: PathBuf,
        /// Target collection (a new id is generated if omitted)
        #[arg(long)]
        id: Option<Uuid>,
    },
    /// Replace a collection with the contents of a directory
    ImportDir {
        dir: PathBuf,
        #[arg(long)]
        id: Option<Uuid>,
    },
    /// Write a collection's tar stream to a file or stdout
    Export {
        id: Uuid,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List every record of a collection
    Ls {
        id: Uuid,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print one file's content
    Cat { id: Uuid, path: String },
    /// One-level directory listing with breadcrumbs
    Browse {
        id: Uuid,
        #[arg(default_value = "/")]
        dir: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Byte-for-byte copy of one collection over another
    Copy { source: Uuid, dest: Uuid },
    /// Delete a collection (absent ids are fine)
    Delete { id: Uuid },
    /// blake3 digest of the stored archive
    Digest { id: Uuid },
    /// Effective evaluation view of an answer
    View {
        /// Task's initial collection
        #[arg(long)]
        initial: Uuid,
        /// Answer's current collection
        #[arg(long)]
        current: Uuid,
        /// Hidden pattern (repeatable)
        #[arg(long = "hidden")]
        hidden: Vec<String>,
        /// Protected pattern (repeatable)
        #[arg(long = "protected")]
        protected: Vec<String>,
        #[arg(long, default_value = "text")]
        format: String,
        /// Write the view as a tar archive instead of listing it
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
}

/// What a command produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    Text(String),
    /// Raw bytes for stdout, e.g. an exported archive or file content
    Bytes(Vec<u8>),
}

impl CommandOutput {
    /// Write to `out`, adding a trailing newline to text.
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        match self {
            CommandOutput::Text(text) if text.is_empty() => Ok(()),
            CommandOutput::Text(text) => writeln!(out, "{}", text),
            CommandOutput::Bytes(bytes) => out.write_all(bytes),
        }
    }
}

impl From<String> for CommandOutput {
    fn from(text: String) -> Self {
        CommandOutput::Text(text)
    }
}

/// CLI context: the loaded configuration and the service built from it
pub struct CliContext {
    service: FileService,
    config: TaskfsConfig,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(config: TaskfsConfig) -> Result<Self, ApiError> {
        let store = config.storage.open_store()?;
        let service = FileService::new(store, Arc::new(OwnerOnly), config.upload.clone());
        Ok(Self { service, config })
    }

    pub fn service(&self) -> &FileService {
        &self.service
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        info!(command = command_name(command), "Executing command");
        match command {
            Commands::Import { file, id } => {
                let id = id.unwrap_or_else(Uuid::new_v4);
                let mut upload = File::open(file)?;
                let summary = self.service.write_archive(&id, &mut upload)?;
                Ok(format_upload_summary(&id, &summary).into())
            }
            Commands::ImportDir { dir, id } => {
                let id = id.unwrap_or_else(Uuid::new_v4);
                let summary = self.service.import_directory(&id, dir)?;
                Ok(format_upload_summary(&id, &summary).into())
            }
            Commands::Export { id, output } => {
                let mut download = self.service.read_archive(id)?;
                match output {
                    Some(path) => {
                        let bytes = write_file(path, |out| {
                            Ok(std::io::copy(&mut download.stream, out)?)
                        })?;
                        Ok(format!("Exported {} ({} bytes) to {}", id, bytes, path.display()).into())
                    }
                    None => {
                        let mut bytes = Vec::new();
                        download.stream.read_to_end(&mut bytes)?;
                        Ok(CommandOutput::Bytes(bytes))
                    }
                }
            }
            Commands::Ls { id, format } => {
                let files = self.service.list_files(id)?;
                format_file_list(&files, format).map(CommandOutput::from)
            }
            Commands::Cat { id, path } => match self.service.get_file(id, path)? {
                Some(file) => match (file.file_type, file.content) {
                    (VirtualFileType::File, Some(content)) => Ok(CommandOutput::Bytes(content)),
                    (VirtualFileType::Symlink, _) => Ok(format!(
                        "{} -> {}",
                        file.path,
                        file.link_target.unwrap_or_default()
                    )
                    .into()),
                    _ => Ok(format!("{} is a directory", file.path).into()),
                },
                None => Ok(format!("No file at '{}' in collection {}", path, id).into()),
            },
            Commands::Browse { id, dir, format } => match self.service.browse(id, dir)? {
                Some(listing) => format_listing(&listing, format).map(CommandOutput::from),
                None => Ok(format!("'{}' is not a directory of collection {}", dir, id).into()),
            },
            Commands::Copy { source, dest } => {
                self.service.store().copy(source, dest)?;
                Ok(format!("Copied {} to {}", source, dest).into())
            }
            Commands::Delete { id } => {
                self.service.delete_collection(id)?;
                Ok(format!("Deleted {}", id).into())
            }
            Commands::Digest { id } => Ok(self.service.store().digest(id)?.into()),
            Commands::View {
                initial,
                current,
                hidden,
                protected,
                format,
                output,
            } => {
                let (task, answer) = self.adhoc_pair(initial, current, hidden, protected)?;
                match output {
                    Some(path) => {
                        write_file(path, |out| {
                            self.service.export_effective_view(&task, &answer, out)?;
                            Ok(0)
                        })?;
                        Ok(format!("Wrote effective view to {}", path.display()).into())
                    }
                    None => {
                        let files = self.service.effective_view(&task, &answer)?;
                        format_file_list(&files, format).map(CommandOutput::from)
                    }
                }
            }
            Commands::Config { command } => match command {
                ConfigCommands::Show => self.config.to_toml().map(CommandOutput::from),
            },
        }
    }

    /// Task and answer records for collections named on the command line.
    fn adhoc_pair(
        &self,
        initial: &CollectionId,
        current: &CollectionId,
        hidden: &[String],
        protected: &[String],
    ) -> Result<(TaskFiles, AnswerFiles), ApiError> {
        let caller = CLI_USER.to_string();
        let mut task = TaskFiles::new(Uuid::new_v4(), caller.clone());
        task.initial_files = *initial;
        self.service
            .configure_patterns(&mut task, &caller, hidden, protected)?;
        let answer = AnswerFiles {
            answer_id: Uuid::new_v4(),
            task_id: task.task_id,
            student: caller,
            current_files: *current,
        };
        Ok((task, answer))
    }
}

fn write_file<F>(path: &Path, write: F) -> Result<u64, ApiError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<u64, ApiError>,
{
    let mut out = BufWriter::new(File::create(path)?);
    let written = write(&mut out)?;
    out.flush()?;
    Ok(written)
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Import { .. } => "import",
        Commands::ImportDir { .. } => "import-dir",
        Commands::Export { .. } => "export",
        Commands::Ls { .. } => "ls",
        Commands::Cat { .. } => "cat",
        Commands::Browse { .. } => "browse",
        Commands::Copy { .. } => "copy",
        Commands::Delete { .. } => "delete",
        Commands::Digest { .. } => "digest",
        Commands::View { .. } => "view",
        Commands::Config { .. } => "config",
    }
}

/// Section heading, bold unless NO_COLOR is set.
fn format_section_heading(title: &str) -> String {
    if std::env::var_os("NO_COLOR").is_some() {
        title.to_string()
    } else {
        format!("{}", title.bold())
    }
}

fn format_upload_summary(id: &CollectionId, summary: &UploadSummary) -> String {
    format!(
        "Imported {} entries ({} upload, {} bytes stored) into {}",
        summary.entries,
        summary.format.name(),
        summary.bytes,
        id
    )
}

fn type_label(file_type: VirtualFileType) -> &'static str {
    match file_type {
        VirtualFileType::File => "file",
        VirtualFileType::Directory => "dir",
        VirtualFileType::Symlink => "link",
    }
}

fn format_file_list(files: &[VirtualFile], format: &str) -> Result<String, ApiError> {
    if format == "json" {
        let rows: Vec<serde_json::Value> = files
            .iter()
            .map(|f| {
                json!({
                    "path": f.path,
                    "type": f.file_type,
                    "size": f.size(),
                    "lastModified": f.last_modified,
                    "linkTarget": f.link_target,
                })
            })
            .collect();
        return serde_json::to_string_pretty(&rows)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render JSON: {}", e)));
    }
    if files.is_empty() {
        return Ok("Collection is empty.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Path", "Type", "Size", "Modified"]);
    for f in files {
        let path = match &f.link_target {
            Some(target) => format!("{} -> {}", f.path, target),
            None => f.path.clone(),
        };
        table.add_row(vec![
            path,
            type_label(f.file_type).to_string(),
            f.size().to_string(),
            f.last_modified.to_rfc3339(),
        ]);
    }
    Ok(format!("{}\n\nTotal: {} entries", table, files.len()))
}

fn format_listing(listing: &DirectoryListing, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return serde_json::to_string_pretty(listing)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render JSON: {}", e)));
    }
    let trail: Vec<&str> = listing
        .breadcrumbs
        .iter()
        .map(|crumb| crumb.label.as_str())
        .collect();
    let mut out = format!("{}\n", format_section_heading(&trail.join(" > ")));
    if listing.children.is_empty() {
        out.push_str("  (empty)");
        return Ok(out);
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Name", "Kind", "Size"]);
    for child in &listing.children {
        let (kind, size) = match &child.kind {
            NodeKind::File { size } => ("file", size.to_string()),
            NodeKind::Directory => ("dir", "-".to_string()),
            NodeKind::Symlink { .. } => ("link", "-".to_string()),
        };
        table.add_row(vec![child.name.clone(), kind.to_string(), size]);
    }
    out.push_str(&table.to_string());
    Ok(out)
}
