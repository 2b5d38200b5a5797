//! WoodSurvey CLI - bridge interface for the survey form
//!
//! Commands: types, evaluate, apply, export, drafts, suggest
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 when an export fails, 1 on any other error

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use woodsurvey_core::{
    draft::DraftStore,
    evaluate_row,
    export::DirectorySaver,
    manufacturers::ManufacturerList,
    numeric::format_value,
    ApplianceType, Edit, ExportPipeline, FluePipeCategory, RenderFormat, SurveyConfig, SurveyForm,
};

#[derive(Parser)]
#[command(name = "woodsurvey-cli")]
#[command(about = "WoodSurvey CLI - appliance clearance survey engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the TOML configuration
    #[arg(short, long, default_value = "woodsurvey.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// List appliance types and their rules
    Types,

    /// Classify a single measurement
    Evaluate {
        /// Required clearance (defaults to the connector baseline with --pipe)
        #[arg(short, long, required_unless_present = "pipe")]
        required: Option<String>,

        /// Connector type for a flue row: single-wall or double-wall
        #[arg(short, long, value_parser = parse_pipe)]
        pipe: Option<FluePipeCategory>,

        #[arg(short, long)]
        actual: String,

        #[arg(short, long)]
        shielded: bool,
    },

    /// Apply a JSON list of edits to a form and print the result
    Apply {
        /// Form JSON (a fresh form when omitted)
        #[arg(short, long)]
        form: Option<PathBuf>,

        /// JSON array of edits
        #[arg(short, long)]
        edits: PathBuf,
    },

    /// Render a form and save the report
    Export {
        #[arg(short, long)]
        form: PathBuf,

        #[arg(long, value_enum, default_value = "json")]
        format: FormatArg,

        /// Output directory (overrides config)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Manage saved drafts
    Drafts {
        #[command(subcommand)]
        action: DraftAction,
    },

    /// Suggest manufacturers for an appliance type
    Suggest {
        #[arg(short, long)]
        r#type: String,

        #[arg(short, long, default_value = "")]
        prefix: String,
    },
}

#[derive(Subcommand)]
enum DraftAction {
    List,
    Save {
        #[arg(short, long)]
        form: PathBuf,

        #[arg(short, long)]
        name: Option<String>,
    },
    /// Print a draft's form (the most recent when no id is given)
    Load {
        #[arg(short, long)]
        id: Option<String>,
    },
    Delete {
        #[arg(short, long)]
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Text,
}

impl From<FormatArg> for RenderFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => RenderFormat::Json,
            FormatArg::Text => RenderFormat::Text,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match SurveyConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => return fail(format!("Failed to load config: {}", e), ExitCode::FAILURE),
    };

    match cli.command {
        Commands::Types => {
            let types: Vec<_> = ApplianceType::ALL
                .iter()
                .map(|t| json!({
                    "id": t.identifier(),
                    "name": t.display_name(),
                    "rule": t.rule(),
                }))
                .collect();
            print_json(&types)
        }

        Commands::Evaluate { required, pipe, actual, shielded } => {
            let required = match (required, pipe) {
                (Some(r), _) => r,
                (None, Some(category)) => {
                    let base = category.base_clearance();
                    format_value(if shielded { base / 2.0 } else { base })
                }
                (None, None) => return fail("--required or --pipe is needed", ExitCode::FAILURE),
            };
            let classification = evaluate_row(&required, &actual, shielded, false);
            print_json(&json!({
                "required": required,
                "classification": classification,
                "rowClass": classification.row_class(),
            }))
        }

        Commands::Apply { form, edits } => {
            let mut survey = match form {
                Some(path) => match read_json::<SurveyForm>(&path) {
                    Ok(f) => f,
                    Err(e) => return fail(e, ExitCode::FAILURE),
                },
                None => SurveyForm::new(),
            };
            let edits: Vec<Edit> = match read_json(&edits) {
                Ok(e) => e,
                Err(e) => return fail(e, ExitCode::FAILURE),
            };
            for (i, edit) in edits.iter().enumerate() {
                if let Err(e) = survey.apply_edit_mut(edit) {
                    return fail(format!("Edit {} rejected: {}", i, e), ExitCode::FAILURE);
                }
            }
            print_json(&survey)
        }

        Commands::Export { form, format, out } => {
            let survey: SurveyForm = match read_json(&form) {
                Ok(f) => f,
                Err(e) => return fail(e, ExitCode::FAILURE),
            };
            let pipeline = ExportPipeline::new(
                config.assembler(),
                RenderFormat::from(format).sink(),
                config.report.file_suffix.clone(),
            );
            let saver = DirectorySaver::new(out.unwrap_or(config.paths.output_dir));

            match pipeline.export_and_save(&survey, &saver) {
                Ok((artifact, path)) => print_json(&json!({
                    "success": true,
                    "path": path,
                    "artifact": {
                        "id": artifact.id,
                        "fileName": artifact.file_name,
                        "format": artifact.format,
                        "pageCount": artifact.page_count,
                        "entryCount": artifact.entry_count,
                        "notesFallback": artifact.notes_fallback,
                        "contentHash": artifact.content_hash,
                        "hash": artifact.hash,
                        "createdAt": artifact.created_at,
                    },
                })),
                Err(e) => fail(e.to_string(), ExitCode::from(2)),
            }
        }

        Commands::Drafts { action } => {
            let store = DraftStore::new(config.paths.drafts);
            let result = match action {
                DraftAction::List => store.list().map(|drafts| {
                    let summary: Vec<_> = drafts
                        .iter()
                        .map(|d| json!({"id": d.id, "name": d.name, "timestamp": d.timestamp}))
                        .collect();
                    json!(summary)
                }),
                DraftAction::Save { form, name } => {
                    let survey: SurveyForm = match read_json(&form) {
                        Ok(f) => f,
                        Err(e) => return fail(e, ExitCode::FAILURE),
                    };
                    store
                        .save(&survey, name.as_deref())
                        .map(|d| json!({"id": d.id, "name": d.name}))
                }
                DraftAction::Load { id } => match id {
                    Some(id) => store.load(&id).map(|d| json!(d)),
                    None => store.latest().map(|d| json!(d)),
                },
                DraftAction::Delete { id } => store
                    .delete(&id)
                    .map(|d| json!({"deleted": d.id})),
            };
            match result {
                Ok(value) => print_json(&value),
                Err(e) => fail(e.to_string(), ExitCode::FAILURE),
            }
        }

        Commands::Suggest { r#type, prefix } => {
            let list = match ManufacturerList::load(&config.paths.manufacturers) {
                Ok(l) => l,
                Err(e) => return fail(format!("Failed to load manufacturers: {}", e), ExitCode::FAILURE),
            };
            print_json(&list.suggest(ApplianceType::from_identifier(&r#type), &prefix))
        }
    }
}

fn parse_pipe(value: &str) -> Result<FluePipeCategory, String> {
    FluePipeCategory::from_identifier(value)
        .ok_or_else(|| format!("unknown pipe type '{}', expected single-wall or double-wall", value))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Invalid JSON in {}: {}", path.display(), e))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => fail(format!("Serialization error: {}", e), ExitCode::FAILURE),
    }
}

fn fail(message: impl std::fmt::Display, code: ExitCode) -> ExitCode {
    tracing::error!("{}", message);
    println!("{}", json!({"success": false, "error": message.to_string()}));
    code
}
