use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use pretag_editor_core::{
    EditorConfig, EditorListener, HeadlessBridge, HostSelection, InputEvent, Projection,
    TagEditor, clean_markup,
};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(version, about = "pretag - tag-token editing engine, headless", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hydrate initial content and print both projections
    Render {
        /// Editor config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Persisted markup to hydrate (overrides the config)
        #[arg(long)]
        markup: Option<String>,

        /// Plain default value (overrides the config)
        #[arg(long)]
        text: Option<String>,

        /// Print the host view instead of the persisted markup
        #[arg(long)]
        host: bool,
    },
    /// Replay a JSON script of input steps and print projections after each
    Replay {
        /// Script file: a JSON array of steps
        script: PathBuf,

        /// Editor config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit one JSON object per step instead of text
        #[arg(long)]
        json: bool,
    },
    /// Strip host-only attributes and caret helpers from markup (reads stdin)
    Clean,
}

/// One scripted step.
#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
enum Step {
    /// Deliver a host input event.
    Event { event: InputEvent },
    /// Move the host selection to document offsets.
    Select { start: usize, end: usize },
    /// Collapse the host selection at an offset.
    Caret { offset: usize },
    /// Focus leaves the surface.
    Blur,
    InsertTag { label: String },
    InsertText { text: String },
    SelectAll,
    Clear,
}

#[derive(Default)]
struct Collector {
    changes: usize,
    removed: Vec<String>,
}

impl EditorListener for Collector {
    fn on_change(&mut self, _projection: &Projection) {
        self.changes += 1;
    }

    fn on_remove_tag(&mut self, label: &str) {
        self.removed.push(label.to_string());
    }
}

#[derive(Serialize)]
struct StepReport<'a> {
    step: usize,
    applied: bool,
    prevent_default: bool,
    removed: &'a [String],
    #[serde(flatten)]
    projection: &'a Projection,
}

fn main() -> Result<()> {
    init_miette()?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            config,
            markup,
            text,
            host,
        } => {
            let mut config = load_config(config)?;
            if let Some(markup) = markup {
                config.markup = markup;
            }
            if let Some(text) = text {
                config.default_value = text;
            }
            render(config, host);
        }
        Commands::Replay {
            script,
            config,
            json,
        } => {
            let config = load_config(config)?;
            let source = std::fs::read_to_string(&script).into_diagnostic()?;
            let steps: Vec<Step> = serde_json::from_str(&source).into_diagnostic()?;
            replay(config, steps, json)?;
        }
        Commands::Clean => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw).into_diagnostic()?;
            println!("{}", clean_markup(raw.trim_end_matches('\n'))?);
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<EditorConfig> {
    match path {
        Some(path) => Ok(EditorConfig::load(&path.to_string_lossy())?),
        None => Ok(EditorConfig::default()),
    }
}

fn render(config: EditorConfig, host: bool) {
    let editor = TagEditor::new(HeadlessBridge::new(), (), config);
    println!("text:   {:?}", editor.text());
    if host {
        println!("host:   {}", editor.host_markup());
    } else {
        println!("markup: {}", editor.markup());
    }
}

fn replay(config: EditorConfig, steps: Vec<Step>, json: bool) -> Result<()> {
    let mut editor = TagEditor::new(HeadlessBridge::new(), Collector::default(), config);

    for (i, step) in steps.into_iter().enumerate() {
        tracing::debug!(step = i, ?step, "replaying");
        let before = editor.listener().removed.len();
        let (applied, prevent_default) = match step {
            Step::Event { event } => {
                let result = editor.handle_event(&event);
                (result.applied, result.prevent_default)
            }
            Step::Select { start, end } => {
                let anchor = editor.position_at(start);
                let focus = editor.position_at(end);
                editor
                    .bridge_mut()
                    .set_selection(Some(HostSelection::new(anchor, focus)));
                (false, false)
            }
            Step::Caret { offset } => {
                let pos = editor.position_at(offset);
                editor.bridge_mut().set_caret(pos);
                (false, false)
            }
            Step::Blur => {
                editor.bridge_mut().blur();
                (false, false)
            }
            Step::InsertTag { label } => {
                editor.insert_tag(label);
                (true, false)
            }
            Step::InsertText { text } => {
                editor.insert_text(text);
                (true, false)
            }
            Step::SelectAll => (editor.select_all(), false),
            Step::Clear => {
                editor.clear();
                (true, false)
            }
        };

        let removed = &editor.listener().removed[before..];
        if json {
            let report = StepReport {
                step: i,
                applied,
                prevent_default,
                removed,
                projection: editor.projection(),
            };
            println!("{}", serde_json::to_string(&report).into_diagnostic()?);
        } else {
            println!(
                "{i:>3} applied={applied:<5} text={:?} markup={}",
                editor.text(),
                editor.markup()
            );
            for label in removed {
                println!("    removed tag {label:?}");
            }
        }
    }

    if !json {
        println!("{} change notification(s)", editor.listener().changes);
    }
    Ok(())
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();
    Ok(())
}
