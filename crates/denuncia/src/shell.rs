// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `denuncia shell` command implementation.
//!
//! Drafts a complaint from the terminal through the same drafting service
//! the web and WhatsApp transports use. Each invocation opens a fresh
//! `shell:<uuid>` session.

use std::path::{Path, PathBuf};

use colored::Colorize;
use denuncia_config::DenunciaConfig;
use denuncia_core::DenunciaError;
use denuncia_core::traits::StorageAdapter;
use denuncia_core::types::{DraftingEvent, DraftingSession};
use denuncia_drafting::{DraftingService, GroundedLookup};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::runtime;

const CHANNEL: &str = "shell";

const HELP: &str = "\
  /ubicacion <lat> <lng> [dirección]  comparte una ubicación
  /evidencia <archivo>                adjunta un archivo como evidencia
  /borrador                           muestra el borrador actual
  /buscar <consulta>                  busca en fuentes oficiales
  /ayuda                              muestra esta ayuda
  /salir                              termina la sesión";

/// One parsed line of shell input.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Say(String),
    Location {
        lat: f64,
        lng: f64,
        address: Option<String>,
    },
    Evidence(PathBuf),
    Draft,
    Search(String),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Say(line.to_string()));
    };
    let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let args = args.trim();

    match name {
        "salir" | "quit" | "exit" => Ok(Command::Quit),
        "ayuda" | "help" => Ok(Command::Help),
        "borrador" => Ok(Command::Draft),
        "buscar" if !args.is_empty() => Ok(Command::Search(args.to_string())),
        "buscar" => Err("uso: /buscar <consulta>".to_string()),
        "evidencia" if !args.is_empty() => Ok(Command::Evidence(PathBuf::from(args))),
        "evidencia" => Err("uso: /evidencia <archivo>".to_string()),
        "ubicacion" | "ubicación" => {
            let mut parts = args.splitn(3, char::is_whitespace);
            let coordinate = |raw: Option<&str>| raw.and_then(|v| v.trim().parse::<f64>().ok());
            match (coordinate(parts.next()), coordinate(parts.next())) {
                (Some(lat), Some(lng)) => Ok(Command::Location {
                    lat,
                    lng,
                    address: parts
                        .next()
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .map(str::to_string),
                }),
                _ => Err("uso: /ubicacion <lat> <lng> [dirección]".to_string()),
            }
        }
        other => Err(format!("comando desconocido: /{other} (usa /ayuda)")),
    }
}

/// MIME type inferred from a file extension.
fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        Some("mp4") => "video/mp4",
        Some("ogg" | "opus") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

fn render_draft(session: &DraftingSession) -> String {
    let draft = &session.draft;
    let missing = if draft.missing_facts.is_empty() {
        "ninguno".to_string()
    } else {
        draft
            .missing_facts
            .iter()
            .map(|f| f.label_es())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let location = session
        .location
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "sin ubicación".to_string());

    format!(
        "Estado: {}\nCompetencia: {}\nFundamento: {}\nUbicación: {}\nEvidencias: {}\nFaltan: {}\n\n{}",
        session.status,
        draft.competency,
        if draft.legal_basis.is_empty() { "-" } else { draft.legal_basis.as_str() },
        location,
        session.evidence.len(),
        missing,
        if draft.narrative.is_empty() { "(sin narrativa)" } else { draft.narrative.as_str() },
    )
}

fn history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("denuncia").join("shell_history"))
}

/// Runs the `denuncia shell` interactive REPL.
pub async fn run_shell(config: DenunciaConfig) -> Result<(), DenunciaError> {
    let components = runtime::build(&config).await?;
    let service = components.service.clone();
    let session_key = format!("{CHANNEL}:{}", uuid::Uuid::new_v4());
    service.open(&session_key, CHANNEL).await?;

    let mut rl = DefaultEditor::new()
        .map_err(|e| DenunciaError::Internal(format!("failed to initialize readline: {e}")))?;
    let history = history_path();
    if let Some(path) = &history {
        let _ = rl.load_history(path);
    }

    println!("{}", "denuncia shell".bold().green());
    if service.is_simulated() {
        println!(
            "{}",
            "modo demo: sin GEMINI_API_KEY las respuestas son simuladas".yellow()
        );
    }
    println!("Describe lo que observaste. Escribe {} para ver los comandos.\n", "/ayuda".yellow());

    let prompt = format!("{}> ", "denuncia".green());
    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line.as_str());

        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => {
                if let Err(e) =
                    execute(&service, &components.lookup, &session_key, command).await
                {
                    report(&e);
                }
            }
            Err(usage) => eprintln!("{}", usage.yellow()),
        }
    }

    if let Some(path) = &history {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = rl.save_history(path);
    }

    components.storage.close().await?;
    println!("{}", format!("sesión guardada como {session_key}").dimmed());
    Ok(())
}

async fn execute(
    service: &DraftingService,
    lookup: &GroundedLookup,
    session_key: &str,
    command: Command,
) -> Result<(), DenunciaError> {
    let event = match command {
        Command::Say(text) => DraftingEvent::TextTurn { text },
        Command::Location { lat, lng, address } => DraftingEvent::Location { lat, lng, address },
        Command::Evidence(path) => {
            let bytes = tokio::fs::read(&path).await.map_err(|e| {
                DenunciaError::Validation(format!("no se pudo leer {}: {e}", path.display()))
            })?;
            DraftingEvent::Evidence {
                bytes,
                source_uri: format!("file://{}", path.display()),
                mime_type: mime_for(&path).to_string(),
            }
        }
        Command::Draft => {
            if let Some(session) = service.snapshot(session_key).await? {
                println!("{}\n", render_draft(&session));
            }
            return Ok(());
        }
        Command::Search(query) => {
            let info = lookup.lookup_legal_info(&query).await;
            println!("{}", info.text);
            for source in &info.sources {
                println!("  {} {}", source.title.cyan(), source.uri.dimmed());
            }
            println!();
            return Ok(());
        }
        Command::Help => {
            println!("{HELP}\n");
            return Ok(());
        }
        Command::Quit => return Ok(()),
    };

    let handled = service.handle(session_key, CHANNEL, event).await?;
    if handled.degraded {
        println!("{}\n", handled.reply.yellow());
    } else {
        println!("{}\n", handled.reply);
    }
    Ok(())
}

fn report(err: &DenunciaError) {
    match err {
        e if e.is_configuration() => {
            eprintln!("{}: {e}", "configuración".red());
            eprintln!("Revisa GEMINI_API_KEY y las restricciones de la clave.");
        }
        DenunciaError::Validation(message) => eprintln!("{}", message.yellow()),
        e => eprintln!("{}: {e}", "error".red()),
    }
}
