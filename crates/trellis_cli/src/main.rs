//! CLI smoke and inspection entry point.
//!
//! # Responsibility
//! - Verify `trellis_core` linkage with deterministic output.
//! - Dump a stored layout or menu as one `path column type title` line per node.
//!
//! Usage: `trellis_cli [<db-file> <layout|menu> <id>]`.
//! Set `TRELLIS_LOG_DIR` (absolute) to also write core logs.

use log::info;
use std::process::ExitCode;
use trellis_core::{DocumentKind, DocumentStore, SqliteDocumentStore};

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var("TRELLIS_LOG_DIR") {
        if let Err(err) = trellis_core::init_logging(trellis_core::default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => {
            println!("trellis_core ping={}", trellis_core::ping());
            println!("trellis_core version={}", trellis_core::core_version());
            ExitCode::SUCCESS
        }
        [db, kind, id] => match dump(db, kind, id) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                eprintln!("{message}");
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("usage: trellis_cli [<db-file> <layout|menu> <id>]");
            ExitCode::from(2)
        }
    }
}

fn dump(db: &str, kind: &str, id: &str) -> Result<(), String> {
    let kind = DocumentKind::parse(kind).ok_or_else(|| format!("unknown document kind `{kind}`"))?;
    let conn = trellis_core::open_db(db).map_err(|err| err.to_string())?;
    let store = SqliteDocumentStore::try_new(&conn).map_err(|err| err.to_string())?;
    let document = store
        .load(kind, id)
        .map_err(|err| err.to_string())?
        .ok_or_else(|| format!("{kind} not found: {id}"))?;

    println!(
        "{kind} {id} title={} nodes={}",
        document.title.as_deref().unwrap_or("-"),
        document.tree.len()
    );
    for (path, node) in document.tree.flatten() {
        let column = document
            .tree
            .column_of(&path)
            .map(|column| column.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{path}\t{column}\t{}\t{}", node.type_name(), node.title);
    }
    info!(
        "event=cli_dump module=cli status=ok kind={} nodes={}",
        kind,
        document.tree.len()
    );
    Ok(())
}
