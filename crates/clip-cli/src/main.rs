//! CLI de operador: ejecuta una etapa del pipeline contra Postgres.
//!
//! Uso:
//!   clip-cli run --action <freeze|review|payout|check_throttle> [--date YYYY-MM-DD]
//!   clip-cli throttle
//!
//! Códigos de salida: 0 ok, 2 uso, 4 rechazado (etapa en curso / conflicto),
//! 5 error de backend.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clip_core::{Action, PayoutPipeline, PayoutStore, PipelineError};
use clip_persistence::{build_pool_from_env, PgPayoutStore, PoolProvider};

const USAGE: &str = "Uso: clip-cli run --action <freeze|review|payout|check_throttle> [--date YYYY-MM-DD]\n     clip-cli throttle";

#[derive(Debug, PartialEq)]
enum Command {
    Run { action: Action, date: Option<NaiveDate> },
    Throttle,
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    match args.get(1).map(String::as_str) {
        Some("throttle") => Ok(Command::Throttle),
        Some("run") => {
            let mut action: Option<Action> = None;
            let mut date: Option<NaiveDate> = None;
            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--action" => {
                        i += 1;
                        let raw = args.get(i).ok_or("--action requiere un valor")?;
                        action = Some(raw.parse().map_err(|e: PipelineError| e.to_string())?);
                    }
                    "--date" => {
                        i += 1;
                        let raw = args.get(i).ok_or("--date requiere un valor")?;
                        date = Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("fecha inválida '{raw}': {e}"))?);
                    }
                    other => return Err(format!("argumento desconocido: {other}")),
                }
                i += 1;
            }
            let action = action.ok_or("falta --action")?;
            Ok(Command::Run { action, date })
        }
        _ => Err(USAGE.to_string()),
    }
}

/// `--date` fija "hoy" al mediodía UTC (para re-ejecuciones retroactivas).
fn effective_now(date: Option<NaiveDate>) -> DateTime<Utc> {
    date.map_or_else(Utc::now, |d| d.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)).and_utc())
}

fn exit_code(err: &PipelineError) -> i32 {
    match err {
        PipelineError::UnknownAction(_) => 2,
        PipelineError::StageLocked { .. } | PipelineError::ThrottleConflict { .. } => 4,
        _ => 5,
    }
}

fn main() {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let command = match parse_args(&args) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    let pool = match build_pool_from_env() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("[clip-cli] pool error: {e}");
            std::process::exit(5);
        }
    };
    let store = PgPayoutStore::new(PoolProvider { pool });

    match command {
        Command::Throttle => match store.load_throttle() {
            Ok(state) => match serde_json::to_string_pretty(&state) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("[clip-cli] serialize error: {e}");
                    std::process::exit(5);
                }
            },
            Err(e) => {
                eprintln!("[clip-cli] throttle error: {e}");
                std::process::exit(5);
            }
        },
        Command::Run { action, date } => {
            let mut pipeline = PayoutPipeline::new(store);
            match pipeline.run(action, effective_now(date)) {
                Ok(report) => match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("[clip-cli] serialize error: {e}");
                        std::process::exit(5);
                    }
                },
                Err(e) => {
                    eprintln!("[clip-cli {action}] {e}");
                    std::process::exit(exit_code(&e));
                }
            }
        }
    }
}
