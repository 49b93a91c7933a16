// Copyright 2022 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use mailbox::{
    core::{Color, Square},
    position::{ErrorKind, FenParseError, Position},
};
use serde::Serialize;
use structopt::StructOpt;
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

/// Validates FEN strings and reports on the positions they describe.
#[derive(Debug, StructOpt)]
struct Options {
    /// FEN representations of the positions to check. Each must be quoted as a single argument.
    #[structopt(name = "FEN", required = true)]
    fens: Vec<String>,

    /// Print one JSON report per line instead of a board diagram.
    #[structopt(long)]
    json: bool,

    /// Print nothing; the exit status alone reports whether every position was accepted.
    #[structopt(short, long)]
    quiet: bool,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    input: &'a str,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    fen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    side_to_move: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    checkers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> Report<'a> {
    fn new(input: &'a str, result: &Result<Position, FenParseError>) -> Report<'a> {
        match result {
            Ok(pos) => {
                let side = pos.side_to_move();
                Report {
                    input,
                    accepted: true,
                    fen: Some(pos.as_fen()),
                    side_to_move: Some(side.to_string()),
                    checkers: pos
                        .checkers(side)
                        .iter()
                        .map(|(sq, piece)| format!("{}{}", piece, sq))
                        .collect(),
                    error_kind: None,
                    error: None,
                }
            }
            Err(err) => Report {
                input,
                accepted: false,
                fen: None,
                side_to_move: None,
                checkers: vec![],
                error_kind: Some(kind_name(err.kind())),
                error: Some(err.to_string()),
            },
        }
    }
}

fn kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Malformed => "malformed",
        ErrorKind::Illegal => "illegal",
        ErrorKind::Internal => "internal",
    }
}

fn print_position(pos: &Position) {
    println!("{}", pos);
    let side = pos.side_to_move();
    println!("{:<20} {}", "Side to move:", side);
    for color in [Color::White, Color::Black] {
        let checkers: Vec<Square> = pos.checkers(color).iter().map(|(sq, _)| sq).collect();
        if !checkers.is_empty() {
            let squares: Vec<String> = checkers.iter().map(Square::to_string).collect();
            println!(
                "{:<20} {} (from {})",
                "In check:",
                color,
                squares.join(", ")
            );
        }
    }
}

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(LevelFilter::WARN)
        .with_env_filter(EnvFilter::from_env("MAILBOX_LOG"))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Options::from_args();
    let mut rejected = 0;
    for input in &args.fens {
        let result = Position::from_fen(input);
        if result.is_err() {
            rejected += 1;
        }

        if args.quiet {
            continue;
        }

        if args.json {
            println!("{}", serde_json::to_string(&Report::new(input, &result))?);
            continue;
        }

        match result {
            Ok(ref pos) => print_position(pos),
            Err(ref err) => println!("{}: {} ({})", input, err, kind_name(err.kind())),
        }
    }

    if rejected != 0 {
        tracing::warn!(rejected, total = args.fens.len(), "some positions were rejected");
        std::process::exit(1);
    }

    Ok(())
}
