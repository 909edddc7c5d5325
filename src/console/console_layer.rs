// Console layer - a line-oriented front end over the board service.
//
// Stands in for a real transport: every line is one request, handled to
// completion before the next is read.

pub mod commands;

use crate::core::board::{BoardService, BoardStore};
use commands::{execute, Command, ParseError, HELP};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Read commands from stdin until `quit` or end of input.
pub async fn run<S: BoardStore>(board: &BoardService<S>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", HELP);

    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => command,
            Err(ParseError::Empty) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match execute(board, command).await {
            Ok(reply) => println!("{}", reply),
            Err(e) => {
                tracing::error!("Command failed: {}", e);
                println!("Something went wrong, please try again.");
            }
        }
    }

    tracing::info!("Console closed");
    Ok(())
}
