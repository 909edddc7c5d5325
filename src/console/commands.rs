// Console commands - parsing one input line and running it against the board.
//
// Output is plain text for acknowledgements and JSON for listings.

use crate::core::board::{BoardError, BoardService, BoardStore};
use std::str::FromStr;
use thiserror::Error;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

pub const HELP: &str = "\
Commands:
  post <author> <text>              submit a new post
  comment <post_id> <author> <text> comment on a post
  like <post_id> <author>           like / unlike a post
  feed                              all posts with comments and likes
  comments <post_id>                comments on one post
  likes <post_id>                   likes on one post
  remove <post_id>                  delete a post and its children
  help                              show this message
  quit                              exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Post { author: String, body: String },
    Comment { post_id: u64, author: String, body: String },
    Like { post_id: u64, actor: String },
    Feed,
    Comments { post_id: u64 },
    Likes { post_id: u64 },
    Remove { post_id: u64 },
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// Split off the first whitespace-delimited word. The remainder keeps its
/// inner spacing, which matters for post bodies.
fn next_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    match input.find(char::is_whitespace) {
        Some(end) => Some((&input[..end], &input[end..])),
        None => Some((input, "")),
    }
}

fn parse_post_id<'a>(
    word: Option<(&'a str, &'a str)>,
    usage: &'static str,
) -> Result<(u64, &'a str), ParseError> {
    let (raw, rest) = word.ok_or(ParseError::Usage(usage))?;
    let id = raw.parse().map_err(|_| ParseError::Usage(usage))?;
    Ok((id, rest))
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (name, rest) = next_word(line).ok_or(ParseError::Empty)?;

        match name.to_lowercase().as_str() {
            "post" => {
                const USAGE: &str = "post <author> <text>";
                let (author, body) = next_word(rest).ok_or(ParseError::Usage(USAGE))?;
                Ok(Command::Post {
                    author: author.to_string(),
                    body: body.trim_start().to_string(),
                })
            }
            "comment" => {
                const USAGE: &str = "comment <post_id> <author> <text>";
                let (post_id, rest) = parse_post_id(next_word(rest), USAGE)?;
                let (author, body) = next_word(rest).ok_or(ParseError::Usage(USAGE))?;
                Ok(Command::Comment {
                    post_id,
                    author: author.to_string(),
                    body: body.trim_start().to_string(),
                })
            }
            "like" => {
                const USAGE: &str = "like <post_id> <author>";
                let (post_id, rest) = parse_post_id(next_word(rest), USAGE)?;
                let (actor, _) = next_word(rest).ok_or(ParseError::Usage(USAGE))?;
                Ok(Command::Like {
                    post_id,
                    actor: actor.to_string(),
                })
            }
            "feed" => Ok(Command::Feed),
            "comments" => {
                let (post_id, _) = parse_post_id(next_word(rest), "comments <post_id>")?;
                Ok(Command::Comments { post_id })
            }
            "likes" => {
                let (post_id, _) = parse_post_id(next_word(rest), "likes <post_id>")?;
                Ok(Command::Likes { post_id })
            }
            "remove" => {
                let (post_id, _) = parse_post_id(next_word(rest), "remove <post_id>")?;
                Ok(Command::Remove { post_id })
            }
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

/// Run a command and render what the user should see.
///
/// Rejections and missing posts come back as `Ok` text: they are answers,
/// not failures. Anything else is returned as an error for the caller to log.
pub async fn execute<S: BoardStore>(
    board: &BoardService<S>,
    command: Command,
) -> Result<String, Error> {
    let result = match command {
        Command::Post { author, body } => board
            .submit_post(&author, &body)
            .await
            .map(|post| format!("Posted #{}", post.id)),
        Command::Comment {
            post_id,
            author,
            body,
        } => board
            .submit_comment(post_id, &author, &body)
            .await
            .map(|comment| format!("Commented #{} on post #{}", comment.id, post_id)),
        Command::Like { post_id, actor } => {
            board
                .toggle_reaction(post_id, &actor)
                .await
                .map(|outcome| {
                    let verb = if outcome.liked { "liked" } else { "unliked" };
                    format!("{} {} post #{}", actor, verb, post_id)
                })
        }
        Command::Feed => match board.feed().await {
            Ok(feed) => return Ok(serde_json::to_string_pretty(&feed)?),
            Err(e) => Err(e),
        },
        Command::Comments { post_id } => match board.comments_for(post_id).await {
            Ok(comments) => return Ok(serde_json::to_string_pretty(&comments)?),
            Err(e) => Err(e),
        },
        Command::Likes { post_id } => match board.reactions_for(post_id).await {
            Ok(reactions) => return Ok(serde_json::to_string_pretty(&reactions)?),
            Err(e) => Err(e),
        },
        Command::Remove { post_id } => board
            .remove_post(post_id)
            .await
            .map(|_| format!("Removed post #{}", post_id)),
        Command::Help => Ok(HELP.to_string()),
        Command::Quit => Ok(String::new()),
    };

    match result {
        Ok(text) => Ok(text),
        Err(BoardError::Rejected(rejected)) => Ok(rejected.to_string()),
        Err(BoardError::NotFound(what)) => Ok(format!("Not found: {}", what)),
        Err(e) => Err(e.into()),
    }
}
