//! Line-oriented game screens.

use crate::form::{FormError, PlayerForm};
use anyhow::{Result, anyhow};
use derive_more::{Display, Error, From};
use noughts::{
    Engine, EngineError, Game, GameId, GameStats, Outcome, Position, ViewGuard, format_elapsed,
    list_time,
};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, instrument};

const HELP: &str = "\
Commands:
  new <name> <age> <email> [first|second]   create a game
  list                                      show all games
  open <id>                                 view a game
  close                                     leave the current game
  play <1-9|label>                          place your mark
  undo | redo | reset                       history controls
  stats                                     win/loss statistics
  help | quit";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a game from form fields.
    New {
        /// Name as typed.
        name: String,
        /// Age as typed.
        age: String,
        /// Email as typed.
        email: String,
        /// Player moves first.
        start_first: bool,
    },
    /// List all games.
    List,
    /// View a game.
    Open(GameId),
    /// Stop viewing.
    Close,
    /// Place a mark at a 0-based square.
    Play(usize),
    /// Undo in the viewed game.
    Undo,
    /// Redo in the viewed game.
    Redo,
    /// Reset the viewed game.
    Reset,
    /// Show statistics.
    Stats,
    /// Show help.
    Help,
    /// Exit.
    Quit,
}

/// Why an input line could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum CommandError {
    /// Blank line.
    #[display("type `help` for commands")]
    #[from(ignore)]
    Empty,
    /// Unrecognized verb.
    #[display("unknown command `{_0}`")]
    #[from(ignore)]
    Unknown(#[error(not(source))] String),
    /// Verb without its argument.
    #[display("missing {_0}")]
    #[from(ignore)]
    Missing(#[error(not(source))] &'static str),
    /// Game id is not a number.
    #[display("`{_0}` is not a game id")]
    #[from(ignore)]
    BadGameId(#[error(not(source))] String),
    /// Square is neither 1-9 nor a label.
    #[display("`{_0}` is not a square (use 1-9 or a label like center)")]
    #[from(ignore)]
    BadSquare(#[error(not(source))] String),
    /// No game is open.
    #[display("open a game first")]
    #[from(ignore)]
    NoGameOpen,
    /// Form rejected the new game.
    #[display("{_0}")]
    Form(FormError),
}

/// Parses one input line.
#[instrument]
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let verb = words.next().ok_or(CommandError::Empty)?.to_lowercase();
    let mut arg = |what| words.next().ok_or(CommandError::Missing(what));

    let command = match verb.as_str() {
        "new" => {
            let name = arg("name")?.to_string();
            let age = arg("age")?.to_string();
            let email = arg("email")?.to_string();
            let start_first = matches!(words.next(), Some(w) if w.eq_ignore_ascii_case("first"));
            Command::New {
                name,
                age,
                email,
                start_first,
            }
        }
        "list" | "ls" => Command::List,
        "open" => {
            let raw = arg("game id")?;
            Command::Open(
                raw.parse()
                    .map_err(|_| CommandError::BadGameId(raw.to_string()))?,
            )
        }
        "close" | "back" => Command::Close,
        "play" | "p" => {
            let rest: Vec<&str> = words.collect();
            if rest.is_empty() {
                return Err(CommandError::Missing("square"));
            }
            Command::Play(parse_square(&rest.join(" "))?)
        }
        "undo" | "u" => Command::Undo,
        "redo" | "r" => Command::Redo,
        "reset" => Command::Reset,
        "stats" => Command::Stats,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(command)
}

/// Squares are numbered 1-9 on screen; labels name them directly.
fn parse_square(raw: &str) -> Result<usize, CommandError> {
    if let Ok(number) = raw.parse::<usize>() {
        return number
            .checked_sub(1)
            .ok_or_else(|| CommandError::BadSquare(raw.to_string()));
    }
    Position::from_label(raw)
        .map(Position::to_index)
        .ok_or_else(|| CommandError::BadSquare(raw.to_string()))
}

/// Renders the board screen for one game.
pub fn render_game(game: &Game) -> String {
    let mut out = vec![
        format!("Welcome, {}! Have a good game...", game.player_name()),
        format!("Time: {}", format_elapsed(*game.total_time())),
    ];
    if !game.is_over() {
        out.push(if game.is_human_turn() {
            "Your Turn".to_string()
        } else {
            "Opponent's Turn".to_string()
        });
    }
    out.push(String::new());
    out.push(game.board().display());
    out.push(String::new());
    match game.outcome() {
        Outcome::HumanWon => out.push("🎉 You Win!".to_string()),
        Outcome::OpponentWon => out.push("🎉 Opponent Wins!".to_string()),
        Outcome::Draw => out.push("It's a Draw! 🤝".to_string()),
        Outcome::InProgress => {}
    }
    let mut controls = Vec::new();
    if game.can_undo() {
        controls.push("undo");
    }
    if game.can_redo() {
        controls.push("redo");
    }
    controls.push("reset");
    out.push(format!("[{}]", controls.join("] [")));
    out.join("\n")
}

/// Renders the game list.
pub fn render_list(games: &[Game]) -> String {
    if games.is_empty() {
        return "No games yet. Create one with `new`.".to_string();
    }
    games
        .iter()
        .map(|game| {
            format!(
                "{:>3}. {:<16} {:<10} {}",
                game.id(),
                game.player_name(),
                game.status(),
                list_time(game)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the statistics panel.
pub fn render_stats(stats: &GameStats) -> String {
    format!(
        "Total Games: {}  Games Won: {}  Games Lost: {}",
        stats.total_games(),
        stats.games_won(),
        stats.games_lost()
    )
}

fn rejected(e: EngineError) -> anyhow::Error {
    anyhow!("{}", e.kind)
}

/// Interactive session over stdin/stdout.
#[derive(Debug)]
pub struct Repl {
    engine: Engine,
    reply_delay: Duration,
    json: bool,
    view: Option<ViewGuard>,
}

impl Repl {
    /// Creates a session around an engine.
    pub fn new(engine: Engine, reply_delay: Duration, json: bool) -> Self {
        Self {
            engine,
            reply_delay,
            json,
            view: None,
        }
    }

    /// Reads commands until `quit` or end of input.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> Result<()> {
        println!("{HELP}\n");
        println!("{}", render_list(&self.engine.games()));
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        prompt()?;
        while let Some(line) = lines.next_line().await? {
            match parse(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => {
                    if let Err(e) = self.execute(command).await {
                        println!("! {e}");
                    }
                }
                Err(e) => println!("! {e}"),
            }
            prompt()?;
        }
        info!("Leaving noughts");
        Ok(())
    }

    fn viewed(&self) -> Result<GameId> {
        Ok(self
            .view
            .as_ref()
            .ok_or(CommandError::NoGameOpen)?
            .id())
    }

    #[instrument(skip(self))]
    async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::New {
                name,
                age,
                email,
                start_first,
            } => {
                let form = PlayerForm {
                    player_name: &name,
                    age: &age,
                    email: &email,
                    start_first,
                };
                let params = form.validate().map_err(CommandError::from)?;
                let id = self.engine.create_game(params);
                println!("Created game {id}. `open {id}` to play.");
            }
            Command::List => {
                let games = self.engine.games();
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&games)?);
                } else {
                    println!("{}", render_list(&games));
                }
            }
            Command::Open(id) => {
                // Drop the previous ticker before starting a new one.
                self.view = None;
                self.view = Some(self.engine.open_view(id).map_err(rejected)?);
                self.show(id).await?;
            }
            Command::Close => {
                self.view = None;
                println!("{}", render_list(&self.engine.games()));
            }
            Command::Play(index) => {
                let id = self.viewed()?;
                self.engine.apply_human_move(id, index).map_err(rejected)?;
                self.show(id).await?;
            }
            Command::Undo => {
                let id = self.viewed()?;
                self.engine.undo(id).map_err(rejected)?;
                self.show(id).await?;
            }
            Command::Redo => {
                let id = self.viewed()?;
                self.engine.redo(id).map_err(rejected)?;
                self.show(id).await?;
            }
            Command::Reset => {
                let id = self.viewed()?;
                self.engine.reset(id).map_err(rejected)?;
                self.show(id).await?;
            }
            Command::Stats => {
                let stats = self.engine.stats();
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    println!("{}", render_stats(&stats));
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
        }
        Ok(())
    }

    /// Prints the game, then again once a pending opponent reply lands.
    async fn show(&self, id: GameId) -> Result<()> {
        let game = self.engine.game(id).ok_or_else(|| anyhow!("game {id} not found"))?;
        println!("{}", render_game(&game));
        if !self.engine.has_pending_reply(id) {
            return Ok(());
        }

        println!("Opponent is thinking...");
        let poll = (self.reply_delay / 5).max(Duration::from_millis(10));
        while self.engine.has_pending_reply(id) {
            tokio::time::sleep(poll).await;
        }
        debug!("Opponent reply landed");
        let game = self.engine.game(id).ok_or_else(|| anyhow!("game {id} not found"))?;
        println!("\n{}", render_game(&game));
        Ok(())
    }
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}
