use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/v1/chat/";

/// Terminal chat with the book tutor assistant.
#[derive(Debug, Parser)]
#[command(name = "tutor", version, about, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(flatten)]
    pub chat: ChatArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the chat UI (the default).
    Chat(ChatArgs),

    /// Serve a local stand-in for the assistant endpoint.
    Serve(ServeArgs),
}

impl Cli {
    pub fn into_command(self) -> Command {
        match self.command {
            Some(command) => command,
            None => Command::Chat(self.chat),
        }
    }
}

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Assistant endpoint that receives chat messages.
    #[arg(long, env = "TUTOR_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Pause before a reply is shown, in milliseconds.
    #[arg(long, env = "TUTOR_REPLY_DELAY_MS", default_value_t = 500)]
    pub reply_delay_ms: u64,

    /// Give up on a request after this many seconds. Waits forever when unset.
    #[arg(long, env = "TUTOR_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Keep the conversation when the chat panel is hidden. Hiding starts over otherwise.
    #[arg(long, env = "TUTOR_KEEP_ON_CLOSE")]
    pub keep_on_close: bool,

    /// Start with the chat panel open.
    #[arg(long)]
    pub open: bool,

    /// Write logs to this file. The UI owns the terminal, so nothing is logged otherwise.
    #[arg(long, env = "TUTOR_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "TUTOR_LISTEN", default_value = "127.0.0.1:8000")]
    pub listen: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub endpoint: String,
    pub reply_delay: Duration,
    pub timeout: Option<Duration>,
    pub keep_on_close: bool,
    pub open: bool,
    pub log_file: Option<PathBuf>,
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        Self {
            endpoint: args.endpoint,
            reply_delay: Duration::from_millis(args.reply_delay_ms),
            timeout: args.timeout_secs.map(Duration::from_secs),
            keep_on_close: args.keep_on_close,
            open: args.open,
            log_file: args.log_file,
        }
    }
}
