//! Command-line interface definition for Queuechat
//!
//! This module defines the CLI structure using clap's derive API.

use crate::chat::ChatId;
use clap::{Args, Parser, Subcommand};

/// Queuechat - terminal client for a queued chat backend
///
/// Send messages to your chats and follow the reply queue until the
/// answer is ready.
#[derive(Parser, Debug, Clone)]
#[command(name = "queuechat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the backend base URL
    #[arg(long, env = "QUEUECHAT_API_URL")]
    pub api_url: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Queuechat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List your chats
    Chats {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one chat and its queue status
    Show {
        /// Chat id
        id: ChatId,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Create a new chat
    Create(CreateArgs),

    /// Send a message and wait for the reply
    Send {
        /// Chat id
        id: ChatId,

        /// Message text
        message: String,

        /// Return as soon as the message is accepted
        #[arg(long)]
        no_wait: bool,
    },

    /// Follow a chat's reply queue until the answer is ready
    Watch {
        /// Chat id
        id: ChatId,
    },

    /// Register a new account
    Register {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        username: String,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log in and print the session token
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// End the current session
    Logout,

    /// Show the logged-in account
    Me,

    /// Confirm your email with the emailed PIN code
    ConfirmEmail {
        /// Six-digit PIN code
        pin: String,
    },

    /// Request a new email confirmation PIN
    NewKey,
}

/// Options for creating a chat
#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Chat title
    #[arg(short, long)]
    pub title: String,

    /// Opening context for the assistant
    #[arg(long)]
    pub context: Option<String>,

    /// Progression type: 0 arithmetic, 1 geometric
    #[arg(long, default_value_t = 0)]
    pub progression: u8,

    /// Difficulty (0-4)
    #[arg(long, default_value_t = 2)]
    pub difficulty: u8,

    /// Politeness (0-4)
    #[arg(long, default_value_t = 2)]
    pub politeness: u8,

    /// Friendliness (0-4)
    #[arg(long, default_value_t = 2)]
    pub friendliness: u8,

    /// Rigidity (0-4)
    #[arg(long, default_value_t = 2)]
    pub rigidity: u8,

    /// Detail orientation (0-4)
    #[arg(long, default_value_t = 2)]
    pub detail_orientation: u8,

    /// Pacing (0-4)
    #[arg(long, default_value_t = 2)]
    pub pacing: u8,

    /// Language identifier (0-9)
    #[arg(long, default_value_t = 0)]
    pub language: u8,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
