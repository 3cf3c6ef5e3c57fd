// CLI commands for the game server and reference client

use crate::game::keys::DEFAULT_KEY_BITS;
use crate::game::server::DEFAULT_PORT;
use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Word grid game CLI
#[derive(Debug, Parser)]
#[command(name = "wordgrid")]
#[command(about = "Letter placement game over an RSA-authenticated, encrypted TCP session")]
pub struct WordgridCli {
    #[command(subcommand)]
    pub command: WordgridCommand,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum WordgridCommand {
    /// Run the game server
    Serve {
        /// Board template file
        #[arg(short, long, default_value = "input/board.txt")]
        board: PathBuf,

        /// User registry file (`<name> <base64 public key>` per line)
        #[arg(short, long, default_value = "input/passwd.txt")]
        users: PathBuf,

        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0")]
        bind: IpAddr,

        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Connect to a server and play interactively
    Play {
        /// Server host name or address
        host: String,

        /// Server port
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// User to log in as (prompted for if omitted)
        #[arg(short, long)]
        user: Option<String>,

        /// Private key file (default: <key-dir>/<user>.txt)
        #[arg(short, long)]
        key: Option<PathBuf>,

        /// Directory holding per-user private key files
        #[arg(long, default_value = "input")]
        key_dir: PathBuf,
    },

    /// Generate a key pair for a new user
    Keygen {
        /// User name
        #[arg(short, long)]
        user: String,

        /// Directory to write the private key file into
        #[arg(short, long, default_value = "input")]
        out_dir: PathBuf,

        /// RSA modulus size in bits
        #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
        bits: usize,
    },
}
