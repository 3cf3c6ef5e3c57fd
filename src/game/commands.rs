// Command handlers for the wordgrid CLI

use crate::game::*;
use anyhow::{Context, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Execute a CLI command
pub async fn execute_command(command: WordgridCommand) -> Result<()> {
    match command {
        WordgridCommand::Serve { board, users, bind, port } => {
            handle_serve(board, users, bind, port).await
        }
        WordgridCommand::Play { host, port, user, key, key_dir } => {
            handle_play(host, port, user, key, key_dir).await
        }
        WordgridCommand::Keygen { user, out_dir, bits } => handle_keygen(user, out_dir, bits),
    }
}

async fn handle_serve(board: PathBuf, users: PathBuf, bind: IpAddr, port: u16) -> Result<()> {
    let template = storage::load_board(&board)?;
    let registry = storage::load_users(&users)?;

    if registry.is_empty() {
        tracing::warn!("No users registered; nobody will be able to log in");
    }

    let server = GameServer::bind(SocketAddr::new(bind, port), registry, template).await?;
    server.run().await
}

async fn handle_play(
    host: String,
    port: u16,
    user: Option<String>,
    key: Option<PathBuf>,
    key_dir: PathBuf,
) -> Result<()> {
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    let username = match user {
        Some(user) => user,
        None => {
            stdout.write_all(b"Username: ").await?;
            stdout.flush().await?;
            let mut line = String::new();
            stdin
                .read_line(&mut line)
                .await
                .context("Failed to read username")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let key_path = key.unwrap_or_else(|| storage::private_key_path(&key_dir, &username));
    let private_key = storage::load_private_key(&key_path)?;

    let mut client = GameClient::connect((host.as_str(), port), &username, &private_key)
        .await
        .with_context(|| format!("Failed to log in to {}:{} as {}", host, port, username))?;

    client::run_console(&mut client, stdin, stdout).await?;
    client.exit().await?;

    Ok(())
}

fn handle_keygen(user: String, out_dir: PathBuf, bits: usize) -> Result<()> {
    println!("Generating {}-bit RSA key for {}...", bits, user);

    let key = keys::generate_private_key(bits)?;
    let (path, registry_line) = storage::write_keypair(&out_dir, &user, &key)?;

    println!("✓ Private key written to {:?}", path);
    println!("\nAdd this line to the user registry:");
    println!("{}", registry_line);

    Ok(())
}
