// Client side of a game session

use crate::game::cipher::SessionCipher;
use crate::game::error::{HandshakeError, SessionError};
use crate::game::handshake::client_handshake;
use crate::game::message::MessageChannel;
use crate::game::protocol::EXIT_COMMAND;
use anyhow::{Context, Result};
use rsa::RsaPrivateKey;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

/// An authenticated connection to a game server
pub struct GameClient {
    channel: MessageChannel<TcpStream>,
    cipher: SessionCipher,
    username: String,
}

impl GameClient {
    /// Connect and log in as `username`
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        username: &str,
        key: &RsaPrivateKey,
    ) -> Result<Self, SessionError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| HandshakeError::Transport(e.into()))?;
        stream
            .set_nodelay(true)
            .map_err(|e| HandshakeError::Transport(e.into()))?;

        let mut channel = MessageChannel::new(stream);
        let cipher = client_handshake(&mut channel, username, key).await?;

        tracing::debug!("Logged in as {}", username);

        Ok(Self {
            channel,
            cipher,
            username: username.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Send one command and wait for its reply
    pub async fn request(&mut self, command: &str) -> Result<String, SessionError> {
        self.channel
            .send(&self.cipher.encrypt(command.as_bytes()))
            .await?;

        let frame = self.channel.receive().await?;
        let reply = self.cipher.decrypt(&frame)?;
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }

    /// Tell the server we are leaving and close the connection
    pub async fn exit(mut self) -> Result<(), SessionError> {
        self.channel
            .send(&self.cipher.encrypt(EXIT_COMMAND.as_bytes()))
            .await?;
        self.channel.close().await?;
        Ok(())
    }
}

/// Interactive loop: prompt, forward each line, print the reply.
/// `exit` or end of input ends the session.
pub async fn run_console<R, W>(client: &mut GameClient, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(b"cmd> ").await?;
        output.flush().await?;

        let line = match lines.next_line().await.context("Failed to read input")? {
            Some(line) => line,
            None => break,
        };
        if line == EXIT_COMMAND {
            break;
        }

        let reply = client
            .request(&line)
            .await
            .context("Lost connection to server")?;
        output.write_all(reply.as_bytes()).await?;
    }

    output.flush().await?;
    Ok(())
}
