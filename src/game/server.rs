// TCP game server: accept loop and per-connection workers

use crate::game::board::{BoardState, BoardTemplate};
use crate::game::error::SessionError;
use crate::game::handshake::{ServerHandshake, Session};
use crate::game::message::MessageChannel;
use crate::game::protocol::{Command, EXIT_COMMAND};
use crate::game::scores::ScoreTable;
use crate::game::users::UserRegistry;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

/// Well-known game port
pub const DEFAULT_PORT: u16 = 26114;

/// The single board shared by every connection worker
pub type SharedBoard = Arc<Mutex<BoardState>>;

/// Read-only state handed to each worker
#[derive(Clone)]
pub struct GameContext {
    pub registry: Arc<UserRegistry>,
    pub scores: Arc<ScoreTable>,
    pub board: SharedBoard,
}

impl GameContext {
    /// Build a fresh game: the board is reset once here
    pub fn new(registry: UserRegistry, template: BoardTemplate) -> Self {
        let names = registry.names().map(str::to_string).collect::<Vec<_>>();
        let board = BoardState::new(template, names);

        Self {
            registry: Arc::new(registry),
            scores: Arc::new(ScoreTable::standard()),
            board: Arc::new(Mutex::new(board)),
        }
    }
}

/// A bound game server
pub struct GameServer {
    listener: TcpListener,
    context: GameContext,
}

impl GameServer {
    /// Bind the listener and set up a new game
    pub async fn bind(
        addr: SocketAddr,
        registry: UserRegistry,
        template: BoardTemplate,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        tracing::info!(
            "Game server listening on {} ({} users, {}x{} board)",
            listener.local_addr()?,
            registry.len(),
            template.height(),
            template.width()
        );

        let context = GameContext::new(registry, template);

        Ok(Self { listener, context })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn board(&self) -> SharedBoard {
        self.context.board.clone()
    }

    /// Accept connections forever, one task per connection
    pub async fn run(self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let context = self.context.clone();
                    let conn_id = Uuid::new_v4();
                    let span = tracing::info_span!("conn", id = %conn_id, %peer);

                    tokio::spawn(
                        async move {
                            tracing::debug!("Accepted connection");
                            match handle_connection(stream, context).await {
                                Ok(()) => tracing::info!("Connection closed"),
                                Err(e) => tracing::warn!("Connection dropped: {}", e),
                            }
                        }
                        .instrument(span),
                    );
                }
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Serve one TCP connection
pub async fn handle_connection(stream: TcpStream, context: GameContext) -> Result<(), SessionError> {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!("Could not set TCP_NODELAY: {}", e);
    }
    serve_stream(stream, context).await
}

/// Login then run the command loop until `exit` or a failure.
///
/// Generic over the stream so it can be driven in memory.
pub async fn serve_stream<S>(stream: S, context: GameContext) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut channel = MessageChannel::new(stream);

    let session = ServerHandshake::new(&context.registry)
        .run(&mut channel)
        .await?;
    tracing::info!("User {} logged in", session.username);

    command_loop(&mut channel, &session, &context).await
}

async fn command_loop<S>(
    channel: &mut MessageChannel<S>,
    session: &Session,
    context: &GameContext,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let frame = channel.receive().await?;
        let plaintext = session.cipher.decrypt(&frame)?;
        let request = String::from_utf8_lossy(&plaintext);

        if request == EXIT_COMMAND {
            tracing::info!("User {} exited", session.username);
            return Ok(());
        }

        let command = Command::parse(&request);
        tracing::debug!("{} -> {:?}", session.username, command);

        // Lock spans execute and encrypt only; the write must not hold it
        let sealed = {
            let mut board = context.board.lock().await;
            let reply = command.execute(&mut board, &context.scores, session.player);
            session.cipher.encrypt(reply.as_bytes())
        };
        channel.send(&sealed).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Terrain;
    use crate::game::error::HandshakeError;
    use crate::game::handshake::client_handshake;
    use crate::game::keys::generate_private_key;
    use crate::game::users::UserRecord;
    use rsa::{RsaPrivateKey, RsaPublicKey};
    use std::sync::OnceLock;
    use std::time::Duration;
    use tokio::io::duplex;

    fn alice_key() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| generate_private_key(1024).unwrap())
    }

    fn context(template: BoardTemplate) -> GameContext {
        let registry =
            UserRegistry::new([UserRecord::new("alice", RsaPublicKey::from(alice_key()))]).unwrap();
        GameContext::new(registry, template)
    }

    #[tokio::test]
    async fn test_session_over_memory_stream() {
        let context = context(BoardTemplate::filled(2, 2, Terrain::Free).unwrap());
        let board = context.board.clone();

        let (a, b) = duplex(4096);
        let server = tokio::spawn(serve_stream(a, context));

        let mut channel = MessageChannel::new(b);
        let cipher = client_handshake(&mut channel, "alice", alice_key())
            .await
            .unwrap();

        channel.send(&cipher.encrypt(b"place j 1 1")).await.unwrap();
        let reply = cipher.decrypt(&channel.receive().await.unwrap()).unwrap();
        assert_eq!(reply, b"8 points\n");

        channel.send(&cipher.encrypt(b"board")).await.unwrap();
        let reply = cipher.decrypt(&channel.receive().await.unwrap()).unwrap();
        assert_eq!(reply, b"oo\noj\nalice: 8\n");

        // No reply to exit; the server just hangs up
        channel.send(&cipher.encrypt(b"exit")).await.unwrap();
        assert!(server.await.unwrap().is_ok());
        assert!(channel.receive().await.is_err());

        assert_eq!(board.lock().await.render(), "oo\noj\nalice: 8\n");
    }

    #[tokio::test]
    async fn test_garbled_ciphertext_ends_session() {
        let context = context(BoardTemplate::filled(1, 1, Terrain::Free).unwrap());

        let (a, b) = duplex(4096);
        let server = tokio::spawn(serve_stream(a, context));

        let mut channel = MessageChannel::new(b);
        client_handshake(&mut channel, "alice", alice_key())
            .await
            .unwrap();

        channel.send(&[1, 2, 3]).await.unwrap();
        assert!(matches!(
            server.await.unwrap(),
            Err(SessionError::Crypto(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_user_ends_session() {
        let context = context(BoardTemplate::filled(1, 1, Terrain::Free).unwrap());

        let (a, b) = duplex(4096);
        let server = tokio::spawn(serve_stream(a, context));

        let mut channel = MessageChannel::new(b);
        channel.send(b"mallory").await.unwrap();

        assert!(matches!(
            server.await.unwrap(),
            Err(SessionError::Handshake(HandshakeError::UnknownUser))
        ));
        assert!(channel.receive().await.is_err());
    }

    #[tokio::test]
    async fn test_unread_replies_do_not_hold_the_board() {
        // 20x20 renders past the pipe capacity, so the first reply write blocks
        let context = context(BoardTemplate::filled(20, 20, Terrain::Free).unwrap());
        let board = context.board.clone();

        let (a, b) = duplex(256);
        let server = tokio::spawn(serve_stream(a, context));

        let mut channel = MessageChannel::new(b);
        let cipher = client_handshake(&mut channel, "alice", alice_key())
            .await
            .unwrap();

        for _ in 0..4 {
            channel.send(&cipher.encrypt(b"board")).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        let guard = tokio::time::timeout(Duration::from_secs(2), board.lock()).await;
        assert!(guard.is_ok(), "stalled reader kept the board locked");
        drop(guard);

        drop(channel);
        assert!(server.await.unwrap().is_err());
    }
}
