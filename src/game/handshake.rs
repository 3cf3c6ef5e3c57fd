// Login handshake: RSA challenge-response and session key delivery
//
//   client                                server
//   ------  username (plaintext)  ------>
//           <------  16-byte challenge
//   ------  challenge, private-key op -->   verify with registered public key
//           <------  session key, RSA-encrypted to the public key
//
// The private-key operation on the challenge is PKCS#1 v1.5 type-1 padding
// with no digest prefix, i.e. an unprefixed PKCS#1 v1.5 signature over the
// raw challenge bytes. The server "decrypts" it by verifying that signature.
// Unknown users and bad responses get no reply; the connection just closes.

use crate::game::board::PlayerId;
use crate::game::cipher::{SessionCipher, SESSION_KEY_LEN};
use crate::game::error::{CryptoError, HandshakeError};
use crate::game::message::MessageChannel;
use crate::game::users::{UserRecord, UserRegistry};
use rand::RngCore;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use tokio::io::{AsyncRead, AsyncWrite};

/// Challenge length in bytes
pub const CHALLENGE_LEN: usize = 16;

/// Longest identity frame accepted before login
pub const MAX_IDENTITY_LEN: usize = 65535;

/// Characters of an unrecognised identity echoed into the log
const LOGGED_NAME_CHARS: usize = 32;

/// Server-side handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    AwaitIdentity,
    ChallengeSent,
    AwaitChallengeResponse,
    SessionKeySent,
    Authenticated,
    Rejected,
}

impl HandshakeState {
    pub fn is_finished(self) -> bool {
        matches!(self, HandshakeState::Authenticated | HandshakeState::Rejected)
    }
}

/// Per-connection state established by a successful login. Only an
/// authenticated handshake produces one.
#[derive(Debug)]
pub struct Session {
    pub username: String,
    pub player: PlayerId,
    pub cipher: SessionCipher,
}

/// Fresh random challenge
pub fn generate_challenge() -> [u8; CHALLENGE_LEN] {
    let mut challenge = [0u8; CHALLENGE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut challenge);
    challenge
}

/// Client side: apply the private key to the challenge
pub fn sign_challenge(key: &RsaPrivateKey, challenge: &[u8]) -> Result<Vec<u8>, CryptoError> {
    Ok(key.sign(Pkcs1v15Sign::new_unprefixed(), challenge)?)
}

/// Server side: check the response recovers exactly `challenge` under the
/// user's public key
pub fn verify_challenge(
    key: &RsaPublicKey,
    challenge: &[u8],
    response: &[u8],
) -> Result<(), HandshakeError> {
    key.verify(Pkcs1v15Sign::new_unprefixed(), challenge, response)
        .map_err(|_| HandshakeError::ChallengeMismatch)
}

/// Server side: wrap the session key for the user
pub fn seal_session_key(key: &RsaPublicKey, session_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut rng = rand::rngs::OsRng;
    Ok(key.encrypt(&mut rng, Pkcs1v15Encrypt, session_key)?)
}

/// Client side: unwrap the session key
pub fn open_session_key(key: &RsaPrivateKey, sealed: &[u8]) -> Result<SessionCipher, CryptoError> {
    let raw = key.decrypt(Pkcs1v15Encrypt, sealed)?;
    SessionCipher::from_slice(&raw)
}

/// Bounded copy of an untrusted name for log lines
fn loggable_name(name: &str) -> String {
    let mut chars = name.chars();
    let mut shown: String = chars.by_ref().take(LOGGED_NAME_CHARS).collect();
    if chars.next().is_some() {
        shown.push_str("...");
    }
    shown
}

/// What the server knows about a login between steps
struct PendingLogin<'a> {
    username: String,
    player: PlayerId,
    record: &'a UserRecord,
    challenge: [u8; CHALLENGE_LEN],
    session_key: [u8; SESSION_KEY_LEN],
}

/// Server half of the login exchange.
///
/// Each `step` performs the I/O for one transition:
///
/// - `AwaitIdentity` -> `ChallengeSent`: read the identity, look it up, send
///   the challenge
/// - `ChallengeSent` -> `SessionKeySent`: read and verify the response (the
///   state reads `AwaitChallengeResponse` while that read is pending), send
///   the sealed session key
/// - `SessionKeySent` -> `Authenticated`: hand out the `Session`
///
/// Any failure moves to `Rejected`.
pub struct ServerHandshake<'a> {
    registry: &'a UserRegistry,
    state: HandshakeState,
    pending: Option<PendingLogin<'a>>,
}

impl<'a> ServerHandshake<'a> {
    pub fn new(registry: &'a UserRegistry) -> Self {
        Self {
            registry,
            state: HandshakeState::AwaitIdentity,
            pending: None,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Drive the exchange to `Authenticated` or `Rejected`
    pub async fn run<S>(&mut self, channel: &mut MessageChannel<S>) -> Result<Session, HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            if let Some(session) = self.step(channel).await? {
                return Ok(session);
            }
        }
    }

    /// Advance one transition. Returns the session once `Authenticated`.
    pub async fn step<S>(
        &mut self,
        channel: &mut MessageChannel<S>,
    ) -> Result<Option<Session>, HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if self.state.is_finished() {
            return Err(HandshakeError::Finished);
        }

        let result = self.advance(channel).await;
        if result.is_err() {
            self.state = HandshakeState::Rejected;
            self.pending = None;
        }
        result
    }

    async fn advance<S>(
        &mut self,
        channel: &mut MessageChannel<S>,
    ) -> Result<Option<Session>, HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match self.state {
            HandshakeState::AwaitIdentity => {
                self.send_challenge(channel).await?;
                self.state = HandshakeState::ChallengeSent;
                Ok(None)
            }
            HandshakeState::ChallengeSent | HandshakeState::AwaitChallengeResponse => {
                self.state = HandshakeState::AwaitChallengeResponse;
                self.send_session_key(channel).await?;
                self.state = HandshakeState::SessionKeySent;
                Ok(None)
            }
            HandshakeState::SessionKeySent => {
                let login = self.pending.take().ok_or(HandshakeError::Finished)?;
                self.state = HandshakeState::Authenticated;
                Ok(Some(Session {
                    username: login.username,
                    player: login.player,
                    cipher: SessionCipher::new(login.session_key),
                }))
            }
            HandshakeState::Authenticated | HandshakeState::Rejected => {
                Err(HandshakeError::Finished)
            }
        }
    }

    async fn send_challenge<S>(&mut self, channel: &mut MessageChannel<S>) -> Result<(), HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let identity = channel.receive_max(MAX_IDENTITY_LEN).await?;
        let username = String::from_utf8_lossy(&identity).into_owned();

        let registry = self.registry;
        let found = match std::str::from_utf8(&identity) {
            Ok(name) => registry.lookup(name),
            Err(_) => None,
        };
        let Some((player, record)) = found else {
            tracing::warn!("Login attempt for unknown user {:?}", loggable_name(&username));
            return Err(HandshakeError::UnknownUser);
        };

        let challenge = generate_challenge();
        channel.send(&challenge).await?;
        tracing::debug!(
            "Challenge sent to {} (key {})",
            username,
            record.fingerprint()
        );

        self.pending = Some(PendingLogin {
            username,
            player,
            record,
            challenge,
            session_key: SessionCipher::generate_key(),
        });
        Ok(())
    }

    async fn send_session_key<S>(&mut self, channel: &mut MessageChannel<S>) -> Result<(), HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let login = self.pending.as_ref().ok_or(HandshakeError::Finished)?;
        let response = channel.receive().await?;

        if let Err(e) = verify_challenge(&login.record.public_key, &login.challenge, &response) {
            tracing::warn!("User {} failed the challenge", login.username);
            return Err(e);
        }

        let sealed = seal_session_key(&login.record.public_key, &login.session_key)?;
        channel.send(&sealed).await?;
        Ok(())
    }
}

/// Client half of the login exchange; returns the negotiated session cipher
pub async fn client_handshake<S>(
    channel: &mut MessageChannel<S>,
    username: &str,
    key: &RsaPrivateKey,
) -> Result<SessionCipher, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    channel.send(username.as_bytes()).await?;

    let challenge = channel.receive().await?;
    let response = sign_challenge(key, &challenge)?;
    channel.send(&response).await?;

    let sealed = channel.receive().await?;
    Ok(open_session_key(key, &sealed)?)
}
