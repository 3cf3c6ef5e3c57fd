// Error taxonomy for the wire protocol

use thiserror::Error;

/// Failures of the framed byte stream. Always fatal to the connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer closed the stream before a full frame arrived
    #[error("connection closed by peer")]
    Closed,

    /// A length prefix (or outgoing payload) exceeded the frame limit
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),

    /// Any other I/O failure on the socket
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Fold `UnexpectedEof` into `Closed` so callers see one variant for hang-ups
    pub fn from_read(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            TransportError::Closed
        } else {
            TransportError::Io(err)
        }
    }
}

/// Failures of the asymmetric or session cipher.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("ciphertext length {0} is not a positive multiple of the block size")]
    BadLength(usize),

    #[error("invalid padding")]
    BadPadding,

    #[error("session key must be 16 bytes, got {0}")]
    BadKeyLength(usize),

    #[error("RSA operation failed: {0}")]
    Rsa(#[from] rsa::Error),
}

/// Reasons a login handshake ends without a session.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// Identity did not match a registered user
    #[error("unknown user")]
    UnknownUser,

    /// The signed challenge did not verify against the user's public key
    #[error("challenge response did not match")]
    ChallengeMismatch,

    /// `step` was called after the handshake had already ended
    #[error("handshake already finished")]
    Finished,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Anything that ends a connection worker.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
