// On-disk game configuration: board template, user registry, private keys

use crate::game::board::{BoardTemplate, Terrain};
use crate::game::keys;
use crate::game::users::{UserRecord, UserRegistry};
use anyhow::{bail, Context, Result};
use rsa::RsaPrivateKey;
use std::path::{Path, PathBuf};

/// Default board template file name
pub const BOARD_FILE: &str = "board.txt";

/// Default user registry file name
pub const USERS_FILE: &str = "passwd.txt";

/// Parse a board template.
///
/// Format: a `<height> <width>` header line, then `height` lines of exactly
/// `width` terrain characters (`o`, `.`, `:`).
pub fn parse_board(text: &str) -> Result<BoardTemplate> {
    let mut lines = text.lines();

    let header = lines.next().context("Board file is empty")?;
    let mut dims = header.split_whitespace().map(str::parse::<usize>);
    let (height, width) = match (dims.next(), dims.next(), dims.next()) {
        (Some(Ok(h)), Some(Ok(w)), None) => (h, w),
        _ => bail!("Board header must be '<height> <width>', got {:?}", header),
    };

    let mut rows = Vec::with_capacity(height);
    for i in 0..height {
        let line = lines
            .next()
            .with_context(|| format!("Board has {} rows, expected {}", i, height))?;
        let line = line.trim_end_matches('\r');

        let row = line
            .chars()
            .map(|c| {
                Terrain::from_char(c)
                    .with_context(|| format!("Row {} has invalid terrain {:?}", i, c))
            })
            .collect::<Result<Vec<_>>>()?;

        if row.len() != width {
            bail!("Row {} has {} cells, expected {}", i, row.len(), width);
        }
        rows.push(row);
    }

    Ok(BoardTemplate::new(rows)?)
}

/// Parse a user registry: one `<name> <base64 public key>` per line
pub fn parse_users(text: &str) -> Result<UserRegistry> {
    let mut records = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (name, key) = line
            .split_once(char::is_whitespace)
            .with_context(|| format!("Line {}: expected '<name> <key>'", lineno + 1))?;

        let public_key = keys::decode_public_key(key)
            .with_context(|| format!("Line {}: bad key for user '{}'", lineno + 1, name))?;

        records.push(UserRecord::new(name, public_key));
    }

    Ok(UserRegistry::new(records)?)
}

pub fn load_board(path: &Path) -> Result<BoardTemplate> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read board file {:?}", path))?;
    parse_board(&text).with_context(|| format!("Invalid board file {:?}", path))
}

pub fn load_users(path: &Path) -> Result<UserRegistry> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read user file {:?}", path))?;
    let registry = parse_users(&text).with_context(|| format!("Invalid user file {:?}", path))?;

    tracing::info!("Loaded {} users from {:?}", registry.len(), path);
    Ok(registry)
}

/// Load a private key file (first non-empty line is base64 PKCS#8)
pub fn load_private_key(path: &Path) -> Result<RsaPrivateKey> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file {:?}", path))?;
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .with_context(|| format!("Key file {:?} is empty", path))?;
    keys::decode_private_key(line).with_context(|| format!("Invalid key file {:?}", path))
}

/// Conventional private key location for a user: `<dir>/<name>.txt`
pub fn private_key_path(dir: &Path, username: &str) -> PathBuf {
    dir.join(format!("{}.txt", username))
}

/// Write a private key file for `username` into `dir` and return the
/// registry line for its public half
pub fn write_keypair(dir: &Path, username: &str, key: &RsaPrivateKey) -> Result<(PathBuf, String)> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;

    let path = private_key_path(dir, username);
    let private_text = keys::encode_private_key(key)?;
    std::fs::write(&path, format!("{}\n", private_text))
        .with_context(|| format!("Failed to write key file {:?}", path))?;

    let public_text = keys::encode_public_key(&rsa::RsaPublicKey::from(key))?;
    Ok((path, format!("{} {}", username, public_text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_board() {
        let board = parse_board("2 3\no.:\n...\n").unwrap();
        assert_eq!((board.height(), board.width()), (2, 3));
        assert_eq!(board.terrain(0, 2), Some(Terrain::Double));
        assert_eq!(board.terrain(1, 0), Some(Terrain::Plain));
    }

    #[test]
    fn test_parse_board_tolerates_crlf() {
        let board = parse_board("1 2\r\noo\r\n").unwrap();
        assert_eq!(board.width(), 2);
    }

    #[test]
    fn test_parse_board_errors() {
        assert!(parse_board("").is_err());
        assert!(parse_board("2\n..\n..").is_err());
        assert!(parse_board("2 2\n..\n").is_err(), "missing row");
        assert!(parse_board("2 2\n..\n...").is_err(), "wrong width");
        assert!(parse_board("1 2\n.x").is_err(), "bad terrain");
        assert!(parse_board("0 0\n").is_err(), "empty board");
    }

    #[test]
    fn test_users_and_keys_on_disk() {
        let dir = tempdir().unwrap();
        let alice = keys::generate_private_key(512).unwrap();
        let bob = keys::generate_private_key(512).unwrap();

        let (alice_path, alice_line) = write_keypair(dir.path(), "alice", &alice).unwrap();
        let (_, bob_line) = write_keypair(dir.path(), "bob", &bob).unwrap();
        assert_eq!(alice_path, private_key_path(dir.path(), "alice"));

        let users_path = dir.path().join(USERS_FILE);
        std::fs::write(&users_path, format!("{}\n\n{}\n", alice_line, bob_line)).unwrap();

        let registry = load_users(&users_path).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["alice", "bob"]);
        assert_eq!(
            registry.lookup("bob").unwrap().1.public_key,
            rsa::RsaPublicKey::from(&bob)
        );

        assert_eq!(load_private_key(&alice_path).unwrap(), alice);
    }

    #[test]
    fn test_parse_users_errors() {
        assert!(parse_users("alice").is_err());
        assert!(parse_users("alice notakey").is_err());
        assert!(parse_users("").unwrap().is_empty());
    }

    #[test]
    fn test_missing_files() {
        let dir = tempdir().unwrap();
        assert!(load_board(&dir.path().join(BOARD_FILE)).is_err());
        assert!(load_users(&dir.path().join(USERS_FILE)).is_err());
        assert!(load_private_key(&dir.path().join("nobody.txt")).is_err());
    }
}
