//! Byte sources for the server-list stream
//!
//! - `-` reads standard input
//! - `tcp://host:port` connects over TCP
//! - anything else is a file path

use fxlist_core::{FxListError, Result};
use std::path::PathBuf;
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tracing::info;

pub type BoxedSource = Box<dyn AsyncRead + Send + Unpin>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Stdin,
    Tcp(String),
    File(PathBuf),
}

impl SourceSpec {
    pub fn parse(source: &str) -> Result<Self> {
        let source = source.trim();

        if source.is_empty() {
            return Err(FxListError::Config("source must not be empty".to_string()));
        }

        if source == "-" {
            return Ok(SourceSpec::Stdin);
        }

        if let Some(addr) = source.strip_prefix("tcp://") {
            if addr.is_empty() || !addr.contains(':') {
                return Err(FxListError::Config(format!(
                    "tcp source must be tcp://host:port, got {}",
                    source
                )));
            }
            return Ok(SourceSpec::Tcp(addr.to_string()));
        }

        Ok(SourceSpec::File(PathBuf::from(source)))
    }

    pub async fn open(&self) -> Result<BoxedSource> {
        match self {
            SourceSpec::Stdin => {
                info!("Reading server stream from stdin");
                Ok(Box::new(tokio::io::stdin()))
            }
            SourceSpec::Tcp(addr) => {
                let stream = TcpStream::connect(addr.as_str()).await?;
                stream.set_nodelay(true)?;
                info!("Connected to {}", addr);
                Ok(Box::new(stream))
            }
            SourceSpec::File(path) => {
                let file = tokio::fs::File::open(path).await?;
                info!("Reading server stream from {}", path.display());
                Ok(Box::new(file))
            }
        }
    }
}

/// Parse and open `source`
pub async fn open_source(source: &str) -> Result<BoxedSource> {
    SourceSpec::parse(source)?.open().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_parse_sources() {
        assert_eq!(SourceSpec::parse("-").unwrap(), SourceSpec::Stdin);
        assert_eq!(
            SourceSpec::parse("tcp://127.0.0.1:30120").unwrap(),
            SourceSpec::Tcp("127.0.0.1:30120".to_string())
        );
        assert_eq!(
            SourceSpec::parse("dumps/servers.bin").unwrap(),
            SourceSpec::File(PathBuf::from("dumps/servers.bin"))
        );
    }

    #[test]
    fn test_parse_rejects_bad_sources() {
        assert!(SourceSpec::parse("").is_err());
        assert!(SourceSpec::parse("   ").is_err());
        assert!(SourceSpec::parse("tcp://").is_err());
        assert!(SourceSpec::parse("tcp://localhost").is_err());
    }

    #[tokio::test]
    async fn test_open_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x02, 0x00, 0x00, 0x00, 0x28, 0x05]).unwrap();

        let mut source = open_source(file.path().to_str().unwrap()).await.unwrap();
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes).await.unwrap();
        assert_eq!(bytes, vec![0x02, 0x00, 0x00, 0x00, 0x28, 0x05]);
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let result = open_source("/definitely/not/here.bin").await;
        assert!(matches!(result, Err(FxListError::StreamFailure(_))));
    }

    #[tokio::test]
    async fn test_open_tcp_source() {
        use tokio::io::AsyncWriteExt;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"hello").await.unwrap();
        });

        let mut source = open_source(&format!("tcp://{}", addr)).await.unwrap();
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes).await.unwrap();
        assert_eq!(bytes, b"hello");
    }
}
