use std::fmt;
use std::fs::DirBuilder;
use std::net::IpAddr;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Local endpoint shared by the daemon and its clients.
///
/// The bridge trusts every peer that can reach the endpoint, so only
/// same-machine transports are representable: a Unix domain socket, or a TCP
/// port on a loopback address.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum SocketEndpoint {
    /// Unix domain socket endpoint.
    Unix { path: Utf8PathBuf },
    /// Loopback TCP endpoint.
    Tcp { host: String, port: u16 },
}

impl SocketEndpoint {
    /// Builds a Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a TCP socket endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket path when the endpoint uses the Unix transport.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Tcp { .. } => None,
        }
    }

    /// Creates the socket's parent directory, readable only by its owner.
    ///
    /// TCP endpoints need no filesystem preparation.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(path) = self.unix_path() else {
            return Ok(());
        };
        let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) else {
            return Err(SocketPreparationError::MissingParent {
                path: path.to_path_buf(),
            });
        };

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        builder
            .create(parent.as_std_path())
            .map_err(|source| SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "unix://{path}"),
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        match url.scheme() {
            "unix" => {
                let path = url.path();
                if path.is_empty() {
                    return Err(SocketParseError::MissingUnixPath(input.to_owned()));
                }
                Ok(Self::unix(path))
            }
            "tcp" => {
                let host = url
                    .host_str()
                    .ok_or_else(|| SocketParseError::MissingHost(input.to_owned()))?;
                let port = url
                    .port()
                    .ok_or_else(|| SocketParseError::MissingPort(input.to_owned()))?;
                if !is_loopback_host(host) {
                    return Err(SocketParseError::NonLoopbackHost(host.to_owned()));
                }
                Ok(Self::tcp(host, port))
            }
            other => Err(SocketParseError::UnsupportedScheme(other.to_owned())),
        }
    }
}

fn is_loopback_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok_and(|address| address.is_loopback())
}

/// Errors encountered while parsing a [`SocketEndpoint`] from text.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// Scheme was neither `unix` nor `tcp`.
    #[error("unsupported socket scheme '{0}'")]
    UnsupportedScheme(String),
    /// TCP host name was missing.
    #[error("missing TCP host in '{0}'")]
    MissingHost(String),
    /// TCP port was missing from the address.
    #[error("missing TCP port in '{0}'")]
    MissingPort(String),
    /// TCP host would expose the bridge beyond this machine.
    #[error("TCP host '{0}' is not a loopback address")]
    NonLoopbackHost(String),
    /// Unix socket path was absent.
    #[error("missing Unix socket path in '{0}'")]
    MissingUnixPath(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors raised when preparing socket directories.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// The Unix socket path has no parent directory.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent { path: Utf8PathBuf },
    /// Failed to create the socket directory.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn displays_unix_socket_as_url() {
        let endpoint = SocketEndpoint::unix("/run/user/1000/rmbridge/bridge.sock");
        assert_eq!(
            endpoint.to_string(),
            "unix:///run/user/1000/rmbridge/bridge.sock"
        );
    }

    #[rstest]
    #[case("tcp://127.0.0.1:9781", 9781)]
    #[case("tcp://localhost:4000", 4000)]
    #[case("tcp://[::1]:4001", 4001)]
    fn parses_loopback_tcp_endpoints(#[case] input: &str, #[case] expected_port: u16) {
        let endpoint: SocketEndpoint = input.parse().expect("loopback endpoint");
        assert!(matches!(endpoint, SocketEndpoint::Tcp { port, .. } if port == expected_port));
    }

    #[test]
    fn rejects_non_loopback_tcp_hosts() {
        let error = "tcp://192.168.1.20:9781"
            .parse::<SocketEndpoint>()
            .expect_err("remote host must be rejected");
        assert!(matches!(error, SocketParseError::NonLoopbackHost(_)));
    }

    #[rstest]
    #[case("tcp://127.0.0.1")]
    #[case("http://127.0.0.1:80")]
    fn rejects_incomplete_or_foreign_urls(#[case] input: &str) {
        assert!(input.parse::<SocketEndpoint>().is_err());
    }

    #[test]
    fn parses_unix_endpoint_round_trip() {
        let endpoint: SocketEndpoint = "unix:///tmp/rmbridge/bridge.sock"
            .parse()
            .expect("unix endpoint");
        assert_eq!(endpoint, SocketEndpoint::unix("/tmp/rmbridge/bridge.sock"));
    }

    #[cfg(unix)]
    #[test]
    fn prepare_filesystem_creates_private_parent() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("temp dir");
        let socket = dir.path().join("nested").join("bridge.sock");
        let endpoint = SocketEndpoint::unix(
            Utf8PathBuf::from_path_buf(socket).expect("utf8 temp path"),
        );
        endpoint.prepare_filesystem().expect("prepare socket dir");

        let metadata = std::fs::metadata(dir.path().join("nested")).expect("metadata");
        assert!(metadata.is_dir());
        assert_eq!(metadata.permissions().mode() & 0o777, 0o700);
    }

    #[test]
    fn prepare_filesystem_is_repeatable_but_rejects_files_in_the_way() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp path");
        let endpoint = SocketEndpoint::unix(root.join("run").join("bridge.sock"));
        endpoint.prepare_filesystem().expect("first preparation");
        endpoint.prepare_filesystem().expect("second preparation");

        std::fs::write(root.join("blocker"), b"x").expect("write blocker");
        let blocked = SocketEndpoint::unix(root.join("blocker").join("bridge.sock"));
        let error = blocked
            .prepare_filesystem()
            .expect_err("a file cannot hold the socket");
        assert!(matches!(error, SocketPreparationError::CreateDirectory { .. }));
    }

    #[test]
    fn tcp_endpoints_need_no_preparation() {
        SocketEndpoint::tcp("127.0.0.1", 0)
            .prepare_filesystem()
            .expect("tcp needs no directory");
    }
}
