//! iptv-org directory client

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use serde::de::DeserializeOwned;

use crate::error::FetchError;
use crate::models::{Channel, Stream};

pub const CHANNELS_ENDPOINT: &str = "https://iptv-org.github.io/api/channels.json";
pub const STREAMS_ENDPOINT: &str = "https://iptv-org.github.io/api/streams.json";

const DEFAULT_USER_AGENT: &str = "XtremeIPTV/1.0";
const READ_CHUNK: usize = 64 * 1024;

/// Shared abort flag for one load cycle
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where a load cycle gets its two directories from
pub trait CatalogSource: Send + Sync + 'static {
    fn channels(&self, cancel: &CancelToken) -> Result<Vec<Channel>, FetchError>;
    fn streams(&self, cancel: &CancelToken) -> Result<Vec<Stream>, FetchError>;
}

pub struct IptvClient {
    channels_endpoint: String,
    streams_endpoint: String,
    user_agent: String,
    agent: ureq::Agent,
}

impl Default for IptvClient {
    fn default() -> Self {
        Self::new(CHANNELS_ENDPOINT, STREAMS_ENDPOINT)
    }
}

impl IptvClient {
    pub fn new(channels_endpoint: &str, streams_endpoint: &str) -> Self {
        Self {
            channels_endpoint: channels_endpoint.trim().to_string(),
            streams_endpoint: streams_endpoint.trim().to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            agent: create_agent(Duration::from_secs(10), Duration::from_secs(30)),
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, global: Duration) -> Self {
        self.agent = create_agent(connect, global);
        self
    }

    pub fn fetch_channels(&self, cancel: &CancelToken) -> Result<Vec<Channel>, FetchError> {
        self.load_json(&self.channels_endpoint, cancel)
    }

    pub fn fetch_streams(&self, cancel: &CancelToken) -> Result<Vec<Stream>, FetchError> {
        self.load_json(&self.streams_endpoint, cancel)
    }

    /// All stream candidates listed for one channel
    pub fn fetch_channel_streams(&self, channel_id: &str, cancel: &CancelToken) -> Result<Vec<Stream>, FetchError> {
        if channel_id.is_empty() {
            return Ok(Vec::new());
        }
        let streams = self.fetch_streams(cancel)?;
        Ok(streams.into_iter().filter(|s| s.channel == channel_id).collect())
    }

    fn load_json<T: DeserializeOwned>(&self, url: &str, cancel: &CancelToken) -> Result<T, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Aborted);
        }

        let response = self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .call()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        // Read in chunks so a fired token stops the transfer early
        let mut reader = response.into_body().into_reader();
        let mut body = Vec::new();
        let mut buffer = vec![0u8; READ_CHUNK];
        loop {
            if cancel.is_cancelled() {
                return Err(FetchError::Aborted);
            }
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => body.extend_from_slice(&buffer[..n]),
                Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FetchError::Transport(format!("Read failed: {}", e))),
            }
        }
        debug!("Fetched {} bytes from {}", body.len(), url);

        Ok(serde_json::from_slice(&body)?)
    }
}

impl CatalogSource for IptvClient {
    fn channels(&self, cancel: &CancelToken) -> Result<Vec<Channel>, FetchError> {
        self.fetch_channels(cancel)
    }

    fn streams(&self, cancel: &CancelToken) -> Result<Vec<Stream>, FetchError> {
        self.fetch_streams(cancel)
    }
}

fn create_agent(connect: Duration, global: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(global))
        .timeout_connect(Some(connect))
        .http_status_as_error(false)
        .build()
        .new_agent()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned HTTP response per accepted connection
    fn serve(responses: Vec<(u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for (status, body) in responses {
                let (mut conn, _) = listener.accept().unwrap();
                let mut request = [0u8; 4096];
                let _ = conn.read(&mut request);
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = conn.write_all(reply.as_bytes());
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_fetch_channels() {
        let base = serve(vec![(200, r#"[{"id":"c1","name":"One","categories":["news"]},{"id":"c2","name":"Two"}]"#)]);
        let client = IptvClient::new(&format!("{}/channels.json", base), "unused");

        let channels = client.fetch_channels(&CancelToken::new()).unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].id, "c1");
    }

    #[test]
    fn test_non_success_status() {
        let base = serve(vec![(503, "busy")]);
        let client = IptvClient::new("unused", &format!("{}/streams.json", base));

        let err = client.fetch_streams(&CancelToken::new()).unwrap_err();
        assert!(matches!(err, FetchError::Status(503)));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_malformed_body() {
        let base = serve(vec![(200, r#"{"not":"an array"}"#)]);
        let client = IptvClient::new("unused", &format!("{}/streams.json", base));

        let err = client.fetch_streams(&CancelToken::new()).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
        assert!(!err.is_abort());
    }

    #[test]
    fn test_cancelled_before_request() {
        let client = IptvClient::new("http://127.0.0.1:9/channels.json", "unused");
        let token = CancelToken::new();
        token.cancel();

        let err = client.fetch_channels(&token).unwrap_err();
        assert!(err.is_abort());
    }

    #[test]
    fn test_cancel_during_body_aborts() {
        // Announce a large body but trickle it out
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut request = [0u8; 4096];
            let _ = conn.read(&mut request);
            let header = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 10485760\r\nConnection: close\r\n\r\n[";
            if conn.write_all(header.as_bytes()).is_err() {
                return;
            }
            let piece = vec![b' '; 16 * 1024];
            for _ in 0..200 {
                if conn.write_all(&piece).and_then(|_| conn.flush()).is_err() {
                    return;
                }
                thread::sleep(Duration::from_millis(20));
            }
        });

        let client = IptvClient::new(&format!("http://{}/channels.json", addr), "unused");
        let token = CancelToken::new();
        let canceller = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            canceller.cancel();
        });

        let err = client.fetch_channels(&token).unwrap_err();
        assert!(err.is_abort(), "expected abort, got {}", err);
    }

    #[test]
    fn test_connection_refused_is_transport() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let client = IptvClient::new(&format!("http://{}/channels.json", addr), "unused")
            .with_timeouts(Duration::from_secs(2), Duration::from_secs(5));

        let err = client.fetch_channels(&CancelToken::new()).unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)), "got {}", err);
        assert!(!err.is_abort());
    }

    #[test]
    fn test_channel_streams_filter() {
        let base = serve(vec![(
            200,
            r#"[{"channel":"c1","url":"https://a/1.m3u8"},{"channel":"c2","url":"https://b/2.m3u8"},{"channel":"c1","url":"https://a/3.ts"}]"#,
        )]);
        let client = IptvClient::new("unused", &format!("{}/streams.json", base));

        let streams = client.fetch_channel_streams("c1", &CancelToken::new()).unwrap();
        assert_eq!(streams.len(), 2);
        assert!(streams.iter().all(|s| s.channel == "c1"));

        // Empty id never touches the network
        let none = client.fetch_channel_streams("", &CancelToken::new()).unwrap();
        assert!(none.is_empty());
    }
}
