//! VTY console client
//!
//! Talks to a daemon's telnet-style management console over TCP. The client
//! only frames requests and delimits replies; it knows nothing about which
//! probe is using it.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::common::{Error, Result};

use super::codec::{extract_reply, strip_telnet, Prompt, PromptKind};

/// Line-oriented console a probe can drive
#[async_trait]
pub trait Console: Send {
    /// Send one line and return the reply up to the next prompt
    async fn command(&mut self, request: &str) -> Result<String>;

    /// Like [`command`](Console::command), but in enabled mode
    async fn enabled_command(&mut self, request: &str) -> Result<String>;
}

/// A live session with one daemon's VTY
pub struct VtyClient {
    stream: TcpStream,
    prompt: Prompt,
    command_timeout: Duration,
    privileged: bool,
    node: Option<String>,
}

impl VtyClient {
    /// Connect and consume the welcome banner up to the first prompt
    ///
    /// Both the connect and the banner read are bounded by `command_timeout`.
    pub async fn connect(
        host: &str,
        port: u16,
        prompt: Prompt,
        command_timeout: Duration,
    ) -> Result<Self> {
        let stream = timeout(command_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| {
                Error::timeout(&format!("connection to {}:{}", host, port), command_timeout)
            })?
            .map_err(|e| Error::connection_failed(host, port, e))?;
        stream.set_nodelay(true)?;

        let mut client = Self {
            stream,
            prompt,
            command_timeout,
            privileged: false,
            node: None,
        };

        let banner = timeout(command_timeout, client.read_until_prompt())
            .await
            .map_err(|_| Error::timeout("console banner", command_timeout))??;
        tracing::trace!("VTY banner: {}", banner.trim_end());

        Ok(client)
    }

    /// Whether the last prompt was the enabled-mode prompt
    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    /// Config node shown in the last prompt, if any
    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    /// Read until the console prints its prompt; returns the text before it
    async fn read_until_prompt(&mut self) -> Result<String> {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            raw.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&strip_telnet(&raw)).into_owned();
            if let Some(found) = self.prompt.find(&text) {
                self.privileged = found.kind == PromptKind::Privileged;
                self.node = found.node;
                return Ok(text[..found.start].to_string());
            }
        }
    }

    async fn exchange(&mut self, request: &str) -> Result<String> {
        tracing::debug!("VTY >>> {}", request);
        self.stream
            .write_all(format!("{}\r", request).as_bytes())
            .await?;
        self.stream.flush().await?;

        let body = self.read_until_prompt().await?;
        let reply = extract_reply(&body, request);
        tracing::trace!("VTY <<< {}", reply);
        Ok(reply)
    }
}

#[async_trait]
impl Console for VtyClient {
    async fn command(&mut self, request: &str) -> Result<String> {
        let limit = self.command_timeout;
        timeout(limit, self.exchange(request))
            .await
            .map_err(|_| Error::timeout(&format!("reply to '{}'", request), limit))?
    }

    async fn enabled_command(&mut self, request: &str) -> Result<String> {
        if !self.privileged {
            self.command("enable").await?;
            if !self.privileged {
                return Err(Error::Protocol(format!(
                    "'enable' was refused by {}",
                    self.prompt.name()
                )));
            }
        }
        self.command(request).await
    }
}
