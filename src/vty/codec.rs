//! VTY wire framing
//!
//! The VTY console has no message framing. A reply ends when the console
//! prints its prompt again:
//! ```text
//! <echoed request>\r\n
//! <reply lines>\r\n
//! OpenBSC(config-net)#
//! ```
//! `>` marks the unprivileged view, `#` the enabled (privileged) mode. The
//! console may also sprinkle telnet option negotiation into the stream.

use regex::Regex;

use crate::common::{Error, Result};

const IAC: u8 = 255;
const SB: u8 = 250;
const SE: u8 = 240;
const WILL: u8 = 251;
const DONT: u8 = 254;

/// Privilege level shown by a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// `NAME> `
    User,
    /// `NAME# `
    Privileged,
}

/// A prompt found at the end of the console output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMatch {
    pub kind: PromptKind,
    /// Config node shown in parentheses, e.g. `config-net`
    pub node: Option<String>,
    /// Byte offset where the prompt line starts
    pub start: usize,
}

/// Recognizes the prompt of one console, keyed by its end-point name
#[derive(Debug, Clone)]
pub struct Prompt {
    name: String,
    pattern: Regex,
}

impl Prompt {
    pub fn new(name: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r"(?:\A|\n){}(?:\(([\w-]+)\))?([>#]) \z",
            regex::escape(name)
        ))
        .map_err(|e| Error::Config(format!("Invalid prompt name '{}': {}", name, e)))?;

        Ok(Self {
            name: name.to_string(),
            pattern,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look for a prompt terminating `text`
    pub fn find(&self, text: &str) -> Option<PromptMatch> {
        let caps = self.pattern.captures(text)?;
        let whole = caps.get(0)?;
        let start = if whole.as_str().starts_with('\n') {
            whole.start() + 1
        } else {
            whole.start()
        };
        let kind = match caps.get(2).map(|m| m.as_str()) {
            Some("#") => PromptKind::Privileged,
            _ => PromptKind::User,
        };

        Some(PromptMatch {
            kind,
            node: caps.get(1).map(|m| m.as_str().to_string()),
            start,
        })
    }
}

/// Remove telnet IAC sequences from raw console bytes
///
/// `IAC IAC` is an escaped 0xFF data byte. An incomplete sequence at the end
/// is dropped; callers re-run this on the whole buffer as more data arrives.
pub fn strip_telnet(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        if input[i] != IAC {
            out.push(input[i]);
            i += 1;
            continue;
        }

        match input.get(i + 1) {
            None => break,
            Some(&IAC) => {
                out.push(IAC);
                i += 2;
            }
            Some(&(WILL..=DONT)) => i += 3,
            Some(&SB) => {
                let mut j = i + 2;
                i = input.len();
                while j + 1 < input.len() {
                    if input[j] == IAC && input[j + 1] == SE {
                        i = j + 2;
                        break;
                    }
                    j += 1;
                }
            }
            Some(_) => i += 2,
        }
    }

    out
}

/// Turn the text preceding a prompt into the reply to `request`
///
/// Drops the echoed request line, normalizes line endings to `\n` and trims
/// trailing whitespace.
pub fn extract_reply(body: &str, request: &str) -> String {
    let normalized = body.replace("\r\n", "\n").replace('\r', "");
    let mut lines = normalized.split('\n').peekable();

    if lines
        .peek()
        .is_some_and(|first| first.trim() == request.trim())
    {
        lines.next();
    }

    lines.collect::<Vec<_>>().join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_user_and_privileged() {
        let prompt = Prompt::new("OpenBSC").unwrap();

        let text = "Welcome to the OpenBSC Control interface\r\nOpenBSC> ";
        let found = prompt.find(text).unwrap();
        assert_eq!(found.kind, PromptKind::User);
        assert_eq!(found.node, None);
        assert_eq!(&text[found.start..], "OpenBSC> ");

        let found = prompt.find("enable\r\nOpenBSC# ").unwrap();
        assert_eq!(found.kind, PromptKind::Privileged);
    }

    #[test]
    fn test_prompt_with_node() {
        let prompt = Prompt::new("OsmoMSC").unwrap();
        let found = prompt.find("network\r\nOsmoMSC(config-net)# ").unwrap();
        assert_eq!(found.kind, PromptKind::Privileged);
        assert_eq!(found.node.as_deref(), Some("config-net"));
    }

    #[test]
    fn test_prompt_must_terminate_output() {
        let prompt = Prompt::new("OpenBSC").unwrap();
        assert!(prompt.find("OpenBSC> partial reply").is_none());
        assert!(prompt.find("say OpenBSC> ").is_none());
        assert!(prompt.find("OtherApp> ").is_none());
        // Bare prompt with nothing before it
        assert!(prompt.find("OpenBSC> ").is_some());
    }

    #[test]
    fn test_prompt_name_is_literal() {
        let prompt = Prompt::new("Osmo.BSC").unwrap();
        assert!(prompt.find("\nOsmoXBSC> ").is_none());
        assert!(prompt.find("\nOsmo.BSC> ").is_some());
    }

    #[test]
    fn test_strip_telnet_negotiation() {
        let mut raw = vec![IAC, WILL, 1, IAC, WILL, 3];
        raw.extend_from_slice(b"Welcome\r\n");
        raw.extend_from_slice(&[IAC, SB, 31, 0, 80, 0, 24, IAC, SE]);
        raw.extend_from_slice(b"App> ");
        assert_eq!(strip_telnet(&raw), b"Welcome\r\nApp> ".to_vec());
    }

    #[test]
    fn test_strip_telnet_escaped_and_truncated() {
        assert_eq!(strip_telnet(&[b'a', IAC, IAC, b'b']), vec![b'a', IAC, b'b']);
        assert_eq!(strip_telnet(&[b'a', IAC]), b"a".to_vec());
        assert_eq!(strip_telnet(&[b'a', IAC, SB, 1, 2]), b"a".to_vec());
    }

    #[test]
    fn test_extract_reply_drops_echo() {
        let body = "show version\r\nOsmoBSC 1.2.3\r\nCopyright\r\n";
        assert_eq!(extract_reply(body, "show version"), "OsmoBSC 1.2.3\nCopyright");
    }

    #[test]
    fn test_extract_reply_without_echo() {
        assert_eq!(
            extract_reply("Configuration saved to /tmp/x.cfg\r\n", "write"),
            "Configuration saved to /tmp/x.cfg"
        );
        assert_eq!(extract_reply("enable\r\n", "enable"), "");
        assert_eq!(extract_reply("", "help"), "");
    }
}
