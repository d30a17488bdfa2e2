//! Mock VTY daemon binary for integration testing
//!
//! Behaves like a network-element daemon started as `mock_vty -c <config>`:
//! it serves a telnet-style console on the port named in its config. Lines
//! of the form `mock <directive>` in the config control its behavior:
//!
//! ```text
//! mock port 4242              # VTY port (required)
//! mock prompt OsmoMock        # prompt name (default: Mock)
//! mock undocumented show bts  # emit (null) docs for this command
//! mock pidfile /tmp/mock.pid  # write our pid here at startup
//! mock write-reply <text>     # reply to `write` with this text instead
//! mock no-listen              # never open the VTY
//! mock hang                   # send the banner, then never answer
//! mock exit                   # exit right after startup
//! ```

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::time::Duration;

const BUILTIN_COMMANDS: &[&str] = &[
    "show version",
    "show online-help",
    "help",
    "enable",
    "disable",
    "write",
    "exit",
];

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let config_path = match args.iter().position(|a| a == "-c") {
        Some(i) if i + 1 < args.len() => PathBuf::from(&args[i + 1]),
        _ => {
            eprintln!("usage: mock_vty -c <config>");
            std::process::exit(2);
        }
    };

    let content = match std::fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Failed to read config '{}': {}", config_path.display(), e);
            std::process::exit(1);
        }
    };

    let settings = MockSettings::parse(&content);

    if let Some(pidfile) = &settings.pidfile {
        std::fs::write(pidfile, std::process::id().to_string()).ok();
    }

    if settings.exit {
        std::process::exit(1);
    }

    if settings.no_listen {
        loop {
            std::thread::sleep(Duration::from_secs(60));
        }
    }

    let Some(port) = settings.port else {
        eprintln!("No 'mock port' line in config");
        std::process::exit(1);
    };

    let listener = match TcpListener::bind(("127.0.0.1", port)) {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind VTY port {}: {}", port, e);
            std::process::exit(1);
        }
    };

    let mut state = MockState {
        settings,
        config_path,
        config: content,
        privileged: false,
    };

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                state.privileged = false;
                state.serve(stream).ok();
            }
            Err(_) => continue,
        }
    }
}

#[derive(Default)]
struct MockSettings {
    port: Option<u16>,
    prompt: String,
    undocumented: Vec<String>,
    pidfile: Option<PathBuf>,
    write_reply: Option<String>,
    no_listen: bool,
    hang: bool,
    exit: bool,
}

impl MockSettings {
    fn parse(content: &str) -> Self {
        let mut settings = MockSettings {
            prompt: "Mock".to_string(),
            ..Default::default()
        };

        for line in content.lines() {
            let words: Vec<&str> = line.split_whitespace().collect();
            match words.as_slice() {
                ["mock", "port", port] => settings.port = port.parse().ok(),
                ["mock", "prompt", name] => settings.prompt = name.to_string(),
                ["mock", "undocumented", command @ ..] => {
                    settings.undocumented.push(command.join(" "))
                }
                ["mock", "pidfile", path] => settings.pidfile = Some(PathBuf::from(path)),
                ["mock", "write-reply", text @ ..] => settings.write_reply = Some(text.join(" ")),
                ["mock", "no-listen"] => settings.no_listen = true,
                ["mock", "hang"] => settings.hang = true,
                ["mock", "exit"] => settings.exit = true,
                _ => {}
            }
        }

        settings
    }
}

struct MockState {
    settings: MockSettings,
    config_path: PathBuf,
    config: String,
    privileged: bool,
}

impl MockState {
    fn prompt(&self) -> String {
        format!(
            "{}{} ",
            self.settings.prompt,
            if self.privileged { '#' } else { '>' }
        )
    }

    fn serve(&mut self, mut stream: TcpStream) -> std::io::Result<()> {
        // IAC WILL ECHO, IAC WILL SUPPRESS-GO-AHEAD
        stream.write_all(&[255, 251, 1, 255, 251, 3])?;
        stream.write_all(b"Welcome to the mock VTY\r\n\r\n")?;
        stream.write_all(self.prompt().as_bytes())?;
        stream.flush()?;

        let mut line = Vec::new();
        let mut buf = [0u8; 1024];

        loop {
            let n = stream.read(&mut buf)?;
            if n == 0 {
                return Ok(());
            }
            if self.settings.hang {
                continue;
            }

            for &byte in &buf[..n] {
                if byte != b'\r' && byte != b'\n' {
                    line.push(byte);
                    continue;
                }
                let request = String::from_utf8_lossy(&line).trim().to_string();
                line.clear();
                if request.is_empty() {
                    continue;
                }

                let Some(reply) = self.handle(&request) else {
                    return Ok(());
                };

                let mut out = format!("{}\r\n", request);
                if !reply.is_empty() {
                    out.push_str(&reply.join("\r\n"));
                    out.push_str("\r\n");
                }
                out.push_str(&self.prompt());
                stream.write_all(out.as_bytes())?;
                stream.flush()?;
            }
        }
    }

    /// Reply lines for a request; `None` closes the session
    fn handle(&mut self, request: &str) -> Option<Vec<String>> {
        let reply = match request {
            "enable" => {
                self.privileged = true;
                Vec::new()
            }
            "disable" => {
                self.privileged = false;
                Vec::new()
            }
            "exit" | "quit" => return None,
            "help" => vec![
                "  help      Description of the interactive help system".to_string(),
                "  show      Show running system information".to_string(),
                "  enable    Turn on privileged mode command".to_string(),
            ],
            "show version" => vec!["Mock VTY daemon 0.1".to_string()],
            "show online-help" => self.online_help(),
            "write" | "write file" => self.write(),
            _ => vec!["% Unknown command.".to_string()],
        };
        Some(reply)
    }

    fn write(&mut self) -> Vec<String> {
        if !self.privileged {
            return vec!["% Unknown command.".to_string()];
        }
        if let Some(reply) = &self.settings.write_reply {
            return vec![reply.clone()];
        }

        match std::fs::write(&self.config_path, &self.config) {
            Ok(()) => {
                let path = std::fs::canonicalize(&self.config_path)
                    .unwrap_or_else(|_| self.config_path.clone());
                vec![format!("Configuration saved to {}", path.display())]
            }
            Err(e) => vec![format!("% Can't write config: {}", e)],
        }
    }

    fn online_help(&self) -> Vec<String> {
        let mut commands: Vec<String> = BUILTIN_COMMANDS.iter().map(|c| c.to_string()).collect();
        for extra in &self.settings.undocumented {
            if !commands.contains(extra) {
                commands.push(extra.clone());
            }
        }

        let mut out = vec![
            "<vtydoc xmlns='urn:osmocom:xml:libosmocore:vty:doc:1.0'>".to_string(),
            "  <node id='view'>".to_string(),
        ];
        for command in &commands {
            let missing = self.settings.undocumented.contains(command);
            out.push(format!("    <command id='{}'>", command));
            out.push("      <params>".to_string());
            for word in command.split_whitespace() {
                let doc = if missing {
                    "(null)".to_string()
                } else {
                    format!("Mock help for {}", word)
                };
                out.push(format!("        <param name='{}' doc='{}' />", word, doc));
            }
            out.push("      </params>".to_string());
            out.push("    </command>".to_string());
        }
        out.push("  </node>".to_string());
        out.push("</vtydoc>".to_string());
        out
    }
}
