//! A scripted SMTP server for integration tests
//!
//! It accepts connections one at a time on an ephemeral local port and
//! reports every finished session over a channel.

#![allow(dead_code)]

use std::{
    collections::HashSet,
    io::{BufRead, BufReader, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::mpsc,
    thread,
    time::Duration,
};

/// What the server does besides accepting everything
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    /// Answer `EHLO` with a 502, as servers predating ESMTP do
    pub reject_ehlo: bool,
    /// Recipients refused with a 550
    pub unknown_users: HashSet<String>,
}

/// One message received through `DATA`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub from: String,
    pub to: Vec<String>,
    /// Content without the terminator, dot-stuffing removed
    pub data: String,
}

/// Everything that happened on one connection
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Command lines, without the trailing CRLF
    pub commands: Vec<String>,
    pub deliveries: Vec<Delivery>,
}

pub struct Server {
    pub addr: SocketAddr,
    sessions: mpsc::Receiver<Session>,
}

impl Server {
    pub fn start(behavior: Behavior) -> Server {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let session = serve(stream, &behavior);
                if tx.send(session).is_err() {
                    break;
                }
            }
        });

        Server { addr, sessions: rx }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Waits for the next finished session
    pub fn session(&self) -> Session {
        self.sessions
            .recv_timeout(Duration::from_secs(5))
            .expect("no SMTP session")
    }

    /// Whether a session finishes within `wait`
    pub fn has_session(&self, wait: Duration) -> bool {
        self.sessions.recv_timeout(wait).is_ok()
    }
}

fn address(arg: &str) -> String {
    arg.trim()
        .trim_start_matches('<')
        .split('>')
        .next()
        .unwrap_or_default()
        .to_owned()
}

fn serve(stream: TcpStream, behavior: &Behavior) -> Session {
    let mut session = Session::default();
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);

    let mut reply = |line: &str| {
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    };

    reply("220 test.local ESMTP ready\r\n");

    let mut from = String::new();
    let mut to = Vec::new();
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = line.trim_end_matches("\r\n").to_owned();
        session.commands.push(line.clone());

        let upper = line.to_ascii_uppercase();
        if upper.starts_with("EHLO ") {
            if behavior.reject_ehlo {
                reply("502 5.5.1 command not implemented\r\n");
            } else {
                reply("250-test.local\r\n250-8BITMIME\r\n250 SMTPUTF8\r\n");
            }
        } else if upper.starts_with("HELO ") {
            reply("250 test.local\r\n");
        } else if upper.starts_with("MAIL FROM:") {
            from = address(&line["MAIL FROM:".len()..]);
            to.clear();
            reply("250 2.1.0 ok\r\n");
        } else if upper.starts_with("RCPT TO:") {
            let rcpt = address(&line["RCPT TO:".len()..]);
            if behavior.unknown_users.contains(&rcpt) {
                reply("550 5.1.1 no such user\r\n");
            } else {
                to.push(rcpt);
                reply("250 2.1.5 ok\r\n");
            }
        } else if upper == "DATA" {
            reply("354 end data with <CR><LF>.<CR><LF>\r\n");
            let mut data = String::new();
            loop {
                let mut data_line = String::new();
                match reader.read_line(&mut data_line) {
                    Ok(0) | Err(_) => return session,
                    Ok(_) => {}
                }
                if data_line == ".\r\n" {
                    break;
                }
                match data_line.strip_prefix('.') {
                    Some(unstuffed) => data.push_str(unstuffed),
                    None => data.push_str(&data_line),
                }
            }
            session.deliveries.push(Delivery {
                from: from.clone(),
                to: to.clone(),
                data,
            });
            reply("250 2.0.0 queued\r\n");
        } else if upper == "NOOP" {
            reply("250 2.0.0 ok\r\n");
        } else if upper == "QUIT" {
            reply("221 2.0.0 bye\r\n");
            break;
        } else {
            reply("500 5.5.2 command not recognized\r\n");
        }
    }

    session
}

/// Routes `tracing` output to the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
