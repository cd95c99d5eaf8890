use std::{
    fmt::Display,
    io::{self, BufRead, BufReader, Write},
    net::{Shutdown, ToSocketAddrs},
    time::Duration,
};

#[cfg(feature = "tracing")]
use super::escape_crlf;
use super::{ClientCodec, NetworkStream};
use crate::{
    address::{Address, Envelope},
    transport::smtp::{
        commands::{Data, Ehlo, Helo, Mail, Noop, Quit, Rcpt},
        error::{self, Error, Phase},
        extension::{ClientId, Extension, MailBodyParameter, MailParameter, ServerInfo},
        response::{parse_response, Response},
    },
};

/// Structure that implements the SMTP client
#[derive(Debug)]
pub struct SmtpConnection {
    /// TCP stream between client and server
    stream: BufReader<NetworkStream>,
    /// Whether QUIT has been sent
    sent_quit: bool,
    /// Information about the server
    server_info: ServerInfo,
}

impl SmtpConnection {
    /// Get information about the server
    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Connects to the configured server
    ///
    /// Reads the greeting, sends EHLO and parses server information.
    pub fn connect<A: ToSocketAddrs>(
        server: A,
        timeout: Option<Duration>,
        hello_name: &ClientId,
    ) -> Result<SmtpConnection, Error> {
        let stream =
            NetworkStream::connect(server, timeout).map_err(|err| err.at(Phase::Connect))?;
        Self::handshake(stream, timeout, hello_name)
    }

    /// Runs the opening exchange on an already connected stream
    ///
    /// On failure the server is sent a QUIT and the stream is shut down.
    pub fn handshake(
        mut stream: NetworkStream,
        timeout: Option<Duration>,
        hello_name: &ClientId,
    ) -> Result<SmtpConnection, Error> {
        set_timeout(&mut stream, timeout)
            .map_err(|err| error::network(err).at(Phase::Connect))?;

        let mut conn = SmtpConnection {
            stream: BufReader::new(stream),
            sent_quit: false,
            server_info: ServerInfo::default(),
        };

        let opened = conn
            .read_response()
            .map_err(|err| err.at(Phase::Greeting))
            .and_then(|_| conn.hello(hello_name).map_err(|err| err.at(Phase::Hello)));
        if let Err(err) = opened {
            conn.abort();
            return Err(err);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("server {}", conn.server_info);
        Ok(conn)
    }

    /// Delivers `email` to every recipient of `envelope`, one transaction each
    ///
    /// Stops at the first failure. The error then tells the phase and the
    /// index of the recipient it happened for, later recipients are not
    /// tried.
    pub fn send(&mut self, envelope: &Envelope, email: &[u8]) -> Result<Response, Error> {
        if !envelope.is_transmittable() {
            return Err(error::client(
                "Envelope contains an address with a line break or an angle bracket",
            )
            .at(Phase::Mail));
        }

        let mut mail_options = vec![];

        // Internationalization handling
        //
        // * 8BITMIME: https://tools.ietf.org/html/rfc6152
        // * SMTPUTF8: https://tools.ietf.org/html/rfc6531

        // Check for non-ascii addresses and use the SMTPUTF8 option if any.
        if envelope.has_non_ascii_addresses() {
            if !self.server_info().supports_feature(Extension::SmtpUtfEight) {
                // don't try to send non-ascii addresses (per RFC)
                return Err(error::client(
                    "Envelope contains non-ascii chars but server does not support SMTPUTF8",
                )
                .at(Phase::Mail));
            }
            mail_options.push(MailParameter::SmtpUtfEight);
        }

        // Check for non-ascii content in the message
        if !email.is_ascii() {
            if !self.server_info().supports_feature(Extension::EightBitMime) {
                return Err(error::client(
                    "Message contains non-ascii chars but server does not support 8BITMIME",
                )
                .at(Phase::Mail));
            }
            mail_options.push(MailParameter::Body(MailBodyParameter::EightBitMime));
        }

        let mut last = None;
        for (index, to_address) in envelope.to().iter().enumerate() {
            let response = self
                .transaction(envelope.from(), to_address, &mail_options, email)
                .map_err(|err| err.for_recipient(index))?;
            last = Some(response);
        }

        last.ok_or_else(|| error::client("Envelope has no recipients"))
    }

    /// One MAIL, RCPT, DATA exchange
    fn transaction(
        &mut self,
        from: &Address,
        to: &Address,
        mail_options: &[MailParameter],
        email: &[u8],
    ) -> Result<Response, Error> {
        self.command(Mail::new(from.clone(), mail_options.to_vec()))
            .map_err(|err| err.at(Phase::Mail))?;
        self.command(Rcpt::new(to.clone()))
            .map_err(|err| err.at(Phase::Rcpt))?;
        self.command(Data).map_err(|err| err.at(Phase::Data))?;
        self.message(email).map_err(|err| err.at(Phase::Message))
    }

    /// Send EHLO and update server info
    ///
    /// Servers that reject EHLO for good are greeted with HELO instead.
    fn hello(&mut self, hello_name: &ClientId) -> Result<(), Error> {
        let response = match self.command(Ehlo::new(hello_name.clone())) {
            Ok(response) => response,
            Err(err) if err.is_permanent() => {
                #[cfg(feature = "tracing")]
                tracing::debug!("EHLO refused ({err}), falling back to HELO");
                self.command(Helo::new(hello_name.clone()))?
            }
            Err(err) => return Err(err),
        };
        self.server_info = ServerInfo::from_response(&response)?;
        Ok(())
    }

    /// Sends QUIT
    pub fn quit(&mut self) -> Result<Response, Error> {
        self.sent_quit = true;
        self.command(Quit)
    }

    /// Sends QUIT if not done yet and shuts the stream down, ignoring errors
    pub fn abort(&mut self) {
        if !self.sent_quit {
            let _ = self.quit();
        }

        let _ = self.stream.get_mut().shutdown(Shutdown::Both);
    }

    /// Checks if the server is connected using the NOOP SMTP command
    pub fn test_connected(&mut self) -> bool {
        self.command(Noop).is_ok()
    }

    /// Sends the message content
    pub fn message(&mut self, message: &[u8]) -> Result<Response, Error> {
        let mut codec = ClientCodec::new();
        let mut out_buf = Vec::with_capacity(message.len() + 5);
        codec.encode(message, &mut out_buf);
        codec.terminate(&mut out_buf);
        self.write(out_buf.as_slice())?;

        self.read_response()
    }

    /// Sends an SMTP command
    pub fn command<C: Display>(&mut self, command: C) -> Result<Response, Error> {
        self.write(command.to_string().as_bytes())?;
        self.read_response()
    }

    /// Writes a string to the server
    fn write(&mut self, string: &[u8]) -> Result<(), Error> {
        self.stream
            .get_mut()
            .write_all(string)
            .map_err(error::network)?;
        self.stream.get_mut().flush().map_err(error::network)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("Wrote: {}", escape_crlf(&String::from_utf8_lossy(string)));
        Ok(())
    }

    /// Gets the SMTP response
    pub fn read_response(&mut self) -> Result<Response, Error> {
        let mut buffer = String::with_capacity(100);

        while self
            .stream
            .read_line(&mut buffer)
            .map_err(error::network)?
            > 0
        {
            #[cfg(feature = "tracing")]
            tracing::debug!("<< {}", escape_crlf(&buffer));
            match parse_response(&buffer) {
                Ok((_remaining, response)) => {
                    return if response.is_positive() {
                        Ok(response)
                    } else {
                        Err(error::code(
                            response.code(),
                            Some(response.message().collect()),
                        ))
                    };
                }
                Err(nom::Err::Incomplete(_)) => { /* read more */ }
                Err(nom::Err::Failure(e)) | Err(nom::Err::Error(e)) => {
                    return Err(error::response(e.to_string()));
                }
            }
        }

        Err(error::response("incomplete response"))
    }
}

fn set_timeout(stream: &mut NetworkStream, duration: Option<Duration>) -> io::Result<()> {
    stream.set_read_timeout(duration)?;
    stream.set_write_timeout(duration)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transport::smtp::client::MockStream;

    fn hello_name() -> ClientId {
        ClientId::Domain("localhost".to_owned())
    }

    fn open(server: &str) -> (Result<SmtpConnection, Error>, MockStream) {
        let mock = MockStream::with_vec(server.as_bytes().to_vec());
        let conn = SmtpConnection::handshake(
            NetworkStream::new_mock(mock.clone()),
            None,
            &hello_name(),
        );
        (conn, mock)
    }

    fn written(mock: &mut MockStream) -> String {
        String::from_utf8(mock.take_vec()).unwrap()
    }

    fn envelope(to: &[&str]) -> Envelope {
        Envelope::new(
            "sender@example.com".parse().unwrap(),
            to.iter().map(|a| a.parse().unwrap()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn handshake_reads_server_info() {
        let (conn, mut mock) =
            open("220 mx.example.org ESMTP\r\n250-mx.example.org\r\n250 8BITMIME\r\n");
        let conn = conn.unwrap();

        assert_eq!(conn.server_info().name(), "mx.example.org");
        assert!(conn.server_info().supports_feature(Extension::EightBitMime));
        assert_eq!(written(&mut mock), "EHLO localhost\r\n");
    }

    #[test]
    fn helo_fallback() {
        let (conn, mut mock) =
            open("220 ready\r\n502 command not implemented\r\n250 old.example.org\r\n");
        let conn = conn.unwrap();

        assert_eq!(conn.server_info().name(), "old.example.org");
        assert!(!conn.server_info().supports_feature(Extension::EightBitMime));
        assert_eq!(
            written(&mut mock),
            "EHLO localhost\r\nHELO localhost\r\n"
        );
    }

    #[test]
    fn no_helo_fallback_on_transient_error() {
        let (conn, mut mock) = open("220 ready\r\n421 shutting down\r\n221 bye\r\n");
        let err = conn.unwrap_err();

        assert!(err.is_transient());
        assert_eq!(err.phase(), Some(Phase::Hello));
        assert_eq!(written(&mut mock), "EHLO localhost\r\nQUIT\r\n");
    }

    #[test]
    fn rejected_greeting() {
        let (conn, mut mock) = open("554 go away\r\n221 bye\r\n");
        let err = conn.unwrap_err();

        assert!(err.is_permanent());
        assert_eq!(err.phase(), Some(Phase::Greeting));
        assert_eq!(err.recipient(), None);
        assert_eq!(written(&mut mock), "QUIT\r\n");
    }

    #[test]
    fn send_to_every_recipient() {
        let (conn, mut mock) = open("220 ready\r\n250 mx\r\n");
        let mut conn = conn.unwrap();
        mock.take_vec();
        mock.next_vec(
            concat!(
                "250 ok\r\n250 ok\r\n354 go ahead\r\n250 queued as 1\r\n",
                "250 ok\r\n250 ok\r\n354 go ahead\r\n250 queued as 2\r\n",
            )
            .as_bytes(),
        );

        let response = conn
            .send(&envelope(&["a@example.com", "b@example.com"]), b"Hi\r\n")
            .unwrap();
        assert_eq!(response.first_line(), Some("queued as 2"));
        assert_eq!(
            written(&mut mock),
            concat!(
                "MAIL FROM:<sender@example.com>\r\n",
                "RCPT TO:<a@example.com>\r\n",
                "DATA\r\n",
                "Hi\r\n.\r\n",
                "MAIL FROM:<sender@example.com>\r\n",
                "RCPT TO:<b@example.com>\r\n",
                "DATA\r\n",
                "Hi\r\n.\r\n",
            )
        );
    }

    #[test]
    fn rejected_recipient_stops_the_send() {
        let (conn, mut mock) = open("220 ready\r\n250 mx\r\n");
        let mut conn = conn.unwrap();
        mock.take_vec();
        mock.next_vec(
            concat!(
                "250 ok\r\n250 ok\r\n354 go ahead\r\n250 queued\r\n",
                "250 ok\r\n550 no such user\r\n",
                "221 bye\r\n",
            )
            .as_bytes(),
        );

        let err = conn
            .send(
                &envelope(&["a@example.com", "b@example.com", "c@example.com"]),
                b"Hi\r\n",
            )
            .unwrap_err();
        conn.abort();

        assert!(err.is_permanent());
        assert_eq!(err.status().map(u16::from), Some(550));
        assert_eq!(err.phase(), Some(Phase::Rcpt));
        assert_eq!(err.recipient(), Some(1));

        let written = written(&mut mock);
        assert_eq!(written.matches("MAIL FROM:").count(), 2);
        assert_eq!(written.matches("DATA\r\n").count(), 1);
        assert!(!written.contains("c@example.com"), "{written}");
        assert!(written.ends_with("RCPT TO:<b@example.com>\r\nQUIT\r\n"));
    }

    #[test]
    fn rejected_message() {
        let (conn, mut mock) = open("220 ready\r\n250 mx\r\n");
        let mut conn = conn.unwrap();
        mock.next_vec(b"250 ok\r\n250 ok\r\n354 go ahead\r\n451 try again later\r\n");

        let err = conn
            .send(&envelope(&["a@example.com"]), b"Hi\r\n")
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(err.phase(), Some(Phase::Message));
        assert_eq!(err.recipient(), Some(0));
    }

    #[test]
    fn eight_bit_payload() {
        let (conn, mut mock) = open("220 ready\r\n250 mx\r\n");
        let mut conn = conn.unwrap();
        mock.take_vec();

        let err = conn
            .send(&envelope(&["a@example.com"]), "Grüße\r\n".as_bytes())
            .unwrap_err();
        assert!(err.is_client());
        assert_eq!(err.phase(), Some(Phase::Mail));
        assert_eq!(written(&mut mock), "");

        let (conn, mut mock) = open("220 ready\r\n250-mx\r\n250 8BITMIME\r\n");
        let mut conn = conn.unwrap();
        mock.take_vec();
        mock.next_vec(b"250 ok\r\n250 ok\r\n354 go ahead\r\n250 queued\r\n");

        conn.send(&envelope(&["a@example.com"]), "Grüße\r\n".as_bytes())
            .unwrap();
        assert!(written(&mut mock)
            .starts_with("MAIL FROM:<sender@example.com> BODY=8BITMIME\r\n"));
    }

    // The parser only takes ASCII, such addresses come from deserialization.
    fn utf8_envelope() -> Envelope {
        Envelope::new(
            "sender@example.com".parse().unwrap(),
            vec![Address::new_unchecked("用户@例子.广告".to_owned())],
        )
        .unwrap()
    }

    #[test]
    fn utf8_addresses() {
        let (conn, mut mock) = open("220 ready\r\n250 mx\r\n");
        let mut conn = conn.unwrap();
        mock.take_vec();

        let err = conn.send(&utf8_envelope(), b"Hi\r\n").unwrap_err();
        assert!(err.is_client());
        assert_eq!(written(&mut mock), "");

        let (conn, mut mock) = open("220 ready\r\n250-mx\r\n250 SMTPUTF8\r\n");
        let mut conn = conn.unwrap();
        mock.take_vec();
        mock.next_vec(b"250 ok\r\n250 ok\r\n354 go ahead\r\n250 queued\r\n");

        conn.send(&utf8_envelope(), b"Hi\r\n").unwrap();
        assert!(written(&mut mock).starts_with("MAIL FROM:<sender@example.com> SMTPUTF8\r\n"));
    }

    #[test]
    fn line_break_in_address_is_refused() {
        let (conn, mut mock) = open("220 ready\r\n250 mx\r\n");
        let mut conn = conn.unwrap();
        mock.take_vec();
        mock.next_vec(b"250 ok\r\n250 ok\r\n250 ok\r\n354 go ahead\r\n250 queued\r\n");

        let envelope = Envelope::new(
            "sender@example.com".parse().unwrap(),
            vec![Address::new_unchecked(
                "a@example.com>\r\nRCPT TO:<victim@evil.com".to_owned(),
            )],
        )
        .unwrap();

        let err = conn.send(&envelope, b"Hi\r\n").unwrap_err();
        assert!(err.is_client());
        assert_eq!(err.phase(), Some(Phase::Mail));
        assert_eq!(written(&mut mock), "");
    }

    #[test]
    fn message_is_dot_stuffed() {
        let (conn, mut mock) = open("220 ready\r\n250 mx\r\n");
        let mut conn = conn.unwrap();
        mock.take_vec();
        mock.next_vec(b"250 queued\r\n");

        conn.message(b".hidden\r\n.\r\nend").unwrap();
        assert_eq!(written(&mut mock), "..hidden\r\n..\r\nend\r\n.\r\n");
    }

    #[test]
    fn multiline_response() {
        let (conn, _mock) = open("220-mx.example.org\r\n220 welcome\r\n250 mx\r\n");
        assert!(conn.is_ok());
    }

    #[test]
    fn broken_response() {
        let (conn, _mock) = open("220 ready\r\nwhat is this\r\n");
        let err = conn.unwrap_err();
        assert!(err.is_response());
        assert_eq!(err.phase(), Some(Phase::Hello));

        let (conn, _mock) = open("220 rea");
        assert!(conn.unwrap_err().is_response());
    }

    #[test]
    fn noop() {
        let (conn, mut mock) = open("220 ready\r\n250 mx\r\n");
        let mut conn = conn.unwrap();
        mock.take_vec();
        mock.next_vec(b"250 ok\r\n");

        assert!(conn.test_connected());
        assert!(!conn.test_connected());
        assert_eq!(written(&mut mock), "NOOP\r\nNOOP\r\n");
    }
}
