use std::{sync::Arc, time::Duration};

use super::{
    client::SmtpConnection, error, extension::ClientId, response::Response, Error, SmtpInfo,
};
use crate::{
    address::Envelope,
    limiter::{RateLimiter, DEFAULT_LIMITER_MAX, DEFAULT_LIMITER_PERIOD},
    Message, Transport,
};

/// Sends emails using the SMTP protocol
///
/// Clones share the rate limiter.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    inner: SmtpClient,
    limiter: Arc<RateLimiter>,
}

impl Transport for SmtpTransport {
    type Ok = ();
    type Error = Error;

    /// Sends an email
    ///
    /// Succeeds without doing anything when the message has no recipients,
    /// or when it is subject to the rate limiter and the limiter is on.
    fn send(&self, message: &Message) -> Result<Self::Ok, Self::Error> {
        if message.to().is_empty() {
            #[cfg(feature = "tracing")]
            tracing::debug!("message has no recipients, nothing to send");
            return Ok(());
        }

        if message.with_limiter() && !self.limiter.try_acquire() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                max = self.limiter.max(),
                period = ?self.limiter.period(),
                rejected = self.limiter.rejected(),
                "rate limiter is on, message dropped"
            );
            return Ok(());
        }

        let envelope = message.envelope().map_err(error::client)?;
        self.send_raw(&envelope, &message.formatted())?;
        Ok(())
    }
}

impl SmtpTransport {
    /// Creates a new SMTP transport builder
    ///
    /// Defaults are:
    ///
    /// * Port 25
    /// * A 60 seconds timeout for connecting and for each read or write
    /// * A limiter allowing 20 messages per 30 minutes
    pub fn builder<T: Into<String>>(server: T) -> SmtpTransportBuilder {
        SmtpTransportBuilder::new(server)
    }

    /// Creates a transport in one call
    ///
    /// A `None` or zero `timeout` disables timeouts. A zero `limiter_max` or
    /// `limiter_period` picks the default value.
    pub fn new<T: Into<String>>(
        server: T,
        port: u16,
        timeout: Option<Duration>,
        limiter_max: usize,
        limiter_period: Duration,
    ) -> Result<SmtpTransport, Error> {
        Self::builder(server)
            .port(port)
            .timeout(timeout)
            .limiter(limiter_max, limiter_period)
            .build()
    }

    /// Creates a `SmtpTransportBuilder` from a connection URL
    ///
    /// The URL has the form
    /// `smtp://host[:port][/hello_name][?timeout=S&limiter_max=N&limiter_period=S]`
    /// where durations are in seconds. Only the `smtp` scheme is supported.
    ///
    /// ```rust,no_run
    /// use ratemail::{Message, SmtpTransport, Transport};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mailer = SmtpTransport::from_url("smtp://localhost:2525?limiter_max=5")?.build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_url(connection_url: &str) -> Result<SmtpTransportBuilder, Error> {
        super::connection_url::from_connection_url(connection_url)
    }

    /// The rate limiter guarding [`send`](Transport::send)
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Sends an already formatted message, bypassing the rate limiter
    ///
    /// Returns the server response to the last recipient's data. The
    /// connection is closed afterwards, whatever the outcome.
    pub fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<Response, Error> {
        let mut conn = self.inner.connection()?;

        let result = conn.send(envelope, email);

        conn.abort();

        result
    }

    /// Tests the SMTP connection
    ///
    /// `test_connection()` tests the connection by using the SMTP NOOP command.
    /// The connection is closed afterwards.
    pub fn test_connection(&self) -> Result<bool, Error> {
        let mut conn = self.inner.connection()?;

        let is_connected = conn.test_connected();

        conn.abort();

        Ok(is_connected)
    }
}

/// Contains client configuration.
/// Instances of this struct can be created using functions of [`SmtpTransport`].
#[derive(Debug, Clone)]
pub struct SmtpTransportBuilder {
    info: SmtpInfo,
    limiter_max: usize,
    limiter_period: Duration,
}

/// Builder for the SMTP `SmtpTransport`
impl SmtpTransportBuilder {
    // Create new builder with default parameters
    pub(crate) fn new<T: Into<String>>(server: T) -> Self {
        let new = SmtpInfo {
            server: server.into(),
            ..Default::default()
        };

        Self {
            info: new,
            limiter_max: DEFAULT_LIMITER_MAX,
            limiter_period: DEFAULT_LIMITER_PERIOD,
        }
    }

    /// Set the name used during EHLO
    pub fn hello_name(mut self, name: ClientId) -> Self {
        self.info.hello_name = name;
        self
    }

    /// Set the timeout duration, `None` or zero disables it
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.info.timeout = timeout.filter(|timeout| !timeout.is_zero());
        self
    }

    /// Set the port to use
    pub fn port(mut self, port: u16) -> Self {
        self.info.port = port;
        self
    }

    /// Allow `max` rate limited messages per `period`
    ///
    /// Zero values pick the defaults, 20 messages per 30 minutes.
    pub fn limiter(mut self, max: usize, period: Duration) -> Self {
        self.limiter_max = max;
        self.limiter_period = period;
        self
    }

    /// Build the transport
    ///
    /// Fails if the server name is empty or the port is zero.
    pub fn build(self) -> Result<SmtpTransport, Error> {
        if self.info.server.trim().is_empty() {
            return Err(error::config("mail host is empty"));
        }
        if self.info.port == 0 {
            return Err(error::config("mail port is 0"));
        }

        Ok(SmtpTransport {
            inner: SmtpClient { info: self.info },
            limiter: Arc::new(RateLimiter::new(self.limiter_max, self.limiter_period)),
        })
    }
}

/// Build client
#[derive(Debug, Clone)]
struct SmtpClient {
    info: SmtpInfo,
}

impl SmtpClient {
    /// Creates a new connection directly usable to send emails
    fn connection(&self) -> Result<SmtpConnection, Error> {
        SmtpConnection::connect::<(&str, u16)>(
            (self.info.server.as_ref(), self.info.port),
            self.info.timeout,
            &self.info.hello_name,
        )
    }
}
