use std::time::Duration;

use url::Url;

use super::{error, extension::ClientId, Error, SmtpTransportBuilder, SMTP_PORT};
use crate::limiter::{DEFAULT_LIMITER_MAX, DEFAULT_LIMITER_PERIOD};

/// Create a new `SmtpTransportBuilder` from a connection URL
pub(crate) fn from_connection_url(connection_url: &str) -> Result<SmtpTransportBuilder, Error> {
    let connection_url = Url::parse(connection_url).map_err(error::config)?;

    if connection_url.scheme() != "smtp" {
        return Err(error::config(format!(
            "Unknown scheme '{}', only 'smtp' is supported",
            connection_url.scheme()
        )));
    }

    let host = connection_url
        .host_str()
        .ok_or_else(|| error::config("smtp host undefined"))?;

    let mut builder =
        SmtpTransportBuilder::new(host).port(connection_url.port().unwrap_or(SMTP_PORT));

    // use the path segment of the URL as name in the name in the HELO / EHLO command
    if connection_url.path().len() > 1 {
        let name = connection_url.path().trim_matches('/').to_owned();
        builder = builder.hello_name(ClientId::Domain(name));
    }

    let mut limiter_max = DEFAULT_LIMITER_MAX;
    let mut limiter_period = DEFAULT_LIMITER_PERIOD;
    for (key, value) in connection_url.query_pairs() {
        let invalid = || error::config(format!("invalid value '{value}' for '{key}'"));
        match key.as_ref() {
            "timeout" => {
                let seconds = value.parse().map_err(|_| invalid())?;
                builder = builder.timeout(Some(Duration::from_secs(seconds)));
            }
            "limiter_max" => {
                limiter_max = value.parse().map_err(|_| invalid())?;
            }
            "limiter_period" => {
                limiter_period = Duration::from_secs(value.parse().map_err(|_| invalid())?);
            }
            _ => return Err(error::config(format!("Unknown parameter '{key}'"))),
        }
    }

    Ok(builder.limiter(limiter_max, limiter_period))
}
