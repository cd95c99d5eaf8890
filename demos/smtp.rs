use std::time::Duration;

use ratemail::{first_invalid, Mailbox, Message, SmtpTransport, Transport};

fn main() {
    tracing_subscriber::fmt::init();

    let to: Vec<Mailbox> = vec![
        "Ops <ops@localhost>".parse().unwrap(),
        "oncall@localhost".parse().unwrap(),
    ];
    if let Some(address) = first_invalid(&to) {
        panic!("invalid recipient {address}");
    }

    let email = to
        .into_iter()
        .fold(
            Message::builder().from("Alerts <alerts@localhost>".parse().unwrap()),
            |builder, to| builder.to(to),
        )
        .subject("Hello ß☺ example")
        .with_limiter(true)
        .body("Be happy!")
        .unwrap();
    email.validate().unwrap();

    // Open a local connection on port 25, at most 2 rate limited messages per hour
    let mailer = SmtpTransport::new("localhost", 25, None, 2, Duration::from_secs(3600)).unwrap();

    for _ in 0..3 {
        match mailer.send(&email) {
            Ok(_) => println!("Email sent"),
            Err(e) => panic!("Could not send email: {e:?}"),
        }
    }
    println!("{} email(s) dropped by the limiter", mailer.limiter().rejected());
}
