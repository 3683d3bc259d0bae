// ABOUTME: Example application sending one SMS through the Transmitter client
// ABOUTME: Binds, submits (segmenting long text), optionally queries the state, then closes

use argh::FromArgs;
use smpp_transmitter::client::{SmppTransmitter, Transmitter, TransmitterConfig};
use smpp_transmitter::message::{Raw, ShortMessage};
use std::error::Error;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Example application to show the simplest case of sending an SMS message
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the system id
    #[argh(option)]
    system_id: Option<String>,

    /// the password
    #[argh(option)]
    password: Option<String>,

    /// the hostname of IP address of the SMSC (default: localhost)
    #[argh(option)]
    host: Option<String>,

    /// the port to use when connecting to the SMSC (default: 2775)
    #[argh(option, short = 'p')]
    port: Option<u32>,

    /// seconds to wait for the bind (default: 10)
    #[argh(option, default = "10")]
    bind_timeout: u64,

    /// query the message state after submitting
    #[argh(switch, short = 'q')]
    query: bool,

    /// the message to send
    #[argh(option, short = 'm')]
    message: String,

    /// the recipient telephone number
    #[argh(option, short = 't')]
    to: String,

    /// the telephone number that the message will be from
    #[argh(option, short = 'f')]
    from: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debugging {
            Level::TRACE
        } else {
            Level::INFO
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let host = cli_args.host.unwrap_or_else(|| "localhost".to_owned());
    let port = cli_args.port.unwrap_or(2775);
    let system_id = cli_args.system_id.unwrap_or_default();
    let password = cli_args.password.unwrap_or_default();

    let tx = Transmitter::new(TransmitterConfig::new(
        format!("{host}:{port}"),
        system_id,
        password,
    ));

    let mut bind = tx.bind();
    match bind
        .wait_timeout(Duration::from_secs(cli_args.bind_timeout))
        .await
    {
        Some(outcome) => {
            if let Err(e) = outcome.into_result() {
                eprintln!("Bind failed: {e}");
                return Err(e.into());
            }
        }
        None => {
            eprintln!("Bind still pending after {}s, giving up", cli_args.bind_timeout);
            tx.close().await;
            return Err("bind timed out".into());
        }
    }

    println!("Connected and bound successfully");

    let sms = ShortMessage::new(
        cli_args.from.as_str(),
        cli_args.to.as_str(),
        Raw::from(cli_args.message),
    )
    .with_delivery_receipt(true);

    let result = match tx.submit(&sms).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to send message: {e}");
            tx.close().await;
            return Err(e.into());
        }
    };

    println!(
        "Message sent successfully! Message ID: {} ({} segment(s))",
        result.message_id,
        result.segments()
    );

    if cli_args.query {
        match tx.query_sm(&cli_args.from, &result.message_id).await {
            Ok(state) => println!("Message {} is {}", state.message_id, state.state_name()),
            Err(e) => eprintln!("Warning: query failed: {e}"),
        }
    }

    tx.close().await;
    Ok(())
}
