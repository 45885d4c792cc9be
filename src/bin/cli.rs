use clap::{Parser, Subcommand};
use rustdis_client::config::DEFAULT_ADDR;
use rustdis_client::{Client, Config, Error, Message, Reply, Subscriptions};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Parser, Debug)]
struct Args {
    /// The server address
    #[arg(short, long, env = "REDIS_ADDR", default_value = DEFAULT_ADDR)]
    addr: String,

    /// Password sent with AUTH after connecting
    #[arg(short, long, env = "REDIS_PASSWORD")]
    password: Option<String>,

    /// Database selected after connecting
    #[arg(short, long, env = "REDIS_DB", default_value_t = 0)]
    db: u32,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print every message published on the given channels
    Subscribe {
        #[arg(required = true)]
        channels: Vec<String>,
    },
    /// Run any other command, e.g. `rustdis-cli get foo`
    #[command(external_subcommand)]
    Raw(Vec<String>),
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let args = Args::parse();

    let mut config = Config::new(args.addr).db(args.db);
    config.password = args.password;
    let client = Client::new(config);

    match args.command {
        Cmd::Subscribe { channels } => subscribe(&client, channels).await,
        Cmd::Raw(parts) => {
            let (name, rest) = parts
                .split_first()
                .ok_or_else(|| Error::Usage("missing command name".to_string()))?;
            let reply = client.execute_args(name, rest).await?;
            print_reply(&reply);
            Ok(())
        }
    }
}

async fn subscribe(client: &Client, channels: Vec<String>) -> Result<(), Error> {
    let (channel_tx, channel_rx) = mpsc::channel(channels.len());
    for channel in channels {
        // The buffer fits every channel.
        let _ = channel_tx.try_send(channel);
    }

    let (message_tx, mut message_rx) = mpsc::channel::<Message>(64);
    let printer = tokio::spawn(async move {
        while let Some(message) = message_rx.recv().await {
            println!(
                "{} {}",
                message.channel,
                String::from_utf8_lossy(&message.payload)
            );
        }
    });

    // Keep the sender alive: dropping it would end the session.
    let result = client
        .subscribe(Subscriptions::new().subscribe(channel_rx), message_tx)
        .await;
    drop(channel_tx);
    let _ = printer.await;
    result
}

fn print_reply(reply: &Reply) {
    match reply {
        Reply::Status(status) => println!("{}", status),
        Reply::Error(message) => println!("(error) {}", message),
        Reply::Integer(i) => println!("(integer) {}", i),
        Reply::Bulk(bytes) => println!("\"{}\"", String::from_utf8_lossy(bytes)),
        Reply::Absent => println!("(nil)"),
        Reply::Array(items) if items.is_empty() => println!("(empty array)"),
        Reply::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                println!("{}) \"{}\"", i + 1, String::from_utf8_lossy(item));
            }
        }
    }
}
