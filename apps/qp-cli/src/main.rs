use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use qp_client::{
    HttpKeyStore, KeyServiceConfig, KeyStore, MemoryKeyStore, MemoryRelay, SessionConfig,
    SessionController,
};
use qp_crypto::{sealed, KeyPair, PublicKey};

#[derive(Parser, Debug)]
#[command(author, version, about = "Quietpost sealed-box messaging tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a fresh X25519 keypair, hex-encoded
    Keygen,
    /// Seal a message to a recipient public key
    Seal {
        /// Recipient public key, hex
        recipient: String,
        /// Message text
        message: String,
    },
    /// Open a sealed message with your own keypair
    Open {
        /// Your public key, hex
        public: String,
        /// Your private key, hex
        secret: String,
        /// Base64 ciphertext
        ciphertext: String,
    },
    /// Resolve a uid's public key and display name from the key service
    Lookup {
        uid: String,
        /// Key service base URL (falls back to QUIETPOST_API_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Run a two-party loopback demo over the in-memory relay
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Keygen => keygen(),
        Commands::Seal { recipient, message } => seal_command(&recipient, &message),
        Commands::Open {
            public,
            secret,
            ciphertext,
        } => open_command(&public, &secret, &ciphertext),
        Commands::Lookup { uid, base_url } => lookup(&uid, base_url).await,
        Commands::Demo => demo().await,
    }
}

fn keygen() -> Result<()> {
    let pair = KeyPair::generate();
    println!("public:  {}", pair.public.to_hex());
    println!("private: {}", pair.secret.to_hex());
    Ok(())
}

fn seal_command(recipient_hex: &str, message: &str) -> Result<()> {
    let recipient = PublicKey::from_hex(recipient_hex)?;
    println!("{}", sealed::seal(message, &recipient)?);
    Ok(())
}

fn open_command(public_hex: &str, secret_hex: &str, ciphertext: &str) -> Result<()> {
    let pair = KeyPair::from_hex(public_hex, secret_hex)?;
    println!("{}", sealed::open(ciphertext, &pair)?);
    Ok(())
}

async fn lookup(uid: &str, base_url: Option<String>) -> Result<()> {
    let config = match base_url {
        Some(url) => KeyServiceConfig::new(url),
        None => KeyServiceConfig::from_env()?,
    };
    let store = HttpKeyStore::new(&config);

    let key = store.public_key(uid).await?;
    match store.fetch_profile(uid).await {
        Ok(profile) => println!("{uid} ({})", profile.name),
        Err(_) => println!("{uid} (no profile)"),
    }
    println!("public key: {}", key.to_hex());
    Ok(())
}

async fn demo() -> Result<()> {
    let relay = Arc::new(MemoryRelay::new());
    let keystore = Arc::new(MemoryKeyStore::new());
    keystore.insert("alice", KeyPair::generate());
    keystore.insert("bob", KeyPair::generate());

    let alice = SessionController::connect(
        relay.clone(),
        keystore.clone(),
        SessionConfig {
            local_uid: "alice".into(),
            peer_uid: "bob".into(),
        },
    )
    .await?;
    let bob = SessionController::connect(
        relay.clone(),
        keystore.clone(),
        SessionConfig {
            local_uid: "bob".into(),
            peer_uid: "alice".into(),
        },
    )
    .await?;

    alice.send("hey bob, sealed end to end").await?;
    bob.send("loud and clear").await?;
    bob.send("the relay only ever sees ciphertext").await?;

    // Let the inbound pipelines drain.
    tokio::time::sleep(Duration::from_millis(200)).await;

    for (name, session) in [("alice", &alice), ("bob", &bob)] {
        println!("--- {name} ---");
        for entry in session.transcript() {
            println!(
                "[{}] {} -> {}: {}",
                entry.timestamp.format("%H:%M:%S"),
                entry.sender_uid,
                entry.receiver_uid,
                entry.plaintext
            );
        }
    }
    Ok(())
}
