use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
mod auth;
use msgseal::{ErrorKind, SealError, Storage};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

#[derive(Debug, Parser)]
#[command(name = "msgseal")]
#[command(
    version,
    about = "Seal messages with a shared passphrase (PBKDF2 + AES-256-CBC)."
)]
struct Cli {
    /// Log debug events to stderr (never message contents or passphrases)
    #[arg(short, long, global = true, env = "MSGSEAL_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Seals a message into an envelope
    Seal {
        /// Message to seal
        #[arg(conflicts_with = "file")]
        message: Option<String>,

        /// Read the message from a file instead
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Generate a fresh passphrase instead of reading one
        #[arg(short, long, default_value_t = false)]
        generate_key: bool,

        /// Write the envelope to a file
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// Print a JSON record instead of the bare envelope
        #[arg(long, default_value_t = false, conflicts_with = "out")]
        json: bool,

        /// Copy the envelope to the clipboard
        #[arg(long, default_value_t = false)]
        copy: bool,
    },

    /// Opens an envelope and prints the message
    #[command(arg_required_else_help = true)]
    Open {
        /// Envelope in `salt:iv:ciphertext` form
        #[arg(conflicts_with = "input", required_unless_present = "input")]
        envelope: Option<String>,

        /// Read the envelope from a file instead
        #[arg(short = 'i', long = "in", value_name = "PATH")]
        input: Option<PathBuf>,

        /// Copy the message to the clipboard
        #[arg(long, default_value_t = false)]
        copy: bool,
    },

    /// Generates a random shareable passphrase
    Keygen,
}

/// What a remote store would persist for one sealed message.
#[derive(Debug, Serialize)]
struct SealedRecord<'a> {
    envelope: &'a str,
    created_at: String,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("msgseal=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Attaches a hint telling the user which input to fix.
fn explain(err: SealError) -> anyhow::Error {
    let hint = match err.kind() {
        ErrorKind::MalformedEnvelope => "this is not a sealed message; check the envelope text",
        ErrorKind::DecryptionFailed => "could not open the message; check the passphrase",
        ErrorKind::InvalidInput => "invalid input",
        ErrorKind::EntropySourceFailure => "cannot seal safely on this system",
    };
    anyhow::Error::new(err).context(hint)
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    arboard::Clipboard::new()
        .and_then(|mut clipboard| clipboard.set_text(text.to_owned()))
        .context("failed to copy to clipboard")
}

fn read_message(message: Option<String>, file: Option<PathBuf>) -> Result<Zeroizing<String>> {
    let message = match (message, file) {
        (Some(m), _) => Zeroizing::new(m),
        (None, Some(path)) => Zeroizing::new(
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        (None, None) => bail!("No message provided"),
    };

    if message.is_empty() {
        bail!("message cannot be empty");
    }
    Ok(message)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Seal {
            message,
            file,
            generate_key,
            out,
            json,
            copy,
        } => {
            let message = read_message(message, file)?;

            let passphrase = if generate_key {
                None
            } else {
                auth::read_passphrase()?
            };
            let passphrase = match passphrase {
                Some(pw) => pw,
                None => {
                    let key = Zeroizing::new(msgseal::generate_standalone_key().map_err(explain)?);
                    eprintln!("generated key: {}", key.as_str());
                    eprintln!("share it with the recipient over a separate channel");
                    key
                }
            };

            let envelope = msgseal::seal(&message, &passphrase).map_err(explain)?;
            drop(passphrase);

            if let Some(path) = out {
                Storage::new(path.clone()).save_envelope(&envelope)?;
                println!("sealed message written to {}", path.display());
            } else if json {
                let record = SealedRecord {
                    envelope: &envelope,
                    created_at: chrono::Utc::now().to_rfc3339(),
                };
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("{envelope}");
            }

            if copy {
                copy_to_clipboard(&envelope)?;
                eprintln!("envelope copied to clipboard");
            }
        }
        Commands::Open {
            envelope,
            input,
            copy,
        } => {
            let envelope = match (envelope, input) {
                (Some(e), _) => e,
                (None, Some(path)) => Storage::new(path).load_envelope()?,
                (None, None) => bail!("No envelope provided"),
            };

            let Some(passphrase) = auth::read_passphrase()? else {
                bail!("No passphrase provided");
            };

            let opened = msgseal::open(&envelope, &passphrase).map_err(explain)?;
            drop(passphrase);
            tracing::debug!(
                authenticity = ?opened.authenticity(),
                "message opened; padding is the only integrity check"
            );

            println!("{}", opened.plaintext());

            if copy {
                copy_to_clipboard(opened.plaintext())?;
                eprintln!("message copied to clipboard");
            }
        }
        Commands::Keygen => {
            let key = Zeroizing::new(msgseal::generate_standalone_key().map_err(explain)?);
            println!("{}", key.as_str());
        }
    }

    Ok(())
}
