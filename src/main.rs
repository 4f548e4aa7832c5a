use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use mimalloc::MiMalloc;
use promptvault::config::CONFIG;
use promptvault::providers::{GenerationConfig, list_capabilities};
use promptvault::remote::{PromptPayload, PromptsClient};
use promptvault::store::NewDraft;
use promptvault::vault::{NewConnection, PasswordPurpose, PasswordRequest};
use promptvault::{Outcome, PasswordPrompt, Vault, VaultError};
use std::process::ExitCode;
use tracing::{debug, info};
use zeroize::Zeroizing;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Parser)]
#[command(name = "promptvault", version, about = "Encrypted LLM credentials and prompt drafts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Supported providers and what each one needs.
    Services,
    /// Save (or overwrite) a connection. Prompts for the key and a password.
    Save(SaveArgs),
    /// Change endpoint or model of a saved connection. Omitted flags keep
    /// the saved value; pass an empty string to clear one.
    Update {
        name: String,
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Saved connections (keys are never shown).
    List,
    Delete { name: String },
    /// Send one prompt through a saved connection.
    Ask(AskArgs),
    /// Models offered by a saved connection's provider.
    Models { name: String },
    /// Re-seal a saved key under a new password.
    Passwd { name: String },
    #[command(subcommand)]
    Draft(DraftCommand),
}

#[derive(Debug, Args)]
struct SaveArgs {
    /// Friendly name; saving again under the same name overwrites.
    #[arg(long)]
    name: String,
    /// One of the names printed by `services`.
    #[arg(long)]
    service: String,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    model: Option<String>,
}

#[derive(Debug, Args)]
struct AskArgs {
    name: String,
    #[arg(required = true, num_args = 1..)]
    prompt: Vec<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    max_tokens: Option<u32>,
    #[arg(long)]
    temperature: Option<f32>,
}

#[derive(Debug, Subcommand)]
enum DraftCommand {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        public: bool,
    },
    List,
    Delete { id: i64 },
    /// Upload a draft to the prompts backend.
    Publish {
        id: i64,
        #[arg(long)]
        username: String,
    },
}

/// Reads passwords from the terminal without echo. An empty entry cancels.
struct TerminalPrompt;

#[async_trait]
impl PasswordPrompt for TerminalPrompt {
    async fn request_password(&self, request: PasswordRequest<'_>) -> Option<Zeroizing<String>> {
        let label = match request.purpose {
            PasswordPurpose::Unlock => format!("Password for {}: ", request.friendly_name),
            PasswordPurpose::NewPassword => {
                format!("New password for {}: ", request.friendly_name)
            }
        };
        read_secret(label).await
    }
}

async fn read_secret(label: String) -> Option<Zeroizing<String>> {
    let read = tokio::task::spawn_blocking(move || rpassword::prompt_password(label)).await;
    match read {
        Ok(Ok(secret)) if !secret.is_empty() => Some(Zeroizing::new(secret)),
        Ok(Ok(_)) => None,
        Ok(Err(err)) => {
            debug!(error = %err, "Password read failed");
            None
        }
        Err(err) => {
            debug!(error = %err, "Password prompt task failed");
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = &*CONFIG;
    promptvault::utils::logging::init_tracing(&cfg.basic.loglevel);

    debug!(
        database_url = %cfg.basic.database_url,
        proxy = %cfg.providers.proxy.as_ref().map_or("<none>", url::Url::as_str),
        request_timeout_secs = cfg.providers.request_timeout_secs,
        pbkdf2_iterations = cfg.cipher.pbkdf2_iterations,
        remote = %cfg.remote.base_url,
        "Configuration loaded"
    );

    let vault = match Vault::from_config(cfg) {
        Ok(vault) => vault,
        Err(err) => {
            eprintln!("{}", err.user_message());
            return ExitCode::FAILURE;
        }
    };

    let result = run(cli.command, &vault).await;
    if let Err(err) = vault.close().await {
        debug!(error = %err, "Record store did not close cleanly");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Vault(err)) => {
            eprintln!("{}", err.user_message());
            ExitCode::FAILURE
        }
        Err(CliError::Other(msg)) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

enum CliError {
    Vault(VaultError),
    Other(String),
}

impl From<VaultError> for CliError {
    fn from(err: VaultError) -> Self {
        CliError::Vault(err)
    }
}

impl From<promptvault::RemoteError> for CliError {
    fn from(err: promptvault::RemoteError) -> Self {
        CliError::Other(err.to_string())
    }
}

fn report_cancelled() {
    println!("Cancelled.");
}

async fn run(command: Command, vault: &Vault) -> Result<(), CliError> {
    match command {
        Command::Services => {
            for cap in list_capabilities() {
                let mut needs = Vec::new();
                if cap.requires_endpoint {
                    needs.push("endpoint");
                }
                if cap.requires_model {
                    needs.push("model");
                }
                println!(
                    "{:<18} {:<18} needs: {}",
                    cap.service_type.as_str(),
                    cap.display_name,
                    if needs.is_empty() { "-".to_string() } else { needs.join(", ") }
                );
            }
        }
        Command::Save(args) => {
            let Some(api_key) = read_secret("API key: ".to_string()).await else {
                report_cancelled();
                return Ok(());
            };
            let Some(password) = read_secret("Encryption password: ".to_string()).await else {
                report_cancelled();
                return Ok(());
            };
            let Some(confirm) = read_secret("Repeat password: ".to_string()).await else {
                report_cancelled();
                return Ok(());
            };
            if *password != *confirm {
                return Err(CliError::Other("Passwords do not match.".to_string()));
            }

            let name = args.name.clone();
            vault
                .save_connection(
                    NewConnection {
                        friendly_name: args.name,
                        service_type: args.service,
                        api_key,
                        endpoint: args.endpoint,
                        model: args.model,
                    },
                    &password,
                )
                .await?;
            println!("Saved {name}.");
        }
        Command::Update {
            name,
            endpoint,
            model,
        } => {
            vault.update_connection(&name, endpoint, model).await?;
            println!("Updated {name}.");
        }
        Command::List => {
            for conn in vault.list_connections().await? {
                println!(
                    "{:<20} {:<18} {}{}",
                    conn.friendly_name,
                    conn.service_type,
                    conn.model.as_deref().unwrap_or("-"),
                    conn.endpoint
                        .as_deref()
                        .map(|e| format!("  {e}"))
                        .unwrap_or_default()
                );
            }
        }
        Command::Delete { name } => {
            vault.delete_connection(&name).await?;
            println!("Deleted {name}.");
        }
        Command::Ask(args) => {
            let config = GenerationConfig {
                model: args.model,
                max_tokens: args.max_tokens,
                temperature: args.temperature,
                ..Default::default()
            };
            let prompt = args.prompt.join(" ");
            match vault
                .generate(&args.name, &prompt, config, &TerminalPrompt)
                .await?
            {
                Outcome::Completed(text) => println!("{text}"),
                Outcome::Cancelled => report_cancelled(),
            }
        }
        Command::Models { name } => match vault.available_models(&name, &TerminalPrompt).await? {
            Outcome::Completed(models) if models.is_empty() => {
                println!("This provider does not list models; enter one by name.");
            }
            Outcome::Completed(models) => {
                for model in models {
                    println!("{model}");
                }
            }
            Outcome::Cancelled => report_cancelled(),
        },
        Command::Passwd { name } => match vault.change_password(&name, &TerminalPrompt).await? {
            Outcome::Completed(()) => println!("Password changed for {name}."),
            Outcome::Cancelled => report_cancelled(),
        },
        Command::Draft(draft) => run_draft(draft, vault).await?,
    }
    Ok(())
}

async fn run_draft(command: DraftCommand, vault: &Vault) -> Result<(), CliError> {
    match command {
        DraftCommand::Add {
            title,
            content,
            public,
        } => {
            let saved = vault
                .save_draft(NewDraft {
                    title,
                    content,
                    is_public: public,
                })
                .await?;
            println!("Draft {} saved.", saved.id);
        }
        DraftCommand::List => {
            for draft in vault.list_drafts().await? {
                let visibility = if draft.is_public { "public" } else { "private" };
                println!("{:>5}  {:<8} {}", draft.id, visibility, draft.title);
            }
        }
        DraftCommand::Delete { id } => {
            vault.delete_draft(id).await?;
            println!("Draft {id} deleted.");
        }
        DraftCommand::Publish { id, username } => {
            let draft = vault
                .list_drafts()
                .await?
                .into_iter()
                .find(|d| d.id == id)
                .ok_or_else(|| CliError::Other(format!("No draft with id {id}.")))?;

            let Some(password) = read_secret(format!("Backend password for {username}: ")).await
            else {
                report_cancelled();
                return Ok(());
            };

            let mut client = PromptsClient::from_config(&CONFIG.remote)?;
            client.login(&username, &password).await?;
            let created = client.create(&PromptPayload::from(&draft)).await?;
            info!(draft_id = id, prompt_id = created.id, "Draft published");
            println!("Draft {id} published as prompt {}.", created.id);
        }
    }
    Ok(())
}
