//! # Coverpage CLI
//!
//! Command-line interface for cover page templates and rendering.
//!
//! ## Usage
//!
//! ```bash
//! # List templates and palettes
//! coverpage templates
//!
//! # Create a document from a template
//! coverpage new centered --scheme custom --primary "0 0% 0%" -o cover.json
//!
//! # Check a document and report unknown tokens
//! coverpage validate cover.json
//!
//! # Populate a document for one report
//! coverpage resolve cover.json --context report.json --signing-url https://storage.internal/sign
//!
//! # Run the HTTP API
//! coverpage serve --listen 0.0.0.0:8080
//! ```

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use coverpage::{
    CoverError,
    config::{DEFAULT_LISTEN, ServerConfig, SigningConfig},
    document::codec,
    merge::{
        self, AssetErrorPolicy, AssetLocator, AssetResolver, HttpSigner, MergeField, MergeResolver,
        NoSigner, ResolutionContext,
    },
    template::{self, CustomColors},
};

/// Coverpage - cover page templates and merge resolution
#[derive(Parser, Debug)]
#[command(name = "coverpage")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List templates and color palettes
    Templates,

    /// Create a document from a template
    New {
        /// Template id
        template: String,

        /// Color scheme: a palette name, "custom", or "default"
        #[arg(long)]
        scheme: Option<String>,

        /// Custom primary color, e.g. "220 87% 56%"
        #[arg(long)]
        primary: Option<String>,

        /// Custom secondary color
        #[arg(long)]
        secondary: Option<String>,

        /// Custom accent color
        #[arg(long)]
        accent: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Decode a document and report problems
    Validate {
        /// Document file
        file: PathBuf,
    },

    /// Resolve merge fields, tokens and assets in a document
    Resolve {
        /// Document file
        file: PathBuf,

        /// Resolution context (JSON with report/organization/inspector/contact)
        #[arg(long, value_name = "FILE")]
        context: Option<PathBuf>,

        /// Fail instead of leaving unsignable assets in place
        #[arg(long)]
        abort_on_asset_error: bool,

        #[command(flatten)]
        signing: SigningArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "COVERPAGE_LISTEN", default_value = DEFAULT_LISTEN)]
        listen: SocketAddr,

        #[command(flatten)]
        signing: SigningArgs,
    },
}

#[derive(Args, Debug)]
struct SigningArgs {
    /// Asset signing endpoint
    #[arg(long, env = "COVERPAGE_SIGNING_URL")]
    signing_url: Option<String>,

    /// Bearer key for the signing endpoint
    #[arg(long, env = "COVERPAGE_SIGNING_KEY", hide_env_values = true)]
    signing_key: Option<String>,

    /// Signed URL lifetime in seconds
    #[arg(long, env = "COVERPAGE_SIGNED_URL_TTL", default_value = "3600")]
    signed_url_ttl: u64,

    /// Comma-separated prefixes that mark internal asset references
    #[arg(long, env = "COVERPAGE_INTERNAL_PREFIXES", default_value = "storage://")]
    internal_prefixes: String,
}

impl SigningArgs {
    fn into_config(self) -> SigningConfig {
        SigningConfig {
            endpoint: self.signing_url,
            api_key: self.signing_key,
            expires_in: Duration::from_secs(self.signed_url_ttl),
            internal_prefixes: SigningConfig::parse_prefixes(&self.internal_prefixes),
            ..SigningConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coverpage=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CoverError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Templates => {
            println!("Available templates:");
            for t in template::all() {
                println!("  {:<10} {}", t.id, t.description);
            }
            println!("\nColor schemes:");
            println!("  default    (template colors)");
            println!("  custom     (--primary/--secondary/--accent)");
            for name in template::color::palette_names() {
                println!("  {}", name);
            }
            Ok(())
        }

        Commands::New {
            template: id,
            scheme,
            primary,
            secondary,
            accent,
            output,
        } => {
            let custom = CustomColors {
                primary,
                secondary,
                accent,
            };
            let colors = template::resolve_colors(scheme.as_deref(), Some(&custom));
            let doc = template::instantiate_with_colors(&id, colors.as_ref())?;
            write_output(output.as_deref(), &codec::encode_pretty(&doc))
        }

        Commands::Validate { file } => {
            let doc = codec::decode(&std::fs::read(&file)?)?;
            let mut warnings = 0;
            for node in doc.root().descendants() {
                if let Some(text) = node.text_content() {
                    for token in merge::tokens(text).iter().filter(|t| !t.is_known()) {
                        println!("warning: {}: unknown token {}", node.id(), token);
                        warnings += 1;
                    }
                }
                if let Some(field) = node.merge_field()
                    && MergeField::parse(field).is_none()
                {
                    println!("warning: {}: unknown merge field {}", node.id(), field);
                    warnings += 1;
                }
            }
            println!(
                "{}: valid, {} nodes, {} warnings",
                file.display(),
                doc.node_count(),
                warnings
            );
            Ok(())
        }

        Commands::Resolve {
            file,
            context,
            abort_on_asset_error,
            signing,
            output,
        } => {
            let doc = codec::decode(&std::fs::read(&file)?)?;
            let context = match context {
                Some(path) => load_context(&path)?,
                None => ResolutionContext::default(),
            };

            let signing = signing.into_config();
            let signer: Arc<dyn AssetResolver> = match signing.endpoint {
                Some(_) => Arc::new(HttpSigner::new(&signing)?),
                None => Arc::new(NoSigner),
            };
            let policy = if abort_on_asset_error {
                AssetErrorPolicy::Abort
            } else {
                AssetErrorPolicy::Degrade
            };

            let resolved = MergeResolver::new(&context, signer.as_ref())
                .with_locator(AssetLocator::from_config(&signing))
                .with_policy(policy)
                .resolve(&doc)
                .await?;

            for failure in &resolved.failures {
                eprintln!(
                    "warning: {}.{}: {} ({})",
                    failure.node_id, failure.attribute, failure.reference, failure.message
                );
            }
            write_output(output.as_deref(), &codec::encode_pretty(&resolved.document))
        }

        Commands::Serve { listen, signing } => {
            let config = ServerConfig {
                listen_addr: listen,
                signing: signing.into_config(),
            };
            coverpage::server::serve(config).await
        }
    }
}

fn load_context(path: &Path) -> Result<ResolutionContext, CoverError> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| CoverError::Config(format!("invalid context file {}: {}", path.display(), e)))
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<(), CoverError> {
    match path {
        Some(path) => {
            std::fs::write(path, contents)?;
            tracing::info!(path = %path.display(), "wrote document");
        }
        None => println!("{}", contents),
    }
    Ok(())
}
