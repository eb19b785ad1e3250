mod cli;
mod progress;

use std::fs;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use treepack::core::{get_config_path, load_config, Config, OutputFormat};
use treepack::output::{display_token_counts, generate_output};
use treepack::pipeline::Pipeline;
use treepack::server;

use crate::cli::{pack_request, Cli, Commands};
use crate::progress::ProgressContext;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn build_pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    let token = config.api_token();
    if token.is_none() {
        warn!(
            "{} is not set; requests are subject to unauthenticated rate limits",
            config.token_env
        );
    }
    Pipeline::from_config(config, token.as_deref())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Cli::parse();

    if let Commands::ConfigPath = args.command {
        let path = get_config_path()?;
        println!("{}", path.display());
        return Ok(());
    }

    let mut config = load_config()?;
    args.apply_to(&mut config);

    match args.command {
        Commands::Serve { .. } => {
            let pipeline = build_pipeline(&config)?;
            server::run(pipeline, &config.bind_address, config.port).await
        }
        Commands::Fetch {
            repo_url,
            mode,
            extensions,
            output,
            file,
            print,
            no_tokens,
        } => {
            let pipeline = build_pipeline(&config)?;
            let request = pack_request(&repo_url, &mode, &extensions);

            let progress = ProgressContext::new(format!("Fetching {repo_url}"));
            let packed = match pipeline.run(&request).await {
                Ok(packed) => {
                    progress.finish(&format!("packed {} files", packed.file_count));
                    packed
                }
                Err(e) => {
                    progress.fail(&e.to_string());
                    return Err(e.into());
                }
            };

            let format: OutputFormat = output.into();
            let content = generate_output(&packed, format);

            if let Some(output_file) = &file {
                fs::write(output_file, &content)?;
                println!("Output written to: {}", output_file.display());
            } else if print {
                println!("{content}");
            } else {
                match arboard::Clipboard::new()
                    .and_then(|mut clipboard| clipboard.set_text(content))
                {
                    Ok(_) => println!("Repository content copied to clipboard"),
                    Err(_) => {
                        println!("Failed to copy to clipboard, use -f to save to a file instead")
                    }
                }
            }

            if !no_tokens {
                display_token_counts(packed.file_count, &packed.token_estimates);
            }
            Ok(())
        }
        Commands::ConfigPath => Ok(()),
    }
}
