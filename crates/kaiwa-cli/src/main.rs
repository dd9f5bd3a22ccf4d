// kaiwa-cli: terminal frontend for kaiwa
// Argument parsing, config loading, streaming output

mod cli;
mod config;
mod output;

use clap::Parser;
use cli::Cli;
use config::{FileConfig, default_config_path};
use kaiwa_core::{ChatClient, ConfigHandle, Error, FinalResponse, Role, SendOptions, Transcript};
use output::TerminalSink;
use std::io::{IsTerminal, Read};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("kaiwa: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let file = FileConfig::load(&path)?;
    let provider = file.resolve(cli.provider.as_deref())?;

    let handle = ConfigHandle::new(provider);
    handle.subscribe(|config| {
        log::info!("provider configuration updated: model={}", config.model);
    });
    let client = ChatClient::new(handle.current())?;

    let mut transcript = Transcript::new();
    if let Some(system) = &cli.system {
        transcript.push(Role::System, system.clone());
    }
    transcript.push(Role::User, read_prompt(&cli)?);

    let options = SendOptions {
        model: cli.model.clone(),
        response_format: cli.json.then(|| "json_object".to_string()),
        ..SendOptions::new()
    };

    if cli.no_stream {
        let response = client.send_once(&transcript, &options).await?;
        transcript.push(Role::Assistant, response.content.clone());
        output::render_message(&response.content)?;
        if cli.verbose {
            print_summary(&response);
        }
        return Ok(());
    }

    // Ctrl-C cancels cooperatively: the stream stops at the next fold and
    // the partial transcript stays as accumulated.
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut sink = TerminalSink::new();
    match client
        .send_stream(&mut transcript, &options, &cancel, &mut sink)
        .await?
    {
        Some(response) => {
            if cli.verbose {
                print_summary(&response);
            }
        }
        None => {
            eprintln!("[cancelled]");
        }
    }
    Ok(())
}

/// Prompt from argv, or stdin when piped.
fn read_prompt(cli: &Cli) -> Result<String, Error> {
    if !cli.prompt.is_empty() {
        return Ok(cli.prompt.join(" "));
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(Error::Configuration(
            "no prompt given (pass it as an argument or pipe it on stdin)".to_string(),
        ));
    }
    let mut prompt = String::new();
    stdin
        .read_to_string(&mut prompt)
        .map_err(|e| Error::Configuration(format!("cannot read stdin: {}", e)))?;
    let prompt = prompt.trim_end();
    if prompt.is_empty() {
        return Err(Error::Configuration("empty prompt on stdin".to_string()));
    }
    Ok(prompt.to_string())
}

/// Response metadata line shown with `-v`. The token counts are character
/// estimates, not provider accounting.
fn print_summary(response: &FinalResponse) {
    eprintln!(
        "[model: {} | finish: {} | tokens: {} prompt + {} completion = {} total (estimated)]",
        response.model,
        response.finish_reason,
        response.usage.prompt_tokens,
        response.usage.completion_tokens,
        response.usage.total_tokens,
    );
}
