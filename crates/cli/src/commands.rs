//! One-shot subcommands. Each signs in, does one thing and signs out.

use std::sync::Arc;

use anyhow::{Result, bail};
use controller::{Controller, HttpApi};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader, Stdin, Stdout};
use tracing::info;

use crate::config::{ClientConfig, Config};
use crate::repl::{Repl, Terminal, replay_action};

type StdRepl = Repl<BufReader<Stdin>, Stdout>;

fn build_controller(config: &Config) -> Result<Controller> {
    let api = HttpApi::new(&config.server.base_url, config.server.timeout())?;
    info!(base_url = api.base_url(), "Using chat server");
    Ok(Controller::new(Arc::new(api)))
}

/// Interactive session over stdin/stdout.
pub fn stdio_repl(config: &Config) -> Result<StdRepl> {
    let controller = build_controller(config)?;
    let term = Terminal::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    Ok(Repl::new(controller, term, config.client.clone()))
}

/// One-shot sessions never restore from the cookie jar.
fn one_shot_repl(config: &Config, username: Option<String>) -> Result<StdRepl> {
    let mut config = config.clone();
    config.client = ClientConfig {
        username: username.or(config.client.username),
        auto_restore: false,
    };
    stdio_repl(&config)
}

pub async fn cmd_chat(config: Config) -> Result<()> {
    stdio_repl(&config)?.run().await
}

pub async fn cmd_models(config: Config, username: Option<String>) -> Result<()> {
    let mut repl = one_shot_repl(&config, username)?;
    signed_in(&mut repl).await?;
    repl.print_models().await?;
    repl.logout().await
}

pub async fn cmd_history(
    config: Config,
    username: Option<String>,
    open: Option<String>,
) -> Result<()> {
    let mut repl = one_shot_repl(&config, username)?;
    signed_in(&mut repl).await?;
    match open {
        None => repl.print_history().await?,
        Some(session_id) => replay(&mut repl, &session_id).await?,
    }
    repl.logout().await
}

pub async fn cmd_register(config: Config, username: Option<String>) -> Result<()> {
    let mut repl = one_shot_repl(&config, username.clone())?;
    if !repl.register(username).await? {
        bail!("registration failed");
    }
    Ok(())
}

async fn signed_in<R, W>(repl: &mut Repl<R, W>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if !repl.login(None).await? {
        bail!("not signed in");
    }
    Ok(())
}

async fn replay<R, W>(repl: &mut Repl<R, W>, session_id: &str) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let Some(user) = repl.controller().state().username().map(str::to_string) else {
        bail!("not signed in");
    };
    repl.replay(replay_action(session_id, &user)).await
}
