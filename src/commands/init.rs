//! Interactive configuration wizard.

use crate::{
    api::jira::SECRET_FILE,
    libs::{config::Config, messages::Message, secret::Secret},
    msg_success,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Forget the cached Jira API token
    #[arg(long)]
    reset_token: bool,
}

pub fn cmd(args: InitArgs) -> Result<()> {
    if args.reset_token {
        Secret::new(SECRET_FILE, "").clear()?;
    }

    let path = Config::init()?.save()?;
    msg_success!(Message::ConfigSaved(path.display().to_string()));
    Ok(())
}
