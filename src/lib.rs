pub mod batch;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod gateway;
pub mod generate;
pub mod input;
pub mod render;
pub mod report;
pub mod resource;
pub mod response;
pub mod validate;

use crate::cli::CliArgs;

pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    Ok(commands::dispatch(args).await?)
}
