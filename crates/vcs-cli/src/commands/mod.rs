pub mod cat_file;
pub mod verify_pack;

use anyhow::Result;
use clap::Subcommand;

use crate::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Provide content or type and size information for repository objects
    CatFile(cat_file::CatFileArgs),
    /// Validate packed archive files
    VerifyPack(verify_pack::VerifyPackArgs),
}

impl Commands {
    /// Get the command name as used in log output.
    pub fn command_name(&self) -> &str {
        match self {
            Commands::CatFile(_) => "cat-file",
            Commands::VerifyPack(_) => "verify-pack",
        }
    }
}

/// Open the repository at `--git-dir`, or discover it from the current
/// directory if not given.
pub fn open_repo(cli: &Cli) -> Result<vcs_repository::Repository> {
    let repo = match &cli.git_dir {
        Some(git_dir) => vcs_repository::Repository::open(git_dir)?,
        None => vcs_repository::Repository::open(".")?,
    };
    Ok(repo)
}

pub fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::CatFile(args) => cat_file::run(args, &cli),
        Commands::VerifyPack(args) => verify_pack::run(args, &cli),
    }
}
