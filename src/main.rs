use anyhow::Result;
use clap::Parser;
use imvdb::Opts;
use imvdb::cli::SubCommandExtend;
use imvdb::config::SubCommand;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let opts = Opts::parse();
    match &opts.subcmd {
        SubCommand::Add(cmd) => cmd.run(&opts).await,
        SubCommand::Search(cmd) => cmd.run(&opts).await,
        SubCommand::List(cmd) => cmd.run(&opts).await,
        SubCommand::Reset(cmd) => cmd.run(&opts).await,
        SubCommand::Server(cmd) => cmd.run(&opts).await,
    }
}
