use clap::Parser;

mod cli;
mod commands;

use cifkit::Config;
use cli::Args;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let config = Config::discover(args.config.as_deref())?;
    let mut options = config.parse_options();
    if args.lenient {
        options.strict = false;
    }

    let output = args.command.run(&config, &options)?;
    print!("{}", output.text);
    if !output.ok {
        std::process::exit(1);
    }
    Ok(())
}
