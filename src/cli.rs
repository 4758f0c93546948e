use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Signal to trap: a name in any case, with or without the SIG prefix,
    /// or a decimal number. Repeatable; SIGMUX_TRAPS takes a comma list.
    #[arg(
        short = 't',
        long = "trap",
        value_name = "SIGNAL",
        env = "SIGMUX_TRAPS",
        value_delimiter = ',',
        required = true
    )]
    pub traps: Vec<String>,
    /// Exit after this many deliveries across all trapped signals.
    #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: u64,
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbosity: u8,
}
