use anyhow::Result;
use clap::Parser;

use loops_shell::{Args, init_logging, run};

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run(args, stdin.lock(), &mut stdout.lock())
}
