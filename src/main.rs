fn main() {
    use clap::Parser;
    use std::error::Error;
    let args = trailscrape::cli::Args::parse();
    trailscrape::logging::initialize(trailscrape::logging::level_for(args.quiet, args.verbose));
    if let Err(e) = trailscrape::cli::run(&args) {
        eprintln!("{}", e);
        if args.verbose {
            let mut source = e.source();
            while let Some(s) = source {
                eprintln!("  cause: {}", s);
                source = s.source();
            }
        }
        std::process::exit(e.exit_code());
    }
}
