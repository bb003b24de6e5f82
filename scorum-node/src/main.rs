use std::error::Error;
use structopt::StructOpt;

fn main() {
    scorum_node::start(scorum_node::settings::CommandLine::from_args())
        .unwrap_or_else(|error| report_error(&error))
}

fn report_error(error: &dyn Error) {
    eprintln!("{}", error);
    let mut source = error.source();
    while let Some(sub_error) = source {
        eprintln!("  |-> {}", sub_error);
        source = sub_error.source();
    }
    std::process::exit(1)
}
