// Copyright (c) Sean Lawlor
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree.

use std::env;
use std::io::stderr;
use std::io::IsTerminal;

use clap::Parser;
use tracing_glog::Glog;
use tracing_glog::GlogFields;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

mod swarm;

#[derive(Debug, clap::Subcommand)]
enum Cli {
    /// Spin up an overlay of peers and run node lookups through it
    Swarm {
        /// The number of peers in the overlay
        peers: usize,
        /// How many free nodes each peer starts with
        nodes_per_peer: usize,
        /// How many lookups to run against the overlay
        lookups: usize,
    },
    /// Spin up an overlay and flood an acquaintance dump through it
    Dump {
        /// The number of peers in the overlay
        peers: usize,
    },
}

#[derive(Parser, Debug)]
struct Args {
    #[command(subcommand)]
    command: Cli,

    /// Set the logging level based on the set of filter directives.
    ///
    /// Normal logging levels are supported (e.g. trace, debug, info, warn,
    /// error), but it's possible to set verbosity for specific spans and
    /// events.
    #[clap(short, long, default_value = "info", use_value_delimiter = true)]
    log: Vec<Directive>,
}

// MAIN //
#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let args = Args::parse();

    // if it's not set, set the log level to debug
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "debug");
    }
    init_logging(args.log);

    // parse the CLI and run the correct playground scenario
    match args.command {
        Cli::Swarm {
            peers,
            nodes_per_peer,
            lookups,
        } => {
            swarm::run_swarm(peers, nodes_per_peer, lookups).await;
        }
        Cli::Dump { peers } => {
            swarm::run_dump(peers).await;
        }
    }
}

fn init_logging(directives: Vec<Directive>) {
    let fmt = tracing_subscriber::fmt::Layer::default()
        .with_ansi(stderr().is_terminal())
        .with_writer(std::io::stderr)
        .event_format(Glog::default().with_timer(tracing_glog::LocalTime::default()))
        .fmt_fields(GlogFields::default());

    let filter = directives
        .into_iter()
        .fold(EnvFilter::from_default_env(), |filter, directive| {
            filter.add_directive(directive)
        });

    let subscriber = Registry::default().with(filter).with(fmt);
    tracing::subscriber::set_global_default(subscriber).expect("to set global subscriber");
}
