//! ferrite-fit monitor
//!
//! Runs one training job on a background thread and serves its live plot,
//! status and report over HTTP. Training can be paused and resumed from the
//! page or with `POST /pause` and `POST /resume`.
//!
//! Run with:
//!   cargo run --bin monitor -- --csv data.csv --x a,b --y label --model mlp_cls
//! Then open http://127.0.0.1:8080

mod page;
mod routes;
mod state;

use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use tiny_http::Server;
use tracing::{error, info};

use ferrite_fit::cli::{init_tracing, parse_args, RunArgs};
use ferrite_fit::{pipeline, ProgressEvent};

use state::Monitor;

#[derive(Parser)]
#[command(name = "monitor", version, about = "Train a model and watch it over HTTP")]
struct Cli {
    #[command(flatten)]
    run: RunArgs,

    /// Address to serve on
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: String,
}

fn main() -> ExitCode {
    init_tracing();
    let cli: Cli = match parse_args() {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    let mut config = match cli.run.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };
    // The page always has a plot to show; per-process names keep concurrent
    // monitors apart.
    let plot_path = config
        .plot_path
        .get_or_insert_with(|| std::env::temp_dir().join(format!("ferrite-fit-monitor-{}.png", std::process::id())))
        .clone();

    let server = match Server::http(cli.addr.as_str()) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("error: cannot bind {}: {e}", cli.addr);
            return ExitCode::from(1);
        }
    };

    let monitor = Arc::new(Monitor::new(plot_path));
    info!(addr = %cli.addr, model = %config.model, "monitor listening");

    let job = Arc::clone(&monitor);
    thread::spawn(move || {
        let mut on_event = |event: &ProgressEvent| job.record(*event);
        let result = pipeline::run(&config, &job.pause, Some(&mut on_event as &mut dyn FnMut(&ProgressEvent)));
        match result {
            Ok(outcome) => job.finish(Ok(outcome.report.render_text())),
            Err(e) => {
                error!(error = %e, "run failed");
                job.finish(Err(e.to_string()));
            }
        }
    });

    // One thread per request so a slow client never stalls the others.
    for request in server.incoming_requests() {
        let monitor = Arc::clone(&monitor);
        thread::spawn(move || routes::dispatch(request, monitor));
    }
    ExitCode::SUCCESS
}
