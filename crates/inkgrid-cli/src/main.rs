#![forbid(unsafe_code)]

//! inkgrid binary entry point.
//!
//! Exit codes: 0 success or help, 1 usage error, 2 font load failure,
//! 3 render-session failure (allocation or output I/O).

use std::env;
use std::fs;
use std::io;
use std::process;

use tracing_subscriber::EnvFilter;

use inkgrid_canvas::RenderConfig;
use inkgrid_cli::cli::{self, Invocation};
use inkgrid_compose::{Compositor, FontFace};

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let opts = match cli::parse(&args) {
        Ok(Invocation::Help) => {
            println!("{}", cli::HELP_TEXT);
            return 0;
        }
        Ok(Invocation::Run(opts)) => opts,
        Err(err) => {
            eprintln!("Usage error: {err}");
            return 1;
        }
    };

    // Font diagnostics go to stdout, not stderr; scripts key off the exit
    // code to distinguish the failure.
    let bytes = match fs::read(&opts.font) {
        Ok(bytes) => bytes,
        Err(err) => {
            println!("failed to read font file {}: {err}", opts.font.display());
            return 2;
        }
    };
    let face = match FontFace::from_bytes(&bytes, opts.size as f32, opts.anti_alias) {
        Ok(face) => face,
        Err(err) => {
            println!("failed to load font {}: {err}", opts.font.display());
            return 2;
        }
    };

    let mut compositor = match Compositor::new(&face, RenderConfig::default()) {
        Ok(compositor) => compositor,
        Err(err) => {
            eprintln!("failed to start render session: {err}");
            return 3;
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match compositor.render_text(&opts.text, &mut out) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            3
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("INKGRID_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
