//! Headless thin-client binary.
//!
//! Connects to the configured application server, lets it construct the
//! initial UI through the protocol engine, drains deferred work, then
//! shuts the session down cleanly. A rendering frontend replaces the
//! console shell and drives the same desktop.

mod config;
mod logging;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use url::Url;

use apiary_rpc::{EventLoopHandle, HttpTransport};
use apiary_ui::{ConsoleShell, Desktop};

use crate::config::AppConfig;

/// Single-threaded task queue standing in for a real toolkit's event
/// loop.
#[derive(Default)]
struct MainLoop {
    tasks: RefCell<VecDeque<Box<dyn FnOnce()>>>,
}

impl MainLoop {
    fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Run tasks until none remain, including ones posted while running.
    fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl EventLoopHandle for MainLoop {
    fn post(&self, task: Box<dyn FnOnce()>) {
        self.tasks.borrow_mut().push_back(task);
    }
}

/// Apply one `key=value` command-line override. Returns false for
/// unknown keys.
fn apply_arg(config: &mut AppConfig, arg: &str) -> bool {
    let Some((key, value)) = arg.split_once('=') else {
        return false;
    };
    match key.trim() {
        "service_url" => config.service_url = value.trim().to_string(),
        "connect_timeout_secs" => match value.trim().parse() {
            Ok(secs) => config.connect_timeout_secs = secs,
            Err(_) => return false,
        },
        "log_filter" => config.log_filter = value.trim().to_string(),
        _ => return false,
    }
    true
}

fn main() -> Result<()> {
    let mut config = AppConfig::load()?;
    for arg in std::env::args().skip(1) {
        if !apply_arg(&mut config, &arg) {
            eprintln!("* command line arg ignored: '{arg}'");
        }
    }

    let _guard = logging::init_logging(&config)?;

    let url: Url = config
        .service_url
        .parse()
        .with_context(|| format!("Invalid service url: {}", config.service_url))?;
    let transport = HttpTransport::with_connect_timeout(
        url,
        Duration::from_secs(config.connect_timeout_secs),
    )?;

    let desktop = Desktop::new(Box::new(transport), Rc::new(ConsoleShell));
    let main_loop = MainLoop::new();
    desktop.set_event_loop(main_loop.clone());

    info!("connecting to {}", config.service_url);
    // The server answers the first (empty) flush by constructing the UI.
    desktop.flush();
    main_loop.run_until_idle();

    let frames = desktop.frames();
    info!("server constructed {} top-level frame(s)", frames.len());
    for frame in &frames {
        let frame = frame.borrow();
        info!("  {:?} visible={}", frame.title(), frame.is_visible());
    }

    // Orderly shutdown: report a close on every frame and settle.
    desktop.close_all();
    main_loop.run_until_idle();
    desktop.flush_if_pending();

    Ok(())
}
