mod alarm;
mod countdown;
mod diagnostics;
mod error;
mod notify;
mod runtime;
mod stopwatch;
mod ticker;
mod time_provider;
mod ui;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use log::info;

use crate::alarm::model::JsonFileStore;
use crate::alarm::scheduler::AlarmScheduler;
use crate::notify::{DesktopNotifier, NotificationSink};
use crate::runtime::ClockRuntime;
use crate::ticker::sleep_until;
use crate::time_provider::SystemTimeSource;

#[derive(Parser, Debug)]
#[command(
    name = "deskclock",
    version,
    about = "Alarms, countdown timer and stopwatch"
)]
struct Cli {
    /// Key-value document holding the alarm list.
    #[arg(long, default_value = "alarms.json")]
    alarms: PathBuf,

    #[arg(long)]
    diagnostics: bool,

    /// Watch alarms in the terminal instead of opening a window.
    #[arg(long)]
    headless: bool,

    /// Stop the headless watcher after this many seconds.
    #[arg(long, requires = "headless")]
    run_for: Option<u64>,

    /// Never use system notifications; always prompt.
    #[arg(long)]
    no_notifications: bool,

    #[arg(long)]
    mute: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let store = JsonFileStore::new(&cli.alarms);
    let mut notifier = DesktopNotifier::new(!cli.no_notifications, !cli.mute);

    if cli.diagnostics {
        return diagnostics::run_diagnostics(&store, &mut notifier);
    }

    notifier.request_permission();
    let scheduler = AlarmScheduler::from_store(Box::new(store));
    let runtime = ClockRuntime::new(Box::new(SystemTimeSource::new()), scheduler);

    if cli.headless {
        return run_headless(runtime, notifier, cli.run_for);
    }
    ui::app::run_gui(runtime, notifier)
}

fn run_headless(
    mut runtime: ClockRuntime,
    mut notifier: DesktopNotifier,
    run_for: Option<u64>,
) -> Result<()> {
    let deadline = run_for.map(|secs| Instant::now() + Duration::from_secs(secs));
    info!(
        "watching {} alarm(s) without a window",
        runtime.alarms().len()
    );

    while runtime.is_active() {
        let outcome = runtime.advance(&mut notifier);
        for fired in &outcome.fired {
            println!(
                "[{}] alarm {} {} (id {}, {:?})",
                runtime.wall_now().format("%H:%M:%S"),
                fired.time,
                fired.label.as_deref().unwrap_or(""),
                fired.id,
                fired.report.delivery
            );
        }
        for prompt in notifier.take_prompts() {
            println!("{prompt}");
        }

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            runtime.shutdown();
            continue;
        }
        let mut wake = Instant::now() + runtime.next_wakeup();
        if let Some(deadline) = deadline {
            wake = wake.min(deadline);
        }
        sleep_until(wake);
    }

    println!("Watcher stopped.");
    Ok(())
}
