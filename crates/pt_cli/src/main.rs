use std::thread;
use std::time::Duration;

use clap::Parser;
use log::{debug, info};
use pt_progress::{pt_println, BarWidth, MonitorConfig, OrExit, OutputGate, Session, SharedProgress};
use rand::Rng;

/// Runs a set of simulated workers and draws one progress bar per worker.
#[derive(Parser, Debug)]
#[command(name = "pt", version, about)]
struct Cli {
    /// Number of worker threads
    #[arg(short, long, default_value_t = 5)]
    threads: usize,

    /// Steps each worker performs before finishing
    #[arg(short, long, default_value_t = 100)]
    steps: u64,

    /// Pause between two steps (e.g. `10ms`, `1s`)
    #[arg(short, long, default_value = "20ms", value_parser = humantime::parse_duration)]
    delay: Duration,

    /// Interval between two redraws
    #[arg(short, long, default_value = "100ms", value_parser = humantime::parse_duration)]
    refresh: Duration,

    /// Fixed bar length; the bars follow the terminal width when omitted
    #[arg(short, long)]
    bar_length: Option<usize>,

    /// Character drawn at the tip of every bar
    #[arg(long, default_value_t = '>')]
    head: char,

    /// Character the filled part of every bar is made of
    #[arg(long, default_value_t = '=')]
    body: char,

    /// Randomize every pause by up to this fraction of `--delay`
    #[arg(long, default_value_t = 0.0)]
    jitter: f64,

    /// Don't print a line per step, only the bars
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn config(&self) -> pt_progress::Result<MonitorConfig> {
        let bar_width = match self.bar_length {
            Some(length) => BarWidth::Fixed(length),
            None => BarWidth::Terminal,
        };
        MonitorConfig::builder()
            .refresh_rate(self.refresh)
            .bar_width(bar_width)
            .head(self.head)
            .body(self.body)
            .build()
    }
}

struct Worker {
    id: usize,
    steps: u64,
    delay: Duration,
    jitter: f64,
    quiet: bool,
    progress: SharedProgress,
    gate: OutputGate,
}

impl Worker {
    fn run(self) -> pt_progress::Result<()> {
        let mut rng = rand::thread_rng();
        for i in 0..=self.steps {
            self.progress.set_ratio(i, self.steps);
            if !self.quiet {
                pt_println!(self.gate, "Thread {}: {}", self.id, i)?;
            }
            thread::sleep(self.pause(&mut rng));
        }
        self.gate.print_message(format_args!("Thread {} finished!", self.id))
    }

    fn pause(&self, rng: &mut impl Rng) -> Duration {
        if self.jitter <= 0.0 {
            return self.delay;
        }
        let factor = 1.0 + rng.gen_range(-self.jitter..=self.jitter);
        self.delay.mul_f64(factor.max(0.0))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    debug!("{:?}", cli);

    let config = cli.config().or_exit();
    let mut session = Session::new(config).or_exit();

    let mut workers = Vec::with_capacity(cli.threads);
    for id in 0..cli.threads {
        let progress = SharedProgress::new();
        session.add_source(id, progress.clone()).or_exit();
        let worker = Worker {
            id,
            steps: cli.steps,
            delay: cli.delay,
            jitter: cli.jitter.clamp(0.0, 1.0),
            quiet: cli.quiet,
            progress,
            gate: session.gate(),
        };
        workers.push(thread::spawn(move || worker.run()));
    }
    session.start().or_exit();
    info!("{} workers running", cli.threads);

    let mut failure = None;
    for worker in workers {
        let result = tokio::task::spawn_blocking(move || worker.join()).await?;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                failure.get_or_insert(e);
            }
            Err(_) => anyhow::bail!("a worker thread panicked"),
        }
    }

    session.finish().await.or_exit();
    if let Some(e) = failure {
        eprintln!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}
