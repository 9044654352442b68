mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::Path;
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, SearchReporter};
use janus::coordinator::FrameCoordinator;
use janus::io::{DirectorySink, FrameSource, ImageSequence, NullSink, load_frame, save_frame};
use janus::playback::{PlaybackStats, Player};
use janus::scoring::disorder_score;
use janus::scramble::transform;
use janus::search::{SearchReport, SearchUpdate};
use janus::{
    CancelToken, Config, Key, KeySearchEngine, Mode, ScrambleDirection, ScrambleError,
    SearchBounds, SearchEvent,
};

const EVENT_POLL: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let stop = CancelToken::new();
    let handler_token = stop.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("Failed to set Ctrl+C handler")?;

    match cli.command {
        Commands::Scramble { input, output, key } => {
            run_transform(&input, &output, key.key()?, ScrambleDirection::Forward)
        }
        Commands::Unscramble { input, output, key } => {
            run_transform(&input, &output, key.key()?, ScrambleDirection::Inverse)
        }
        Commands::Crack {
            input,
            output,
            r_max,
            s_max,
            threads,
            json,
        } => {
            let bounds = SearchBounds::new(
                r_max.unwrap_or(config.search.r_max),
                s_max.unwrap_or(config.search.s_max),
            );
            let threads = threads.unwrap_or(config.threads);
            let config = config.with_bounds(bounds).with_threads(threads);
            run_crack(&input, output.as_deref(), &config, json, &stop)
        }
        Commands::Play {
            input,
            output,
            mode,
            key,
            crack_first,
            cadence_ms,
        } => {
            let cadence_ms = cadence_ms.unwrap_or(config.cadence_ms);
            let config = config.with_cadence_ms(cadence_ms);
            config.validate()?;
            run_play(
                &input,
                &output,
                mode.into(),
                key.key()?,
                crack_first,
                &config,
                &stop,
            )
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_transform(
    input: &Path,
    output: &Path,
    key: Key,
    direction: ScrambleDirection,
) -> Result<()> {
    let frame =
        load_frame(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let result = transform(&frame, key, direction);
    save_frame(output, &result)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{:?} {} -> {} with key {}",
        direction,
        input.display(),
        output.display(),
        key
    );
    println!(
        "Disorder score: {:.1} -> {:.1}",
        disorder_score(&frame),
        disorder_score(&result)
    );
    Ok(())
}

fn run_crack(
    input: &Path,
    output: Option<&Path>,
    config: &Config,
    json: bool,
    stop: &CancelToken,
) -> Result<()> {
    let frame =
        load_frame(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let engine = KeySearchEngine::from_config(config)?;
    let reporter = SearchReporter::new(config.search.candidate_count() as u64)?;

    let start = Instant::now();
    let handle = engine.spawn(Some(frame), stop.clone())?;

    let mut best: Option<SearchUpdate> = None;
    let mut evaluated = 0usize;
    for event in handle.events().iter() {
        reporter.observe(&event);
        match event {
            SearchEvent::Improved(update) => best = Some(update),
            SearchEvent::Progress(progress) => evaluated = progress.evaluated,
            SearchEvent::Finished(_) => {}
        }
    }

    let (report, preview) = match handle.join() {
        Ok(result) => {
            reporter.finish(format!("Recovered key {}", result.key));
            (SearchReport::completed(&result), result.frame)
        }
        Err(ScrambleError::Cancelled) => {
            let Some(best) = best else {
                reporter.abandon("Search cancelled".to_string());
                bail!("Search cancelled before any key was scored");
            };
            reporter.abandon(format!("Search cancelled, best so far {}", best.key));
            (
                SearchReport::partial(&best, evaluated, start.elapsed()),
                best.preview,
            )
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(output) = output {
        save_frame(output, &preview)
            .with_context(|| format!("Failed to write {}", output.display()))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("Key:        {}", report.key);
        println!("Score:      {:.2}", report.score);
        println!("Candidates: {}", report.evaluated);
        println!("Elapsed:    {} ms", report.elapsed_ms);
        if report.cancelled {
            println!("[!] Search was cancelled, key may be wrong");
        }
    }
    Ok(())
}

fn run_play(
    input: &Path,
    output: &Path,
    mode: Mode,
    key: Key,
    crack_first: bool,
    config: &Config,
    stop: &CancelToken,
) -> Result<()> {
    let mut source = ImageSequence::open(input)
        .with_context(|| format!("Failed to open frames in {}", input.display()))?;
    if source.is_empty() {
        bail!("No png/jpg frames found in {}", input.display());
    }
    let mut sink = DirectorySink::create(output)?;
    let coordinator = FrameCoordinator::with_settings(mode, key);
    let player = Player::from_config(config);
    let engine = if crack_first {
        Some(KeySearchEngine::from_config(config)?)
    } else {
        None
    };

    let mut stats = thread::scope(|scope| {
        let playback = scope.spawn(|| {
            player.run(&mut source, &coordinator, &mut NullSink, &mut sink, stop)
        });

        if let Some(engine) = &engine
            && let Err(e) =
                crack_while_playing(&coordinator, engine, &playback, player.cadence(), stop)
        {
            warn!(error = %e, "Key search failed");
        }

        playback
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
    })?;

    if coordinator.take_restart() && !stop.is_cancelled() {
        source.rewind()?;
        let replay = player.run(&mut source, &coordinator, &mut NullSink, &mut sink, stop)?;
        stats = PlaybackStats {
            frames: stats.frames + replay.frames,
            restarts: stats.restarts + 1 + replay.restarts,
            cancelled: replay.cancelled,
        };
    }

    let (mode, key) = coordinator.settings();
    println!();
    println!("Frames written: {}", stats.frames);
    println!("Restarts:       {}", stats.restarts);
    println!("Final mode:     {} with key {}", mode, key);
    println!("Output folder:  {}", output.display());
    Ok(())
}

fn crack_while_playing(
    coordinator: &FrameCoordinator,
    engine: &KeySearchEngine,
    playback: &ScopedJoinHandle<'_, janus::Result<PlaybackStats>>,
    poll: Duration,
    stop: &CancelToken,
) -> Result<()> {
    while !coordinator.has_snapshot() {
        if playback.is_finished() || stop.is_cancelled() {
            return Ok(());
        }
        thread::sleep(poll);
    }

    let handle = coordinator.begin_search(engine)?;
    let reporter = SearchReporter::new(engine.bounds().candidate_count() as u64)?;

    handle.forward_events(stop, EVENT_POLL, |event| reporter.observe(&event));

    match coordinator.complete_search(handle)? {
        Some(result) => reporter.finish(format!(
            "Recovered key {}, restarting playback",
            result.key
        )),
        None => reporter.abandon("Search cancelled".to_string()),
    }
    Ok(())
}
