use chrono::Local;
use cyclefeed::config::Config;
use cyclefeed::report::{EmissionRecord, RunSummary};
use cyclefeed::utils::progress::create_progress_spinner;
use cyclefeed::utils::scan::ScanOptions;
use cyclefeed::{
    ConsumeError, Consumer, Emission, Feed, RoundRecord, RunReport, Scheduler,
    SetupError, SourceSpec,
};
use owo_colors::OwoColorize;
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

/// Source selection and enumeration flags shared by `run` and `plan`.
#[derive(Debug, Default, Clone)]
pub struct SourceOptions {
    /// (path, cycle) pairs from the command line, in order.
    pub sources: Vec<(String, String)>,
    pub recursive: bool,
    pub audio_only: bool,
    pub skip_hidden: bool,
}

#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    pub sources: SourceOptions,
    pub play: bool,
    pub json: bool,
    pub keep_going: bool,
}

/// Everything needed to build the feeds, after merging flags into the config.
struct Setup {
    specs: Vec<SourceSpec>,
    scan: ScanOptions,
}

fn resolve(options: &SourceOptions, config: &mut Config) -> Result<Setup, SetupError> {
    config.recursive |= options.recursive;
    config.audio_only |= options.audio_only;
    config.skip_hidden |= options.skip_hidden;

    let pairs: Vec<(String, String)> = if options.sources.is_empty() {
        config
            .sources
            .iter()
            .map(|s| (s.path.clone(), s.cycle.clone()))
            .collect()
    } else {
        options.sources.clone()
    };

    let pairs = pairs
        .into_iter()
        .map(|(path, cycle)| (PathBuf::from(shellexpand::tilde(&path).into_owned()), cycle));

    // Every cycle is validated before any directory is touched
    let specs = SourceSpec::parse_all(pairs)?;

    Ok(Setup {
        specs,
        scan: config.scan_options(),
    })
}

fn load_feeds(setup: Setup) -> Result<Vec<Feed<PathBuf>>, SetupError> {
    let spinner = create_progress_spinner();
    spinner.set_message(format!("Scanning {} sources...", setup.specs.len()));

    let mut feeds = Vec::with_capacity(setup.specs.len());
    for spec in setup.specs {
        spinner.set_message(format!("Scanning {}", spec.path.display()));
        match spec.into_feed(&setup.scan) {
            Ok(feed) => feeds.push(feed),
            Err(e) => {
                spinner.finish_and_clear();
                return Err(e);
            }
        }
    }

    spinner.finish_and_clear();
    Ok(feeds)
}

/// Writes each emission to `out` and optionally plays it.
struct CliConsumer<W> {
    out: W,
    json: bool,
    #[cfg(feature = "player")]
    player: Option<cyclefeed::player::AudioPlayer>,
}

impl<W: Write> Consumer<PathBuf> for CliConsumer<W> {
    fn announce(&mut self, emission: &Emission<'_, PathBuf>) -> Result<(), ConsumeError> {
        if self.json {
            let record = EmissionRecord {
                round: emission.round,
                feed: emission.feed,
                source: emission.label.to_string(),
                path: emission.token.display().to_string(),
                emitted_at: Local::now().to_rfc3339(),
            };
            let line = serde_json::to_string(&record)?;
            writeln!(self.out, "{line}")?;
        } else {
            writeln!(self.out, "{}", emission.token.display())?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn consume(&mut self, emission: &Emission<'_, PathBuf>) -> Result<(), ConsumeError> {
        #[cfg(feature = "player")]
        {
            if let Some(player) = &self.player {
                return player.play_blocking(emission.token);
            }
        }

        let _ = emission;
        Ok(())
    }
}

fn build_consumer<W: Write>(
    options: &RunOptions,
    config: &Config,
    out: W,
) -> Result<CliConsumer<W>, Box<dyn Error>> {
    #[cfg(feature = "player")]
    {
        let player = if options.play {
            Some(cyclefeed::player::AudioPlayer::new(config.volume)?)
        } else {
            None
        };
        Ok(CliConsumer {
            out,
            json: options.json,
            player,
        })
    }

    #[cfg(not(feature = "player"))]
    {
        let _ = config;
        if options.play {
            return Err(format!(
                "Playback requires the 'player' feature. Rebuild with {}",
                "cargo build --release --features player".cyan()
            )
            .into());
        }
        Ok(CliConsumer {
            out,
            json: options.json,
        })
    }
}

/// True when the reader on the other end of stdout went away.
fn is_broken_pipe(err: &(dyn Error + Send + Sync + 'static)) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe)
}

pub fn handle_run(options: &RunOptions) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    config.keep_going |= options.keep_going;

    let setup = resolve(&options.sources, &mut config)?;
    let policy = config.failure_policy();
    let feeds = load_feeds(setup)?;
    let consumer = build_consumer(options, &config, io::stdout().lock())?;

    let mut scheduler = Scheduler::new(feeds).with_policy(policy);
    let started_at = Local::now().to_rfc3339();
    let result = scheduler.run(consumer);
    let mut out = io::stdout().lock();

    match result {
        Ok(report) => {
            print_summary(&mut out, options.json, &started_at, &report, None)?;
            Ok(())
        }
        Err(err) if is_broken_pipe(&*err.source) => {
            log::debug!(
                "Output closed in round {} after {} entries, stopping",
                err.round,
                err.report.total_consumed()
            );
            Ok(())
        }
        Err(err) => {
            let message = err.to_string();
            let summary = print_summary(
                &mut out,
                options.json,
                &started_at,
                &err.report,
                Some(&message),
            );
            if let Err(e) = summary {
                log::debug!("Could not write run summary: {e}");
            }
            Err(err.into())
        }
    }
}

fn print_summary(
    out: &mut impl Write,
    json: bool,
    started_at: &str,
    report: &RunReport,
    error: Option<&str>,
) -> io::Result<()> {
    if json {
        let summary = RunSummary {
            status: if error.is_some() { "aborted" } else { "complete" },
            started_at: started_at.to_string(),
            finished_at: Local::now().to_rfc3339(),
            error: error.map(str::to_string),
            report,
        };
        match serde_json::to_string(&summary) {
            Ok(line) => writeln!(out, "{line}")?,
            Err(e) => log::error!("Failed to serialize summary: {e}"),
        }
        return Ok(());
    }

    eprintln!();
    if error.is_some() {
        eprintln!("{} Run aborted", "✗".red());
    } else {
        eprintln!("{} Run complete", "✓".green());
    }
    eprintln!(
        "  {} rounds, {} emitted, {} consumed",
        report.productive_rounds(),
        report.total_emitted(),
        report.total_consumed()
    );
    if report.total_failed() > 0 {
        eprintln!("  {} failed", report.total_failed().to_string().yellow());
    }
    for feed in &report.feeds {
        eprintln!(
            "  {} {}/{} emitted{}",
            feed.label.cyan(),
            feed.emitted,
            feed.initial,
            if feed.remaining > 0 {
                format!(", {} left", feed.remaining)
            } else {
                String::new()
            }
        );
    }
    Ok(())
}

pub fn handle_plan(options: &SourceOptions, json: bool) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    let setup = resolve(options, &mut config)?;
    let feeds = load_feeds(setup)?;
    let scheduler = Scheduler::new(feeds);
    let plan = scheduler.plan();

    let mut out = io::stdout().lock();
    if json {
        let labels: Vec<&str> = scheduler.feeds().iter().map(|f| f.label()).collect();
        let value = serde_json::json!({
            "feeds": labels,
            "rounds": plan,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        write!(out, "{}", format_plan(scheduler.feeds(), &plan))?;
    }

    Ok(())
}

fn format_plan(feeds: &[Feed<PathBuf>], plan: &[RoundRecord]) -> String {
    let mut out = String::new();

    for (index, feed) in feeds.iter().enumerate() {
        let drawn: usize = plan.iter().map(|r| r.draws[index]).sum();
        let left = feed.remaining() - drawn;
        let note = if left == 0 {
            String::new()
        } else if feed.cycle().is_all_zero() {
            ", cycle never draws".to_string()
        } else {
            format!(", {left} never drawn")
        };
        out.push_str(&format!(
            "[{index}] {} (cycle {}, {} entries{note})\n",
            feed.label(),
            feed.cycle(),
            feed.remaining(),
        ));
    }

    for record in plan {
        let draws: Vec<String> = record
            .draws
            .iter()
            .enumerate()
            .map(|(i, d)| format!("[{i}]={d}"))
            .collect();
        out.push_str(&format!("round {}: {}\n", record.round, draws.join(" ")));
    }

    out.push_str(&format!(
        "{} rounds, {} entries\n",
        plan.len(),
        plan.iter().map(RoundRecord::total).sum::<usize>()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyclefeed::Cycle;
    use cyclefeed::config::SourceEntry;
    use tempfile::TempDir;

    fn pair(path: &str, cycle: &str) -> (String, String) {
        (path.to_string(), cycle.to_string())
    }

    #[test]
    fn test_resolve_prefers_command_line_sources() {
        let mut config = Config::new();
        config.sources.push(SourceEntry {
            path: "/from/config".to_string(),
            cycle: "1".to_string(),
        });
        let options = SourceOptions {
            sources: vec![pair("/a", "2-1"), pair("/b", "3")],
            ..Default::default()
        };

        let setup = resolve(&options, &mut config).unwrap();
        assert_eq!(setup.specs.len(), 2);
        assert_eq!(setup.specs[0].path, PathBuf::from("/a"));
        assert_eq!(setup.specs[1].cycle.values(), &[3]);
    }

    #[test]
    fn test_resolve_falls_back_to_config_sources() {
        let mut config = Config::new();
        config.sources.push(SourceEntry {
            path: "/from/config".to_string(),
            cycle: "4".to_string(),
        });

        let setup = resolve(&SourceOptions::default(), &mut config).unwrap();
        assert_eq!(setup.specs.len(), 1);
        assert_eq!(setup.specs[0].path, PathBuf::from("/from/config"));
    }

    #[test]
    fn test_resolve_flags_override_config() {
        let mut config = Config::new();
        let options = SourceOptions {
            audio_only: true,
            recursive: true,
            ..Default::default()
        };
        let setup = resolve(&options, &mut config).unwrap();
        assert!(setup.scan.recursive);
        assert!(setup.scan.extensions.is_some());
        assert!(!setup.scan.skip_hidden);
    }

    #[test]
    fn test_resolve_rejects_malformed_cycle() {
        let mut config = Config::new();
        let options = SourceOptions {
            sources: vec![pair("/a", "1"), pair("/b", "a-b")],
            ..Default::default()
        };
        let err = resolve(&options, &mut config).err().unwrap();
        assert!(err.to_string().contains("format must be 'A-B-C-...-Z'"));
        assert_eq!(err.path(), &PathBuf::from("/b"));
    }

    #[test]
    fn test_load_feeds_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let setup = Setup {
            specs: vec![
                SourceSpec::parse(temp_dir.path(), "1").unwrap(),
                SourceSpec::parse(temp_dir.path().join("missing"), "1").unwrap(),
            ],
            scan: ScanOptions::default(),
        };
        assert!(matches!(
            load_feeds(setup),
            Err(SetupError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_format_plan() {
        let feeds = vec![
            Feed::new(
                "one",
                vec![PathBuf::from("x"), PathBuf::from("y"), PathBuf::from("z")],
                Cycle::constant(2),
            ),
            Feed::new("zero", vec![PathBuf::from("w")], Cycle::constant(0)),
            Feed::new(
                "late",
                vec![PathBuf::from("u"), PathBuf::from("v")],
                "0-1".parse::<Cycle>().unwrap(),
            ),
        ];
        let scheduler = Scheduler::new(feeds);
        let text = format_plan(scheduler.feeds(), &scheduler.plan());

        assert!(text.contains("[0] one (cycle 2, 3 entries)"));
        assert!(text.contains("[1] zero (cycle 0, 1 entries, cycle never draws)"));
        assert!(text.contains("[2] late (cycle 0-1, 2 entries, 1 never drawn)"));
        assert!(text.contains("round 1: [0]=2 [1]=0 [2]=0"));
        assert!(text.contains("round 2: [0]=1 [1]=0 [2]=1"));
        assert!(text.ends_with("2 rounds, 4 entries\n"));
    }

    #[test]
    fn test_consumer_writes_json_lines() {
        let mut consumer = CliConsumer {
            out: Vec::new(),
            json: true,
            #[cfg(feature = "player")]
            player: None,
        };
        let token = PathBuf::from("/music/a.wav");
        let emission = Emission {
            round: 1,
            feed: 0,
            label: "/music",
            token: &token,
            quota: 1,
            slot: 0,
        };
        consumer.announce(&emission).unwrap();
        assert!(consumer.consume(&emission).is_ok());

        let text = String::from_utf8(consumer.out).unwrap();
        let record: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(record["path"], "/music/a.wav");
        assert_eq!(record["round"], 1);
    }

    /// A stdout whose reader has gone away, as after `| head`.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_closed_output_ends_run_without_panic() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["a.wav", "b.wav", "c.wav"] {
            std::fs::write(temp_dir.path().join(name), b"fake").unwrap();
        }
        let feeds = vec![
            SourceSpec::parse(temp_dir.path(), "1")
                .unwrap()
                .into_feed(&ScanOptions::default())
                .unwrap(),
        ];
        let consumer = CliConsumer {
            out: ClosedPipe,
            json: false,
            #[cfg(feature = "player")]
            player: None,
        };

        let err = Scheduler::new(feeds).run(consumer).unwrap_err();
        assert!(is_broken_pipe(&*err.source));
        assert_eq!(err.round, 1);
        assert_eq!(err.report.total_consumed(), 0);
        assert_eq!(err.report.total_remaining(), 2);
    }

    #[test]
    fn test_closed_output_aborts_even_with_keep_going() {
        let feeds = vec![Feed::new(
            "one",
            vec![PathBuf::from("x"), PathBuf::from("y")],
            Cycle::constant(1),
        )];
        let consumer = CliConsumer {
            out: ClosedPipe,
            json: true,
            #[cfg(feature = "player")]
            player: None,
        };

        let err = Scheduler::new(feeds)
            .with_policy(cyclefeed::FailurePolicy::Skip)
            .run(consumer)
            .unwrap_err();
        assert!(is_broken_pipe(&*err.source));
        assert_eq!(err.report.total_emitted(), 1);
    }

    #[test]
    fn test_is_broken_pipe() {
        let pipe: ConsumeError = Box::new(io::Error::from(io::ErrorKind::BrokenPipe));
        let other: ConsumeError = "cannot decode".into();
        assert!(is_broken_pipe(&*pipe));
        assert!(!is_broken_pipe(&*other));
    }
}
