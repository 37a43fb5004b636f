//! Built-in automations.

use std::io::{Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use crate::dispatch::request::AutomationExitCode;
use crate::engine::registry::AutomationCommand;
use crate::engine::{EngineError, OperationContext};

const SLEEP_POLL: Duration = Duration::from_millis(50);

/// Does nothing, successfully. Used to warm up and ping the helper.
pub struct Noop;

impl AutomationCommand for Noop {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn execute(&self, _ctx: &mut OperationContext, _args: &[String]) -> Result<i32, EngineError> {
        Ok(AutomationExitCode::Success.code())
    }
}

/// Prints its arguments separated by spaces.
pub struct Echo;

impl AutomationCommand for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn execute(&self, ctx: &mut OperationContext, args: &[String]) -> Result<i32, EngineError> {
        writeln!(ctx.stdout, "{}", args.join(" "))?;
        Ok(AutomationExitCode::Success.code())
    }
}

/// Copies stdin to stdout.
pub struct CatStdin;

impl AutomationCommand for CatStdin {
    fn name(&self) -> &'static str {
        "cat-stdin"
    }

    fn execute(&self, ctx: &mut OperationContext, _args: &[String]) -> Result<i32, EngineError> {
        let mut input = Vec::new();
        ctx.stdin.read_to_end(&mut input)?;
        ctx.stdout.write_all(&input)?;
        Ok(AutomationExitCode::Success.code())
    }
}

/// `sleep <seconds>`: waits, giving up early once cancelled.
pub struct Sleep;

impl AutomationCommand for Sleep {
    fn name(&self) -> &'static str {
        "sleep"
    }

    fn execute(&self, ctx: &mut OperationContext, args: &[String]) -> Result<i32, EngineError> {
        let deadline = args
            .first()
            .and_then(|a| a.parse::<f64>().ok())
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
            .and_then(|d| Instant::now().checked_add(d));
        let Some(deadline) = deadline else {
            writeln!(ctx.stderr, "usage: sleep <seconds>")?;
            return Ok(AutomationExitCode::KnownError.code());
        };

        while Instant::now() < deadline {
            if ctx.is_cancelled() {
                return Err(EngineError::Failed("sleep cancelled".into()));
            }
            thread::sleep(SLEEP_POLL.min(deadline.saturating_duration_since(Instant::now())));
        }
        Ok(AutomationExitCode::Success.code())
    }
}

/// Describes the snapshot the automation runs against.
pub struct ConfigSummary;

impl AutomationCommand for ConfigSummary {
    fn name(&self) -> &'static str {
        "config-summary"
    }

    fn execute(&self, ctx: &mut OperationContext, _args: &[String]) -> Result<i32, EngineError> {
        let snapshot = &ctx.snapshot;
        let config = snapshot.config();
        writeln!(
            ctx.stdout,
            "generation {} built at {:.3}: {} sources, {} bytes",
            snapshot.generation(),
            snapshot.built_at().unix_seconds(),
            config.len(),
            config.total_bytes()
        )?;
        for source in config.sources() {
            writeln!(ctx.stdout, "{}\t{}", source.path.display(), source.contents.len())?;
        }
        Ok(AutomationExitCode::Success.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Stamp;
    use crate::dispatch::capture::{CaptureBuffer, OperationIo};
    use crate::reload::{ConfigSnapshot, ConfigSource, MonitoringConfig};
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn context(stdin: &str, config: MonitoringConfig) -> (OperationContext, CaptureBuffer) {
        let output = CaptureBuffer::new();
        let io = OperationIo {
            stdin: Cursor::new(stdin.as_bytes().to_vec()),
            stdout: output.clone(),
            stderr: output.clone(),
        };
        let snapshot = Arc::new(ConfigSnapshot::new(config, Stamp::ZERO, 7));
        (OperationContext::new(snapshot, io), output)
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn echo_joins_arguments() {
        let (mut ctx, output) = context("", MonitoringConfig::default());
        assert_eq!(Echo.execute(&mut ctx, &args(&["a", "b c"])).unwrap(), 0);
        assert_eq!(output.seal(), "a b c\n");
    }

    #[test]
    fn cat_stdin_copies_payload() {
        let (mut ctx, output) = context("host1\nhost2\n", MonitoringConfig::default());
        assert_eq!(CatStdin.execute(&mut ctx, &[]).unwrap(), 0);
        assert_eq!(output.seal(), "host1\nhost2\n");
    }

    #[test]
    fn sleep_rejects_bad_arguments() {
        let (mut ctx, output) = context("", MonitoringConfig::default());
        assert_eq!(Sleep.execute(&mut ctx, &args(&["soon"])).unwrap(), 1);
        assert_eq!(output.seal(), "usage: sleep <seconds>\n");
    }

    #[test]
    fn sleep_stops_when_cancelled() {
        let (mut ctx, _output) = context("", MonitoringConfig::default());
        drop(ctx.cancellation());

        let started = Instant::now();
        let err = Sleep.execute(&mut ctx, &args(&["30"])).unwrap_err();
        assert!(matches!(err, EngineError::Failed(_)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn config_summary_lists_sources() {
        let config = MonitoringConfig::new(vec![ConfigSource {
            path: PathBuf::from("/site/etc/check_mk/main.mk"),
            contents: b"all_hosts = []".to_vec(),
            modified: None,
        }]);
        let (mut ctx, output) = context("", config);
        assert_eq!(ConfigSummary.execute(&mut ctx, &[]).unwrap(), 0);

        let text = output.seal();
        assert!(text.starts_with("generation 7 built at "));
        assert!(text.contains("1 sources, 14 bytes"));
        assert!(text.contains("/site/etc/check_mk/main.mk\t14"));
    }
}
