//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use automation_helper::clock::Stamp;
use automation_helper::dispatch::{Console, Dispatcher};
use automation_helper::engine::{AutomationEngine, EngineError, OperationContext};
use automation_helper::health::HealthReporter;
use automation_helper::observability::logging::LogLevelHandle;
use automation_helper::http::{AppState, HttpServer};
use automation_helper::lifecycle::Shutdown;
use automation_helper::reload::{BuildError, ConfigBuilder, MonitoringConfig, ReloadCoordinator};
use automation_helper::staleness::FreshnessState;
use automation_helper::config::ListenerConfig;
use tokio::net::TcpListener;

/// Engine with a handful of scripted operations:
///
/// - `noop`: exit 0, no output
/// - `foo` / `bar`: write their own name several times, pausing in between
/// - `sleep <secs>`: sleep, polling the cancellation flag
/// - `panic`: panic on the worker
/// - `exit`: request a process exit
/// - `fail`: engine error
/// - `code <n>`: return `n`
/// - `cat`: copy stdin to stdout
#[derive(Default)]
pub struct FakeEngine;

impl AutomationEngine for FakeEngine {
    fn execute(
        &self,
        ctx: &mut OperationContext,
        name: &str,
        args: &[String],
    ) -> Result<i32, EngineError> {
        match name {
            "noop" => Ok(0),
            "foo" | "bar" => {
                for _ in 0..5 {
                    write!(ctx.stdout, "{name}")?;
                    write!(ctx.stderr, "{name}")?;
                    thread::sleep(Duration::from_millis(10));
                }
                Ok(0)
            }
            "sleep" => {
                let secs: u64 = args.first().and_then(|a| a.parse().ok()).unwrap_or(1);
                let deadline = Instant::now() + Duration::from_secs(secs);
                while Instant::now() < deadline {
                    if ctx.is_cancelled() {
                        return Err(EngineError::Failed("cancelled".into()));
                    }
                    thread::sleep(Duration::from_millis(20));
                }
                Ok(0)
            }
            "panic" => panic!("operation blew up"),
            "exit" => Err(EngineError::SystemExit("exit(1) called".into())),
            "fail" => Err(EngineError::Failed("something broke".into())),
            "code" => Ok(args.first().and_then(|a| a.parse().ok()).unwrap_or(0)),
            "cat" => {
                let mut input = String::new();
                ctx.stdin.read_to_string(&mut input)?;
                write!(ctx.stdout, "{input}")?;
                Ok(0)
            }
            other => Err(EngineError::UnknownAutomation(other.to_string())),
        }
    }
}

/// Builder that counts builds, records peak concurrency and can be told to fail.
#[derive(Default)]
pub struct CountingBuilder {
    pub builds: AtomicUsize,
    pub cache_clears: AtomicUsize,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub fail: AtomicBool,
    delay: Duration,
}

impl CountingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl ConfigBuilder for CountingBuilder {
    fn clear_caches(&self) {
        self.cache_clears.fetch_add(1, Ordering::SeqCst);
    }

    fn build_all(&self) -> Result<MonitoringConfig, BuildError> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        thread::sleep(self.delay);
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(BuildError::Invalid("syntax error in main.mk".into()));
        }
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(MonitoringConfig::default())
    }
}

/// A dispatcher driven by a hand-controlled freshness state.
pub struct Harness {
    pub dispatcher: Arc<Dispatcher>,
    pub coordinator: ReloadCoordinator,
    pub freshness: Arc<FreshnessState>,
    pub builder: Arc<CountingBuilder>,
    pub health: HealthReporter,
}

impl Harness {
    pub async fn start(builder: CountingBuilder) -> Self {
        Self::start_with_console(builder, Console::default()).await
    }

    /// Harness whose console overrides the level behind `log_level`.
    pub async fn with_log_level(builder: CountingBuilder, log_level: LogLevelHandle) -> Self {
        Self::start_with_console(builder, Console::new(Some(log_level))).await
    }

    async fn start_with_console(builder: CountingBuilder, console: Console) -> Self {
        let builder = Arc::new(builder);
        let freshness = Arc::new(FreshnessState::new());
        let coordinator = ReloadCoordinator::start(builder.clone()).await.unwrap();
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(FakeEngine),
            coordinator.clone(),
            freshness.clone(),
            console,
        ));
        let health = HealthReporter::new(coordinator.clone());

        Self {
            dispatcher,
            coordinator,
            freshness,
            builder,
            health,
        }
    }

    /// Record a configuration change strictly after the current snapshot.
    pub async fn touch(&self) {
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.freshness.mark_changed(Stamp::now());
    }

    pub fn app_state(&self, max_timeout: Duration) -> AppState {
        AppState {
            dispatcher: self.dispatcher.clone(),
            health: self.health.clone(),
            max_timeout,
        }
    }
}

/// Serve `state` on an ephemeral loopback port.
pub async fn start_server(state: AppState) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(state, &ListenerConfig::default());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Poll `condition` until it holds or `limit` passes.
pub async fn eventually(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    condition()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
