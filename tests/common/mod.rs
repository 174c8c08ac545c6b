use gittldr_qa::orchestrator::EventSink;
use gittldr_qa::{Config, Question};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Event sink that records every notification for assertions
#[derive(Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<Question>>,
    count_increments: AtomicU32,
    stats_refreshes: AtomicU32,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<Question> {
        self.updates.lock().unwrap().clone()
    }

    pub fn count_increments(&self) -> u32 {
        self.count_increments.load(Ordering::SeqCst)
    }

    pub fn stats_refreshes(&self) -> u32 {
        self.stats_refreshes.load(Ordering::SeqCst)
    }
}

impl EventSink for RecordingSink {
    fn question_updated(&self, question: &Question) {
        self.updates.lock().unwrap().push(question.clone());
    }

    fn question_count_incremented(&self) {
        self.count_increments.fetch_add(1, Ordering::SeqCst);
    }

    fn stats_refresh_requested(&self) {
        self.stats_refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Installs a test subscriber once so `RUST_LOG` surfaces orchestrator
/// traces during debugging
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Configuration pointed at a mock server, with millisecond-scale
/// polling delays so integration tests stay fast on real time
pub fn test_config(api_base: &str) -> Config {
    let mut config = Config::default();
    config.backend.api_base = api_base.to_string();
    config.polling.base_delay_ms = 25;
    // Suppress the stats-refresh side channel unless a test opts in.
    config.stats_refresh.probability = 0.0;
    config.stats_refresh.seed = Some(1);
    config
}
