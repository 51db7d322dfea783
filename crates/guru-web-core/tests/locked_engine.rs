use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::future::join_all;

use guru_web_core::engine::{Analyzer, Engine, GuruCommand, LockedEngine, QueryRequest};
use guru_web_core::error::EngineError;
use guru_web_core::format::{OutputFormat, QueryReport, RawReport};
use guru_web_core::gate::QueryGate;
use guru_web_core::scope::ScopeIndex;

/// Records when each call enters and leaves the analyzer.
struct InstrumentedAnalyzer {
    spans: Arc<Mutex<Vec<(Instant, Instant)>>>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    // Mutated on every call, like a shared type-checking cache would be.
    answered: usize,
}

impl Analyzer for InstrumentedAnalyzer {
    fn query(&mut self, request: &QueryRequest) -> Result<Box<dyn QueryReport>, EngineError> {
        let entered = Instant::now();
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);

        if request.mode == "panic" {
            self.active.fetch_sub(1, Ordering::SeqCst);
            panic!("analyzer blew up");
        }

        std::thread::sleep(Duration::from_millis(15));
        self.answered += 1;
        let answer = format!("{} #{}", request.mode, self.answered);

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.spans.lock().unwrap().push((entered, Instant::now()));
        Ok(Box::new(RawReport::new(answer.into_bytes())))
    }
}

struct Probe {
    spans: Arc<Mutex<Vec<(Instant, Instant)>>>,
    peak: Arc<AtomicUsize>,
}

fn engine() -> (Arc<dyn Engine>, Probe) {
    let spans = Arc::new(Mutex::new(Vec::new()));
    let peak = Arc::new(AtomicUsize::new(0));
    let analyzer = InstrumentedAnalyzer {
        spans: spans.clone(),
        active: Arc::new(AtomicUsize::new(0)),
        peak: peak.clone(),
        answered: 0,
    };
    let engine: Arc<dyn Engine> = Arc::new(LockedEngine::new(
        analyzer,
        GuruCommand::new("guru", "example.com/app"),
    ));
    (engine, Probe { spans, peak })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_queries_never_overlap() {
    let (engine, probe) = engine();
    let scope = Arc::new(ScopeIndex::new(["/src/app/main.go"]));
    let gate = QueryGate::new(scope, engine);

    let tasks = (0..8).map(|i| {
        let gate = gate.clone();
        tokio::spawn(async move {
            let request = QueryRequest::new(
                "callers",
                format!("/src/app/main.go:#{i},#{}", i + 1),
                OutputFormat::Plain,
            );
            gate.run_query(&request, None).await.map(|report| report.plain())
        })
    });
    let results = join_all(tasks).await;

    let mut answers: Vec<String> = results
        .into_iter()
        .map(|joined| {
            let plain = joined.expect("task panicked").expect("query failed");
            String::from_utf8(plain).unwrap()
        })
        .collect();
    answers.sort();
    let mut expected: Vec<String> = (1..=8).map(|n| format!("callers #{n}")).collect();
    expected.sort();
    assert_eq!(answers, expected, "every call saw the previous call's state");

    assert_eq!(probe.peak.load(Ordering::SeqCst), 1);
    let mut spans = probe.spans.lock().unwrap().clone();
    assert_eq!(spans.len(), 8);
    spans.sort_by_key(|(entered, _)| *entered);
    for pair in spans.windows(2) {
        let (_, left_exit) = pair[0];
        let (right_enter, _) = pair[1];
        assert!(left_exit <= right_enter, "engine calls overlapped");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_analyzer_is_an_engine_failure() {
    let (engine, _) = engine();

    let request = QueryRequest::new("panic", "/src/app/main.go:#0", OutputFormat::Plain);
    let err = engine.query(&request).await.err().expect("panic must surface");
    assert!(matches!(err, EngineError::Internal(_)));

    let request = QueryRequest::new("describe", "/src/app/main.go:#0", OutputFormat::Plain);
    let report = engine.query(&request).await.ok().expect("engine stays usable");
    assert_eq!(report.plain(), b"describe #1");
}

#[test]
fn command_line_describes_the_query() {
    let (engine, _) = engine();
    let request = QueryRequest::new("referrers", "/src/app/main.go:#4,#8", OutputFormat::Json);
    assert_eq!(
        engine.command_line(&request),
        "guru -json -scope example.com/app -- referrers /src/app/main.go:#4,#8"
    );
}
