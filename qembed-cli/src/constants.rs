//! Shared constants for the qembed CLI.

use std::time::Duration;

/// Remote service used when neither flag, env nor config names one.
pub const DEFAULT_OLLAMA_URL: &str = "https://ollama-staging-a9b1.up.railway.app";

/// Model pulled and queried by default.
pub const DEFAULT_MODEL: &str = "qwen3-embedding:0.6b";

/// Timeout for `GET /api/tags` probes and listings.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the request that wakes a sleeping service.
pub const WAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for the whole model pull stream.
pub const PULL_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for a single embedding request.
pub const EMBED_TIMEOUT: Duration = Duration::from_secs(30);

/// Probes after the wake request before giving up.
pub const WAKE_ATTEMPTS: u32 = 12;

/// Delay before each wake probe.
pub const WAKE_INTERVAL: Duration = Duration::from_secs(5);

/// Characters of each sentence shown in progress lines and the legend.
pub const PREVIEW_CHARS: usize = 50;

/// Sentences embedded by the smoke run. The first pair is a paraphrase.
pub const TEST_SENTENCES: &[&str] = &[
    "The quick brown fox jumps over the lazy dog",
    "A fast auburn canine leaps above a sleepy hound",
    "Machine learning is transforming technology",
    "Python is a programming language",
    "Dogs are loyal companions",
];
