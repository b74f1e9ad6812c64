//! Shared constants for end-to-end tests

// ============================================================================
// Feature table fixture
// ============================================================================

pub const TRACK_YELLOW: &str = "Yellow";
pub const TRACK_CLOCKS: &str = "Clocks";
pub const TRACK_FIX_YOU: &str = "Fix You";
pub const TRACK_SPEED_OF_SOUND: &str = "Speed of Sound";
pub const TRACK_BOHEMIAN: &str = "Bohemian Rhapsody";
pub const TRACK_UNDER_PRESSURE: &str = "Under Pressure";

/// Rows in the fixture table.
pub const FIXTURE_TRACK_COUNT: usize = 6;

/// Recommendations returned per query by the test server.
pub const TEST_RECOMMEND_COUNT: usize = 3;

// ============================================================================
// Fake upstreams
// ============================================================================

pub const SPOTIFY_CLIENT_ID: &str = "test-client-id";
pub const SPOTIFY_CLIENT_SECRET: &str = "test-client-secret";

/// Canned reply of the scripted dialogue generator.
pub const DIALOGUE_REPLY: &str = "I like talking about music too.";

/// Message that makes the scripted generator fail like an overloaded model.
pub const DIALOGUE_FAILURE_TRIGGER: &str = "overload";

/// Message the scripted generator answers only after `DIALOGUE_SLOW_DELAY_MS`.
pub const DIALOGUE_SLOW_TRIGGER: &str = "take your time";
pub const DIALOGUE_SLOW_DELAY_MS: u64 = 300;

pub const TELEGRAM_TOKEN: &str = "123456-test-token";

// ============================================================================
// Timeouts
// ============================================================================

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
