//! Sliding-window rate limiting shared by the per-rider request limit and
//! the per-session per-sender message limit.

use serde::{Deserialize, Serialize};
use triad_core::{Timestamp, TriadError};
use triad_state::StateDb;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RateWindow {
    pub window_start: Timestamp,
    pub count: u32,
}

/// Check and record one unit of usage against `subject`'s window. Returns
/// `TriadError::RateLimited` once `max` is reached inside the current window.
pub fn check_and_increment(
    db: &StateDb,
    subject: &[u8],
    now: Timestamp,
    window_secs: u64,
    max: u32,
) -> Result<(), TriadError> {
    let mut window: RateWindow = db.get_rate_limit(subject)?.unwrap_or_default();

    if now - window.window_start >= window_secs as i64 {
        window.window_start = now;
        window.count = 0;
    }

    if window.count >= max {
        return Err(TriadError::RateLimited);
    }

    window.count += 1;
    db.put_rate_limit(subject, &window)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("triad_ridehail_ratelimit_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    #[test]
    fn allows_up_to_max_then_rejects() {
        let db = temp_db("max");
        for _ in 0..3 {
            check_and_increment(&db, b"rider", 1_000, 60, 3).unwrap();
        }
        let err = check_and_increment(&db, b"rider", 1_010, 60, 3).unwrap_err();
        assert!(matches!(err, TriadError::RateLimited));
    }

    #[test]
    fn window_resets_after_elapsed() {
        let db = temp_db("reset");
        for _ in 0..3 {
            check_and_increment(&db, b"rider", 1_000, 60, 3).unwrap();
        }
        check_and_increment(&db, b"rider", 1_061, 60, 3).unwrap();
    }
}
