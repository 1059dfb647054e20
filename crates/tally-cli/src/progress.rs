use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use tally_proto::CountSnapshot;

const TOP_ROUTES: usize = 5;

/// Remaining time at the current rate, when the total is known and some
/// progress has been made.
pub fn eta(done: u64, total: Option<u64>, elapsed: Duration) -> Option<Duration> {
    let total = total?;
    if done == 0 || done >= total {
        return None;
    }
    let per_frame = elapsed.as_secs_f64() / done as f64;
    Some(Duration::from_secs_f64(per_frame * (total - done) as f64))
}

/// Spawns the reporter. It logs every snapshot it receives and exits when the
/// sender is dropped.
pub fn spawn_reporter(total_frames: Option<u64>) -> (mpsc::Sender<CountSnapshot>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<CountSnapshot>(8);
    let handle = tokio::spawn(async move {
        let started = Instant::now();
        while let Some(snap) = rx.recv().await {
            report(&snap, total_frames, started.elapsed());
        }
    });
    (tx, handle)
}

fn report(snap: &CountSnapshot, total: Option<u64>, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    let fps = if secs > 0.0 { snap.frame as f64 / secs } else { 0.0 };

    match total {
        Some(t) if t > 0 => {
            let pct = 100.0 * snap.frame as f64 / t as f64;
            let eta_s = eta(snap.frame, total, elapsed).map(|d| d.as_secs()).unwrap_or(0);
            info!(
                "frame {}/{} ({:.1}%) {:.1} fps eta {}s tracks={} counted={}",
                snap.frame,
                t,
                pct,
                fps,
                eta_s,
                snap.active_tracks,
                snap.total_routes()
            );
        }
        _ => info!(
            "frame {} {:.1} fps tracks={} counted={}",
            snap.frame,
            fps,
            snap.active_tracks,
            snap.total_routes()
        ),
    }

    for (route, n) in snap.top_routes(TOP_ROUTES) {
        info!("  {}: {}", route, n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eta_scales_with_remaining_frames() {
        let e = eta(100, Some(400), Duration::from_secs(10)).unwrap();
        assert_eq!(e.as_secs(), 30);
    }

    #[test]
    fn eta_unknown_without_total_or_progress() {
        assert_eq!(eta(100, None, Duration::from_secs(10)), None);
        assert_eq!(eta(0, Some(400), Duration::from_secs(10)), None);
        assert_eq!(eta(400, Some(400), Duration::from_secs(10)), None);
    }

    #[tokio::test]
    async fn reporter_drains_and_exits() {
        let (tx, handle) = spawn_reporter(Some(10));
        for frame in 1..=3 {
            tx.send(CountSnapshot { frame, ..Default::default() }).await.unwrap();
        }
        drop(tx);
        handle.await.unwrap();
    }
}
