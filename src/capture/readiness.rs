use crate::capture::DocumentProbe;
use crate::config::ReadinessConfig;
use tokio::time::{Instant, sleep, timeout};

/// How the loading wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// No loading indicator was left; the grace period has elapsed
    Settled,
    /// Indicators were still present when the maximum wait ran out
    TimedOut,
}

/// Polls the document until no loading indicator is left.
///
/// Returns within `max_wait + grace_period + poll_interval`. Running out of
/// time is not an error: the caller captures whatever is on screen.
pub async fn wait_until_loaded<P: DocumentProbe>(probe: &P, config: &ReadinessConfig) -> Readiness {
    let Some(selector) = config.loading_selector_group() else {
        ::log::debug!("No loading indicator selectors configured, settling");
        sleep(config.grace_period()).await;
        return Readiness::Settled;
    };
    let started = Instant::now();
    let mut polls = 0usize;

    while started.elapsed() < config.max_wait() {
        polls += 1;
        // A stalled query must not outlive the overall wait
        let remaining = config.max_wait().saturating_sub(started.elapsed());
        let pending = match timeout(remaining, probe.count(&selector)).await {
            Ok(Ok(count)) => count,
            Ok(Err(e)) => {
                ::log::warn!("Loading indicator check failed: {}", e);
                usize::MAX
            }
            Err(_) => {
                ::log::warn!("Loading indicator check did not answer within {:?}", remaining);
                usize::MAX
            }
        };

        if pending == 0 {
            ::log::debug!(
                "No loading indicators after {} polls, settling for {:?}",
                polls,
                config.grace_period()
            );
            sleep(config.grace_period()).await;
            return Readiness::Settled;
        }

        ::log::trace!("Poll {}: loading indicators still present", polls);
        sleep(config.poll_interval()).await;
    }

    ::log::warn!(
        "Dashboard still loading after {:?}, capturing anyway",
        config.max_wait()
    );
    Readiness::TimedOut
}
