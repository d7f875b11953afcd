use std::time::{Duration, Instant};

/// Repeat suppression for outbound labels.
///
/// A label goes out if it differs from the last one sent, or if the
/// cooldown since that send has elapsed.
#[derive(Debug, Clone)]
pub struct EmissionGate {
    cooldown: Duration,
    last: Option<(String, Instant)>,
}

impl EmissionGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: None,
        }
    }

    /// Decide whether `label` is sent at `now`, recording it if so.
    pub fn admit(&mut self, label: &str, now: Instant) -> bool {
        if label.is_empty() {
            return false;
        }
        let allowed = match &self.last {
            Some((last, at)) if last == label => now.saturating_duration_since(*at) >= self.cooldown,
            _ => true,
        };
        if allowed {
            self.last = Some((label.to_string(), now));
        }
        allowed
    }

    pub fn last_label(&self) -> Option<&str> {
        self.last.as_ref().map(|(label, _)| label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_millis(800);

    #[test]
    fn repeat_within_cooldown_is_suppressed() {
        let mut gate = EmissionGate::new(COOLDOWN);
        let t0 = Instant::now();
        assert!(gate.admit("А", t0));
        assert!(!gate.admit("А", t0 + Duration::from_millis(300)));
        assert!(!gate.admit("А", t0 + Duration::from_millis(799)));
        assert!(gate.admit("А", t0 + Duration::from_millis(800)));
    }

    #[test]
    fn interrupting_label_reopens_the_gate() {
        let mut gate = EmissionGate::new(COOLDOWN);
        let t0 = Instant::now();
        assert!(gate.admit("А", t0));
        assert!(gate.admit("Б", t0 + Duration::from_millis(100)));
        assert!(gate.admit("А", t0 + Duration::from_millis(200)));
        assert_eq!(gate.last_label(), Some("А"));
    }

    #[test]
    fn suppressed_repeat_does_not_extend_cooldown() {
        let mut gate = EmissionGate::new(COOLDOWN);
        let t0 = Instant::now();
        assert!(gate.admit("5", t0));
        assert!(!gate.admit("5", t0 + Duration::from_millis(700)));
        assert!(gate.admit("5", t0 + Duration::from_millis(850)));
    }

    #[test]
    fn empty_label_never_goes_out() {
        let mut gate = EmissionGate::new(COOLDOWN);
        assert!(!gate.admit("", Instant::now()));
        assert_eq!(gate.last_label(), None);
    }
}
