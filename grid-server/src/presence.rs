use std::time::Duration;

use grid_types::PresenceStatus;

use crate::config::Config;

/// Heartbeat-gap thresholds for the liveness ladder. Demotion is purely
/// time-driven; promotion back to active happens on any inbound action,
/// never by the sweep.
#[derive(Debug, Clone, Copy)]
pub struct PresencePolicy {
    pub idle_after: Duration,
    pub afk_after: Duration,
    pub disconnect_after: Duration,
}

impl PresencePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            idle_after: Duration::from_secs(config.idle_after_seconds),
            afk_after: Duration::from_secs(config.afk_after_seconds),
            disconnect_after: Duration::from_secs(config.disconnect_after_seconds),
        }
    }

    /// Status implied by the time since the player was last heard from.
    pub fn status_for_gap(&self, gap: Duration) -> PresenceStatus {
        if gap >= self.disconnect_after {
            PresenceStatus::Disconnected
        } else if gap >= self.afk_after {
            PresenceStatus::Afk
        } else if gap >= self.idle_after {
            PresenceStatus::Idle
        } else {
            PresenceStatus::Active
        }
    }

    /// The sweep only ever moves players down the ladder. A player who
    /// marked themselves afk stays afk even with a fresh heartbeat gap.
    pub fn demoted(&self, current: PresenceStatus, gap: Duration) -> Option<PresenceStatus> {
        let implied = self.status_for_gap(gap);
        if rank(implied) > rank(current) {
            Some(implied)
        } else {
            None
        }
    }
}

fn rank(status: PresenceStatus) -> u8 {
    match status {
        PresenceStatus::Active => 0,
        PresenceStatus::Idle => 1,
        PresenceStatus::Afk => 2,
        PresenceStatus::Disconnected => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PresencePolicy {
        PresencePolicy {
            idle_after: Duration::from_secs(30),
            afk_after: Duration::from_secs(90),
            disconnect_after: Duration::from_secs(180),
        }
    }

    #[test]
    fn test_ladder_thresholds() {
        let policy = policy();
        assert_eq!(
            policy.status_for_gap(Duration::from_secs(5)),
            PresenceStatus::Active
        );
        assert_eq!(
            policy.status_for_gap(Duration::from_secs(30)),
            PresenceStatus::Idle
        );
        assert_eq!(
            policy.status_for_gap(Duration::from_secs(90)),
            PresenceStatus::Afk
        );
        assert_eq!(
            policy.status_for_gap(Duration::from_secs(500)),
            PresenceStatus::Disconnected
        );
    }

    #[test]
    fn test_sweep_never_promotes() {
        let policy = policy();

        // Fresh gap does not lift a self-declared afk player.
        assert_eq!(
            policy.demoted(PresenceStatus::Afk, Duration::from_secs(1)),
            None
        );
        // But a long gap still pushes them to disconnected.
        assert_eq!(
            policy.demoted(PresenceStatus::Afk, Duration::from_secs(200)),
            Some(PresenceStatus::Disconnected)
        );
    }

    #[test]
    fn test_active_player_demotes_stepwise() {
        let policy = policy();
        assert_eq!(
            policy.demoted(PresenceStatus::Active, Duration::from_secs(40)),
            Some(PresenceStatus::Idle)
        );
        assert_eq!(
            policy.demoted(PresenceStatus::Idle, Duration::from_secs(40)),
            None
        );
    }
}
