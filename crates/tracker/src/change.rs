//! Change detection between two observations of the same application.

use crate::ReleaseStatus;

/// Decides whether the transition `previous` → `current` warrants a notification.
///
/// The first observation of an application (`previous == None`) is always
/// reported. After that, only these fields matter:
///
/// - the version string,
/// - the version's store state,
/// - whether a phased rollout is attached at all,
/// - the rollout state,
/// - the rollout's current day number.
///
/// Every other delta (customer fraction, dates, pause duration, record ids) is
/// ignored.
pub fn should_notify(previous: Option<&ReleaseStatus>, current: &ReleaseStatus) -> bool {
    let Some(previous) = previous else {
        return true;
    };

    let prev_phase = previous.phased_release.as_ref();
    let curr_phase = current.phased_release.as_ref();

    previous.version.version_string != current.version.version_string
        || previous.version.app_store_state != current.version.app_store_state
        || previous.has_phased_release() != current.has_phased_release()
        || prev_phase.map(|p| &p.state) != curr_phase.map(|p| &p.state)
        || prev_phase.and_then(|p| p.current_day_number)
            != curr_phase.and_then(|p| p.current_day_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AppStoreState, PhasedRelease, PhasedReleaseId, PhasedReleaseState, Platform,
        ReleaseVersion, VersionId,
    };

    fn status(version: &str, state: AppStoreState, phase: Option<PhasedRelease>) -> ReleaseStatus {
        ReleaseStatus {
            version: ReleaseVersion {
                id: VersionId::new("ver-1").unwrap(),
                platform: Platform::Ios,
                version_string: version.to_string(),
                app_store_state: state,
                release_type: None,
                earliest_release_date: None,
                created_date: "2024-05-01T10:00:00Z".parse().unwrap(),
            },
            phased_release: phase,
        }
    }

    fn phase(state: PhasedReleaseState, day: Option<u8>, fraction: Option<f64>) -> PhasedRelease {
        PhasedRelease {
            id: PhasedReleaseId::new("phase-1").unwrap(),
            state,
            start_date: Some("2024-05-02T00:00:00Z".parse().unwrap()),
            current_day_number: day,
            customer_fraction: fraction,
            total_pause_duration: None,
        }
    }

    fn active(day: u8, fraction: f64) -> Option<PhasedRelease> {
        Some(phase(PhasedReleaseState::Active, Some(day), Some(fraction)))
    }

    #[test]
    fn first_observation_always_notifies() {
        let current = status("1.0", AppStoreState::PrepareForSubmission, None);
        assert!(should_notify(None, &current));
    }

    #[test]
    fn identical_status_does_not_notify() {
        let current = status("2.1", AppStoreState::ReadyForSale, active(5, 0.2));
        assert!(!should_notify(Some(&current.clone()), &current));
    }

    #[test]
    fn version_string_change_notifies() {
        let previous = status("2.0", AppStoreState::ReadyForSale, None);
        let current = status("2.1", AppStoreState::ReadyForSale, None);
        assert!(should_notify(Some(&previous), &current));
    }

    #[test]
    fn store_state_change_notifies() {
        let previous = status("2.1", AppStoreState::WaitingForReview, None);
        let current = status("2.1", AppStoreState::InReview, None);
        assert!(should_notify(Some(&previous), &current));
    }

    #[test]
    fn customer_fraction_drift_alone_does_not_notify() {
        let previous = status("2.1", AppStoreState::ReadyForSale, active(3, 0.05));
        let current = status("2.1", AppStoreState::ReadyForSale, active(3, 0.07));
        assert!(!should_notify(Some(&previous), &current));
    }

    #[test]
    fn day_number_change_notifies() {
        let previous = status("2.1", AppStoreState::ReadyForSale, active(3, 0.05));
        let current = status("2.1", AppStoreState::ReadyForSale, active(4, 0.05));
        assert!(should_notify(Some(&previous), &current));
    }

    #[test]
    fn rollout_state_change_notifies() {
        let previous = status("2.1", AppStoreState::ReadyForSale, active(4, 0.1));
        let paused = Some(phase(PhasedReleaseState::Paused, Some(4), Some(0.1)));
        let current = status("2.1", AppStoreState::ReadyForSale, paused);
        assert!(should_notify(Some(&previous), &current));
    }

    #[test]
    fn rollout_removal_notifies() {
        let previous = status("2.1", AppStoreState::ReadyForSale, active(7, 1.0));
        let current = status("2.1", AppStoreState::ReadyForSale, None);
        assert!(should_notify(Some(&previous), &current));
    }

    #[test]
    fn rollout_appearance_notifies() {
        let previous = status("2.1", AppStoreState::PendingDeveloperRelease, None);
        let inactive = Some(phase(PhasedReleaseState::Inactive, None, None));
        let current = status("2.1", AppStoreState::PendingDeveloperRelease, inactive);
        assert!(should_notify(Some(&previous), &current));
    }

    #[test]
    fn start_date_and_record_id_changes_are_ignored() {
        let previous = status("2.1", AppStoreState::ReadyForSale, active(2, 0.02));
        let mut moved = phase(PhasedReleaseState::Active, Some(2), Some(0.02));
        moved.id = PhasedReleaseId::new("phase-2").unwrap();
        moved.start_date = Some("2024-05-03T00:00:00Z".parse().unwrap());
        let current = status("2.1", AppStoreState::ReadyForSale, Some(moved));
        assert!(!should_notify(Some(&previous), &current));
    }
}
