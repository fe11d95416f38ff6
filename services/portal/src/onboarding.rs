//! First-visit onboarding slides

use common::store::KeyValueStore;
use tracing::info;

use crate::error::PortalResult;
use crate::routes::Route;

/// Presence flag set once the donor finished the introduction
pub const ONBOARDING_COMPLETED_KEY: &str = "onboarding-completed";

/// One onboarding slide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slide {
    pub title: &'static str,
    pub body: &'static str,
}

pub const SLIDES: [Slide; 4] = [
    Slide {
        title: "Your impact",
        body: "Every kilogram you donate is sorted, recycled and kept out of landfills.",
    },
    Slide {
        title: "What to donate",
        body: "Clean plastic, paper, glass and metal. Keep organic waste out of the bag.",
    },
    Slide {
        title: "How to donate",
        body: "Separate your recyclables and hand them over at collection. Each donation is weighed.",
    },
    Slide {
        title: "Track your impact",
        body: "Follow your total donated weight and your full history from the dashboard.",
    },
];

/// Cursor over [`SLIDES`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnboardingFlow {
    index: usize,
}

impl OnboardingFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &'static Slide {
        &SLIDES[self.index]
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == SLIDES.len()
    }

    /// Advance one slide. Returns `false` on the last slide.
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Go back one slide. Returns `false` on the first slide.
    pub fn previous(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.index -= 1;
        true
    }
}

pub async fn is_completed<S: KeyValueStore>(store: &S) -> PortalResult<bool> {
    Ok(store.get(ONBOARDING_COMPLETED_KEY).await?.is_some())
}

/// Mark the introduction as seen; the dashboard stops redirecting
pub async fn finish<S: KeyValueStore>(store: &S) -> PortalResult<Route> {
    store.set(ONBOARDING_COMPLETED_KEY, "true").await?;
    info!("Onboarding completed");
    Ok(Route::Dashboard)
}

/// Forget the flag so the introduction can be reviewed
pub async fn reset<S: KeyValueStore>(store: &S) -> PortalResult<Route> {
    store.delete(ONBOARDING_COMPLETED_KEY).await?;
    info!("Onboarding reset");
    Ok(Route::Onboarding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::store::MemoryStore;

    #[test]
    fn test_flow_walks_every_slide() {
        let mut flow = OnboardingFlow::new();
        assert!(flow.is_first());
        assert!(!flow.previous());

        let mut seen = vec![flow.current().title];
        while flow.next() {
            seen.push(flow.current().title);
        }
        assert_eq!(seen.len(), SLIDES.len());
        assert!(flow.is_last());

        assert!(flow.previous());
        assert_eq!(flow.index(), 2);
    }

    #[tokio::test]
    async fn test_finish_and_reset() {
        let store = MemoryStore::new();
        assert!(!is_completed(&store).await.unwrap());

        assert_eq!(finish(&store).await.unwrap(), Route::Dashboard);
        assert!(is_completed(&store).await.unwrap());
        assert_eq!(
            store.get(ONBOARDING_COMPLETED_KEY).await.unwrap().as_deref(),
            Some("true")
        );

        assert_eq!(reset(&store).await.unwrap(), Route::Onboarding);
        assert!(!is_completed(&store).await.unwrap());
    }
}
