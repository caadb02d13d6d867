use crate::modules::content::service::OnboardingService;

#[derive(Clone)]
pub struct AppState {
    pub onboarding: OnboardingService,
}

impl AppState {
    pub fn new(onboarding: OnboardingService) -> Self {
        Self { onboarding }
    }
}
