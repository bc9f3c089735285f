use sitesurvey_engine::{
    NavigationDecision, NavigationRequest, SaveHandler, UnloadDecision, UnsavedChangesGuard,
};

/// Stand-in for the browser's navigation environment: a current route,
/// an in-app navigation hook and an unload hook, both routed through the
/// screen's guard.
pub struct TestRouter<H> {
    current: String,
    history: Vec<String>,
    guard: UnsavedChangesGuard<H>,
}

impl<H: SaveHandler> TestRouter<H> {
    pub fn new(start: impl Into<String>, guard: UnsavedChangesGuard<H>) -> Self {
        let current = start.into();
        Self {
            history: vec![current.clone()],
            current,
            guard,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn guard(&self) -> &UnsavedChangesGuard<H> {
        &self.guard
    }

    /// Ask the guard, then change route only if it allows.
    pub async fn navigate(&mut self, to: &str) -> NavigationDecision {
        let request = NavigationRequest::new(self.current.clone(), to);
        let decision = self.guard.intercept(&request).await;
        if decision.is_allowed() {
            self.current = to.to_string();
            self.history.push(self.current.clone());
        }
        decision
    }

    pub fn unload(&self) -> UnloadDecision {
        self.guard.on_before_unload()
    }
}
