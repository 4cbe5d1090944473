use crate::screen::ScreenHandle;
use crate::step::TransitionKind;

/// Stack primitive the coordinator drives. Hosts adapt their platform
/// navigation stack behind this trait; `animated` is a pass-through hint and
/// every call returns as soon as the instruction is issued.
pub trait NavigatorAdapter: Send {
    fn push(&mut self, screen: ScreenHandle, transition: TransitionKind, animated: bool);

    /// Pop the topmost element. Implementations keep the root element in
    /// place, so popping a single-element stack returns `None`.
    fn pop_one(&mut self, animated: bool) -> Option<ScreenHandle>;

    fn pop_to_root(&mut self, animated: bool);

    /// Pop until `screen` is topmost. Returns `false` when the screen is not
    /// on the stack, leaving the stack untouched.
    fn pop_to(&mut self, screen: &ScreenHandle, animated: bool) -> bool;

    fn topmost(&self) -> Option<ScreenHandle>;

    fn stack(&self) -> Vec<ScreenHandle>;
}

/// In-memory reference navigator with platform stack semantics. Used by the
/// default coordinator constructor and anywhere a host stack is not in play.
#[derive(Default)]
pub struct StackNavigator {
    screens: Vec<ScreenHandle>,
}

impl StackNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_screens(screens: Vec<ScreenHandle>) -> Self {
        Self { screens }
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }
}

impl NavigatorAdapter for StackNavigator {
    fn push(&mut self, screen: ScreenHandle, _transition: TransitionKind, _animated: bool) {
        self.screens.push(screen);
    }

    fn pop_one(&mut self, _animated: bool) -> Option<ScreenHandle> {
        if self.screens.len() <= 1 {
            return None;
        }
        self.screens.pop()
    }

    fn pop_to_root(&mut self, _animated: bool) {
        self.screens.truncate(1);
    }

    fn pop_to(&mut self, screen: &ScreenHandle, _animated: bool) -> bool {
        match self
            .screens
            .iter()
            .position(|candidate| ScreenHandle::same_instance(candidate, screen))
        {
            Some(index) => {
                self.screens.truncate(index + 1);
                true
            }
            None => false,
        }
    }

    fn topmost(&self) -> Option<ScreenHandle> {
        self.screens.last().cloned()
    }

    fn stack(&self) -> Vec<ScreenHandle> {
        self.screens.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::Screen;

    struct Blank;
    impl Screen for Blank {}

    fn screen(id: &str) -> ScreenHandle {
        ScreenHandle::new(id, Box::new(Blank))
    }

    fn navigator(ids: &[&str]) -> StackNavigator {
        StackNavigator::with_screens(ids.iter().map(|id| screen(id)).collect())
    }

    #[test]
    fn pop_one_keeps_the_root() {
        let mut nav = navigator(&["a", "b"]);
        assert_eq!(nav.pop_one(false).unwrap().step_id(), "b");
        assert!(nav.pop_one(false).is_none());
        assert_eq!(nav.topmost().unwrap().step_id(), "a");
    }

    #[test]
    fn pop_to_truncates_above_target() {
        let mut nav = navigator(&["a", "b", "c"]);
        let target = nav.stack()[1].clone();
        assert!(nav.pop_to(&target, false));
        assert_eq!(nav.len(), 2);
        assert_eq!(nav.topmost().unwrap().step_id(), "b");
    }

    #[test]
    fn pop_to_missing_screen_is_untouched() {
        let mut nav = navigator(&["a", "b"]);
        let foreign = screen("z");
        assert!(!nav.pop_to(&foreign, false));
        assert_eq!(nav.len(), 2);
    }

    #[test]
    fn pop_to_root_leaves_one_element() {
        let mut nav = navigator(&["a", "b", "c"]);
        nav.pop_to_root(false);
        assert_eq!(nav.len(), 1);
        assert_eq!(nav.topmost().unwrap().step_id(), "a");
    }
}
