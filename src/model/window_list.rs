use super::window::WindowId;

/// Receives focus transitions made by a [`WindowList`].
pub trait FocusObserver {
    fn focused(&mut self, window: WindowId);
    fn unfocused(&mut self, window: WindowId);
}

impl FocusObserver for () {
    fn focused(&mut self, _window: WindowId) {}

    fn unfocused(&mut self, _window: WindowId) {}
}

/// Windows of one workspace, ordered by recency of focus. The focused
/// window, when there is one, is the last element.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WindowList {
    windows: Vec<WindowId>,
    focused: Option<WindowId>,
}

impl WindowList {
    /// Appends a window without focusing it.
    pub fn add(&mut self, window: WindowId) {
        debug_assert!(!self.contains(window), "{window} is already in the list");
        self.windows.push(window);
    }

    /// Focuses the window at `position`, moving it to the end of the list.
    /// Does nothing on an empty list.
    #[track_caller]
    pub fn focus(&mut self, position: usize, observer: &mut impl FocusObserver) {
        if self.windows.is_empty() {
            return;
        }
        assert!(
            position < self.windows.len(),
            "focus position {position} out of range for {} windows",
            self.windows.len()
        );
        if let Some(previous) = self.focused.take() {
            observer.unfocused(previous);
        }
        let window = self.windows.remove(position);
        self.windows.push(window);
        self.focused = Some(window);
        observer.focused(window);
    }

    /// Removes the window at `position`, unfocusing it first if needed.
    #[track_caller]
    pub fn remove(&mut self, position: usize, observer: &mut impl FocusObserver) -> WindowId {
        assert!(
            position < self.windows.len(),
            "remove position {position} out of range for {} windows",
            self.windows.len()
        );
        let window = self.windows[position];
        if self.focused == Some(window) {
            self.focused = None;
            observer.unfocused(window);
        }
        self.windows.remove(position)
    }

    /// The most recently focused window, or the newest if none was focused
    /// since.
    pub fn current(&self) -> Option<WindowId> { self.windows.last().copied() }

    pub fn focused(&self) -> Option<WindowId> { self.focused }

    pub fn position(&self, window: WindowId) -> Option<usize> {
        self.windows.iter().position(|&w| w == window)
    }

    pub fn contains(&self, window: WindowId) -> bool { self.windows.contains(&window) }

    pub fn len(&self) -> usize { self.windows.len() }

    pub fn is_empty(&self) -> bool { self.windows.is_empty() }

    /// Least recently focused first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = WindowId> + '_ {
        self.windows.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct Events(Vec<String>);

    impl FocusObserver for Events {
        fn focused(&mut self, window: WindowId) { self.0.push(format!("focus {}", window.0)); }

        fn unfocused(&mut self, window: WindowId) {
            self.0.push(format!("unfocus {}", window.0));
        }
    }

    fn list(ids: &[u32]) -> WindowList {
        let mut list = WindowList::default();
        for &id in ids {
            list.add(WindowId(id));
        }
        list
    }

    #[test]
    fn add_appends_without_focus() {
        let list = list(&[1, 2, 3]);
        assert_eq!(list.iter().collect::<Vec<_>>(), [WindowId(1), WindowId(2), WindowId(3)]);
        assert_eq!(list.focused(), None);
        assert_eq!(list.current(), Some(WindowId(3)));
    }

    #[test]
    fn focus_moves_to_end() {
        let mut list = list(&[1, 2, 3]);
        let mut events = Events::default();
        list.focus(2, &mut events);
        list.focus(0, &mut events);
        assert_eq!(list.iter().collect::<Vec<_>>(), [WindowId(2), WindowId(3), WindowId(1)]);
        assert_eq!(list.focused(), Some(WindowId(1)));
        assert_eq!(list.current(), Some(WindowId(1)));
        assert_eq!(events.0, ["focus 3", "unfocus 3", "focus 1"]);
    }

    #[test]
    fn focus_after_add_unfocuses_the_focused_window() {
        let mut list = list(&[1]);
        list.focus(0, &mut ());
        list.add(WindowId(2));
        let mut events = Events::default();
        list.focus(1, &mut events);
        assert_eq!(events.0, ["unfocus 1", "focus 2"]);
    }

    #[test]
    fn remove_focused_window() {
        let mut list = list(&[1, 2]);
        list.focus(1, &mut ());
        let mut events = Events::default();
        assert_eq!(list.remove(1, &mut events), WindowId(2));
        assert_eq!(events.0, ["unfocus 2"]);
        assert_eq!(list.focused(), None);
        assert_eq!(list.current(), Some(WindowId(1)));
    }

    #[test]
    fn remove_unfocused_window_is_quiet() {
        let mut list = list(&[1, 2]);
        list.focus(1, &mut ());
        let mut events = Events::default();
        assert_eq!(list.remove(0, &mut events), WindowId(1));
        assert!(events.0.is_empty());
        assert_eq!(list.focused(), Some(WindowId(2)));
        assert_eq!(list.position(WindowId(2)), Some(0));
    }

    #[test]
    fn empty_list() {
        let list = WindowList::default();
        assert_eq!(list.current(), None);
        assert!(list.is_empty());
        assert_eq!(list.position(WindowId(1)), None);
    }

    #[test]
    fn focus_on_empty_list_does_nothing() {
        let mut list = WindowList::default();
        let mut events = Events::default();
        list.focus(0, &mut events);
        assert!(events.0.is_empty());
        assert_eq!(list.focused(), None);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn focus_out_of_range_panics() { list(&[1]).focus(1, &mut ()); }
}
