//! Pull-based lazy sequences
//!
//! A `Lazy<T>` produces items strictly on demand through an explicit
//! lifecycle: NotStarted until the first pull, InProgress while items
//! flow, Exhausted once the underlying producer runs dry. Pulling past
//! Exhausted is a no-op that keeps returning `None`, never an error.
//!
//! Combinators (`map`, `filter`, `chain`) wrap the sequence without
//! materializing it, so paginated producers behind a `Lazy` only fetch
//! what consumers actually ask for.

/// Lifecycle of a lazy sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazyState {
    NotStarted,
    InProgress { cursor: usize },
    Exhausted,
}

type Thunk<T> = Box<dyn FnMut() -> Option<T>>;

/// A pull-based lazy sequence
pub struct Lazy<T> {
    state: LazyState,
    next: Thunk<T>,
}

impl<T: 'static> Lazy<T> {
    /// Create from a producer closure; `None` marks the end
    pub fn from_fn(next: impl FnMut() -> Option<T> + 'static) -> Self {
        Self {
            state: LazyState::NotStarted,
            next: Box::new(next),
        }
    }

    /// Replay an already materialized vector
    pub fn from_vec(items: Vec<T>) -> Self {
        let mut iter = items.into_iter();
        Self::from_fn(move || iter.next())
    }

    /// The empty sequence
    pub fn empty() -> Self {
        Self::from_fn(|| None)
    }

    /// A single-item sequence
    pub fn once(item: T) -> Self {
        let mut item = Some(item);
        Self::from_fn(move || item.take())
    }

    /// Pull the next item, advancing the state machine
    pub fn pull(&mut self) -> Option<T> {
        if self.state == LazyState::Exhausted {
            return None;
        }
        match (self.next)() {
            Some(item) => {
                let cursor = match self.state {
                    LazyState::InProgress { cursor } => cursor + 1,
                    _ => 1,
                };
                self.state = LazyState::InProgress { cursor };
                Some(item)
            }
            None => {
                self.state = LazyState::Exhausted;
                None
            }
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> LazyState {
        self.state
    }

    /// Number of items pulled so far
    pub fn cursor(&self) -> usize {
        match self.state {
            LazyState::InProgress { cursor } => cursor,
            _ => 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == LazyState::Exhausted
    }

    /// Transform each item without materializing the sequence
    pub fn map<U: 'static>(self, mut f: impl FnMut(T) -> U + 'static) -> Lazy<U> {
        let mut inner = self;
        Lazy::from_fn(move || inner.pull().map(&mut f))
    }

    /// Keep items matching the predicate
    pub fn filter(self, mut keep: impl FnMut(&T) -> bool + 'static) -> Lazy<T> {
        let mut inner = self;
        Lazy::from_fn(move || {
            while let Some(item) = inner.pull() {
                if keep(&item) {
                    return Some(item);
                }
            }
            None
        })
    }

    /// Concatenate two sequences
    ///
    /// The second sequence is not pulled until the first is exhausted
    /// and a further item is requested.
    pub fn chain(self, other: Lazy<T>) -> Lazy<T> {
        let mut first = Some(self);
        let mut second = other;
        Lazy::from_fn(move || {
            if let Some(head) = first.as_mut() {
                if let Some(item) = head.pull() {
                    return Some(item);
                }
                first = None;
            }
            second.pull()
        })
    }
}

impl<T: 'static> Iterator for Lazy<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.pull()
    }
}

impl<T> std::fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lazy").field("state", &self.state).finish()
    }
}
