//! Change notifications for views that mirror the registry.
//!
//! Row ranges are inclusive. Consecutive modified rows are reported as one
//! range by `SpanCoalescer`. Commit and rollback close each range at the
//! first unmodified row after it, so that boundary row is reported too.

/// What changed in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    /// Rows `first..=last` were appended.
    RowsInserted { first: usize, last: usize },
    /// Data in rows `first..=last` changed.
    RowsChanged { first: usize, last: usize },
}

/// Callback invoked for every registry event, on the owner's thread.
pub type Listener = Box<dyn FnMut(RegistryEvent)>;

#[derive(Default)]
pub(crate) struct Listeners {
    inner: Vec<Listener>,
}

impl Listeners {
    pub(crate) fn push(&mut self, listener: Listener) {
        self.inner.push(listener);
    }

    pub(crate) fn emit(&mut self, event: RegistryEvent) {
        for l in &mut self.inner {
            l(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }
}

/// Turns a row-by-row sequence of "modified / not modified" into maximal spans.
#[derive(Debug, Default)]
pub(crate) struct SpanCoalescer {
    span_begin: Option<usize>,
    spans: Vec<(usize, usize)>,
    include_boundary: bool,
}

impl SpanCoalescer {
    /// Spans cover exactly the modified rows.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Spans also cover the unmodified row that ends them.
    pub(crate) fn with_boundary() -> Self {
        Self {
            include_boundary: true,
            ..Self::default()
        }
    }

    /// Feed rows in ascending order, each exactly once.
    pub(crate) fn row(&mut self, row: usize, modified: bool) {
        match (modified, self.span_begin) {
            (true, None) => self.span_begin = Some(row),
            (false, Some(begin)) => {
                let end = if self.include_boundary { row } else { row - 1 };
                self.spans.push((begin, end));
                self.span_begin = None;
            }
            _ => {}
        }
    }

    /// Close any open span ending at `last_row` and return all spans.
    pub(crate) fn finish(mut self, last_row: Option<usize>) -> Vec<(usize, usize)> {
        if let (Some(begin), Some(last)) = (self.span_begin.take(), last_row) {
            self.spans.push((begin, last));
        }
        self.spans
    }
}
