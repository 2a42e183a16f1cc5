//! Progress reporting for long-running flash operations.

/// Receives progress updates from bulk flash operations.
///
/// `done` and `total` are byte counts; `status` carries a short
/// human-readable description of the current step, or `None` on the
/// final completion report.
pub trait ProgressSink {
    fn report(&mut self, done: usize, total: usize, status: Option<&str>);
}

/// Discards all progress updates.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _done: usize, _total: usize, _status: Option<&str>) {}
}

/// Re-bases an inner operation's progress into an outer operation's
/// range, so a nested step reports against the overall total.
pub struct OffsetProgress<'a> {
    inner: &'a mut dyn ProgressSink,
    base: usize,
    total: usize,
}

impl<'a> OffsetProgress<'a> {
    pub fn new(inner: &'a mut dyn ProgressSink, base: usize, total: usize) -> Self {
        OffsetProgress { inner, base, total }
    }
}

impl ProgressSink for OffsetProgress<'_> {
    fn report(&mut self, done: usize, _total: usize, status: Option<&str>) {
        self.inner.report(self.base + done, self.total, status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Vec<(usize, usize, Option<String>)>);

    impl ProgressSink for Recorder {
        fn report(&mut self, done: usize, total: usize, status: Option<&str>) {
            self.0.push((done, total, status.map(str::to_owned)));
        }
    }

    #[test]
    fn offset_rebases_into_outer_range() {
        let mut outer = Recorder(Vec::new());
        {
            let mut nested = OffsetProgress::new(&mut outer, 4096, 12288);
            nested.report(0, 256, Some("step"));
            nested.report(256, 256, None);
        }
        assert_eq!(
            outer.0,
            vec![
                (4096, 12288, Some("step".to_owned())),
                (4352, 12288, None),
            ]
        );
    }
}
