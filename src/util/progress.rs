/// Receives progress notifications while an artifact is streamed to disk. All methods default
///  to doing nothing.
pub trait ProgressObserver {
    /// `total` is the declared content length, if the server sent one
    fn on_start(&self, _total: Option<u64>) {}

    fn on_progress(&self, _downloaded: u64, _total: Option<u64>) {}

    fn on_finish(&self, _downloaded: u64) {}
}

pub struct NoProgress;
impl ProgressObserver for NoProgress {}

#[cfg(test)]
pub mod test_support {
    use std::sync::Mutex;
    use super::ProgressObserver;

    /// remembers every notification for later assertions
    #[derive(Default)]
    pub struct RecordingProgress {
        pub started: Mutex<Option<Option<u64>>>,
        pub progress: Mutex<Vec<(u64, Option<u64>)>>,
        pub finished: Mutex<Option<u64>>,
    }
    impl ProgressObserver for RecordingProgress {
        fn on_start(&self, total: Option<u64>) {
            *self.started.lock().unwrap() = Some(total);
        }

        fn on_progress(&self, downloaded: u64, total: Option<u64>) {
            self.progress.lock().unwrap().push((downloaded, total));
        }

        fn on_finish(&self, downloaded: u64) {
            *self.finished.lock().unwrap() = Some(downloaded);
        }
    }
}
