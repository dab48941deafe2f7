/// Progress message sent by the processor after each run
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub progress: f32,
    pub run_name: String,
}

impl WorkerStatus {
    pub fn new(progress: f32, run_name: &str) -> Self {
        Self {
            progress,
            run_name: run_name.to_string(),
        }
    }
}
