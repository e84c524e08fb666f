use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const RUNNING_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
const DONE_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} {msg}";

/// Progress over a batch of filings. A disabled tracker draws nothing.
#[derive(Clone)]
pub struct ProgressTracker {
    progress_bar: Option<ProgressBar>,
}

fn styled(template: &str) -> Option<ProgressStyle> {
    ProgressStyle::default_bar()
        .template(template)
        .ok()
        .map(|style| style.progress_chars("#>-"))
}

impl ProgressTracker {
    pub fn new(total: u64, enabled: bool) -> Self {
        let progress_bar = enabled.then(|| {
            let pb = ProgressBar::new(total);
            if let Some(style) = styled(RUNNING_TEMPLATE) {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        Self { progress_bar }
    }

    pub fn start_filing(&self, filing: &str) {
        if let Some(pb) = &self.progress_bar {
            pb.set_message(format!("Processing [{}]", filing));
        }
    }

    pub fn finish_filing(&self) {
        if let Some(pb) = &self.progress_bar {
            pb.inc(1);
        }
    }

    /// Print above the bar, or straight to stdout when disabled.
    pub fn println(&self, line: &str) {
        match &self.progress_bar {
            Some(pb) => pb.println(line),
            None => println!("{}", line),
        }
    }

    pub fn finish(&self, message: &str) {
        if let Some(pb) = &self.progress_bar {
            if let Some(style) = styled(DONE_TEMPLATE) {
                pb.set_style(style);
            }
            pb.finish_with_message(message.to_string());
        }
    }
}
