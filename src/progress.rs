//! Spinners shown while a fetch is running

use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;

/// Await `future` behind a spinner on stderr when `enabled`
pub async fn with_spinner<F: Future>(enabled: bool, message: &str, future: F) -> F::Output {
    let progress = enabled.then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]")
        {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let output = future.await;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    output
}
