/// Progress bar for `tckgen` executable: selected streamlines against the
/// number requested, with the number attempted in the message.
pub (super) struct Progress {
    bar: ProgressBar,
    requested: usize,
}

impl Progress {

    pub (super) fn new(requested: usize) -> Self {
        let bar = ProgressBar::new(requested as u64);
        bar.set_style(ProgressStyle::default_bar()
                      .template("Tracking: {msg}\n[{elapsed_precise}] {wide_bar} {pos}/{len} ({eta_precise})")
                      .unwrap_or_else(|_| ProgressStyle::default_bar())
        );
        bar.tick();
        Self { bar, requested }
    }

    pub (super) fn update(&self, counts: &Counts) {
        self.bar.set_position(counts.selected as u64);
        self.bar.set_message(message(counts, self.requested));
    }

    pub (super) fn finish(&self, counts: &Counts) {
        self.bar.finish_with_message(message(counts, self.requested));
    }
}

/// Attempted and selected counts, with the selected ones as a percentage of
/// those requested
fn message(&Counts { total, selected }: &Counts, requested: usize) -> String {
    let percent = if requested > 0 { 100.0 * selected as f32 / requested as f32 } else { 100.0 };
    format!("{} generated, {} selected ({percent:.1}%)", group_digits(total), group_digits(selected))
}


// ----- Imports -----------------------------------------------------------------------------------------
use indicatif::{ProgressBar, ProgressStyle};
use fodtrack::{tracking::Counts, utils::group_digits};
