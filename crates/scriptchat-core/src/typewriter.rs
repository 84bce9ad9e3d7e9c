//! Typewriter reveal of the analysis feed.
//!
//! A [`Typewriter`] grows one character per tick. [`AnalysisFeed`] chains four
//! of them strictly in series behind a short lead-in. Both are driven by the
//! caller's frame tick, so there is nothing to cancel: restarting the feed
//! throws away the old stages in one step.

use std::time::{Duration, Instant};

use crate::analysis::AnalysisResult;

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// One more character is visible
    Revealed,
    /// The whole target was already visible; reported exactly once
    Completed,
    /// Nothing left to do
    Idle,
}

#[derive(Debug, Clone, Default)]
pub struct Typewriter {
    target: String,
    // Byte offset of the visible prefix
    end: usize,
    completed: bool,
}

impl Typewriter {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            end: 0,
            completed: false,
        }
    }

    /// The revealed prefix
    pub fn text(&self) -> &str {
        &self.target[..self.end]
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn tick(&mut self) -> Tick {
        if self.completed {
            return Tick::Idle;
        }
        match self.target[self.end..].chars().next() {
            Some(c) => {
                self.end += c.len_utf8();
                Tick::Revealed
            }
            None => {
                self.completed = true;
                Tick::Completed
            }
        }
    }
}

/// The stages of the feed, in reveal order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Summary,
    PredictionsLabel,
    TopPrediction,
    SecondPrediction,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Summary,
        Stage::PredictionsLabel,
        Stage::TopPrediction,
        Stage::SecondPrediction,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    LeadIn { until: Instant },
    Typing { stage: usize },
    Done,
}

/// Chained typewriter reveal of an [`AnalysisResult`]
#[derive(Debug, Clone)]
pub struct AnalysisFeed {
    stages: Vec<Typewriter>,
    phase: Phase,
    lead_in: Duration,
    has_analysis: bool,
}

impl AnalysisFeed {
    pub fn new(lead_in: Duration) -> Self {
        Self {
            stages: Vec::new(),
            phase: Phase::Idle,
            lead_in,
            has_analysis: false,
        }
    }

    /// Start over with `analysis`, discarding whatever was being typed.
    pub fn restart(&mut self, analysis: Option<&AnalysisResult>, now: Instant) {
        self.clear();
        if let Some(analysis) = analysis {
            self.stages = analysis.feed_lines().into_iter().map(Typewriter::new).collect();
            self.has_analysis = true;
            self.phase = Phase::LeadIn {
                until: now + self.lead_in,
            };
        }
    }

    /// Empty every buffer and stop the cascade
    pub fn clear(&mut self) {
        self.stages.clear();
        self.has_analysis = false;
        self.phase = Phase::Idle;
    }

    pub fn tick(&mut self, now: Instant) {
        match self.phase {
            Phase::Idle | Phase::Done => {}
            Phase::LeadIn { until } => {
                if now >= until {
                    self.phase = Phase::Typing { stage: 0 };
                }
            }
            Phase::Typing { stage } => {
                if self.stages[stage].tick() == Tick::Completed {
                    self.phase = if stage + 1 < self.stages.len() {
                        Phase::Typing { stage: stage + 1 }
                    } else {
                        Phase::Done
                    };
                }
            }
        }
    }

    pub fn text(&self, stage: Stage) -> &str {
        self.stages
            .get(stage.index())
            .map(Typewriter::text)
            .unwrap_or("")
    }

    /// False means the panel should show the pending placeholder
    pub fn has_analysis(&self) -> bool {
        self.has_analysis
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// The stage currently growing, if any
    pub fn active_stage(&self) -> Option<Stage> {
        match self.phase {
            Phase::Typing { stage } => Stage::ALL.get(stage).copied(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Prediction;

    #[test]
    fn test_typewriter_reveals_ok() {
        let mut tw = Typewriter::new("OK");
        let mut seen = vec![tw.text().to_string()];
        let mut completions = 0;

        for _ in 0..5 {
            match tw.tick() {
                Tick::Revealed => seen.push(tw.text().to_string()),
                Tick::Completed => {
                    assert_eq!(tw.text(), "OK");
                    completions += 1;
                }
                Tick::Idle => {}
            }
        }

        assert_eq!(seen, vec!["", "O", "OK"]);
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_typewriter_multibyte() {
        let mut tw = Typewriter::new("né");
        tw.tick();
        tw.tick();
        assert_eq!(tw.text(), "né");
        assert_eq!(tw.tick(), Tick::Completed);
    }

    #[test]
    fn test_empty_target_completes_on_first_tick() {
        let mut tw = Typewriter::new("");
        assert_eq!(tw.tick(), Tick::Completed);
        assert_eq!(tw.tick(), Tick::Idle);
    }

    fn analysis(summary: &str) -> AnalysisResult {
        AnalysisResult {
            summary: summary.to_string(),
            predictions: vec![Prediction {
                label: "X".to_string(),
                score: 0.5,
                color: "#FFFFFF".to_string(),
            }],
        }
    }

    #[test]
    fn test_feed_waits_for_lead_in() {
        let start = Instant::now();
        let mut feed = AnalysisFeed::new(Duration::from_millis(300));
        feed.restart(Some(&analysis("abc")), start);

        feed.tick(start + Duration::from_millis(100));
        feed.tick(start + Duration::from_millis(200));
        assert_eq!(feed.active_stage(), None);

        feed.tick(start + Duration::from_millis(300));
        assert_eq!(feed.active_stage(), Some(Stage::Summary));
        assert_eq!(feed.text(Stage::Summary), "");
        feed.tick(start + Duration::from_millis(325));
        assert_eq!(feed.text(Stage::Summary), "a");
    }

    #[test]
    fn test_feed_runs_stages_in_series() {
        let start = Instant::now();
        let mut feed = AnalysisFeed::new(Duration::ZERO);
        feed.restart(Some(&analysis("ab")), start);

        let mut growing_at_once = 0;
        for _ in 0..200 {
            feed.tick(start);
            let partial = Stage::ALL
                .iter()
                .filter(|s| {
                    let text = feed.text(**s);
                    !text.is_empty() && text.len() < feed.stages[s.index()].target().len()
                })
                .count();
            growing_at_once = growing_at_once.max(partial);
        }

        assert!(feed.is_done());
        assert!(growing_at_once <= 1);
        assert_eq!(feed.text(Stage::Summary), "ab");
        assert_eq!(feed.text(Stage::PredictionsLabel), "> PREDICTIONS:");
        assert_eq!(feed.text(Stage::TopPrediction), "  most likely: probably: X (50.0%)");
        assert_eq!(feed.text(Stage::SecondPrediction), "");
    }

    #[test]
    fn test_restart_clears_previous_text() {
        let start = Instant::now();
        let mut feed = AnalysisFeed::new(Duration::ZERO);
        feed.restart(Some(&analysis("first analysis")), start);
        for _ in 0..6 {
            feed.tick(start);
        }
        assert_eq!(feed.text(Stage::Summary), "first");

        feed.restart(Some(&analysis("second")), start);
        assert_eq!(feed.text(Stage::Summary), "");
        for _ in 0..4 {
            feed.tick(start);
        }
        assert_eq!(feed.text(Stage::Summary), "sec");
    }

    #[test]
    fn test_no_analysis_is_pending() {
        let mut feed = AnalysisFeed::new(Duration::ZERO);
        feed.restart(None, Instant::now());
        assert!(!feed.has_analysis());
        feed.tick(Instant::now());
        assert_eq!(feed.text(Stage::Summary), "");
    }
}
