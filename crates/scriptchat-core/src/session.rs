//! Playback session: the state of one replayed conversation.
//!
//! The session never sleeps or spawns anything itself. Whenever an assistant
//! turn is due it hands back a [`Scheduled`] request tagged with the current
//! [`Generation`]; the owner arranges for [`PlaybackSession::fire`] to be called
//! with that generation once the delay has passed. Every load and every
//! auto-advance bumps the generation, so a firing from a superseded schedule
//! is simply ignored.

use std::collections::VecDeque;
use std::ops::Range;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::analysis::AnalysisResult;
use crate::cursor;
use crate::state::{display_timestamp, DisplayRole, DisplayedMessage, Role, Turn};
use crate::template::ConversationScript;

/// Tag identifying one scheduling epoch of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(pub u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

/// A request to call [`PlaybackSession::fire`] after `delay`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    pub generation: Generation,
    pub delay: Duration,
}

/// Bounds of the "bot is typing" pause before an assistant turn appears
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDelay {
    pub min: Duration,
    pub max: Duration,
}

impl ReplyDelay {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Uniform in `[min, max)`; `min` when the range is empty
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let range: Range<u64> = self.min.as_millis() as u64..self.max.as_millis() as u64;
        if range.is_empty() {
            return self.min;
        }
        Duration::from_millis(rng.gen_range(range))
    }
}

impl Default for ReplyDelay {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_millis(1500))
    }
}

pub struct PlaybackSession {
    history: Vec<DisplayedMessage>,
    suggestion: Option<String>,
    queue: VecDeque<Turn>,
    analysis: Option<AnalysisResult>,
    partner_name: Option<String>,

    generation: Generation,
    // Generation of the emission currently waiting on a timer, if any
    pending: Option<Generation>,

    next_id: u64,
    delay: ReplyDelay,
    rng: StdRng,
}

impl PlaybackSession {
    pub fn new(delay: ReplyDelay) -> Self {
        Self::with_rng(delay, StdRng::from_entropy())
    }

    pub fn with_rng(delay: ReplyDelay, rng: StdRng) -> Self {
        Self {
            history: Vec::new(),
            suggestion: None,
            queue: VecDeque::new(),
            analysis: None,
            partner_name: None,
            generation: Generation::default(),
            pending: None,
            next_id: 0,
            delay,
            rng,
        }
    }

    pub fn history(&self) -> &[DisplayedMessage] {
        &self.history
    }

    /// The next expected user message, used to pre-fill the input
    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    pub fn queue(&self) -> impl ExactSizeIterator<Item = &Turn> {
        self.queue.iter()
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    /// Name from the most recently loaded template that had one
    pub fn partner_name(&self) -> Option<&str> {
        self.partner_name.as_deref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// True while an assistant turn is waiting for its delay to pass
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Replace everything with a fresh replay of `script`.
    ///
    /// History is cut at the conversation cursor; if the remainder starts with
    /// a user turn it becomes the suggestion, otherwise any leftover turns are
    /// auto-advanced straight away.
    pub fn load(&mut self, script: &ConversationScript) -> Option<Scheduled> {
        self.generation = self.generation.next();
        self.pending = None;

        if let Some(name) = &script.name {
            self.partner_name = Some(name.clone());
        }
        self.analysis = Some(script.analysis.clone().unwrap_or_else(AnalysisResult::fallback));

        let split = cursor::split(&script.messages);
        self.history.clear();
        for turn in split.history {
            let message = self.make_message("msg", turn.role.into(), &turn.content);
            self.history.push(message);
        }

        tracing::info!(
            history = self.history.len(),
            remaining = split.remainder.len(),
            generation = self.generation.0,
            "loaded conversation"
        );

        match split.remainder.split_first() {
            Some((head, tail)) if head.is_user() => {
                self.suggestion = Some(head.content.clone());
                self.queue = tail.iter().cloned().collect();
                None
            }
            _ => {
                self.suggestion = None;
                self.queue.clear();
                if split.remainder.is_empty() {
                    return None;
                }
                // Only reachable for a remainder that doesn't start with a user
                // turn, which the cursor normally rules out. Drain it anyway.
                self.queue = split.remainder.iter().cloned().collect();
                self.auto_advance()
            }
        }
    }

    /// The user sent `text`. Blank input is ignored.
    pub fn send(&mut self, text: &str) -> Option<Scheduled> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let message = self.make_message("user", DisplayRole::User, text);
        self.history.push(message);
        self.suggestion = None;

        self.auto_advance()
    }

    /// A scheduled delay for `generation` has elapsed.
    ///
    /// Appends the waiting assistant turn and moves on. Firings from any
    /// generation other than the pending one are ignored.
    pub fn fire(&mut self, generation: Generation) -> Option<Scheduled> {
        if self.pending != Some(generation) {
            tracing::debug!(
                stale = generation.0,
                current = self.generation.0,
                "ignoring stale emission"
            );
            return None;
        }
        self.pending = None;

        let turn = self.queue.pop_front()?;
        let message = self.make_message("bot", DisplayRole::Bot, &turn.content);
        self.history.push(message);
        tracing::debug!(queued = self.queue.len(), "emitted assistant turn");

        self.auto_advance()
    }

    /// Step through the queue until the user has something to do.
    fn auto_advance(&mut self) -> Option<Scheduled> {
        self.generation = self.generation.next();
        self.pending = None;

        match self.queue.front().map(|turn| turn.role) {
            None => {
                self.suggestion = None;
                None
            }
            Some(Role::Assistant) => {
                let delay = self.delay.sample(&mut self.rng);
                self.pending = Some(self.generation);
                Some(Scheduled {
                    generation: self.generation,
                    delay,
                })
            }
            Some(Role::User) => {
                self.suggestion = self.queue.pop_front().map(|turn| turn.content);
                None
            }
        }
    }

    fn make_message(&mut self, prefix: &str, role: DisplayRole, content: &str) -> DisplayedMessage {
        self.next_id += 1;
        DisplayedMessage {
            id: format!("{}-{}", prefix, self.next_id),
            role,
            content: content.to_string(),
            timestamp: display_timestamp(),
        }
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new(ReplyDelay::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session() -> PlaybackSession {
        PlaybackSession::with_rng(ReplyDelay::default(), StdRng::seed_from_u64(7))
    }

    fn shown(session: &PlaybackSession) -> Vec<(DisplayRole, String)> {
        session
            .history()
            .iter()
            .map(|m| (m.role, m.content.clone()))
            .collect()
    }

    #[test]
    fn test_end_to_end_hi_hey_bye() {
        let script = ConversationScript::from_turns(vec![
            Turn::assistant("hi"),
            Turn::user("hey"),
            Turn::assistant("bye"),
        ]);
        let mut s = session();

        assert_eq!(s.load(&script), None);
        assert_eq!(shown(&s), vec![(DisplayRole::Bot, "hi".to_string())]);
        assert_eq!(s.suggestion(), Some("hey"));
        assert_eq!(s.queue().cloned().collect::<Vec<_>>(), vec![Turn::assistant("bye")]);

        let scheduled = s.send("hey").expect("bye should be scheduled");
        assert_eq!(
            shown(&s),
            vec![
                (DisplayRole::Bot, "hi".to_string()),
                (DisplayRole::User, "hey".to_string()),
            ]
        );
        assert!(s.is_pending());

        assert_eq!(s.fire(scheduled.generation), None);
        assert_eq!(shown(&s).last(), Some(&(DisplayRole::Bot, "bye".to_string())));
        assert_eq!(s.queue().len(), 0);
        assert_eq!(s.suggestion(), None);
        assert!(!s.is_pending());
    }

    #[test]
    fn test_delay_is_within_bounds() {
        let mut s = session();
        // Cursor stops on the user turn, leaving one assistant turn queued
        let script = ConversationScript::from_turns(vec![
            Turn::assistant("hello"),
            Turn::user("q"),
            Turn::assistant("a"),
        ]);
        for _ in 0..50 {
            assert_eq!(s.load(&script), None);
            assert_eq!(s.suggestion(), Some("q"));
            let scheduled = s.send("q").unwrap();
            assert_eq!(scheduled.generation, s.generation());
            assert!(scheduled.delay >= Duration::from_millis(1000));
            assert!(scheduled.delay < Duration::from_millis(1500));
        }
    }

    #[test]
    fn test_assistant_turns_emit_in_order_then_suggest() {
        let script = ConversationScript::from_turns(vec![
            Turn::user("one"),
            Turn::user("two"),
            Turn::assistant("a"),
            Turn::assistant("b"),
            Turn::user("three"),
        ]);
        let mut s = session();
        s.load(&script);
        // len 5, half = 2 is assistant, cutoff moves to 4
        assert_eq!(s.history().len(), 4);
        assert_eq!(s.suggestion(), Some("three"));

        let script = ConversationScript::from_turns(vec![
            Turn::user("one"),
            Turn::user("two"),
            Turn::assistant("a"),
            Turn::assistant("b"),
            Turn::user("three"),
            Turn::assistant("c"),
        ]);
        s.load(&script);
        // len 6, half = 3 is assistant, cutoff moves to 4
        assert_eq!(s.suggestion(), Some("three"));

        let first = s.send("three").unwrap();
        assert_eq!(s.fire(first.generation), None);
        assert_eq!(shown(&s).last().unwrap().1, "c");
    }

    #[test]
    fn test_consecutive_assistant_turns_are_chained() {
        let mut s = session();
        s.load(&ConversationScript::from_turns(vec![
            Turn::user("go"),
            Turn::assistant("a"),
            Turn::assistant("b"),
            Turn::user("next"),
        ]));
        // Cutoff 2 is assistant, 3 is user: only "next" remains
        assert_eq!(s.suggestion(), Some("next"));

        s.load(&ConversationScript::from_turns(vec![
            Turn::user("go"),
            Turn::user("now"),
            Turn::assistant("a"),
            Turn::assistant("b"),
            Turn::user("done"),
            Turn::user("really"),
        ]));
        assert_eq!(s.suggestion(), Some("done"));
        assert_eq!(s.queue().len(), 1);

        let mut s = session();
        s.load(&ConversationScript::from_turns(vec![
            Turn::user("go"),
            Turn::assistant("a"),
            Turn::assistant("b"),
        ]));
        // Trailing replies are pulled into history, nothing is left to play
        assert_eq!(s.history().len(), 3);
        assert_eq!(s.suggestion(), None);
        assert_eq!(s.send("extra"), None);

        let mut s = session();
        s.load(&ConversationScript::from_turns(vec![
            Turn::assistant("x"),
            Turn::assistant("y"),
            Turn::user("go"),
            Turn::assistant("a"),
            Turn::assistant("b"),
        ]));
        let first = s.send("go").unwrap();
        let second = s.fire(first.generation).unwrap();
        assert_ne!(first.generation, second.generation);
        assert_eq!(s.fire(second.generation), None);
        let bots: Vec<_> = shown(&s)
            .into_iter()
            .filter(|(r, _)| *r == DisplayRole::Bot)
            .map(|(_, c)| c)
            .collect();
        assert_eq!(bots, vec!["x", "y", "a", "b"]);
    }

    #[test]
    fn test_send_echoes_suggestion_text() {
        let mut s = session();
        s.load(&ConversationScript::from_turns(vec![
            Turn::assistant("hello"),
            Turn::user("suggested reply"),
        ]));
        let text = s.suggestion().unwrap().to_string();
        s.send(&text);
        assert_eq!(s.history().last().unwrap().content, "suggested reply");
        assert_eq!(s.history().last().unwrap().role, DisplayRole::User);
        assert_eq!(s.suggestion(), None);
    }

    #[test]
    fn test_send_overrides_suggestion() {
        let mut s = session();
        s.load(&ConversationScript::from_turns(vec![
            Turn::assistant("hello"),
            Turn::user("suggested"),
            Turn::assistant("reply"),
        ]));
        s.send("  something else  ");
        assert_eq!(s.history().last().unwrap().content, "something else");
        assert!(s.is_pending());
    }

    #[test]
    fn test_blank_send_is_ignored() {
        let mut s = session();
        s.load(&ConversationScript::from_turns(vec![
            Turn::assistant("hello"),
            Turn::user("suggested"),
        ]));
        assert_eq!(s.send("   "), None);
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.suggestion(), Some("suggested"));
    }

    #[test]
    fn test_reload_is_deterministic() {
        let script = ConversationScript::from_turns(vec![
            Turn::user("a"),
            Turn::assistant("b"),
            Turn::user("c"),
            Turn::assistant("d"),
        ]);
        let mut s = session();

        s.load(&script);
        let first = shown(&s);
        let first_suggestion = s.suggestion().map(str::to_string);
        let first_analysis = s.analysis().cloned();

        let scheduled = s.send("c").unwrap();
        s.fire(scheduled.generation);

        s.load(&script);
        assert_eq!(shown(&s), first);
        assert_eq!(s.suggestion().map(str::to_string), first_suggestion);
        assert_eq!(s.analysis().cloned(), first_analysis);
    }

    #[test]
    fn test_switching_templates_drops_pending_emission() {
        let mut s = session();
        s.load(&ConversationScript::from_turns(vec![
            Turn::assistant("old hi"),
            Turn::user("old hey"),
            Turn::assistant("old bye"),
        ]));
        let stale = s.send("old hey").unwrap();

        s.load(&ConversationScript::from_turns(vec![
            Turn::assistant("new hi"),
            Turn::user("new hey"),
        ]));
        assert!(!s.is_pending());
        assert_eq!(s.fire(stale.generation), None);

        let contents: Vec<_> = shown(&s).into_iter().map(|(_, c)| c).collect();
        assert_eq!(contents, vec!["new hi"]);
        assert_eq!(s.suggestion(), Some("new hey"));
    }

    #[test]
    fn test_send_while_pending_reschedules_same_turn() {
        let mut s = session();
        s.load(&ConversationScript::from_turns(vec![
            Turn::assistant("hi"),
            Turn::user("hey"),
            Turn::assistant("bye"),
        ]));
        let first = s.send("hey").unwrap();
        let second = s.send("impatient").unwrap();

        assert_eq!(s.fire(first.generation), None);
        assert_eq!(s.history().last().unwrap().content, "impatient");

        s.fire(second.generation);
        let bots = s
            .history()
            .iter()
            .filter(|m| m.role == DisplayRole::Bot && m.content == "bye")
            .count();
        assert_eq!(bots, 1);
    }

    #[test]
    fn test_empty_script_is_blank_state() {
        let mut s = session();
        assert_eq!(s.load(&ConversationScript::default()), None);
        assert!(s.history().is_empty());
        assert_eq!(s.suggestion(), None);
        assert_eq!(s.queue().len(), 0);
        assert_eq!(s.analysis(), Some(&AnalysisResult::fallback()));
    }

    #[test]
    fn test_partner_name_persists_until_overridden() {
        let mut s = session();
        let named = ConversationScript {
            name: Some("Maya".to_string()),
            ..ConversationScript::default()
        };
        s.load(&named);
        s.load(&ConversationScript::default());
        assert_eq!(s.partner_name(), Some("Maya"));
    }

    #[test]
    fn test_message_ids_are_unique() {
        let mut s = session();
        s.load(&ConversationScript::from_turns(vec![
            Turn::assistant("a"),
            Turn::assistant("b"),
            Turn::user("c"),
        ]));
        s.send("c");
        let mut ids: Vec<_> = s.history().iter().map(|m| m.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_empty_delay_range_uses_min() {
        let delay = ReplyDelay::new(Duration::from_millis(20), Duration::from_millis(20));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(delay.sample(&mut rng), Duration::from_millis(20));
    }
}
