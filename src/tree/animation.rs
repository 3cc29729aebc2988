use eframe::egui::Color32;

/// Lifetime of a message animation, in the caller's time units (milliseconds).
pub const ANIMATION_DURATION: f64 = 800.0;

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationEvent {
    pub from_id: String,
    pub to_id: String,
    pub color: Color32,
    pub start_time: f64,
}

impl AnimationEvent {
    /// Fraction of the animation elapsed at `now`, `None` before it starts.
    pub fn progress(&self, now: f64) -> Option<f32> {
        let elapsed = now - self.start_time;
        if elapsed < 0.0 {
            return None;
        }
        Some((elapsed / ANIMATION_DURATION).clamp(0.0, 1.0) as f32)
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now - self.start_time >= ANIMATION_DURATION
    }
}

/// Active message animations plus the pending-repaint latch.
#[derive(Clone, Debug, Default)]
pub struct AnimationSet {
    events: Vec<AnimationEvent>,
    tick_pending: bool,
}

impl AnimationSet {
    pub fn add(&mut self, from_id: &str, to_id: &str, color: Color32, now: f64) {
        self.events.push(AnimationEvent {
            from_id: from_id.to_owned(),
            to_id: to_id.to_owned(),
            color,
            start_time: now,
        });
    }

    /// Drops expired animations and reports whether any remain.
    pub fn advance(&mut self, now: f64) -> bool {
        self.events.retain(|event| !event.is_expired(now));
        !self.events.is_empty()
    }

    pub fn events(&self) -> &[AnimationEvent] {
        &self.events
    }

    pub fn is_active(&self) -> bool {
        !self.events.is_empty()
    }

    /// Claims the single pending-tick slot. Returns false if a tick is
    /// already scheduled or nothing is animating.
    pub fn schedule_tick(&mut self) -> bool {
        if self.tick_pending || self.events.is_empty() {
            return false;
        }
        self.tick_pending = true;
        true
    }

    pub fn tick_arrived(&mut self) {
        self.tick_pending = false;
    }

    pub fn tick_pending(&self) -> bool {
        self.tick_pending
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.tick_pending = false;
    }
}
