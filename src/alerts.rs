use super::*;

pub const DEFAULT_ALERT_SELECTOR: &str = ".alert";
pub const DEFAULT_FADE_DELAY_MS: i64 = 5_000;
pub const DEFAULT_REMOVAL_DELAY_MS: i64 = 300;

/// Fades out and removes flash alerts some time after the page is ready.
///
/// Every matching alert gets its own pair of timers: at `fade_delay_ms`
/// its opacity drops to `0` (letting a CSS transition run), and
/// `removal_delay_ms` after that it is detached from the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertDismiss {
    selector: Selector,
    fade_delay_ms: i64,
    removal_delay_ms: i64,
}

impl Default for AlertDismiss {
    fn default() -> Self {
        Self {
            selector: Selector::class("alert"),
            fade_delay_ms: DEFAULT_FADE_DELAY_MS,
            removal_delay_ms: DEFAULT_REMOVAL_DELAY_MS,
        }
    }
}

impl AlertDismiss {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selector(mut self, selector: &str) -> Result<Self> {
        self.selector = Selector::parse(selector)?;
        Ok(self)
    }

    pub fn with_fade_delay_ms(mut self, delay_ms: i64) -> Self {
        self.fade_delay_ms = delay_ms.max(0);
        self
    }

    pub fn with_removal_delay_ms(mut self, delay_ms: i64) -> Self {
        self.removal_delay_ms = delay_ms.max(0);
        self
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn fade_delay_ms(&self) -> i64 {
        self.fade_delay_ms
    }

    pub fn removal_delay_ms(&self) -> i64 {
        self.removal_delay_ms
    }

    /// Schedules the fade and removal of every alert currently in the page.
    /// Returns how many alerts were scheduled.
    pub fn schedule(&self, host: &mut dyn Host) -> usize {
        let alerts = host.query_selector_all(None, &self.selector);
        for alert in &alerts {
            let fade = TimerTask::SetStyle {
                node: *alert,
                property: "opacity".into(),
                value: "0".into(),
                then: Some((
                    self.removal_delay_ms,
                    Box::new(TimerTask::Remove { node: *alert }),
                )),
            };
            host.set_timeout(self.fade_delay_ms, fade);
        }
        host.trace(format!(
            "[alert] scheduled count={} selector={} fade_ms={} removal_ms={}",
            alerts.len(),
            self.selector,
            self.fade_delay_ms,
            self.removal_delay_ms
        ));
        alerts.len()
    }
}

impl ReadyCallback for AlertDismiss {
    fn on_ready(&self, host: &mut dyn Host) -> Result<()> {
        self.schedule(host);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_flash_alert_timing() {
        let dismiss = AlertDismiss::default();
        assert_eq!(dismiss.selector().as_str(), DEFAULT_ALERT_SELECTOR);
        assert_eq!(dismiss.fade_delay_ms(), 5_000);
        assert_eq!(dismiss.removal_delay_ms(), 300);
    }

    #[test]
    fn negative_delays_clamp_to_zero() {
        let dismiss = AlertDismiss::new()
            .with_fade_delay_ms(-10)
            .with_removal_delay_ms(-1);
        assert_eq!(dismiss.fade_delay_ms(), 0);
        assert_eq!(dismiss.removal_delay_ms(), 0);
    }

    #[test]
    fn invalid_selector_is_rejected() {
        assert!(matches!(
            AlertDismiss::new().with_selector("div:hover"),
            Err(Error::UnsupportedSelector(_))
        ));
    }

    #[test]
    fn schedules_one_fade_per_alert() -> Result<()> {
        let mut page = Page::from_html(
            "<div class='alert'>a</div><div class='alert alert-error'>b</div><div>c</div>",
        )?;
        assert_eq!(AlertDismiss::default().schedule(&mut page), 2);
        let timers = page.pending_timers();
        assert_eq!(timers.len(), 2);
        assert!(timers.iter().all(|timer| timer.due_at == 5_000));
        Ok(())
    }
}
