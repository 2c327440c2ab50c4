use page_helpers::{
    Error, Host, NodeId, Page, ReadyCallback, Result, Selector, TimerTask, Timers,
};
use std::cell::Cell;
use std::rc::Rc;

struct CountingHook {
    calls: Rc<Cell<usize>>,
}

impl ReadyCallback for CountingHook {
    fn on_ready(&self, _host: &mut dyn Host) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        Ok(())
    }
}

struct FailingHook;

impl ReadyCallback for FailingHook {
    fn on_ready(&self, _host: &mut dyn Host) -> Result<()> {
        Err(Error::Runtime("hook failed".into()))
    }
}

fn first(page: &Page, selector: &str) -> Result<NodeId> {
    page.query_all(selector)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::SelectorNotFound(selector.into()))
}

#[test]
fn ready_callbacks_run_once_in_order() -> Result<()> {
    let calls = Rc::new(Cell::new(0));
    let mut page = Page::from_html("<p></p>")?;
    page.register_ready(Box::new(CountingHook {
        calls: Rc::clone(&calls),
    }));
    page.register_ready(Box::new(CountingHook {
        calls: Rc::clone(&calls),
    }));
    assert!(!page.is_ready());

    page.fire_ready()?;
    page.fire_ready()?;
    assert!(page.is_ready());
    assert_eq!(calls.get(), 2);
    Ok(())
}

#[test]
fn ready_callback_errors_propagate() -> Result<()> {
    let mut page = Page::from_html("<p></p>")?;
    page.register_ready(Box::new(FailingHook));
    assert_eq!(
        page.fire_ready(),
        Err(Error::Runtime("hook failed".into()))
    );
    Ok(())
}

#[test]
fn timers_run_in_due_then_schedule_order() -> Result<()> {
    let mut page = Page::from_html("<p id='a'></p><p id='b'></p>")?;
    let a = first(&page, "#a")?;
    let b = first(&page, "#b")?;

    page.set_timeout(
        100,
        TimerTask::SetStyle {
            node: a,
            property: "color".into(),
            value: "red".into(),
            then: None,
        },
    );
    page.set_timeout(50, TimerTask::Remove { node: b });
    page.set_timeout(
        100,
        TimerTask::SetStyle {
            node: a,
            property: "color".into(),
            value: "blue".into(),
            then: None,
        },
    );

    let pending = page.pending_timers();
    assert_eq!(
        pending.iter().map(|timer| timer.due_at).collect::<Vec<_>>(),
        vec![50, 100, 100]
    );

    page.advance_time(60)?;
    page.assert_absent("#b")?;
    page.assert_style("#a", "color", "")?;

    page.advance_time(40)?;
    page.assert_style("#a", "color", "blue")?;
    Ok(())
}

#[test]
fn negative_delay_runs_on_next_due_pass() -> Result<()> {
    let mut page = Page::from_html("<p id='a'></p>")?;
    let a = first(&page, "#a")?;
    page.set_timeout(-5, TimerTask::Remove { node: a });
    assert_eq!(page.pending_timers()[0].due_at, 0);
    assert_eq!(page.run_due_timers()?, 1);
    page.assert_absent("#a")?;
    Ok(())
}

#[test]
fn clock_cannot_move_backwards() -> Result<()> {
    let mut page = Page::from_html("<p></p>")?;
    page.advance_time(10)?;
    assert!(matches!(page.advance_time(-1), Err(Error::Runtime(_))));
    assert!(matches!(page.advance_time_to(5), Err(Error::Runtime(_))));
    assert_eq!(page.now_ms(), 10);
    Ok(())
}

#[test]
fn flush_moves_clock_to_last_task() -> Result<()> {
    let mut page = Page::from_html("<div class='alert' id='x'></div>")?;
    let x = first(&page, "#x")?;
    page.set_timeout(
        250,
        TimerTask::SetStyle {
            node: x,
            property: "opacity".into(),
            value: "0".into(),
            then: Some((30, Box::new(TimerTask::Remove { node: x }))),
        },
    );
    page.flush()?;
    assert_eq!(page.now_ms(), 280);
    page.assert_absent("#x")?;
    Ok(())
}

#[test]
fn step_limit_stops_runaway_queues() -> Result<()> {
    let mut page = Page::from_html("<p id='a'></p>")?;
    let a = first(&page, "#a")?;
    assert!(matches!(page.set_timer_step_limit(0), Err(Error::Runtime(_))));
    page.set_timer_step_limit(2)?;
    for _ in 0..3 {
        page.set_timeout(0, TimerTask::Remove { node: a });
    }
    match page.run_due_timers() {
        Err(Error::Runtime(message)) => assert!(message.contains("limit=2"), "{message}"),
        other => panic!("expected step limit error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn trace_log_keeps_most_recent_entries() -> Result<()> {
    let mut page = Page::from_html("<p></p>")?;
    page.enable_trace(true);
    page.set_trace_stderr(false);
    assert!(page.set_trace_log_limit(0).is_err());
    page.set_trace_log_limit(2)?;
    for delta in [1, 2, 3] {
        page.advance_time(delta)?;
    }
    let logs = page.take_trace_logs();
    assert_eq!(logs.len(), 2);
    assert!(logs[1].starts_with("[timer] advance delta_ms=3"));

    page.set_trace_timers(false);
    page.advance_time(1)?;
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn type_text_only_accepts_text_controls() -> Result<()> {
    let mut page = Page::from_html(
        "<input id='name'><input id='locked' readonly value='x'><p id='para'></p>",
    )?;
    page.type_text("#name", "Rui")?;
    page.assert_value("#name", "Rui")?;

    page.type_text("#locked", "changed")?;
    page.assert_value("#locked", "x")?;

    assert!(matches!(
        page.type_text("#para", "x"),
        Err(Error::TypeMismatch { .. })
    ));
    assert_eq!(
        page.type_text("#missing", "x"),
        Err(Error::SelectorNotFound("#missing".into()))
    );
    Ok(())
}

#[test]
fn assertion_failures_carry_a_dom_snippet() -> Result<()> {
    let page = Page::from_html("<input id='q' style='border-color: red'>")?;
    match page.assert_style("#q", "border-color", "") {
        Err(Error::AssertionFailed { dom_snippet, .. }) => {
            assert_eq!(dom_snippet, r#"<input id="q" style="border-color: red">"#);
        }
        other => panic!("expected assertion failure, got {other:?}"),
    }
    assert!(page.assert_absent("#q").is_err());
    Ok(())
}

#[test]
fn invalid_markup_and_selectors_are_reported() {
    assert!(matches!(
        Page::from_html("<div><!-- never closed"),
        Err(Error::HtmlParse(_))
    ));
    assert!(matches!(
        Selector::parse("li + li"),
        Err(Error::UnsupportedSelector(_))
    ));
    let error = Error::SelectorNotFound("#x".into());
    assert_eq!(error.to_string(), "selector not found: #x");
}
