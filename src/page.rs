use super::*;

#[derive(Debug, Clone)]
struct ScheduledTask {
    id: i64,
    due_at: i64,
    order: i64,
    task: TimerTask,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: i64,
    pub due_at: i64,
    pub order: i64,
}

#[derive(Debug)]
struct SchedulerState {
    task_queue: Vec<ScheduledTask>,
    now_ms: i64,
    timer_step_limit: usize,
    next_timer_id: i64,
    next_task_order: i64,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            task_queue: Vec::new(),
            now_ms: 0,
            timer_step_limit: 10_000,
            next_timer_id: 1,
            next_task_order: 0,
        }
    }
}

#[derive(Debug, Default)]
struct DialogMockState {
    confirm_messages: Vec<String>,
    confirm_responses: VecDeque<bool>,
    default_confirm_response: bool,
}

#[derive(Debug)]
struct TraceState {
    enabled: bool,
    timers: bool,
    logs: VecDeque<String>,
    log_limit: usize,
    to_stderr: bool,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            timers: true,
            logs: VecDeque::new(),
            log_limit: 10_000,
            to_stderr: true,
        }
    }
}

/// Deterministic in-memory page host.
///
/// Holds the element tree, a virtual clock with its timer queue, scripted
/// answers for confirmation dialogs and an optional trace log. Time only
/// moves when the caller advances it.
pub struct Page {
    dom: Dom,
    scheduler: SchedulerState,
    dialogs: DialogMockState,
    trace_state: TraceState,
    ready_callbacks: Vec<Box<dyn ReadyCallback>>,
    ready_fired: bool,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Ok(Self {
            dom: parse_html(html)?,
            scheduler: SchedulerState::default(),
            dialogs: DialogMockState::default(),
            trace_state: TraceState::default(),
            ready_callbacks: Vec::new(),
            ready_fired: false,
        })
    }

    pub fn register_ready(&mut self, callback: Box<dyn ReadyCallback>) {
        self.ready_callbacks.push(callback);
    }

    /// Runs every registered ready callback, in registration order.
    ///
    /// The page becomes ready once; later calls do nothing. Callbacks
    /// registered after that are never run.
    pub fn fire_ready(&mut self) -> Result<()> {
        if self.ready_fired {
            self.trace_line("[ready] already fired".into());
            return Ok(());
        }
        self.ready_fired = true;
        let callbacks = std::mem::take(&mut self.ready_callbacks);
        self.trace_line(format!("[ready] fire callbacks={}", callbacks.len()));
        for callback in &callbacks {
            callback.on_ready(self)?;
        }
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready_fired
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace_state.enabled = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_state.logs).into()
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_state.to_stderr = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace_state.timers = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Runtime(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_state.log_limit = max_entries;
        while self.trace_state.logs.len() > self.trace_state.log_limit {
            self.trace_state.logs.pop_front();
        }
        Ok(())
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::Runtime(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.scheduler.timer_step_limit = max_steps;
        Ok(())
    }

    pub fn enqueue_confirm_response(&mut self, accepted: bool) {
        self.dialogs.confirm_responses.push_back(accepted);
    }

    /// Answer used once the queued responses run out. Defaults to `false`,
    /// i.e. the dialog was dismissed.
    pub fn set_default_confirm_response(&mut self, accepted: bool) {
        self.dialogs.default_confirm_response = accepted;
    }

    pub fn take_confirm_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.dialogs.confirm_messages)
    }

    /// Runs the required-field validator against this page.
    pub fn validate_form(&mut self, form_id: &str) -> bool {
        let valid = validate_form(self, form_id);
        self.trace_line(format!("[form] validate id={form_id} valid={valid}"));
        valid
    }

    /// Runs the confirmation prompt against this page's dialog mocks.
    pub fn confirm_action(&mut self, message: Option<&str>) -> bool {
        confirm_action(self, message)
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.has_attr(target, "disabled") || self.dom.has_attr(target, "readonly") {
            return Ok(());
        }
        let tag = self.dom.tag_name(target).unwrap_or_default().to_string();
        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }
        self.dom.set_value(target, text)
    }

    /// Detaches every element matching `selector`, as outside page code would.
    pub fn remove(&mut self, selector: &str) -> Result<usize> {
        let selector = Selector::parse(selector)?;
        let targets = self.dom.query_selector_all(self.dom.root, &selector);
        let mut removed = 0usize;
        for target in targets {
            if self.dom.remove_node(target) {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn query_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self.dom.query_selector_all(self.dom.root, &selector))
    }

    pub fn now_ms(&self) -> i64 {
        self.scheduler.now_ms
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        let mut timers = self
            .scheduler
            .task_queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::Runtime(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let target = self.scheduler.now_ms.saturating_add(delta_ms);
        let from = self.scheduler.now_ms;
        let ran = self.run_timer_queue(Some(target))?;
        self.scheduler.now_ms = target;
        self.trace_timer_line(format!(
            "[timer] advance delta_ms={delta_ms} from={from} to={target} ran_due={ran}"
        ));
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        if target_ms < self.scheduler.now_ms {
            return Err(Error::Runtime(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={})",
                self.scheduler.now_ms
            )));
        }
        let from = self.scheduler.now_ms;
        let ran = self.run_timer_queue(Some(target_ms))?;
        self.scheduler.now_ms = target_ms;
        self.trace_timer_line(format!(
            "[timer] advance_to from={from} to={target_ms} ran_due={ran}"
        ));
        Ok(())
    }

    /// Runs every queued task, moving the clock forward as needed.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.scheduler.now_ms;
        let ran = self.run_timer_queue(None)?;
        self.trace_timer_line(format!(
            "[timer] flush from={from} to={} ran={ran}",
            self.scheduler.now_ms
        ));
        Ok(())
    }

    pub fn run_next_timer(&mut self) -> Result<bool> {
        let Some(next_idx) = self.next_task_index(None) else {
            self.trace_timer_line("[timer] run_next none".into());
            return Ok(false);
        };
        let task = self.scheduler.task_queue.remove(next_idx);
        self.execute_timer_task(task);
        Ok(true)
    }

    /// Runs tasks already due at the current time, without moving the clock.
    pub fn run_due_timers(&mut self) -> Result<usize> {
        let ran = self.run_timer_queue(Some(self.scheduler.now_ms))?;
        self.trace_timer_line(format!(
            "[timer] run_due now_ms={} ran={ran}",
            self.scheduler.now_ms
        ));
        Ok(ran)
    }

    // Tasks scheduled by a running task are picked up in the same pass
    // when they are due before `due_limit`.
    fn run_timer_queue(&mut self, due_limit: Option<i64>) -> Result<usize> {
        let mut steps = 0usize;
        while let Some(next_idx) = self.next_task_index(due_limit) {
            steps += 1;
            if steps > self.scheduler.timer_step_limit {
                return Err(self.timer_step_limit_error(steps, due_limit));
            }
            let task = self.scheduler.task_queue.remove(next_idx);
            self.execute_timer_task(task);
        }
        Ok(steps)
    }

    fn timer_step_limit_error(&self, steps: usize, due_limit: Option<i64>) -> Error {
        let due_limit_desc = due_limit
            .map(|value| value.to_string())
            .unwrap_or_else(|| "none".into());
        Error::Runtime(format!(
            "timer queue exceeded max task steps: limit={}, steps={steps}, now_ms={}, due_limit={due_limit_desc}, pending_tasks={}",
            self.scheduler.timer_step_limit,
            self.scheduler.now_ms,
            self.scheduler.task_queue.len(),
        ))
    }

    fn next_task_index(&self, due_limit: Option<i64>) -> Option<usize> {
        self.scheduler
            .task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.is_none_or(|limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }

    fn execute_timer_task(&mut self, scheduled: ScheduledTask) {
        if scheduled.due_at > self.scheduler.now_ms {
            self.scheduler.now_ms = scheduled.due_at;
        }
        self.trace_timer_line(format!(
            "[timer] run id={} due_at={} now_ms={}",
            scheduled.id, scheduled.due_at, self.scheduler.now_ms
        ));
        scheduled.task.run(self);
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        self.select_one(selector).map(|_| ())
    }

    pub fn assert_absent(&self, selector: &str) -> Result<()> {
        let matches = self.query_all(selector)?;
        if let Some(first) = matches.first() {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: "no match".into(),
                actual: format!("{} match(es)", matches.len()),
                dom_snippet: self.dom.dump_node(*first),
            });
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target).ok_or_else(|| Error::TypeMismatch {
            selector: selector.to_string(),
            expected: "form control".into(),
            actual: self.dom.tag_name(target).unwrap_or_default().to_string(),
        })?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.dom.dump_node(target),
            });
        }
        Ok(())
    }

    /// Checks an inline style property. An empty `expected` means the
    /// property has no override.
    pub fn assert_style(&self, selector: &str, property: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.style_get(target, property).unwrap_or_default();
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("{property}: {expected:?}"),
                actual: format!("{property}: {actual:?}"),
                dom_snippet: self.dom.dump_node(target),
            });
        }
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.query_all(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn trace_timer_line(&mut self, line: String) {
        if self.trace_state.enabled && self.trace_state.timers {
            self.trace_line(line);
        }
    }

    fn trace_line(&mut self, line: String) {
        if self.trace_state.enabled {
            if self.trace_state.to_stderr {
                eprintln!("{line}");
            }
            if self.trace_state.logs.len() >= self.trace_state.log_limit {
                self.trace_state.logs.pop_front();
            }
            self.trace_state.logs.push_back(line);
        }
    }
}

impl Document for Page {
    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.dom.by_id(id)
    }

    fn query_selector_all(&self, scope: Option<NodeId>, selector: &Selector) -> Vec<NodeId> {
        let scope = scope.unwrap_or(self.dom.root);
        if !self.dom.is_valid_node(scope) {
            return Vec::new();
        }
        self.dom.query_selector_all(scope, selector)
    }

    fn value(&self, node: NodeId) -> Option<String> {
        self.dom.value(node)
    }

    fn style_property(&self, node: NodeId, property: &str) -> Option<String> {
        self.dom.style_get(node, property)
    }

    fn set_style_property(&mut self, node: NodeId, property: &str, value: &str) {
        self.dom.style_set(node, property, value);
    }

    fn remove(&mut self, node: NodeId) -> bool {
        self.dom.remove_node(node)
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.dom.is_connected(node)
    }
}

impl Timers for Page {
    fn now_ms(&self) -> i64 {
        self.scheduler.now_ms
    }

    fn set_timeout(&mut self, delay_ms: i64, task: TimerTask) -> i64 {
        let delay_ms = delay_ms.max(0);
        let id = self.scheduler.next_timer_id;
        self.scheduler.next_timer_id += 1;
        let order = self.scheduler.next_task_order;
        self.scheduler.next_task_order += 1;
        let due_at = self.scheduler.now_ms.saturating_add(delay_ms);
        self.scheduler.task_queue.push(ScheduledTask {
            id,
            due_at,
            order,
            task,
        });
        self.trace_timer_line(format!(
            "[timer] schedule id={id} due_at={due_at} delay_ms={delay_ms}"
        ));
        id
    }
}

impl Dialogs for Page {
    fn confirm(&mut self, message: &str) -> bool {
        self.dialogs.confirm_messages.push(message.to_string());
        let accepted = self
            .dialogs
            .confirm_responses
            .pop_front()
            .unwrap_or(self.dialogs.default_confirm_response);
        self.trace_line(format!("[dialog] confirm message={message:?} accepted={accepted}"));
        accepted
    }
}

impl Host for Page {
    fn trace(&mut self, line: String) {
        self.trace_line(line);
    }
}
