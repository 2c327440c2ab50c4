use super::*;

/// Read/write access to the page element tree.
///
/// Implementations must tolerate handles of nodes that were already
/// removed: reads return `None`/empty and writes are no-ops or harmless.
pub trait Document {
    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Elements matching `selector` under `scope` (the whole document when
    /// `None`), in document order.
    fn query_selector_all(&self, scope: Option<NodeId>, selector: &Selector) -> Vec<NodeId>;

    /// Current value of a form control; `None` when the node has no value.
    fn value(&self, node: NodeId) -> Option<String>;

    fn style_property(&self, node: NodeId, property: &str) -> Option<String>;

    /// Sets an inline style property. An empty `value` clears the override.
    fn set_style_property(&mut self, node: NodeId, property: &str, value: &str);

    /// Detaches `node` from the tree. Returns false when it was not attached.
    fn remove(&mut self, node: NodeId) -> bool;

    fn is_connected(&self, node: NodeId) -> bool;
}

/// Deferred task queue of the host. There is no way to cancel a task.
pub trait Timers {
    fn now_ms(&self) -> i64;

    /// Schedules `task` to run `delay_ms` from now (negative delays run as
    /// soon as possible) and returns its timer id.
    fn set_timeout(&mut self, delay_ms: i64, task: TimerTask) -> i64;
}

/// Blocking modal dialogs.
pub trait Dialogs {
    /// Shows an OK/Cancel dialog. `true` when accepted, `false` when
    /// cancelled or dismissed.
    fn confirm(&mut self, message: &str) -> bool;
}

/// Everything a page utility may use.
pub trait Host: Document + Timers + Dialogs {
    fn trace(&mut self, _line: String) {}
}

/// Hook run once after the page's initial structure is built.
pub trait ReadyCallback {
    fn on_ready(&self, host: &mut dyn Host) -> Result<()>;
}

/// A deferred page mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerTask {
    /// Writes an inline style property, then optionally schedules a
    /// follow-up task relative to the moment this one ran.
    SetStyle {
        node: NodeId,
        property: String,
        value: String,
        then: Option<(i64, Box<TimerTask>)>,
    },
    /// Detaches a node. No-op when it is already gone.
    Remove { node: NodeId },
}

impl TimerTask {
    pub fn run(self, host: &mut dyn Host) {
        match self {
            Self::SetStyle {
                node,
                property,
                value,
                then,
            } => {
                host.set_style_property(node, &property, &value);
                host.trace(format!("[task] style {property}={value} node={}", node.0));
                if let Some((delay_ms, next)) = then {
                    host.set_timeout(delay_ms, *next);
                }
            }
            Self::Remove { node } => {
                let removed = host.remove(node);
                host.trace(format!("[task] remove node={} removed={removed}", node.0));
            }
        }
    }
}
