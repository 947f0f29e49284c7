//! Sample beans served by `mgmt-demo`.
//!
//! [`CounterBean`] shows every accessor shape plus overloaded operations;
//! [`HealthBean`] picks its own namespace, so several instances can be
//! registered side by side and share the `status` command.

use crate::bean::{Managed, MethodSpec};
use crate::catalog::OwnerName;
use parking_lot::Mutex;

const HISTORY_LIMIT: usize = 32;

/// A counter with a bounded history of its past values.
#[derive(Debug, Default)]
pub struct CounterBean {
    state: Mutex<CounterState>,
}

#[derive(Debug, Default)]
struct CounterState {
    count: i32,
    history: Vec<i32>,
}

impl CounterBean {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> i32 {
        self.state.lock().count
    }

    pub fn set_count(&self, count: i32) {
        self.update(|_| count);
    }

    pub fn increase(&self, by: i64) {
        self.update(|current| i64::from(current).wrapping_add(by) as i32);
    }

    /// Up to `limit` previous values, most recent last.
    pub fn recent(&self, limit: i32) -> Vec<i32> {
        let state = self.state.lock();
        let limit = usize::try_from(limit).unwrap_or(0);
        let skip = state.history.len().saturating_sub(limit);
        state.history[skip..].to_vec()
    }

    fn update(&self, next: impl FnOnce(i32) -> i32) {
        let mut state = self.state.lock();
        let previous = state.count;
        state.history.push(previous);
        if state.history.len() > HISTORY_LIMIT {
            state.history.remove(0);
        }
        state.count = next(previous);
    }
}

impl Managed for CounterBean {
    fn description(&self) -> &str {
        "bean only for testing"
    }

    fn methods(&self) -> Vec<MethodSpec<Self>> {
        vec![
            MethodSpec::getter("getCount", "the count", CounterBean::count),
            MethodSpec::setter("setCount", "set the count", CounterBean::set_count),
            MethodSpec::getter("isCountZero", "check if counter is zero", |bean: &CounterBean| {
                bean.count() == 0
            }),
            MethodSpec::new("increaseCount", "increase count")
                .param::<i32>("adder", "number to be increased")
                .handler(|bean: &CounterBean, args| {
                    bean.increase(i64::from(args.get::<i32>(0)?));
                    Ok(())
                }),
            MethodSpec::new("increaseCount", "increase count")
                .param::<i64>("adder", "number to be increased")
                .handler(|bean: &CounterBean, args| {
                    bean.increase(args.get::<i64>(0)?);
                    Ok(())
                }),
            MethodSpec::new("increaseCount", "increase count by one").handler(
                |bean: &CounterBean, _| {
                    bean.increase(1);
                    Ok(())
                },
            ),
            MethodSpec::new("recentCounts", "previous values of the count")
                .param::<i32>("limit", "maximum number of values")
                .handler(|bean: &CounterBean, args| Ok(bean.recent(args.get::<i32>(0)?))),
        ]
    }
}

/// Named health check published under its own namespace.
#[derive(Debug)]
pub struct HealthBean {
    name: String,
    status: Mutex<String>,
}

impl HealthBean {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Mutex::new("OK".to_string()),
        }
    }

    pub fn set_status(&self, status: impl Into<String>) {
        *self.status.lock() = status.into();
    }
}

impl Managed for HealthBean {
    fn description(&self) -> &str {
        "health of one component"
    }

    fn methods(&self) -> Vec<MethodSpec<Self>> {
        vec![
            MethodSpec::new("status", "current health")
                .handler(|bean: &HealthBean, _| Ok(bean.status.lock().clone())),
            MethodSpec::new("degrade", "mark the component unhealthy")
                .param::<String>("reason", "why it is unhealthy")
                .handler(|bean: &HealthBean, args| {
                    bean.set_status(format!("DEGRADED: {}", args.get::<String>(0)?));
                    Ok(())
                }),
        ]
    }

    fn namespace(&self) -> OwnerName {
        OwnerName::from(format!("mgmtplane::sample:type={}", self.name))
    }
}
