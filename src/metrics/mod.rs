// 请求指标和任务统计
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::models::{Task, TaskStatus};

#[derive(Debug, Clone)]
struct Sample {
    duration: Duration,
    status: u16,
    user_id: Option<String>,
}

/// 固定容量的请求样本环形缓冲区，满了以后丢弃最旧的样本
#[derive(Debug)]
pub struct RequestMetrics {
    capacity: usize,
    samples: Mutex<VecDeque<Sample>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSnapshot {
    pub active_users: usize,
    /// 秒
    pub avg_response_time: f64,
    pub error_rate: f64,
    pub sample_count: usize,
}

impl RequestMetrics {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn record(&self, duration: Duration, status: u16, user_id: Option<String>) {
        let mut samples = self.samples.lock();
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(Sample {
            duration,
            status,
            user_id,
        });
    }

    pub fn snapshot(&self) -> RequestSnapshot {
        let samples = self.samples.lock();
        let count = samples.len();
        if count == 0 {
            return RequestSnapshot {
                active_users: 0,
                avg_response_time: 0.0,
                error_rate: 0.0,
                sample_count: 0,
            };
        }

        let total: Duration = samples.iter().map(|s| s.duration).sum();
        let errors = samples.iter().filter(|s| s.status >= 500).count();
        let active_users = samples
            .iter()
            .filter_map(|s| s.user_id.as_deref())
            .collect::<HashSet<_>>()
            .len();

        RequestSnapshot {
            active_users,
            avg_response_time: total.as_secs_f64() / count as f64,
            error_rate: errors as f64 / count as f64,
            sample_count: count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStats {
    pub total_tasks: usize,
    pub tasks_by_status: BTreeMap<&'static str, usize>,
    pub overdue_tasks: usize,
    pub average_age_days: f64,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let mut tasks_by_status: BTreeMap<&'static str, usize> =
            TaskStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for task in tasks {
            *tasks_by_status.entry(task.status.as_str()).or_default() += 1;
        }

        let overdue_tasks = tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Completed && t.expire_date < now)
            .count();

        let average_age_days = if tasks.is_empty() {
            0.0
        } else {
            let total_secs: i64 = tasks
                .iter()
                .map(|t| (now - t.created_at).num_seconds().max(0))
                .sum();
            total_secs as f64 / 86_400.0 / tasks.len() as f64
        };

        Self {
            total_tasks: tasks.len(),
            tasks_by_status,
            overdue_tasks,
            average_age_days,
        }
    }
}
