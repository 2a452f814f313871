//! Pure analytics over a task and its cycle history.
//!
//! [`analyze`] takes already-loaded rows and a clock reading and computes
//! the full report without touching storage. Missing or zero data never
//! errors; the affected scores come back as zeros or neutral labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dayflow_store::types::{StopEvent, Task, TaskProgress, TaskStatus};

// ─────────────────────────────────────────────────────────────────────────────
// Report types
// ─────────────────────────────────────────────────────────────────────────────

/// Direction of per-cycle output over the recorded history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Recent cycles outperform early ones by more than 10%.
    Improving,
    /// Recent cycles underperform early ones by more than 10%.
    Declining,
    /// Within the 10% band either way.
    Stable,
    /// Fewer than six recorded cycles.
    InsufficientData,
    /// No recorded cycles at all.
    NoData,
}

/// Coarse task health label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    /// Completed.
    Excellent,
    /// In progress with work credited.
    Good,
    /// Still pending.
    NeedsAttention,
    /// Anything else (in progress with nothing credited, or stopped).
    Warning,
}

/// Where the current cycle stands relative to its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    /// Past the cycle end.
    Overdue,
    /// Less than 10% of the cycle remains.
    Urgent,
    /// Less than 30% remains.
    Approaching,
    /// Comfortably within the cycle.
    OnTrack,
    /// The cycle has no positive duration.
    NoDeadline,
}

/// Letter grade over the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    /// 90 and above.
    A,
    /// 75 to 90.
    B,
    /// 60 to 75.
    C,
    /// 40 to 60.
    D,
    /// Below 40.
    F,
}

/// How far the current cycle has come against its estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionMetrics {
    /// Percent of the estimate credited (0 when the estimate is 0).
    pub completion_rate: f64,
    /// Hours still owed, floored at 0.
    pub remaining_hours: f64,
}

/// Output per cycle against the estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEfficiency {
    /// Mean hours credited per recorded cycle.
    pub avg_hours_per_cycle: f64,
    /// estimate / average, as a percent capped at 100.
    pub efficiency_score: f64,
}

/// Cycle-over-cycle movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressTrends {
    /// 100 minus the coefficient of variation of per-cycle hours.
    pub consistency_score: f64,
    /// Percent change of the second half's average over the first half's.
    pub improvement_rate: f64,
    /// Coarse direction label.
    pub trend: Trend,
}

/// Weighted performance scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceIndicators {
    /// Aggregate done over aggregate estimated, as a percent.
    pub productivity: f64,
    /// Mean per-cycle estimate accuracy.
    pub reliability: f64,
    /// Mean per-cycle completion, capped at 100 per cycle.
    pub quality: f64,
    /// 0.4 productivity + 0.3 reliability + 0.3 quality.
    pub overall: f64,
}

/// Health label plus pause pressure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusAnalysis {
    /// Coarse health.
    pub health: Health,
    /// Number of live stop events (0 or 1 for a single task).
    pub stop_frequency: usize,
}

/// Clock position within the current cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAnalysis {
    /// Hours elapsed since the cycle start.
    pub time_spent_hours: f64,
    /// Hours until the cycle end (negative when overdue).
    pub time_remaining_hours: f64,
    /// Deadline classification.
    pub deadline_status: DeadlineStatus,
}

/// Grade, score, and advice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    /// Letter grade over the overall score.
    pub grade: Grade,
    /// Mean of completion rate and efficiency score.
    pub overall_score: f64,
    /// Ordered, deduplicated advice strings.
    pub recommendations: Vec<String>,
}

/// The full report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAnalytics {
    /// The task analyzed.
    pub task_id: String,
    /// Completion against the estimate.
    pub completion: CompletionMetrics,
    /// Per-cycle efficiency.
    pub efficiency: TimeEfficiency,
    /// Movement over the history.
    pub trends: ProgressTrends,
    /// Weighted performance scores.
    pub performance: PerformanceIndicators,
    /// Health and pause pressure.
    pub status: StatusAnalysis,
    /// Clock position in the current cycle.
    pub time: TimeAnalysis,
    /// Grade and advice.
    pub summary: AnalyticsSummary,
}

// ─────────────────────────────────────────────────────────────────────────────
// Computation
// ─────────────────────────────────────────────────────────────────────────────

/// Build the full report from already-loaded rows.
#[must_use]
pub fn analyze(
    task: &Task,
    progress: &[TaskProgress],
    stops: &[StopEvent],
    now: DateTime<Utc>,
) -> TaskAnalytics {
    let completion = completion_metrics(task);
    let efficiency = time_efficiency(task, progress);
    let trends = progress_trends(progress);
    let performance = performance_indicators(progress);
    let status = status_analysis(task, stops);
    let time = time_analysis(task, now);
    let summary = build_summary(task, &completion, &efficiency, &time);

    TaskAnalytics {
        task_id: task.id.clone(),
        completion,
        efficiency,
        trends,
        performance,
        status,
        time,
        summary,
    }
}

fn completion_metrics(task: &Task) -> CompletionMetrics {
    let completion_rate = if task.estimated_hr > 0.0 {
        task.done_hr / task.estimated_hr * 100.0
    } else {
        0.0
    };
    CompletionMetrics {
        completion_rate: round2(completion_rate),
        remaining_hours: round2((task.estimated_hr - task.done_hr).max(0.0)),
    }
}

fn time_efficiency(task: &Task, progress: &[TaskProgress]) -> TimeEfficiency {
    let avg = mean(progress.iter().map(|p| p.done_hr));
    let score = if avg > 0.0 {
        (task.estimated_hr / avg * 100.0).min(100.0)
    } else {
        0.0
    };
    TimeEfficiency {
        avg_hours_per_cycle: round2(avg),
        efficiency_score: round2(score),
    }
}

fn progress_trends(progress: &[TaskProgress]) -> ProgressTrends {
    let hours: Vec<f64> = progress.iter().map(|p| p.done_hr).collect();
    let n = hours.len();

    let trend = if n == 0 {
        Trend::NoData
    } else if n < 6 {
        Trend::InsufficientData
    } else {
        let early = mean(hours[..3].iter().copied());
        let late = mean(hours[n - 3..].iter().copied());
        if late > early * 1.1 {
            Trend::Improving
        } else if late < early * 0.9 {
            Trend::Declining
        } else {
            Trend::Stable
        }
    };

    let consistency = if n < 2 {
        0.0
    } else {
        let avg = mean(hours.iter().copied());
        if avg > 0.0 {
            let variance = hours.iter().map(|h| (h - avg).powi(2)).sum::<f64>()
                / f64_len(n);
            let cv = variance.sqrt() / avg;
            (100.0 - cv * 100.0).max(0.0)
        } else {
            0.0
        }
    };

    let improvement = if n < 2 {
        0.0
    } else {
        let mid = n / 2;
        let first = mean(hours[..mid].iter().copied());
        let second = mean(hours[mid..].iter().copied());
        if first > 0.0 {
            (second - first) / first * 100.0
        } else {
            0.0
        }
    };

    ProgressTrends {
        consistency_score: round2(consistency),
        improvement_rate: round2(improvement),
        trend,
    }
}

fn performance_indicators(progress: &[TaskProgress]) -> PerformanceIndicators {
    let total_done: f64 = progress.iter().map(|p| p.done_hr).sum();
    let total_est: f64 = progress.iter().map(|p| p.estimated_hr).sum();
    let productivity = if total_est > 0.0 {
        total_done / total_est * 100.0
    } else {
        0.0
    };

    let estimated: Vec<&TaskProgress> =
        progress.iter().filter(|p| p.estimated_hr > 0.0).collect();
    let reliability = mean(estimated.iter().map(|p| {
        (100.0 - (p.done_hr - p.estimated_hr).abs() / p.estimated_hr * 100.0).max(0.0)
    }));
    let quality = mean(
        estimated
            .iter()
            .map(|p| (p.done_hr / p.estimated_hr * 100.0).min(100.0)),
    );

    let overall = 0.4 * productivity + 0.3 * reliability + 0.3 * quality;
    PerformanceIndicators {
        productivity: round2(productivity),
        reliability: round2(reliability.min(100.0)),
        quality: round2(quality),
        overall: round2(overall),
    }
}

fn status_analysis(task: &Task, stops: &[StopEvent]) -> StatusAnalysis {
    let health = match task.status {
        TaskStatus::Completed => Health::Excellent,
        TaskStatus::InProgress if task.done_hr > 0.0 => Health::Good,
        TaskStatus::Pending => Health::NeedsAttention,
        _ => Health::Warning,
    };
    StatusAnalysis {
        health,
        stop_frequency: stops.len(),
    }
}

fn time_analysis(task: &Task, now: DateTime<Utc>) -> TimeAnalysis {
    let total = hours_between(task.start_date, task.end_date);
    let spent = hours_between(task.start_date, now);
    let remaining = hours_between(now, task.end_date);

    let deadline_status = if total <= 0.0 {
        DeadlineStatus::NoDeadline
    } else if now > task.end_date {
        DeadlineStatus::Overdue
    } else {
        let fraction_left = remaining / total;
        if fraction_left < 0.1 {
            DeadlineStatus::Urgent
        } else if fraction_left < 0.3 {
            DeadlineStatus::Approaching
        } else {
            DeadlineStatus::OnTrack
        }
    };

    TimeAnalysis {
        time_spent_hours: round2(spent),
        time_remaining_hours: round2(remaining),
        deadline_status,
    }
}

fn build_summary(
    task: &Task,
    completion: &CompletionMetrics,
    efficiency: &TimeEfficiency,
    time: &TimeAnalysis,
) -> AnalyticsSummary {
    let overall_score = (completion.completion_rate + efficiency.efficiency_score) / 2.0;
    let grade = if overall_score >= 90.0 {
        Grade::A
    } else if overall_score >= 75.0 {
        Grade::B
    } else if overall_score >= 60.0 {
        Grade::C
    } else if overall_score >= 40.0 {
        Grade::D
    } else {
        Grade::F
    };

    let mut recommendations = Vec::new();
    match time.deadline_status {
        DeadlineStatus::Overdue => recommendations.push(
            "Deadline has passed; revisit the schedule or close the task out".to_string(),
        ),
        DeadlineStatus::Urgent => recommendations
            .push("Deadline is close; prioritize the remaining hours".to_string()),
        _ => {}
    }
    if task.is_repetitive && task.is_stopped {
        recommendations
            .push("Task is stopped; resume it to keep cycles rolling".to_string());
    }
    if completion.completion_rate < 50.0 {
        recommendations
            .push("Completion is behind; plan more time against this task".to_string());
    }
    if efficiency.efficiency_score < 50.0 {
        recommendations
            .push("Cycles run under the estimate; consider re-estimating".to_string());
    }
    if recommendations.is_empty() {
        recommendations.push("Task is on track".to_string());
    }

    AnalyticsSummary {
        grade,
        overall_score: round2(overall_score),
        recommendations,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Numeric helpers
// ─────────────────────────────────────────────────────────────────────────────

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count: usize = 0;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 { 0.0 } else { sum / f64_len(count) }
}

#[allow(clippy::cast_precision_loss)]
fn f64_len(n: usize) -> f64 {
    n as f64
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let seconds = (to - from).num_seconds() as f64;
    seconds / 3600.0
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
