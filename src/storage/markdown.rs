//! Task file encoding.
//!
//! Each task is a markdown file with TOML front matter fenced by `+++`:
//!
//! ```text
//! +++
//! id = "task-1"
//! title = "Write docs"
//! status = "To Do"
//! ...
//! +++
//!
//! Free-text body.
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Task, TaskStatus};

const FENCE: &str = "+++";

/// Structured fields of a task, as stored in front matter.
#[derive(Debug, Serialize, Deserialize)]
struct FrontMatter {
    id: String,
    title: String,
    #[serde(default)]
    status: TaskStatus,
    #[serde(default)]
    assignee: Vec<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

/// Render a task to file contents.
pub fn encode_task(task: &Task) -> Result<String, String> {
    let front = FrontMatter {
        id: task.id.clone(),
        title: task.title.clone(),
        status: task.status,
        assignee: task.assignee.clone(),
        created_at: task.created_at,
        labels: task.labels.clone(),
        dependencies: task.dependencies.clone(),
    };
    let header = toml::to_string(&front).map_err(|e| e.to_string())?;

    let mut out = String::with_capacity(header.len() + task.body.len() + 16);
    out.push_str(FENCE);
    out.push('\n');
    out.push_str(&header);
    out.push_str(FENCE);
    out.push_str("\n\n");
    out.push_str(&task.body);
    if !task.body.is_empty() && !task.body.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Parse file contents into a task.
///
/// The body is everything after the closing fence, minus the single blank
/// line `encode_task` writes after it.
pub fn decode_task(contents: &str) -> Result<Task, String> {
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
    let rest = contents
        .strip_prefix(FENCE)
        .and_then(|r| r.strip_prefix('\n').or_else(|| r.strip_prefix("\r\n")))
        .ok_or_else(|| "missing opening +++ fence".to_string())?;

    let (header, body) = split_at_closing_fence(rest)
        .ok_or_else(|| "missing closing +++ fence".to_string())?;

    let front: FrontMatter = toml::from_str(header).map_err(|e| e.to_string())?;

    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);

    Ok(Task {
        id: front.id,
        title: front.title,
        status: front.status,
        assignee: front.assignee,
        created_at: front.created_at,
        labels: front.labels,
        dependencies: front.dependencies,
        body: body.to_string(),
    })
}

/// Split at the first line consisting solely of the fence.
fn split_at_closing_fence(text: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == FENCE {
            return Some((&text[..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}
