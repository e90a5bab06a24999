//! The single auto-refreshing status page.

use crate::state::{RunState, Status};

const REFRESH_SECS: u32 = 2;

pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn state_label(state: RunState) -> &'static str {
    match state {
        RunState::Running => "running",
        RunState::Paused => "paused",
        RunState::Done => "done",
        RunState::Failed => "failed",
    }
}

pub fn render(status: &Status, report: Option<&str>) -> String {
    let finished = matches!(status.state, RunState::Done | RunState::Failed);
    // Stop refreshing once nothing can change.
    let refresh = if finished {
        String::new()
    } else {
        format!(r#"<meta http-equiv="refresh" content="{REFRESH_SECS}">"#)
    };

    let progress = match &status.latest {
        Some(e) => html_escape(&e.line()),
        None => "waiting for the first epoch".to_string(),
    };
    // Epoch in the query string defeats image caching between frames.
    let frame = status.latest.map_or(0, |e| e.epoch);

    let controls = match status.state {
        RunState::Running => r#"<form method="post" action="/pause"><button>Pause</button></form>"#,
        RunState::Paused => r#"<form method="post" action="/resume"><button>Resume</button></form>"#,
        RunState::Done | RunState::Failed => "",
    };

    let error = status
        .error
        .as_deref()
        .map(|e| format!(r#"<p class="error">{}</p>"#, html_escape(e)))
        .unwrap_or_default();

    let report = report
        .map(|r| format!("<h2>Report</h2><pre>{}</pre>", html_escape(r)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
{refresh}
<title>ferrite-fit monitor</title>
<style>
body {{ font-family: monospace; margin: 2em; background: #f6f6f6; color: #222; }}
.state {{ font-weight: bold; text-transform: uppercase; }}
.error {{ color: #b00020; }}
img {{ border: 1px solid #999; max-width: 100%; }}
pre {{ background: #fff; padding: 1em; border: 1px solid #ddd; }}
</style>
</head>
<body>
<h1>ferrite-fit monitor</h1>
<p>state: <span class="state">{state}</span></p>
<p>{progress}</p>
{controls}
{error}
<p><img src="/plot.png?epoch={frame}" alt="live plot"></p>
{report}
</body>
</html>
"#,
        state = state_label(status.state),
    )
}
