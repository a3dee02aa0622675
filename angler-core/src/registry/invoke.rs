//! Subprocess invocation of the handler wire protocol.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::RegistryError;
use crate::uri::Uri;

use super::Handler;

/// A node or edge declared by a handler's `node`/`incoming`/`outgoing` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declared {
    Node { uri: String, value: Value },
    Edge { source: String, sink: String },
}

/// The result of running a `get`/`set` invocation: either the observed/
/// confirmed state, or a failure that the caller treats as per-node.
pub type HandlerOutcome<T> = Result<T, RegistryError>;

pub(super) async fn list_schemes(path: &Path) -> Result<Vec<String>, RegistryError> {
    let output = run(path, &["list"], None, None)
        .await
        .map_err(|source| RegistryError::Spawn {
            handler: path.display().to_string(),
            source,
        })?;
    if !output.status.success() {
        return Err(RegistryError::HandlerFailure {
            handler: path.display().to_string(),
            subcommand: "list".to_string(),
            detail: format!("exit status {}", output.status),
        });
    }
    let schemes = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    Ok(schemes)
}

/// Invokes `get` for the node's URI parts, returning its reported state.
/// Any `node`/`edge` declaration lines or other non-JSON chatter on stdout
/// are ignored; the first line that parses as JSON is the reported state.
pub async fn get(handler: &Handler, uri: &Uri) -> HandlerOutcome<Value> {
    let args = uri_args("get", uri);
    let output = spawn(handler, &args, None, None).await?;
    let text = String::from_utf8_lossy(&output.stdout);
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("node ") || line.starts_with("edge ") {
            continue;
        }
        if let Ok(value) = serde_json::from_str(line) {
            return Ok(value);
        }
    }
    Err(RegistryError::HandlerFailure {
        handler: handler.path.display().to_string(),
        subcommand: "get".to_string(),
        detail: "no JSON value found on stdout".to_string(),
    })
}

/// Invokes `set`, writing `old` then `new` as JSON lines on stdin, subject
/// to the apply-phase set timeout.
pub async fn set(handler: &Handler, uri: &Uri, old: &Value, new: &Value) -> HandlerOutcome<()> {
    let args = uri_args("set", uri);
    let stdin_payload = format!("{}\n{}\n", old, new);
    let output = spawn_with_timeout(
        handler,
        &args,
        Some(stdin_payload),
        Some(super::SET_TIMEOUT),
    )
    .await?;
    if !output.status.success() {
        return Err(RegistryError::HandlerFailure {
            handler: handler.path.display().to_string(),
            subcommand: "set".to_string(),
            detail: format!("exit status {}", output.status),
        });
    }
    Ok(())
}

/// Invokes `node` and parses its declaration lines.
pub async fn node(handler: &Handler, uri: &Uri) -> HandlerOutcome<Vec<Declared>> {
    let args = uri_args("node", uri);
    let output = spawn(handler, &args, None, None).await?;
    Ok(parse_declarations(&String::from_utf8_lossy(&output.stdout)))
}

/// Invokes `incoming`/`outgoing`: own URI parts then the peer's.
pub async fn edge_hook(
    handler: &Handler,
    subcommand: &'static str,
    own: &Uri,
    peer: &Uri,
) -> HandlerOutcome<Vec<Declared>> {
    let mut args = uri_args(subcommand, own);
    args.extend(uri_parts(peer));
    let output = spawn(handler, &args, None, None).await?;
    Ok(parse_declarations(&String::from_utf8_lossy(&output.stdout)))
}

fn uri_args(subcommand: &'static str, uri: &Uri) -> Vec<String> {
    let mut args = vec![subcommand.to_string()];
    args.extend(uri_parts(uri));
    args
}

fn uri_parts(uri: &Uri) -> Vec<String> {
    vec![
        uri.scheme.clone(),
        uri.host.clone(),
        uri.path.clone(),
        uri.query.clone().unwrap_or_default(),
        uri.fragment.clone().unwrap_or_default(),
    ]
}

/// Parses `node <uri> <json...>` / `edge <src> <sink>` lines, skipping and
/// logging anything that does not match either shape.
fn parse_declarations(stdout: &str) -> Vec<Declared> {
    let mut declared = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim_start();
        match keyword {
            "node" => {
                match rest.split_once(char::is_whitespace) {
                    Some((uri, json)) => match serde_json::from_str(json.trim()) {
                        Ok(value) => declared.push(Declared::Node {
                            uri: uri.to_string(),
                            value,
                        }),
                        Err(e) => {
                            tracing::warn!(line, error = %e, "skipping malformed node declaration");
                        }
                    },
                    None => {
                        tracing::warn!(line, "skipping malformed node declaration");
                    }
                }
            }
            "edge" => {
                let tokens: Vec<&str> = rest.split_whitespace().collect();
                if tokens.len() == 2 {
                    declared.push(Declared::Edge {
                        source: tokens[0].to_string(),
                        sink: tokens[1].to_string(),
                    });
                } else {
                    tracing::warn!(line, "skipping malformed edge declaration");
                }
            }
            _ => {
                tracing::warn!(line, "ignoring unrecognized handler output line");
            }
        }
    }
    declared
}

async fn run(
    path: &Path,
    args: &[&str],
    stdin_payload: Option<String>,
    _timeout: Option<Duration>,
) -> std::io::Result<std::process::Output> {
    let mut child = Command::new(path)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(payload) = stdin_payload {
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(payload.as_bytes()).await?;
        }
    } else {
        drop(child.stdin.take());
    }

    child.wait_with_output().await
}

async fn spawn(
    handler: &Handler,
    args: &[String],
    stdin_payload: Option<String>,
    timeout: Option<Duration>,
) -> Result<std::process::Output, RegistryError> {
    let args_ref: Vec<&str> = args.iter().map(String::as_str).collect();
    run(&handler.path, &args_ref, stdin_payload, timeout)
        .await
        .map_err(|source| RegistryError::Spawn {
            handler: handler.path.display().to_string(),
            source,
        })
}

async fn spawn_with_timeout(
    handler: &Handler,
    args: &[String],
    stdin_payload: Option<String>,
    timeout: Option<Duration>,
) -> Result<std::process::Output, RegistryError> {
    let subcommand = args.first().cloned().unwrap_or_default();
    match timeout {
        None => spawn(handler, args, stdin_payload, None).await,
        Some(duration) => {
            let future = spawn(handler, args, stdin_payload, None);
            match tokio::time::timeout(duration, future).await {
                Ok(result) => result,
                Err(_) => Err(RegistryError::Timeout {
                    handler: handler.path.display().to_string(),
                    subcommand,
                    timeout_secs: duration.as_secs(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::Uri;
    use std::os::unix::fs::PermissionsExt;

    fn fixture_handler(dir: &tempfile::TempDir, script: &str) -> Handler {
        let path = dir.path().join("handler");
        std::fs::write(&path, script).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        Handler { path }
    }

    #[tokio::test]
    async fn get_ignores_stray_declaration_lines_around_the_json_value() {
        let dir = tempfile::tempdir().unwrap();
        let handler = fixture_handler(
            &dir,
            "#!/bin/sh\necho 'node path:///noise {}'\necho '{\"folder\": {}}'\necho 'edge path:///a path:///b'\n",
        );
        let uri = Uri::parse("path:///etc").unwrap();
        let value = get(&handler, &uri).await.unwrap();
        assert_eq!(value, serde_json::json!({"folder": {}}));
    }

    #[test]
    fn parses_node_declaration_with_object_value() {
        let declared = parse_declarations("node path:///etc {\"folder\": {}}\n");
        assert_eq!(
            declared,
            vec![Declared::Node {
                uri: "path:///etc".to_string(),
                value: serde_json::json!({"folder": {}}),
            }]
        );
    }

    #[test]
    fn parses_edge_declaration() {
        let declared = parse_declarations("edge path:///etc path:///etc/sub\n");
        assert_eq!(
            declared,
            vec![Declared::Edge {
                source: "path:///etc".to_string(),
                sink: "path:///etc/sub".to_string(),
            }]
        );
    }

    #[test]
    fn skips_malformed_lines_without_aborting() {
        let declared = parse_declarations("garbage\nedge only-one-token\nnode path:///etc {}\n");
        assert_eq!(
            declared,
            vec![Declared::Node {
                uri: "path:///etc".to_string(),
                value: serde_json::json!({}),
            }]
        );
    }

    #[test]
    fn node_json_payload_may_contain_spaces() {
        let declared = parse_declarations(r#"node path:///etc {"folder": {"mode": "0755"}}"#);
        assert_eq!(
            declared,
            vec![Declared::Node {
                uri: "path:///etc".to_string(),
                value: serde_json::json!({"folder": {"mode": "0755"}}),
            }]
        );
    }
}
