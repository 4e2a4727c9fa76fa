//! Line-oriented JSON front end: one payload per input line, one response
//! per output line.

use anyhow::Result;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use sysconf_protocol::{RequestAccepted, RequestOptions};
use sysconf_requests::RequestHandlers;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const BAD_REQUEST: u16 = 400;

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Response {
    Accepted(RequestAccepted),
    Rejected { error: String, status: u16 },
}

impl Response {
    fn rejected(error: impl ToString) -> Self {
        Self::Rejected {
            error: error.to_string(),
            status: BAD_REQUEST,
        }
    }
}

async fn handle(handlers: &RequestHandlers, payload: &Value) -> Response {
    match handlers.handle_request(payload, RequestOptions::default()).await {
        Ok(accepted) => Response::Accepted(accepted),
        Err(err) => Response::rejected(err),
    }
}

/// Serves payloads until `reader` reaches EOF and returns how many lines
/// were answered. Blank lines are skipped.
pub async fn serve_lines<R, W>(
    handlers: &RequestHandlers,
    reader: R,
    mut writer: W,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut answered = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Ok(payload) => handle(handlers, &payload).await,
            Err(err) => {
                warn!("Discarding unparsable payload: {err}");
                Response::rejected(format!("invalid JSON: {err}"))
            }
        };
        debug!("Response: {response:?}");

        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
        answered += 1;
    }

    Ok(answered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use sysconf_bus::LocalBus;
    use sysconf_requests::{
        CommandCategory, DuplicateRequestOptimizer, ExecutorId, RequestFactory, RequestQueue,
    };
    use uuid::Uuid;

    fn handlers() -> (RequestHandlers, Arc<RequestQueue>) {
        let queue = Arc::new(RequestQueue::new(Arc::new(
            DuplicateRequestOptimizer::new(ExecutorId::new("asterisk")),
        )));
        let handlers = RequestHandlers::new(
            RequestFactory::new(Vec::<CommandCategory>::new()),
            queue.clone(),
            Arc::new(LocalBus::new("node-a", 8)),
        );
        (handlers, queue)
    }

    #[tokio::test]
    async fn each_line_gets_one_response() {
        let (handlers, queue) = handlers();
        let input = b"{\"context\": 1}\n\nnot json\n[1, 2]\n".as_slice();
        let mut output = Vec::new();

        let answered = serve_lines(&handlers, input, &mut output).await.unwrap();

        assert_eq!(answered, 3);
        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        let accepted = Uuid::parse_str(responses[0]["request_uuid"].as_str().unwrap()).unwrap();
        assert_eq!(queue.try_get().unwrap().uuid(), accepted);
        assert_eq!(responses[1]["status"], 400);
        assert!(responses[1]["error"].as_str().unwrap().starts_with("invalid JSON"));
        assert_eq!(responses[2]["status"], 400);
        assert!(queue.is_empty());
    }
}
