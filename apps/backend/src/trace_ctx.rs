//! Task-local request context.
//!
//! Carries the current request's trace id and whether diagnostic detail may
//! be exposed in error responses. Set by the `TraceSpan` middleware for the
//! lifetime of the request future; read by the error envelope and by log
//! statements anywhere below it.

use tokio::task_local;

#[derive(Debug, Clone)]
pub struct RequestCtx {
    pub trace_id: String,
    /// False in production: diagnostics stay in the logs only.
    pub expose_details: bool,
}

task_local! {
    static REQUEST_CTX: RequestCtx;
}

/// Trace id of the current task, or `"unknown"` outside a request.
pub fn trace_id() -> String {
    REQUEST_CTX
        .try_with(|ctx| ctx.trace_id.clone())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Whether error diagnostics may be returned to the client.
/// Outside a request scope this is always false.
pub fn expose_details() -> bool {
    REQUEST_CTX
        .try_with(|ctx| ctx.expose_details)
        .unwrap_or(false)
}

/// Run a future within a request context.
pub async fn with_request_ctx<F, R>(ctx: RequestCtx, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    REQUEST_CTX.scope(ctx, future).await
}

/// Run a future with only a trace id set (details suppressed).
pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    with_request_ctx(
        RequestCtx {
            trace_id,
            expose_details: false,
        },
        future,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trace_id_outside_context() {
        assert_eq!(trace_id(), "unknown");
        assert!(!expose_details());
    }

    #[tokio::test]
    async fn test_trace_id_within_context() {
        let result = with_request_ctx(
            RequestCtx {
                trace_id: "test-trace-123".to_string(),
                expose_details: true,
            },
            async {
                assert_eq!(trace_id(), "test-trace-123");
                assert!(expose_details());
                "success"
            },
        )
        .await;

        assert_eq!(result, "success");
        assert_eq!(trace_id(), "unknown");
    }

    #[tokio::test]
    async fn test_nested_contexts() {
        with_trace_id("outer".to_string(), async {
            assert_eq!(trace_id(), "outer");

            with_request_ctx(
                RequestCtx {
                    trace_id: "inner".to_string(),
                    expose_details: true,
                },
                async {
                    assert_eq!(trace_id(), "inner");
                    assert!(expose_details());
                },
            )
            .await;

            assert_eq!(trace_id(), "outer");
            assert!(!expose_details());
        })
        .await;
    }
}
