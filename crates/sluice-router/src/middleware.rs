use crate::selector::RoutingGroupSelector;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

/// Routing group chosen for a request; `None` means the default group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingDecision {
    pub routing_group: Option<String>,
}

/// Axum middleware running the selector and recording a [`RoutingDecision`]
/// in the request extensions. The body reaches the next handler intact.
///
/// ```ignore
/// let app = Router::new()
///     .route("/v1/statement", post(forward))
///     .layer(axum::middleware::from_fn_with_state(selector, assign_routing_group));
/// ```
pub async fn assign_routing_group(
    State(selector): State<Arc<dyn RoutingGroupSelector>>,
    mut req: Request,
    next: Next,
) -> Response {
    let routing_group = selector.find_routing_group(&mut req).await;
    tracing::debug!(
        method = %req.method(),
        path = %req.uri().path(),
        routing_group = ?routing_group,
        "Assigned routing group"
    );

    req.extensions_mut().insert(RoutingDecision { routing_group });
    next.run(req).await
}
