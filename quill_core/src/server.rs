//! The request boundary: authentication chain, dispatch, error rendering.

use tracing::instrument;

use crate::auth::{AuthChain, AuthOutcome};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::router::RouteTable;

/// Ties the route table and the authentication chain together.
///
/// `serve` is the one place where typed errors become wire responses; the
/// dispatcher and the handlers below it only ever see `Result`.
pub struct RestServer {
    routes: RouteTable,
    auth: AuthChain,
}

impl RestServer {
    pub fn new() -> Self {
        RestServer {
            routes: RouteTable::new(),
            auth: AuthChain::new(),
        }
    }

    pub fn routes_mut(&mut self) -> &mut RouteTable {
        &mut self.routes
    }

    pub fn auth_mut(&mut self) -> &mut AuthChain {
        &mut self.auth
    }

    /// Authenticates the request, dispatches it, and converts any error into
    /// its JSON response form.
    #[instrument(skip_all, fields(method = %request.method(), path = %request.path()))]
    pub async fn serve(&self, mut request: Request) -> Response {
        match self.auth.run(&request).await {
            AuthOutcome::Failure(err) => return err.into_response(),
            AuthOutcome::Success(principal) => request.set_principal(principal),
            AuthOutcome::Pass => {}
        }
        match self.routes.dispatch(request).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }
}

impl Default for RestServer {
    fn default() -> Self {
        RestServer::new()
    }
}
