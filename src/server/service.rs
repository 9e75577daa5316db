use super::request::parse_request;
use super::response::write_outcome;
use crate::handler::RequestHandler;
use may_minihttp::{HttpService, Request, Response};
use std::io;

/// `HttpService` that feeds every request to a [`RequestHandler`].
///
/// One clone runs per connection; all clones share the same route table.
#[derive(Clone)]
pub struct RestService {
    handler: RequestHandler,
}

impl RestService {
    pub fn new(handler: RequestHandler) -> Self {
        Self { handler }
    }

    #[must_use]
    pub fn route_count(&self) -> usize {
        self.handler.routes().len()
    }
}

impl HttpService for RestService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let request = parse_request(req);
        let outcome = self.handler.handle(&request);
        write_outcome(res, outcome);
        Ok(())
    }
}
