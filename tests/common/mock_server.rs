//! An in-memory mock DAP server.
//!
//! Implements the `Connect`/`DapConnection` collaborator contracts over
//! canned responses. Data responses are keyed by the exact constraint text,
//! so tests double as assertions on the subset expressions the crate puts
//! on the wire.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use dapraster::dap::{DapConnection, DataResponse};
use dapraster::{AttributeTree, Connect, Error, MetadataSchema, Result};

/// Shared state behind a mock server and every connection it hands out.
#[derive(Debug, Default)]
pub struct MockState {
    pub version: String,
    pub schema: MetadataSchema,
    pub attributes: AttributeTree,
    pub responses: HashMap<String, DataResponse>,
    pub requested_constraints: Vec<String>,
    pub connect_count: usize,
}

/// A mock DAP server; hand its connector to `Dataset::open`.
#[derive(Debug, Clone)]
pub struct MockServer {
    state: Rc<RefCell<MockState>>,
}

impl MockServer {
    pub fn new(schema: MetadataSchema, attributes: AttributeTree) -> MockServer {
        MockServer {
            state: Rc::new(RefCell::new(MockState {
                version: "DAP/3.2".to_string(),
                schema,
                attributes,
                ..MockState::default()
            })),
        }
    }

    /// Override the version string the server reports.
    pub fn with_version(self, version: &str) -> MockServer {
        self.state.borrow_mut().version = version.to_string();
        self
    }

    /// Serve `response` for the exact constraint text `constraint`.
    pub fn add_response(&self, constraint: &str, response: DataResponse) {
        self.state
            .borrow_mut()
            .responses
            .insert(constraint.to_string(), response);
    }

    /// Every constraint requested so far, in order.
    pub fn requested_constraints(&self) -> Vec<String> {
        self.state.borrow().requested_constraints.clone()
    }

    /// How many connections have been opened.
    pub fn connect_count(&self) -> usize {
        self.state.borrow().connect_count
    }

    /// The connector to pass to `Dataset::open`.
    pub fn connector(&self) -> MockConnect {
        MockConnect {
            state: Rc::clone(&self.state),
        }
    }
}

/// Connector handed to `Dataset::open`.
#[derive(Debug, Clone)]
pub struct MockConnect {
    state: Rc<RefCell<MockState>>,
}

impl Connect for MockConnect {
    fn connect(&self, _url: &str) -> Result<Box<dyn DapConnection>> {
        self.state.borrow_mut().connect_count += 1;
        Ok(Box::new(MockConnection {
            state: Rc::clone(&self.state),
        }))
    }
}

struct MockConnection {
    state: Rc<RefCell<MockState>>,
}

impl DapConnection for MockConnection {
    fn request_version(&mut self) -> Result<String> {
        Ok(self.state.borrow().version.clone())
    }

    fn request_metadata_schema(&mut self) -> Result<MetadataSchema> {
        Ok(self.state.borrow().schema.clone())
    }

    fn request_attributes(&mut self) -> Result<AttributeTree> {
        Ok(self.state.borrow().attributes.clone())
    }

    fn request_data(&mut self, constraint: &str) -> Result<DataResponse> {
        let mut state = self.state.borrow_mut();
        state.requested_constraints.push(constraint.to_string());
        state
            .responses
            .get(constraint)
            .cloned()
            .ok_or_else(|| Error::Fetch {
                message: format!("The mock server has no response for constraint '{}'", constraint),
            })
    }
}
