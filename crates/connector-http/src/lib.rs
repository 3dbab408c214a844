//! The send-data action of the cloud connector: the request panel that
//! edits its settings and the runtime action that performs the request.

pub mod body;
pub mod error;
pub mod executor;
pub mod headers;
pub mod model;
pub mod panel;
pub mod query;
pub mod reactor;
pub mod transport;
pub mod validate;

pub use error::{ConnectorError, Result};
pub use executor::{ConnectorStash, RuleStash, dispatch};
pub use model::{BodyType, FormValues, HttpMethod, InitInfo, RequestBody, RequestSettings};
pub use panel::{RequestPanel, RowList, Tab};
pub use transport::{ReqwestTransport, Transport};
