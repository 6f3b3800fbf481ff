//! Client side of the reconciliation protocol.
//!
//! A [`LinkForm`] holds the rows a user is editing, [`build_request`] turns
//! them into one batch, and a [`LinkGateway`] carries the batch to the
//! service, over HTTP ([`HttpLinkGateway`]) or in process
//! ([`LocalLinkGateway`]).
//!
//! ```rust,ignore
//! let gateway = HttpLinkGateway::new("http://localhost:3000", DEFAULT_TIMEOUT)?;
//! let mut form = LinkForm::new("u1");
//! form.refresh(&gateway).await?;
//! form.update(0, EntryEdit::Platform(Some(Platform::Github)))?;
//! form.update(0, EntryEdit::Url("https://github.com/u1".into()))?;
//! form.submit(&gateway).await?;
//! ```

pub mod form;
pub mod gateway;
pub mod request;

pub use form::{EntryEdit, FormError, LinkForm, SubmitError};
pub use gateway::{DEFAULT_TIMEOUT, GatewayError, HttpLinkGateway, LinkGateway, LocalLinkGateway};
pub use request::build_request;
